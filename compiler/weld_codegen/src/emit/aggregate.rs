//! Structs, unions and bitfield accessors.

use weld_ir::{ItemId, ItemKind, Ty, TypeId};
use weld_layout::{BitSlot, FieldSlot, Layout, Member, UnitStorage};

use super::{derives, emit_size_assertions, Out};
use crate::context::Context;
use crate::types::Position;
use crate::CodegenError;

/// What a bitfield accessor reads and writes.
enum BitValue {
    Bool,
    Int(String),
}

impl BitValue {
    fn ty(&self) -> &str {
        match self {
            BitValue::Bool => "bool",
            BitValue::Int(ty) => ty,
        }
    }
}

/// Widest unit loaded whole: the bytes of a `u128`.
const WHOLE_UNIT_LIMIT: u64 = 16;

/// How one allocation unit is loaded into and stored from an integer.
struct UnitAccess {
    field: String,
    storage: UnitStorage,
    in_union: bool,
}

/// The bytes of a unit one accessor loads, and where its bits sit in them.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct Window {
    start: u64,
    len: u64,
    /// Bit offset of the field within the loaded integer.
    shift: u64,
}

impl Window {
    /// `u64`, or `u128` for windows wider than 8 bytes.
    fn wide(self) -> (&'static str, u32) {
        if self.len > 8 {
            ("u128", 128)
        } else {
            ("u64", 64)
        }
    }
}

impl UnitAccess {
    /// Units up to 16 bytes are loaded whole. Longer byte runs (chained
    /// bitfields of a packed struct) load only the bytes under `bit`.
    fn window(&self, bit: &BitSlot) -> Window {
        match self.storage {
            UnitStorage::Bytes(n) if n > WHOLE_UNIT_LIMIT => {
                let start = bit.bit_offset / 8;
                let end = (bit.bit_offset + u64::from(bit.width)).div_ceil(8);
                Window {
                    start,
                    len: end - start,
                    shift: bit.bit_offset - start * 8,
                }
            }
            storage => Window {
                start: 0,
                len: storage.size(),
                shift: bit.bit_offset,
            },
        }
    }

    fn is_whole(&self, window: Window) -> bool {
        window.start == 0 && window.len == self.storage.size()
    }

    fn field_value(&self) -> String {
        if self.in_union {
            format!("unsafe {{ self.{} }}", self.field)
        } else {
            format!("self.{}", self.field)
        }
    }

    fn load(&self, out: &mut Out, mutable: bool, window: Window) {
        let binding = if mutable { "let mut unit" } else { "let unit" };
        let (wide, bits) = window.wide();
        match self.storage {
            UnitStorage::Bytes(_) => {
                let source = if self.is_whole(window) {
                    self.field_value()
                } else {
                    format!(
                        "{}[{}..{}]",
                        self.field_value(),
                        window.start,
                        window.start + window.len
                    )
                };
                out.line(&format!("let mut bytes = [0u8; {}];", bits / 8));
                out.line(&format!(
                    "bytes[..{}].copy_from_slice(&{source});",
                    window.len
                ));
                out.line(&format!("{binding} = {wide}::from_le_bytes(bytes);"));
            }
            _ => out.line(&format!("{binding} = {wide}::from({});", self.field_value())),
        }
    }

    fn store(&self, out: &mut Out, window: Window) {
        match self.storage {
            UnitStorage::Bytes(n) if self.is_whole(window) => {
                out.line(&format!("let mut bytes = [0u8; {n}];"));
                out.line(&format!("bytes.copy_from_slice(&unit.to_le_bytes()[..{n}]);"));
                out.line(&format!("self.{} = bytes;", self.field));
            }
            UnitStorage::Bytes(_) => out.line(&format!(
                "self.{}[{}..{}].copy_from_slice(&unit.to_le_bytes()[..{}]);",
                self.field,
                window.start,
                window.start + window.len,
                window.len
            )),
            UnitStorage::U64 => out.line(&format!("self.{} = unit;", self.field)),
            UnitStorage::U8 | UnitStorage::U16 | UnitStorage::U32 => out.line(&format!(
                "self.{} = unit as {};",
                self.field,
                storage_type(self.storage)
            )),
        }
    }
}

fn storage_type(storage: UnitStorage) -> String {
    match storage {
        UnitStorage::U8 => "u8".to_owned(),
        UnitStorage::U16 => "u16".to_owned(),
        UnitStorage::U32 => "u32".to_owned(),
        UnitStorage::U64 => "u64".to_owned(),
        UnitStorage::Bytes(n) => format!("[u8; {n}]"),
    }
}

/// `expr >> n`, or `expr` for a zero shift.
fn shr(expr: &str, n: u64) -> String {
    if n == 0 {
        expr.to_owned()
    } else {
        format!("({expr} >> {n})")
    }
}

fn low_mask(width: u32) -> u128 {
    if width >= 128 {
        u128::MAX
    } else {
        (1u128 << width) - 1
    }
}

impl Context<'_> {
    pub(super) fn emit_aggregate(
        &self,
        out: &mut Out,
        id: ItemId,
        layout: &Layout,
    ) -> Result<(), CodegenError> {
        let is_union = self.graph.item(id).is_union();
        let ident = self.ident(id)?;
        let copy = self.is_copy(id);

        let mut members = Vec::with_capacity(layout.members.len());
        let mut natural = 1;
        for (index, member) in layout.members.iter().enumerate() {
            let name = self
                .names
                .member(id, index)
                .ok_or_else(|| CodegenError::Unnamed {
                    item: format!("{}::<member {index}>", self.name(id)),
                })?;
            let ty = match member {
                Member::Field {
                    owner,
                    slot,
                    layout: field,
                    ..
                } => {
                    let ty = self.slot_type(id, *owner, *slot)?;
                    natural = natural.max(self.rendered_align(ty, field.align));
                    let rendered = self.render(ty, Position::Value, id)?;
                    if is_union && self.needs_manually_drop(ty) {
                        format!("::core::mem::ManuallyDrop<{rendered}>")
                    } else {
                        rendered
                    }
                }
                Member::Bitfield(unit) => {
                    natural = natural.max(unit.storage.align());
                    storage_type(unit.storage)
                }
                Member::Padding { size, .. } => format!("[u8; {size}]"),
            };
            members.push((name, ty));
        }

        // A denied blob may align lower than the C type it stands for.
        let repr_align = layout
            .repr_align
            .or_else(|| (!layout.packed && layout.align > natural).then_some(layout.align));
        match (layout.packed, repr_align) {
            (true, _) => out.line("#[repr(C, packed)]"),
            (false, Some(align)) => out.line(&format!("#[repr(C, align({align}))]")),
            (false, None) => out.line("#[repr(C)]"),
        }
        // Unions never derive `Debug`, and packed structs can only derive
        // it when every field can be copied out.
        let derive_debug = self.options.derive_debug && !is_union && (copy || !layout.packed);
        if let Some(derives) = derives(copy, derive_debug) {
            out.line(&derives);
        }
        let keyword = if is_union { "union" } else { "struct" };
        out.open(&format!("pub {keyword} {ident}"));
        for (name, ty) in &members {
            out.line(&format!("pub {name}: {ty},"));
        }
        out.close("");

        if self.options.derive_debug && !derive_debug {
            out.blank();
            out.open(&format!("impl ::core::fmt::Debug for {ident}"));
            out.open("fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result");
            out.line(&format!("f.write_str(\"{ident} {{ .. }}\")"));
            out.close("");
            out.close("");
        }

        self.emit_accessors(out, id, ident, layout, is_union)?;

        if self.options.layout_tests {
            let offsets: Vec<(&str, u64)> = if is_union {
                Vec::new()
            } else {
                members
                    .iter()
                    .zip(&layout.members)
                    .map(|((name, _), member)| (*name, member.offset()))
                    .collect()
            };
            out.blank();
            emit_size_assertions(out, ident, layout.type_layout(), &offsets);
        }
        Ok(())
    }

    /// Declared type of a plan entry.
    fn slot_type(&self, user: ItemId, owner: ItemId, slot: FieldSlot) -> Result<TypeId, CodegenError> {
        let def = self
            .graph
            .item(owner)
            .aggregate()
            .and_then(|agg| agg.definition.as_ref());
        let ty = def.and_then(|def| match slot {
            FieldSlot::Base(index) => def.bases.get(index).copied(),
            FieldSlot::Field(index) => def.fields.get(index).map(|field| field.ty),
        });
        ty.ok_or_else(|| CodegenError::Unrenderable {
            user: self.name(user),
            what: "a member missing from its declaration".to_owned(),
        })
    }

    fn emit_accessors(
        &self,
        out: &mut Out,
        id: ItemId,
        ident: &str,
        layout: &Layout,
        is_union: bool,
    ) -> Result<(), CodegenError> {
        let mut opened = false;
        for (index, member) in layout.members.iter().enumerate() {
            let Member::Bitfield(unit) = member else {
                continue;
            };
            let Some(field) = self.names.member(id, index) else {
                continue;
            };
            let access = UnitAccess {
                field: field.to_owned(),
                storage: unit.storage,
                in_union: is_union,
            };
            for bit in &unit.bits {
                let Some(accessor) = self.names.accessor(id, bit.owner, bit.field) else {
                    continue;
                };
                let value = self.bit_value(id, bit)?;
                if opened {
                    out.blank();
                } else {
                    out.blank();
                    out.open(&format!("impl {ident}"));
                    opened = true;
                }
                emit_getter(out, &access, bit, &value, &accessor.getter);
                out.blank();
                emit_setter(out, &access, bit, &value, &accessor.setter);
            }
        }
        if opened {
            out.close("");
        }
        Ok(())
    }

    /// Accessor value type of a bitfield: its declared integer, `bool`, or
    /// the integer an enum is stored as.
    fn bit_value(&self, user: ItemId, bit: &BitSlot) -> Result<BitValue, CodegenError> {
        let ty = self.slot_type(user, bit.owner, FieldSlot::Field(bit.field))?;
        match self.graph.ty(self.graph.resolve_alias(ty)) {
            Ty::Bool => Ok(BitValue::Bool),
            Ty::Int(kind) => Ok(BitValue::Int(self.int_type(*kind).to_owned())),
            Ty::Item(target) => match &self.graph.item(*target).kind {
                ItemKind::Enum(def) => {
                    let consts = self.set.contains(*target)
                        && self
                            .names
                            .enumeration(*target)
                            .is_some_and(|names| names.style == weld_names::EnumStyle::Consts);
                    if consts {
                        return Ok(BitValue::Int(self.path(*target)?));
                    }
                    self.enum_repr(def.repr)
                        .map(|repr| BitValue::Int(repr.to_owned()))
                        .ok_or_else(|| CodegenError::Unrenderable {
                            user: self.name(user),
                            what: format!("a bitfield of type `{}`", def.repr.c_spelling()),
                        })
                }
                _ => Err(CodegenError::Unrenderable {
                    user: self.name(user),
                    what: "a bitfield of non-integer type".to_owned(),
                }),
            },
            _ => Err(CodegenError::Unrenderable {
                user: self.name(user),
                what: "a bitfield of non-integer type".to_owned(),
            }),
        }
    }
}

fn emit_getter(out: &mut Out, access: &UnitAccess, bit: &BitSlot, value: &BitValue, name: &str) {
    let window = access.window(bit);
    let (wide, bits) = window.wide();
    let width = u64::from(bit.width);
    out.line("#[inline]");
    out.open(&format!("pub fn {name}(&self) -> {}", value.ty()));
    access.load(out, false, window);
    let expr = match value {
        BitValue::Bool => format!("({} & 0x1) != 0", shr("unit", window.shift)),
        BitValue::Int(ty) if bit.signed => {
            let signed = wide.replacen('u', "i", 1);
            let left = u64::from(bits) - window.shift - width;
            let raised = if left == 0 {
                format!("(unit as {signed})")
            } else {
                format!("((unit << {left}) as {signed})")
            };
            format!("{} as {ty}", shr(&raised, u64::from(bits) - width))
        }
        BitValue::Int(ty) => format!(
            "({} & {:#x}) as {ty}",
            shr("unit", window.shift),
            low_mask(bit.width)
        ),
    };
    out.line(&expr);
    out.close("");
}

fn emit_setter(out: &mut Out, access: &UnitAccess, bit: &BitSlot, value: &BitValue, name: &str) {
    let window = access.window(bit);
    let (wide, _) = window.wide();
    let mask = low_mask(bit.width);
    let shifted = mask << window.shift;
    out.line("#[inline]");
    out.open(&format!("pub fn {name}(&mut self, value: {})", value.ty()));
    access.load(out, true, window);
    out.line(&format!("unit &= !{shifted:#x};"));
    let raw = match value {
        BitValue::Bool => format!("{wide}::from(value)"),
        BitValue::Int(_) => format!("(value as {wide})"),
    };
    let masked = format!("{raw} & {mask:#x}");
    if window.shift == 0 {
        out.line(&format!("unit |= {masked};"));
    } else {
        out.line(&format!("unit |= ({masked}) << {};", window.shift));
    }
    access.store(out, window);
    out.close("");
}
