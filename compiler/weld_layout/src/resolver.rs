//! The layout resolver.
//!
//! Lays out aggregates bottom-up along by-value containment, memoizing every
//! result in a [`LayoutTable`]. An aggregate that cannot be laid out is
//! recorded as invalid and reported once; every aggregate containing it by
//! value degrades in turn.

use rustc_hash::FxHashSet;
use smallvec::SmallVec;
use weld_diagnostic::{Diagnostic, DiagnosticQueue, Origin};
use weld_ir::{AggregateDef, ItemGraph, ItemId, ItemKind, StringInterner, Ty, TypeId};

use crate::layout::{
    BitSlot, BitfieldUnit, FieldSlot, Layout, LayoutError, LayoutState, LayoutTable, Member,
    TypeLayout, UnitStorage,
};
use crate::place::{place_struct, place_union, Placement, SlotInput};
use crate::target::TargetAbi;

/// Largest alignment `#[repr(align(N))]` accepts.
const MAX_REPR_ALIGN: u64 = 1 << 29;

/// Why a type has no layout, as seen from the field using it.
#[derive(Clone, Debug)]
enum Blocked {
    /// A forward-declared aggregate with no definition.
    Incomplete(ItemId),
    /// An aggregate already recorded as invalid.
    Degraded(ItemId),
    /// An aggregate currently being laid out further up the stack.
    Cycle(ItemId),
    /// A scalar the target cannot represent.
    Unsupported(String),
    /// `void`, a function type, or a dependent type.
    Unsized(String),
    /// An array larger than any object on the target.
    TooLarge(String),
}

/// Resolve the layout of every aggregate in `items` (and everything they
/// contain by value).
#[tracing::instrument(level = "debug", skip_all, fields(target = %target))]
pub fn resolve_layouts(
    graph: &ItemGraph,
    interner: &StringInterner,
    target: &TargetAbi,
    items: impl IntoIterator<Item = ItemId>,
    diagnostics: &mut DiagnosticQueue,
) -> LayoutTable {
    let mut resolver = LayoutResolver::new(graph, interner, target, diagnostics);
    for id in items {
        if graph.item(id).is_aggregate() {
            resolver.resolve(id);
        }
    }
    let table = resolver.finish();
    tracing::debug!(layouts = table.len(), "layouts resolved");
    table
}

/// Memoizing layout resolver for one run.
pub struct LayoutResolver<'a> {
    graph: &'a ItemGraph,
    interner: &'a StringInterner,
    target: &'a TargetAbi,
    diagnostics: &'a mut DiagnosticQueue,
    table: LayoutTable,
    /// Aggregates being laid out, innermost last.
    stack: Vec<ItemId>,
    /// Aggregates found on a by-value containment cycle.
    on_cycle: FxHashSet<ItemId>,
}

impl<'a> LayoutResolver<'a> {
    pub fn new(
        graph: &'a ItemGraph,
        interner: &'a StringInterner,
        target: &'a TargetAbi,
        diagnostics: &'a mut DiagnosticQueue,
    ) -> Self {
        LayoutResolver {
            graph,
            interner,
            target,
            diagnostics,
            table: LayoutTable::new(),
            stack: Vec::new(),
            on_cycle: FxHashSet::default(),
        }
    }

    /// Lay out one aggregate. `None` when it is incomplete or invalid.
    pub fn resolve(&mut self, id: ItemId) -> Option<&Layout> {
        match self.aggregate_layout(id) {
            Ok(_) => self.table.get(id),
            Err(_) => None,
        }
    }

    pub fn finish(self) -> LayoutTable {
        self.table
    }

    fn aggregate_layout(&mut self, id: ItemId) -> Result<TypeLayout, Blocked> {
        match self.table.state(id) {
            Some(LayoutState::Resolved(layout)) => return Ok(layout.type_layout()),
            Some(LayoutState::Invalid(_)) => return Err(Blocked::Degraded(id)),
            None => {}
        }
        if let Some(pos) = self.stack.iter().position(|&open| open == id) {
            self.on_cycle.extend(self.stack[pos..].iter().copied());
            return Err(Blocked::Cycle(id));
        }
        let graph = self.graph;
        let Some(def) = graph.item(id).aggregate().and_then(|a| a.definition.as_ref()) else {
            return Err(Blocked::Incomplete(id));
        };

        self.stack.push(id);
        let result = weld_stack::with_stack(|| self.compute(id, def));
        self.stack.pop();

        match result {
            Ok(layout) => {
                let type_layout = layout.type_layout();
                tracing::trace!(
                    item = %self.name(id),
                    size = layout.size,
                    align = layout.align,
                    "resolved layout"
                );
                self.table.insert(id, LayoutState::Resolved(layout));
                Ok(type_layout)
            }
            Err(err) => {
                self.report(id, &err);
                self.table.insert(id, LayoutState::Invalid(err));
                Err(Blocked::Degraded(id))
            }
        }
    }

    fn compute(&mut self, id: ItemId, def: &'a AggregateDef) -> Result<Layout, LayoutError> {
        let is_union = self.graph.item(id).is_union();

        if let Some(align) = def.align {
            if !align.is_power_of_two() || align > MAX_REPR_ALIGN {
                return Err(LayoutError::InvalidAlign {
                    item: self.name(id),
                    align,
                });
            }
            if def.packed {
                return Err(LayoutError::PackedAligned {
                    item: self.name(id),
                    align,
                });
            }
        }

        let mut inputs = Vec::with_capacity(def.bases.len() + def.fields.len());
        let mut signed = Vec::with_capacity(def.fields.len());

        for &base in &def.bases {
            let label = format!("base {}", self.spell(base));
            let layout = self
                .ty_layout(base)
                .map_err(|blocked| self.to_error(id, &label, blocked))?;
            self.check_packed_member(id, def, base)?;
            inputs.push(SlotInput::Value { layout });
        }

        let mut flexible = false;
        for (index, field) in def.fields.iter().enumerate() {
            let label = self.field_label(field.name, index);
            if let Some(width) = field.bit_width {
                let Some((unit, is_signed)) = self.bitfield_type(field.ty) else {
                    return Err(LayoutError::NonIntegerBitfield { field: label });
                };
                if u64::from(width) > unit.size * 8 {
                    return Err(LayoutError::BitfieldTooWide {
                        field: label,
                        width,
                        max: unit.size * 8,
                    });
                }
                inputs.push(SlotInput::Bitfield {
                    width,
                    unit,
                    named: field.name.is_some(),
                });
                signed.push(is_signed);
                continue;
            }

            let layout = self
                .ty_layout(field.ty)
                .map_err(|blocked| self.to_error(id, &label, blocked))?;
            self.check_packed_member(id, def, field.ty)?;
            if matches!(
                self.graph.ty(self.graph.resolve_alias(field.ty)),
                Ty::Array { len: None, .. }
            ) {
                flexible = true;
            }
            inputs.push(SlotInput::Value { layout });
            signed.push(false);
        }

        let rule = self.target.bitfield_rule();
        let placement = if is_union {
            place_union(&inputs, rule, def.packed, def.align)
        } else {
            place_struct(&inputs, rule, def.packed, def.align)
        };
        let placement = placement
            .filter(|p| p.size <= self.target.max_object_size())
            .ok_or_else(|| LayoutError::ObjectTooLarge {
                what: format!("`{}`", self.name(id)),
                target: self.target.triple().to_owned(),
            })?;

        let members = self.plan(id, def, is_union, &inputs, &signed, &placement);
        let natural = members.iter().map(Member::rust_align).max().unwrap_or(1);
        let repr_align = (!def.packed && placement.align > natural).then_some(placement.align);

        let base_count = def.bases.len();
        Ok(Layout {
            size: placement.size,
            align: placement.align,
            packed: def.packed,
            repr_align,
            field_offsets: placement.slots[base_count..]
                .iter()
                .map(|p| p.bit_offset)
                .collect(),
            base_offsets: placement.slots[..base_count]
                .iter()
                .map(|p| p.bit_offset / 8)
                .collect(),
            members,
            flexible,
        })
    }

    /// Build the emission plan from a placement.
    fn plan(
        &mut self,
        id: ItemId,
        def: &AggregateDef,
        is_union: bool,
        inputs: &[SlotInput],
        signed: &[bool],
        placement: &Placement,
    ) -> Vec<Member> {
        let base_count = def.bases.len();
        let mut raw: Vec<RawMember> = Vec::with_capacity(inputs.len());
        let mut group: Option<PendingUnit> = None;

        for (k, (input, placed)) in inputs.iter().zip(&placement.slots).enumerate() {
            match *input {
                SlotInput::Value { layout } => {
                    raw.extend(group.take().map(RawMember::Unit));
                    let offset = placed.bit_offset / 8;
                    if k < base_count {
                        raw.push(RawMember::Placed(Member::Field {
                            owner: id,
                            slot: FieldSlot::Base(k),
                            offset,
                            layout,
                        }));
                        continue;
                    }
                    let index = k - base_count;
                    if let Some(nested) = self.flatten_target(id, def, index, is_union) {
                        self.table.mark_flattened(nested.0);
                        raw.extend(
                            nested
                                .1
                                .into_iter()
                                .map(|m| RawMember::Placed(m.shifted(offset))),
                        );
                    } else {
                        raw.push(RawMember::Placed(Member::Field {
                            owner: id,
                            slot: FieldSlot::Field(index),
                            offset,
                            layout,
                        }));
                    }
                }
                SlotInput::Bitfield { width: 0, .. } => {
                    raw.extend(group.take().map(RawMember::Unit));
                }
                SlotInput::Bitfield { width, .. } => {
                    let index = k - base_count;
                    let (start, end) = placed.unit.unwrap_or((placed.bit_offset / 8, 0));
                    let bit = PendingBit {
                        field: index,
                        bit: placed.bit_offset,
                        width,
                        signed: signed.get(index).copied().unwrap_or(false),
                    };
                    // Union members never share storage.
                    match &mut group {
                        Some(open) if !is_union && start < open.end => {
                            open.start = open.start.min(start);
                            open.end = open.end.max(end);
                            open.bits.push(bit);
                        }
                        _ => {
                            raw.extend(group.take().map(RawMember::Unit));
                            let mut bits = SmallVec::new();
                            bits.push(bit);
                            group = Some(PendingUnit { start, end, bits });
                        }
                    }
                }
            }
        }
        raw.extend(group.take().map(RawMember::Unit));

        let mut members = Vec::with_capacity(raw.len());
        let mut cursor = 0u64;
        for i in 0..raw.len() {
            let member = match &raw[i] {
                RawMember::Placed(member) => member.clone(),
                RawMember::Unit(unit) => {
                    let next_start = if is_union {
                        placement.size
                    } else {
                        raw[i + 1..]
                            .first()
                            .map_or(placement.size, RawMember::start)
                    };
                    let first_byte = unit
                        .bits
                        .iter()
                        .map(|b| b.bit / 8)
                        .min()
                        .unwrap_or(unit.start);
                    let last_end = unit
                        .bits
                        .iter()
                        .map(|b| (b.bit + u64::from(b.width)).div_ceil(8))
                        .max()
                        .unwrap_or(unit.end);
                    let start = if is_union {
                        0
                    } else {
                        unit.start.max(cursor).min(first_byte)
                    };
                    let end = unit.end.min(next_start).max(last_end);
                    let storage =
                        UnitStorage::for_unit(end - start, start, placement.align, def.packed);
                    Member::Bitfield(BitfieldUnit {
                        offset: start,
                        storage,
                        bits: unit
                            .bits
                            .iter()
                            .map(|b| BitSlot {
                                owner: id,
                                field: b.field,
                                bit_offset: b.bit - start * 8,
                                width: b.width,
                                signed: b.signed,
                            })
                            .collect(),
                    })
                }
            };
            if !is_union {
                if member.offset() > cursor {
                    members.push(Member::Padding {
                        offset: cursor,
                        size: member.offset() - cursor,
                    });
                }
                cursor = cursor.max(member.offset() + member.size());
            }
            members.push(member);
        }
        if !is_union && placement.size > cursor {
            members.push(Member::Padding {
                offset: cursor,
                size: placement.size - cursor,
            });
        }
        members
    }

    /// The nested aggregate an anonymous member flattens into its parent,
    /// with its plan. Only same-kind members flatten, and a packed member
    /// only into a packed parent.
    fn flatten_target(
        &self,
        parent: ItemId,
        def: &AggregateDef,
        index: usize,
        is_union: bool,
    ) -> Option<(ItemId, Vec<Member>)> {
        let field = def.fields.get(index)?;
        if !field.anonymous {
            return None;
        }
        let nested = self.graph.resolve_item(field.ty)?;
        let item = self.graph.item(nested);
        if !item.is_aggregate() || item.is_union() != is_union || nested == parent {
            return None;
        }
        let layout = self.table.get(nested)?;
        if layout.packed && !def.packed {
            return None;
        }
        Some((nested, layout.members.clone()))
    }

    fn ty_layout(&mut self, ty: TypeId) -> Result<TypeLayout, Blocked> {
        let graph = self.graph;
        match graph.ty(ty) {
            Ty::Bool => Ok(self.target.bool_layout().into()),
            Ty::Int(kind) => self
                .target
                .int_layout(*kind)
                .map(Into::into)
                .ok_or_else(|| Blocked::Unsupported(kind.c_spelling().to_owned())),
            Ty::Float(kind) => self
                .target
                .float_layout(*kind)
                .map(Into::into)
                .ok_or_else(|| Blocked::Unsupported(kind.c_spelling().to_owned())),
            Ty::Pointer { .. } | Ty::Reference { .. } => Ok(self.target.pointer().into()),
            Ty::Array { element, len } => {
                let elem = self.ty_layout(*element)?;
                let size = elem
                    .size
                    .checked_mul(len.unwrap_or(0))
                    .filter(|&size| size <= self.target.max_object_size())
                    .ok_or_else(|| Blocked::TooLarge(self.spell(ty)))?;
                Ok(TypeLayout::new(size, elem.align))
            }
            Ty::Item(id) => match &graph.item(*id).kind {
                ItemKind::Struct(_) | ItemKind::Union(_) => self.aggregate_layout(*id),
                ItemKind::Enum(def) => self
                    .target
                    .int_layout(def.repr)
                    .map(Into::into)
                    .ok_or_else(|| Blocked::Unsupported(def.repr.c_spelling().to_owned())),
                ItemKind::TypeAlias(alias) => self.ty_layout(alias.target),
                ItemKind::Function(_) | ItemKind::Template(_) => Err(Blocked::Unsized(self.spell(ty))),
            },
            Ty::Void | Ty::Function(_) | Ty::TemplateParam(_) => Err(Blocked::Unsized(self.spell(ty))),
        }
    }

    /// Declared type layout and signedness of a bitfield.
    fn bitfield_type(&self, ty: TypeId) -> Option<(TypeLayout, bool)> {
        match self.graph.ty(self.graph.resolve_alias(ty)) {
            Ty::Bool => Some((self.target.bool_layout().into(), false)),
            Ty::Int(kind) => Some((
                self.target.int_layout(*kind)?.into(),
                self.target.is_signed(*kind),
            )),
            Ty::Item(id) => match &self.graph.item(*id).kind {
                ItemKind::Enum(def) => Some((
                    self.target.int_layout(def.repr)?.into(),
                    self.target.is_signed(def.repr),
                )),
                _ => None,
            },
            _ => None,
        }
    }

    /// `#[repr(packed)]` types cannot contain `#[repr(align)]` types.
    fn check_packed_member(
        &self,
        id: ItemId,
        def: &AggregateDef,
        ty: TypeId,
    ) -> Result<(), LayoutError> {
        if !def.packed {
            return Ok(());
        }
        let mut current = self.graph.resolve_alias(ty);
        while let Ty::Array { element, .. } = self.graph.ty(current) {
            current = self.graph.resolve_alias(*element);
        }
        let aligned = match self.graph.ty(current) {
            Ty::Item(inner) => self.table.get(*inner).and_then(|l| l.repr_align),
            _ => None,
        };
        match aligned {
            Some(align) => Err(LayoutError::PackedAligned {
                item: self.name(id),
                align,
            }),
            None => Ok(()),
        }
    }

    fn to_error(&self, id: ItemId, field: &str, blocked: Blocked) -> LayoutError {
        let field = field.to_owned();
        match blocked {
            Blocked::Cycle(_) | Blocked::Degraded(_) if self.on_cycle.contains(&id) => {
                LayoutError::ContainmentCycle {
                    item: self.name(id),
                }
            }
            Blocked::Incomplete(target) => LayoutError::IncompleteField {
                field,
                ty: self.name(target),
            },
            Blocked::Degraded(target) | Blocked::Cycle(target) => LayoutError::DegradedField {
                field,
                ty: self.name(target),
            },
            Blocked::Unsupported(ty) => LayoutError::UnsupportedScalar {
                field,
                ty,
                target: self.target.triple().to_owned(),
            },
            Blocked::Unsized(ty) => LayoutError::IncompleteField { field, ty },
            Blocked::TooLarge(ty) => LayoutError::ObjectTooLarge {
                what: format!("field `{field}` of type {ty}"),
                target: self.target.triple().to_owned(),
            },
        }
    }

    fn report(&mut self, id: ItemId, err: &LayoutError) {
        let item = self.graph.item(id);
        let name = self.name(id);
        tracing::warn!(item = %name, code = %err.code(), "{err}");
        self.diagnostics.add(
            Diagnostic::warning(err.code())
                .with_message(format!("cannot lay out `{name}`: {err}"))
                .with_label(
                    Origin::from_location(item.location, self.interner),
                    format!("{} declared here", item.kind.label()),
                )
                .with_note("it is emitted as an opaque type"),
        );
    }

    fn name(&self, id: ItemId) -> String {
        self.graph.qualified_name(id, self.interner)
    }

    fn field_label(&self, name: Option<weld_ir::Name>, index: usize) -> String {
        match name {
            Some(name) => self.interner.lookup(name).to_owned(),
            None => format!("#{index}"),
        }
    }

    fn spell(&self, ty: TypeId) -> String {
        match self.graph.ty(ty) {
            Ty::Void => "void".to_owned(),
            Ty::Bool => "bool".to_owned(),
            Ty::Int(kind) => kind.c_spelling().to_owned(),
            Ty::Float(kind) => kind.c_spelling().to_owned(),
            Ty::Pointer { pointee, .. } => format!("{}*", self.spell(*pointee)),
            Ty::Reference { pointee, .. } => format!("{}&", self.spell(*pointee)),
            Ty::Array { element, len } => match len {
                Some(n) => format!("{}[{n}]", self.spell(*element)),
                None => format!("{}[]", self.spell(*element)),
            },
            Ty::Function(_) => "function type".to_owned(),
            Ty::Item(id) => format!("`{}`", self.name(*id)),
            Ty::TemplateParam(name) => self.interner.lookup(*name).to_owned(),
        }
    }
}

/// A plan entry before bitfield units are clipped to their neighbours.
enum RawMember {
    Placed(Member),
    Unit(PendingUnit),
}

impl RawMember {
    fn start(&self) -> u64 {
        match self {
            RawMember::Placed(member) => member.offset(),
            RawMember::Unit(unit) => unit.start,
        }
    }
}

struct PendingUnit {
    start: u64,
    end: u64,
    bits: SmallVec<[PendingBit; 4]>,
}

struct PendingBit {
    field: usize,
    /// Absolute bit offset within the aggregate.
    bit: u64,
    width: u32,
    signed: bool,
}
