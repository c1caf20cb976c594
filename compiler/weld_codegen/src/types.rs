//! Rendering type expressions as Rust types.

use weld_filter::Emission;
use weld_ir::{FloatKind, FnSig, IntKind, ItemId, ItemKind, Ty, TypeId};

use crate::context::Context;
use crate::CodegenError;

pub(crate) const C_VOID: &str = "::core::ffi::c_void";

/// Widest integer a denied blob is built from.
const MAX_BLOB_ALIGN: u64 = 16;

/// Where a type is spelled.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Position {
    /// Field, typedef target, return type.
    Value,
    /// Function parameter: arrays decay to pointers.
    Param,
    /// Behind a pointer: `void` and denied types are `c_void`.
    Pointee,
}

/// Fixed-width Rust integer of a given byte size and signedness.
pub(crate) fn fixed_int(size: u64, signed: bool) -> &'static str {
    match (size, signed) {
        (1, true) => "i8",
        (1, false) => "u8",
        (2, true) => "i16",
        (2, false) => "u16",
        (4, true) => "i32",
        (4, false) => "u32",
        (16, true) => "i128",
        (16, false) => "u128",
        (_, true) => "i64",
        (_, false) => "u64",
    }
}

impl Context<'_> {
    /// Render `ty` as used by `user`.
    pub(crate) fn render(
        &self,
        ty: TypeId,
        position: Position,
        user: ItemId,
    ) -> Result<String, CodegenError> {
        weld_stack::with_stack(|| self.render_inner(ty, position, user))
    }

    fn render_inner(
        &self,
        ty: TypeId,
        position: Position,
        user: ItemId,
    ) -> Result<String, CodegenError> {
        match self.graph.ty(ty) {
            Ty::Void => Ok(C_VOID.to_owned()),
            Ty::Bool => Ok("bool".to_owned()),
            Ty::Int(kind) => Ok(self.int_type(*kind).to_owned()),
            Ty::Float(FloatKind::Float) => Ok("f32".to_owned()),
            Ty::Float(FloatKind::Double) => Ok("f64".to_owned()),
            Ty::Float(kind) => Err(self.unrenderable(user, kind.c_spelling())),
            Ty::Pointer { pointee, is_const } | Ty::Reference { pointee, is_const } => {
                self.render_pointer(*pointee, *is_const, user)
            }
            Ty::Array { element, len } => {
                if position == Position::Param {
                    let element = self.render(*element, Position::Pointee, user)?;
                    return Ok(format!("*mut {element}"));
                }
                let element = self.render(*element, Position::Value, user)?;
                Ok(format!("[{element}; {}]", len.unwrap_or(0)))
            }
            Ty::Function(sig) => self.fn_type(sig, user),
            Ty::Item(id) => self.render_item(ty, *id, position, user),
            Ty::TemplateParam(_) => Err(self.unrenderable(user, "a template parameter")),
        }
    }

    fn render_pointer(
        &self,
        pointee: TypeId,
        is_const: bool,
        user: ItemId,
    ) -> Result<String, CodegenError> {
        let qualifier = if is_const { "const" } else { "mut" };
        if self.unsupported_scalar(pointee).is_some() {
            return Ok(format!("*{qualifier} {C_VOID}"));
        }
        if let Ty::Function(sig) = self.graph.ty(self.graph.resolve_alias(pointee)) {
            let function = match self.graph.ty(pointee) {
                Ty::Item(alias) if self.set.contains(*alias) => self.path(*alias)?,
                _ => self.fn_type(sig, user)?,
            };
            return Ok(format!("::core::option::Option<{function}>"));
        }
        let pointee = self.render(pointee, Position::Pointee, user)?;
        Ok(format!("*{qualifier} {pointee}"))
    }

    fn render_item(
        &self,
        ty: TypeId,
        id: ItemId,
        position: Position,
        user: ItemId,
    ) -> Result<String, CodegenError> {
        if self.set.is_denied(id) {
            return match position {
                Position::Pointee => Ok(C_VOID.to_owned()),
                Position::Value | Position::Param => self.denied_blob(ty, user),
            };
        }
        if !self.set.contains(id) {
            return Err(CodegenError::Unreachable {
                user: self.name(user),
                target: self.name(id),
            });
        }
        match &self.graph.item(id).kind {
            ItemKind::Function(_) => Err(self.unrenderable(user, "a function as a type")),
            ItemKind::Template(_) => Err(self.unrenderable(user, "an uninstantiated template")),
            ItemKind::TypeAlias(alias)
                if position == Position::Param
                    && matches!(self.graph.ty(self.graph.resolve_alias(alias.target)), Ty::Array { .. }) =>
            {
                self.render(alias.target, position, user)
            }
            _ => self.path(id),
        }
    }

    /// A denied type used by value: integers with its size and alignment.
    fn denied_blob(&self, ty: TypeId, user: ItemId) -> Result<String, CodegenError> {
        let Some(layout) = self.layouts.type_layout(self.graph, self.target, ty) else {
            return Err(self.unrenderable(user, "a denied type without a layout"));
        };
        let align = layout.align.clamp(1, MAX_BLOB_ALIGN);
        let unit = fixed_int(align, false);
        Ok(format!("[{unit}; {}]", layout.size / align))
    }

    /// Alignment of the Rust type a by-value member of type `ty` renders
    /// as, given its C alignment. Lower than `align` only when the member
    /// bottoms out in a denied blob.
    pub(crate) fn rendered_align(&self, ty: TypeId, align: u64) -> u64 {
        let mut current = ty;
        loop {
            match self.graph.ty(current) {
                Ty::Array { element, .. } => current = *element,
                Ty::Item(id) if self.set.is_denied(*id) => return align.min(MAX_BLOB_ALIGN),
                Ty::Item(id) => match &self.graph.item(*id).kind {
                    ItemKind::TypeAlias(alias) => current = alias.target,
                    _ => return align,
                },
                _ => return align,
            }
        }
    }

    /// `unsafe extern "abi" fn(..) -> ..`
    pub(crate) fn fn_type(&self, sig: &FnSig, user: ItemId) -> Result<String, CodegenError> {
        let mut params = sig
            .params
            .iter()
            .map(|&param| self.render(param, Position::Param, user))
            .collect::<Result<Vec<_>, _>>()?;
        if sig.variadic {
            params.push("...".to_owned());
        }
        let ret = self.return_type(sig.ret, user)?;
        Ok(format!(
            "unsafe extern \"{}\" fn({}){ret}",
            sig.call_conv.rust_abi(),
            params.join(", ")
        ))
    }

    /// ` -> T`, or nothing for `void`.
    pub(crate) fn return_type(&self, ret: TypeId, user: ItemId) -> Result<String, CodegenError> {
        if matches!(self.graph.ty(ret), Ty::Void) {
            return Ok(String::new());
        }
        Ok(format!(" -> {}", self.render(ret, Position::Value, user)?))
    }

    pub(crate) fn int_type(&self, kind: IntKind) -> &'static str {
        match kind {
            IntKind::Char => "::core::ffi::c_char",
            IntKind::SChar => "::core::ffi::c_schar",
            IntKind::UChar => "::core::ffi::c_uchar",
            IntKind::Short => "::core::ffi::c_short",
            IntKind::UShort => "::core::ffi::c_ushort",
            IntKind::Int => "::core::ffi::c_int",
            IntKind::UInt => "::core::ffi::c_uint",
            IntKind::Long => "::core::ffi::c_long",
            IntKind::ULong => "::core::ffi::c_ulong",
            IntKind::LongLong => "::core::ffi::c_longlong",
            IntKind::ULongLong => "::core::ffi::c_ulonglong",
            IntKind::Int128 => "i128",
            IntKind::UInt128 => "u128",
            IntKind::Char16 => "u16",
            IntKind::Char32 => "u32",
            IntKind::WChar => {
                let size = self.target.int_layout(kind).map_or(4, |layout| layout.size);
                fixed_int(size, self.target.is_signed(kind))
            }
        }
    }

    /// Fixed-width integer backing an enum, `None` if the target has none.
    pub(crate) fn enum_repr(&self, repr: IntKind) -> Option<&'static str> {
        let layout = self.target.int_layout(repr)?;
        Some(fixed_int(layout.size, self.target.is_signed(repr)))
    }

    /// The C spelling of a scalar with no Rust equivalent that values of
    /// `ty` contain, if any. Pointers never do: their pointee degrades to
    /// `c_void`.
    pub(crate) fn unsupported_scalar(&self, ty: TypeId) -> Option<&'static str> {
        weld_stack::with_stack(|| match self.graph.ty(ty) {
            Ty::Float(kind @ (FloatKind::LongDouble | FloatKind::Float128)) => Some(kind.c_spelling()),
            Ty::Int(kind) => self
                .target
                .int_layout(*kind)
                .is_none()
                .then_some(kind.c_spelling()),
            Ty::Array { element, .. } => self.unsupported_scalar(*element),
            Ty::Function(sig) => std::iter::once(sig.ret)
                .chain(sig.params.iter().copied())
                .find_map(|part| self.unsupported_scalar(part)),
            Ty::Item(id) => match &self.graph.item(*id).kind {
                ItemKind::TypeAlias(alias) if !self.set.is_denied(*id) => {
                    self.unsupported_scalar(alias.target)
                }
                ItemKind::Enum(def) if self.set.emission(*id) == Some(Emission::Full) => self
                    .target
                    .int_layout(def.repr)
                    .is_none()
                    .then_some(def.repr.c_spelling()),
                _ => None,
            },
            Ty::Void
            | Ty::Bool
            | Ty::Float(_)
            | Ty::Pointer { .. }
            | Ty::Reference { .. }
            | Ty::TemplateParam(_) => None,
        })
    }

    /// Whether a union member of this type must be wrapped in
    /// `ManuallyDrop`: Rust only allows `Copy` union fields otherwise.
    pub(crate) fn needs_manually_drop(&self, ty: TypeId) -> bool {
        match self.graph.ty(self.graph.resolve_alias(ty)) {
            Ty::Array { element, .. } => self.needs_manually_drop(*element),
            Ty::Item(id) => {
                self.set.contains(*id)
                    && !self.set.is_denied(*id)
                    && self.graph.item(*id).is_aggregate()
                    && !self.is_copy(*id)
            }
            _ => false,
        }
    }

    fn unrenderable(&self, user: ItemId, what: &str) -> CodegenError {
        CodegenError::Unrenderable {
            user: self.name(user),
            what: what.to_owned(),
        }
    }
}
