//! Enums.

use rustc_hash::FxHashMap;
use weld_ir::{EnumDef, ItemId};
use weld_names::EnumStyle;

use super::Out;
use crate::context::Context;
use crate::CodegenError;

/// A variant value as a literal of the backing integer.
///
/// Values are stored as `i64` bits; unsigned backings are masked to their
/// width so that `-1` in a `uint8_t` enum prints as `255`.
pub(crate) fn discriminant(value: i64, size: u64, signed: bool) -> String {
    if signed {
        return value.to_string();
    }
    let bits = u64::from_ne_bytes(value.to_ne_bytes());
    let masked = if size >= 8 {
        bits
    } else {
        bits & ((1u64 << (size * 8)) - 1)
    };
    masked.to_string()
}

impl Context<'_> {
    pub(super) fn emit_enum(
        &self,
        out: &mut Out,
        id: ItemId,
        def: &EnumDef,
    ) -> Result<(), CodegenError> {
        let ident = self.ident(id)?;
        let names = self.names.enumeration(id).ok_or_else(|| CodegenError::Unnamed {
            item: self.name(id),
        })?;
        let repr = self.enum_repr(def.repr).ok_or_else(|| CodegenError::Unrenderable {
            user: self.name(id),
            what: format!("an enum backed by `{}`", def.repr.c_spelling()),
        })?;
        let size = self.target.int_layout(def.repr).map_or(8, |layout| layout.size);
        let signed = self.target.is_signed(def.repr);

        let variants: Vec<(&str, String)> = def
            .variants
            .iter()
            .zip(&names.variants)
            .map(|(variant, name)| (name.as_str(), discriminant(variant.value, size, signed)))
            .collect();

        match names.style {
            EnumStyle::Consts => {
                out.line(&format!("pub type {ident} = {repr};"));
                for (name, value) in &variants {
                    out.line(&format!("pub const {name}: {ident} = {value};"));
                }
            }
            EnumStyle::Rust => {
                // Rust rejects duplicate discriminants; later duplicates
                // become associated constants naming the first variant.
                let mut first: FxHashMap<&str, &str> = FxHashMap::default();
                let mut unique = Vec::new();
                let mut duplicates = Vec::new();
                for (name, value) in &variants {
                    match first.get(value.as_str()) {
                        Some(original) => duplicates.push((*name, *original)),
                        None => {
                            first.insert(value.as_str(), *name);
                            unique.push((*name, value.as_str()));
                        }
                    }
                }

                out.line(&format!("#[repr({repr})]"));
                if self.options.derive_debug {
                    out.line("#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]");
                } else {
                    out.line("#[derive(Copy, Clone, PartialEq, Eq, Hash)]");
                }
                out.open(&format!("pub enum {ident}"));
                for (name, value) in &unique {
                    out.line(&format!("{name} = {value},"));
                }
                out.close("");

                if !duplicates.is_empty() {
                    out.blank();
                    out.open(&format!("impl {ident}"));
                    for (name, original) in &duplicates {
                        out.line(&format!("pub const {name}: {ident} = {ident}::{original};"));
                    }
                    out.close("");
                }
            }
        }
        Ok(())
    }
}
