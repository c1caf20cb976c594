//! Function declarations.

use weld_diagnostic::{Diagnostic, DiagnosticQueue, ErrorCode};
use weld_ir::{FunctionDef, ItemId, TypeId};

use super::Out;
use crate::context::{Context, Shape};
use crate::types::Position;
use crate::CodegenError;

impl Context<'_> {
    /// Functions passing an opaque type or an unrepresentable scalar by
    /// value cannot be declared with the right ABI and are left out.
    pub(super) fn admit_function(
        &self,
        id: ItemId,
        func: &FunctionDef,
        diagnostics: &mut DiagnosticQueue,
    ) -> bool {
        let signature = || std::iter::once(func.ret).chain(func.params.iter().map(|param| param.ty));

        if let Some(scalar) = signature().find_map(|ty| self.unsupported_scalar(ty)) {
            self.warn_unsupported(id, "function", scalar, diagnostics);
            return false;
        }

        if let Some(opaque) = signature().find_map(|ty| self.opaque_by_value(ty)) {
            let name = self.name(id);
            let opaque = self.name(opaque);
            tracing::warn!(function = %name, opaque = %opaque, "skipped: opaque type by value");
            diagnostics.add(
                Diagnostic::warning(ErrorCode::E5001)
                    .with_message(format!(
                        "function `{name}` passes opaque type `{opaque}` by value"
                    ))
                    .with_label(self.origin(id), "declared here")
                    .with_note("the function is not emitted")
                    .with_suggestion(
                        "pass the type by pointer, or make it complete and remove it from `--opaque-type`",
                    ),
            );
            return false;
        }
        true
    }

    /// The emitted type without contents that `ty` passes by value, if any.
    fn opaque_by_value(&self, ty: TypeId) -> Option<ItemId> {
        let id = self.graph.resolve_item(ty)?;
        if !self.set.contains(id) {
            return None;
        }
        let item = self.graph.item(id);
        let contentless = self.set.is_opaque(id)
            || (item.is_aggregate() && !matches!(self.shape(id), Shape::Aggregate(_)));
        contentless.then_some(id)
    }

    pub(super) fn emit_function(
        &self,
        out: &mut Out,
        id: ItemId,
        func: &FunctionDef,
    ) -> Result<(), CodegenError> {
        let ident = self.ident(id)?;
        let names = self.names.function(id).ok_or_else(|| CodegenError::Unnamed {
            item: self.name(id),
        })?;

        let mut params = Vec::with_capacity(func.params.len() + 1);
        for (index, param) in func.params.iter().enumerate() {
            let name = names.params.get(index).ok_or_else(|| CodegenError::Unnamed {
                item: format!("{}::<parameter {}>", self.name(id), index + 1),
            })?;
            let ty = self.render(param.ty, Position::Param, id)?;
            params.push(format!("{name}: {ty}"));
        }
        if func.variadic {
            params.push("...".to_owned());
        }
        let ret = self.return_type(func.ret, id)?;

        out.open(&format!("unsafe extern \"{}\"", func.call_conv.rust_abi()));
        if let Some(link_name) = &names.link_name {
            out.line(&format!("#[link_name = \"{link_name}\"]"));
        }
        out.line(&format!("pub fn {ident}({}){ret};", params.join(", ")));
        out.close("");
        Ok(())
    }
}
