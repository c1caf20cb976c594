//! Per-item emission.
//!
//! Every declaration is printed by one `emit_*` method on the shared
//! context. Whether an item can be declared at all is decided up front by
//! [`Context::admit`], which reports the item-scoped warnings; emission
//! itself only fails on broken invariants.

mod aggregate;
mod enumeration;
mod function;

use weld_diagnostic::{Diagnostic, DiagnosticQueue, ErrorCode, Origin};
use weld_filter::Emission;
use weld_ir::{ItemId, ItemKind};
use weld_layout::TypeLayout;

use crate::context::{Context, Shape};
use crate::emitter::{Printer, StringEmitter};
use crate::types::Position;
use crate::CodegenError;

pub(crate) type Out = Printer<StringEmitter>;

impl Context<'_> {
    /// Whether a declared item can be emitted. Warns when it cannot.
    pub(crate) fn admit(&self, id: ItemId, diagnostics: &mut DiagnosticQueue) -> bool {
        let item = self.graph.item(id);
        match &item.kind {
            ItemKind::Function(func) => self.admit_function(id, func, diagnostics),
            ItemKind::TypeAlias(alias) => match self.unsupported_scalar(alias.target) {
                Some(scalar) => {
                    self.warn_unsupported(id, "typedef", scalar, diagnostics);
                    false
                }
                None => true,
            },
            ItemKind::Enum(def) if self.set.emission(id) == Some(Emission::Full) => {
                if self.enum_repr(def.repr).is_some() {
                    true
                } else {
                    self.warn_unsupported(id, "enum", def.repr.c_spelling(), diagnostics);
                    false
                }
            }
            ItemKind::Template(_) => false,
            ItemKind::Struct(_) | ItemKind::Union(_) | ItemKind::Enum(_) => true,
        }
    }

    pub(crate) fn emit_item(&self, out: &mut Out, id: ItemId) -> Result<(), CodegenError> {
        let item = self.graph.item(id);
        match &item.kind {
            ItemKind::Function(func) => self.emit_function(out, id, func),
            ItemKind::TypeAlias(alias) => {
                let target = self.render(alias.target, Position::Value, id)?;
                out.line(&format!("pub type {} = {target};", self.ident(id)?));
                Ok(())
            }
            ItemKind::Enum(def) if self.set.emission(id) == Some(Emission::Full) => {
                self.emit_enum(out, id, def)
            }
            ItemKind::Struct(_) | ItemKind::Union(_) | ItemKind::Enum(_) => match self.shape(id) {
                Shape::Aggregate(layout) => self.emit_aggregate(out, id, layout),
                Shape::Blob(layout, reason) => self.emit_blob(out, id, layout, reason),
                Shape::Handle(reason) => self.emit_handle(out, id, reason),
            },
            ItemKind::Template(_) => Ok(()),
        }
    }

    /// A type without contents but with the C size and alignment.
    fn emit_blob(
        &self,
        out: &mut Out,
        id: ItemId,
        layout: TypeLayout,
        reason: &str,
    ) -> Result<(), CodegenError> {
        let ident = self.ident(id)?;
        out.line(&format!("/// Opaque: {reason}."));
        if layout.align > 1 {
            out.line(&format!("#[repr(C, align({}))]", layout.align));
        } else {
            out.line("#[repr(C)]");
        }
        if let Some(derives) = derives(self.is_copy(id), self.options.derive_debug) {
            out.line(&derives);
        }
        out.open(&format!("pub struct {ident}"));
        out.line(&format!("pub _opaque: [u8; {}],", layout.size));
        out.close("");
        if self.options.layout_tests {
            out.blank();
            emit_size_assertions(out, ident, layout, &[]);
        }
        Ok(())
    }

    /// A zero-sized type only usable behind a pointer.
    fn emit_handle(&self, out: &mut Out, id: ItemId, reason: &str) -> Result<(), CodegenError> {
        let ident = self.ident(id)?;
        out.line(&format!("/// Opaque: {reason}."));
        out.line("#[repr(C)]");
        if self.options.derive_debug {
            out.line("#[derive(Debug)]");
        }
        out.open(&format!("pub struct {ident}"));
        out.line("_unused: [u8; 0],");
        out.close("");
        Ok(())
    }

    fn warn_unsupported(
        &self,
        id: ItemId,
        what: &str,
        scalar: &str,
        diagnostics: &mut DiagnosticQueue,
    ) {
        let name = self.name(id);
        tracing::warn!(item = %name, scalar, "skipped: no Rust equivalent");
        diagnostics.add(
            Diagnostic::warning(ErrorCode::E5002)
                .with_message(format!(
                    "{what} `{name}` uses `{scalar}`, which has no Rust equivalent on {}",
                    self.target.triple()
                ))
                .with_label(self.origin(id), "declared here")
                .with_note(format!("the {what} is not emitted")),
        );
    }

    fn origin(&self, id: ItemId) -> Origin {
        Origin::from_location(self.graph.item(id).location, self.interner)
    }
}

/// `#[derive(..)]` line for the given capabilities.
pub(crate) fn derives(copy: bool, debug: bool) -> Option<String> {
    let mut traits = Vec::new();
    if debug {
        traits.push("Debug");
    }
    if copy {
        traits.extend(["Copy", "Clone"]);
    }
    (!traits.is_empty()).then(|| format!("#[derive({})]", traits.join(", ")))
}

/// `const _: () = { assert!(..); };` for size, alignment and the
/// given `(member, offset)` pairs.
pub(crate) fn emit_size_assertions(
    out: &mut Out,
    ident: &str,
    layout: TypeLayout,
    offsets: &[(&str, u64)],
) {
    out.open("const _: () =");
    out.line(&format!(
        "assert!(::core::mem::size_of::<{ident}>() == {});",
        layout.size
    ));
    out.line(&format!(
        "assert!(::core::mem::align_of::<{ident}>() == {});",
        layout.align
    ));
    for (member, offset) in offsets {
        out.line(&format!(
            "assert!(::core::mem::offset_of!({ident}, {member}) == {offset});"
        ));
    }
    out.close(";");
}
