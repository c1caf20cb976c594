//! The codegen entry point.

use weld_diagnostic::DiagnosticQueue;
use weld_ir::ItemId;
use weld_names::ROOT_MODULE;

use crate::context::Context;
use crate::emit::Out;
use crate::emitter::{Printer, StringEmitter};
use crate::{emission_order, CodegenError, CodegenInput, CodegenOptions};

/// First line of every generated file.
pub(crate) const HEADER: &str = "// Generated by weld. Do not edit.";

/// Print the bindings for one run.
///
/// Items that cannot be bound are left out with a warning in `diagnostics`;
/// an `Err` means the earlier stages broke an invariant and nothing should
/// be written.
#[tracing::instrument(level = "debug", skip_all, fields(items = input.set.len()))]
pub fn generate(
    input: &CodegenInput<'_>,
    options: &CodegenOptions,
    diagnostics: &mut DiagnosticQueue,
) -> Result<String, CodegenError> {
    let cx = Context::new(input, *options);
    let admitted: Vec<ItemId> = emission_order(input.graph, input.set, input.layouts, input.names)
        .into_iter()
        .filter(|&id| cx.admit(id, diagnostics))
        .collect();

    let mut out = Printer::new(StringEmitter::with_capacity(admitted.len() * 160));
    out.line(HEADER);
    if input.names.flattened() {
        for &id in &admitted {
            out.blank();
            cx.emit_item(&mut out, id)?;
        }
    } else if !admitted.is_empty() {
        let mut tree = ModuleTree::default();
        for &id in &admitted {
            tree.insert(input.names.module(id), id);
        }
        out.blank();
        emit_module(&cx, &mut out, ROOT_MODULE, &tree, 0)?;
    }

    let mut emitter = out.finish();
    emitter.ensure_trailing_newline();
    tracing::debug!(
        declared = admitted.len(),
        bytes = emitter.len(),
        "bindings generated"
    );
    Ok(emitter.output())
}

/// Declared items grouped by module, in emission order; submodules in
/// order of first appearance.
#[derive(Default)]
struct ModuleTree<'n> {
    items: Vec<ItemId>,
    children: Vec<(&'n str, ModuleTree<'n>)>,
}

impl<'n> ModuleTree<'n> {
    fn insert(&mut self, path: &'n [String], id: ItemId) {
        let Some((head, rest)) = path.split_first() else {
            self.items.push(id);
            return;
        };
        let index = match self.children.iter().position(|(name, _)| *name == head.as_str()) {
            Some(index) => index,
            None => {
                self.children.push((head.as_str(), ModuleTree::default()));
                self.children.len() - 1
            }
        };
        self.children[index].1.insert(rest, id);
    }
}

fn emit_module(
    cx: &Context<'_>,
    out: &mut Out,
    name: &str,
    tree: &ModuleTree<'_>,
    depth: usize,
) -> Result<(), CodegenError> {
    out.open(&format!("pub mod {name}"));
    out.line("#[allow(unused_imports)]");
    out.line(&format!("use self::{}{ROOT_MODULE};", "super::".repeat(depth + 1)));
    for &id in &tree.items {
        out.blank();
        cx.emit_item(out, id)?;
    }
    for (child, subtree) in &tree.children {
        out.blank();
        emit_module(cx, out, child, subtree, depth + 1)?;
    }
    out.close("");
    Ok(())
}
