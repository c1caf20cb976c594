//! Inputs and options shared by all emission code.

use weld_filter::{CodegenSet, Emission, OpaqueReason};
use weld_ir::{ItemGraph, ItemId, ItemKind, StringInterner};
use weld_layout::{Layout, LayoutTable, TargetAbi, Triviality, TypeLayout};
use weld_names::NameTable;

use crate::CodegenError;

/// Everything the earlier stages produced for one run.
#[derive(Clone, Copy)]
pub struct CodegenInput<'a> {
    pub graph: &'a ItemGraph,
    pub interner: &'a StringInterner,
    pub target: &'a TargetAbi,
    pub set: &'a CodegenSet,
    pub layouts: &'a LayoutTable,
    pub names: &'a NameTable,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct CodegenOptions {
    /// Emit `const` assertions checking size, alignment and field offsets.
    pub layout_tests: bool,
    /// Derive or implement `Debug` on emitted types.
    pub derive_debug: bool,
}

impl Default for CodegenOptions {
    fn default() -> Self {
        CodegenOptions {
            layout_tests: true,
            derive_debug: true,
        }
    }
}

/// How an emitted struct, union or enum is printed.
#[derive(Clone, Copy, Debug)]
pub(crate) enum Shape<'l> {
    /// Full contents.
    Aggregate(&'l Layout),
    /// `[u8; size]` with the C alignment.
    Blob(TypeLayout, &'static str),
    /// Zero-sized handle, only usable behind a pointer.
    Handle(&'static str),
}

pub(crate) struct Context<'a> {
    pub(crate) graph: &'a ItemGraph,
    pub(crate) interner: &'a StringInterner,
    pub(crate) target: &'a TargetAbi,
    pub(crate) set: &'a CodegenSet,
    pub(crate) layouts: &'a LayoutTable,
    pub(crate) names: &'a NameTable,
    pub(crate) triviality: Triviality<'a>,
    pub(crate) options: CodegenOptions,
}

impl<'a> Context<'a> {
    pub(crate) fn new(input: &CodegenInput<'a>, options: CodegenOptions) -> Self {
        Context {
            graph: input.graph,
            interner: input.interner,
            target: input.target,
            set: input.set,
            layouts: input.layouts,
            names: input.names,
            triviality: Triviality::new(input.graph, input.layouts),
            options,
        }
    }

    /// Shape of an emitted aggregate or enum.
    pub(crate) fn shape(&self, id: ItemId) -> Shape<'a> {
        let layouts = self.layouts;
        match (&self.graph.item(id).kind, self.set.emission(id)) {
            (ItemKind::Struct(_) | ItemKind::Union(_), Some(Emission::Full)) => {
                match layouts.get(id) {
                    Some(layout) => Shape::Aggregate(layout),
                    None => Shape::Handle("layout could not be computed"),
                }
            }
            (ItemKind::Struct(_) | ItemKind::Union(_), Some(Emission::Opaque(reason))) => {
                match layouts.get(id) {
                    Some(layout) => Shape::Blob(layout.type_layout(), reason.describe()),
                    None => Shape::Handle(reason.describe()),
                }
            }
            (ItemKind::Enum(def), Some(Emission::Opaque(reason))) => {
                match self.target.int_layout(def.repr) {
                    Some(scalar) => Shape::Blob(scalar.into(), reason.describe()),
                    None => Shape::Handle(reason.describe()),
                }
            }
            _ => Shape::Handle(OpaqueReason::Incomplete.describe()),
        }
    }

    /// Whether copies of an emitted item are plain bitwise copies.
    pub(crate) fn is_copy(&self, id: ItemId) -> bool {
        match &self.graph.item(id).kind {
            ItemKind::Enum(_) => true,
            _ => self.triviality.is_trivially_copyable(id),
        }
    }

    /// Path used to refer to an emitted item.
    pub(crate) fn path(&self, id: ItemId) -> Result<String, CodegenError> {
        self.names.path(id).ok_or_else(|| CodegenError::Unnamed {
            item: self.name(id),
        })
    }

    /// Declared identifier of an emitted item.
    pub(crate) fn ident(&self, id: ItemId) -> Result<&'a str, CodegenError> {
        let names = self.names;
        names.ident(id).ok_or_else(|| CodegenError::Unnamed {
            item: self.name(id),
        })
    }

    /// Qualified C name, for diagnostics.
    pub(crate) fn name(&self, id: ItemId) -> String {
        self.graph.qualified_name(id, self.interner)
    }
}
