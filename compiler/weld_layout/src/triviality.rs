//! Trivially-copyable classification.
//!
//! An aggregate is trivially copyable when it has a fixed size, holds no
//! pointer, reference or function pointer anywhere in its by-value members,
//! and the front-end did not flag it as having a non-trivial copy or
//! destructor. The emitter derives `Copy` exactly for these.

use std::cell::RefCell;

use rustc_hash::{FxHashMap, FxHashSet};
use weld_ir::{ItemFlags, ItemGraph, ItemId, ItemKind, Ty, TypeId};

use crate::layout::LayoutTable;

/// Memoizing classifier over one graph and its layouts.
pub struct Triviality<'a> {
    graph: &'a ItemGraph,
    layouts: &'a LayoutTable,
    cache: RefCell<FxHashMap<ItemId, bool>>,
    /// Aggregates currently being classified (cycle detection).
    ///
    /// Containment cycles never get a layout, so re-entry only happens on
    /// invalid input; it classifies as non-trivial.
    classifying: RefCell<FxHashSet<ItemId>>,
}

impl<'a> Triviality<'a> {
    pub fn new(graph: &'a ItemGraph, layouts: &'a LayoutTable) -> Self {
        Triviality {
            graph,
            layouts,
            cache: RefCell::new(FxHashMap::default()),
            classifying: RefCell::new(FxHashSet::default()),
        }
    }

    /// Whether an aggregate is trivially copyable.
    pub fn is_trivially_copyable(&self, id: ItemId) -> bool {
        if let Some(&cached) = self.cache.borrow().get(&id) {
            return cached;
        }
        let result = weld_stack::with_stack(|| self.classify(id));
        self.cache.borrow_mut().insert(id, result);
        result
    }

    fn classify(&self, id: ItemId) -> bool {
        if !self.classifying.borrow_mut().insert(id) {
            return false;
        }

        let item = self.graph.item(id);
        let result = match &item.kind {
            ItemKind::Struct(agg) | ItemKind::Union(agg) => {
                let fixed = self.layouts.get(id).is_some_and(|layout| !layout.flexible);
                fixed
                    && !item.flags.contains(ItemFlags::NON_TRIVIAL)
                    && agg.definition.as_ref().is_some_and(|def| {
                        def.bases.iter().all(|&base| self.is_trivial_type(base))
                            && def.fields.iter().all(|field| self.is_trivial_type(field.ty))
                    })
            }
            ItemKind::Enum(_) => true,
            ItemKind::TypeAlias(alias) => self.is_trivial_type(alias.target),
            ItemKind::Function(_) | ItemKind::Template(_) => false,
        };

        self.classifying.borrow_mut().remove(&id);
        result
    }

    /// Whether values of a type expression are trivially copyable.
    pub fn is_trivial_type(&self, ty: TypeId) -> bool {
        match self.graph.ty(ty) {
            Ty::Bool | Ty::Int(_) | Ty::Float(_) => true,
            Ty::Array {
                element,
                len: Some(_),
            } => self.is_trivial_type(*element),
            Ty::Item(id) => self.is_trivially_copyable(*id),
            Ty::Pointer { .. }
            | Ty::Reference { .. }
            | Ty::Function(_)
            | Ty::Array { len: None, .. }
            | Ty::Void
            | Ty::TemplateParam(_) => false,
        }
    }
}

#[cfg(test)]
mod tests;
