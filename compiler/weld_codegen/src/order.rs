//! Emission order.
//!
//! Rust does not care in which order items are declared, but readers do:
//! a type is printed after everything it contains, inherits from or aliases.
//! Ties, and the members of containment cycles through typedefs, go in item
//! id order, so the order is fully determined by the graph.

use std::collections::BTreeSet;

use rustc_hash::{FxHashMap, FxHashSet};
use weld_filter::{CodegenSet, Emission};
use weld_ir::{ItemGraph, ItemId, ItemKind};
use weld_layout::LayoutTable;
use weld_names::NameTable;

/// Whether an item of the set is printed as its own declaration.
///
/// Flattened anonymous members live inside their parent, elided typedefs
/// are spelled as their target, and class templates have no binding.
pub(crate) fn is_declared(
    graph: &ItemGraph,
    layouts: &LayoutTable,
    names: &NameTable,
    id: ItemId,
) -> bool {
    !layouts.is_flattened(id)
        && !names.is_elided(id)
        && !matches!(graph.item(id).kind, ItemKind::Template(_))
}

/// Declared items of `set`, dependencies first.
#[tracing::instrument(level = "debug", skip_all, fields(items = set.len()))]
pub fn emission_order(
    graph: &ItemGraph,
    set: &CodegenSet,
    layouts: &LayoutTable,
    names: &NameTable,
) -> Vec<ItemId> {
    let items: Vec<ItemId> = set
        .ids()
        .filter(|&id| is_declared(graph, layouts, names, id))
        .collect();
    let declared: FxHashSet<ItemId> = items.iter().copied().collect();

    let mut pending: FxHashMap<ItemId, usize> = FxHashMap::default();
    let mut dependents: FxHashMap<ItemId, Vec<ItemId>> = FxHashMap::default();
    for &id in &items {
        let mut deps: Vec<ItemId> = Vec::new();
        if set.emission(id) == Some(Emission::Full) {
            collect_dependencies(graph, layouts, names, id, &mut deps);
        }
        deps.retain(|dep| *dep != id && declared.contains(dep));
        deps.sort_unstable();
        deps.dedup();
        pending.insert(id, deps.len());
        for dep in deps {
            dependents.entry(dep).or_default().push(id);
        }
    }

    let mut ready: BTreeSet<ItemId> = items
        .iter()
        .copied()
        .filter(|id| pending.get(id) == Some(&0))
        .collect();
    let mut order = Vec::with_capacity(items.len());
    let mut placed: FxHashSet<ItemId> = FxHashSet::default();
    while let Some(id) = ready.pop_first() {
        order.push(id);
        placed.insert(id);
        for &dependent in dependents.get(&id).map_or(&[][..], Vec::as_slice) {
            if let Some(count) = pending.get_mut(&dependent) {
                *count = count.saturating_sub(1);
                if *count == 0 {
                    ready.insert(dependent);
                }
            }
        }
    }

    if order.len() < items.len() {
        let cyclic = items.len() - order.len();
        tracing::debug!(cyclic, "dependency cycle; remaining items in id order");
        order.extend(items.iter().copied().filter(|id| !placed.contains(id)));
    }
    order
}

/// Items that must be printed before `id`, looking through flattened
/// members and elided typedefs.
fn collect_dependencies(
    graph: &ItemGraph,
    layouts: &LayoutTable,
    names: &NameTable,
    id: ItemId,
    out: &mut Vec<ItemId>,
) {
    let mut stack = vec![id];
    let mut visited: FxHashSet<ItemId> = FxHashSet::default();
    while let Some(current) = stack.pop() {
        if !visited.insert(current) {
            continue;
        }
        for edge in graph.edges(current) {
            if !edge.kind.orders_definition() {
                continue;
            }
            if layouts.is_flattened(edge.target) {
                stack.push(edge.target);
            } else {
                out.push(names.canonical(edge.target));
            }
        }
    }
}
