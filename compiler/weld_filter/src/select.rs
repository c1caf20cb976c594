//! Root selection and closure.

use std::collections::VecDeque;

use weld_diagnostic::{Diagnostic, DiagnosticQueue, ErrorCode, Origin};
use weld_ir::{Item, ItemFlags, ItemGraph, ItemId, ItemKind, StringInterner};

use crate::codegen_set::{CodegenSet, Emission, OpaqueReason};
use crate::pattern::{CompiledFilter, DeniedDependencyPolicy, PatternList};

/// Compute the set of items to emit.
#[tracing::instrument(level = "debug", skip_all, fields(items = graph.len()))]
pub fn select(
    graph: &ItemGraph,
    interner: &StringInterner,
    filter: &CompiledFilter,
    diagnostics: &mut DiagnosticQueue,
) -> CodegenSet {
    let mut selector = Selector {
        graph,
        interner,
        filter,
        set: CodegenSet::new(filter.policy),
        queue: VecDeque::new(),
    };

    let roots = if filter.has_allow() {
        selector.allowed_roots(diagnostics)
    } else {
        selector.default_roots()
    };
    tracing::debug!(roots = roots.len(), "selected roots");

    for id in roots {
        if selector.is_denied(id) {
            tracing::trace!(item = %selector.name(id), "root denied");
            continue;
        }
        selector.admit(id);
    }
    selector.close();

    if filter.policy == DeniedDependencyPolicy::OpaqueField {
        selector.apply_opaque_field(diagnostics);
    }

    tracing::debug!(emitted = selector.set.len(), "closure computed");
    selector.set
}

struct Selector<'a> {
    graph: &'a ItemGraph,
    interner: &'a StringInterner,
    filter: &'a CompiledFilter,
    set: CodegenSet,
    queue: VecDeque<ItemId>,
}

impl Selector<'_> {
    /// Top-level declarations outside system headers.
    fn default_roots(&self) -> Vec<ItemId> {
        self.graph
            .roots()
            .iter()
            .copied()
            .filter(|&id| {
                let item = self.graph.item(id);
                self.filter.include_system_headers
                    || !item.flags.contains(ItemFlags::SYSTEM_HEADER)
            })
            .filter(|&id| self.is_root_candidate(self.graph.item(id)))
            .collect()
    }

    /// Items matching an allow pattern of a compatible kind, in id order.
    fn allowed_roots(&self, diagnostics: &mut DiagnosticQueue) -> Vec<ItemId> {
        let lists: [(&PatternList, fn(&ItemKind) -> bool); 3] = [
            (&self.filter.allow_items, |_| true),
            (&self.filter.allow_types, |kind| {
                !matches!(kind, ItemKind::Function(_))
            }),
            (&self.filter.allow_functions, |kind| {
                matches!(kind, ItemKind::Function(_))
            }),
        ];
        // Per pattern: (matched anything, matched something emittable).
        let mut hits: Vec<Vec<(bool, bool)>> = lists
            .iter()
            .map(|(list, _)| vec![(false, false); list.patterns().len()])
            .collect();

        let mut roots = Vec::new();
        for item in self.graph.items() {
            if item.name.is_none() {
                continue;
            }
            let raw = self.raw_name(item);
            let qualified = self.name(item.id);
            let mut selected = false;
            for (list_index, (list, accepts)) in lists.iter().enumerate() {
                if !accepts(&item.kind) {
                    continue;
                }
                for pattern in list.matching(raw, &qualified) {
                    let hit = &mut hits[list_index][pattern];
                    hit.0 = true;
                    if self.is_root_candidate(item) {
                        hit.1 = true;
                        selected = true;
                    }
                }
            }
            if selected {
                roots.push(item.id);
            }
        }

        for ((list, _), list_hits) in lists.iter().zip(&hits) {
            for (pattern, &(any, emittable)) in list.patterns().iter().zip(list_hits) {
                if !any {
                    diagnostics.add(
                        Diagnostic::warning(ErrorCode::E4004)
                            .with_message(format!("allow pattern `{pattern}` matched nothing")),
                    );
                } else if !emittable {
                    diagnostics.add(
                        Diagnostic::note(ErrorCode::E4001)
                            .with_message(format!(
                                "allow pattern `{pattern}` matched only declarations that are never emitted"
                            ))
                            .with_note("class templates and internal functions have no binding")
                            .with_suggestion(format!(
                                "to bind instantiations, pass `--instantiate '{pattern}<.*>'`"
                            )),
                    );
                }
            }
        }
        roots
    }

    /// Templates and internal-linkage functions are never emitted.
    fn is_root_candidate(&self, item: &Item) -> bool {
        match &item.kind {
            ItemKind::Template(_) => false,
            ItemKind::Function(_) => !item.flags.contains(ItemFlags::INTERNAL_LINKAGE),
            _ => true,
        }
    }

    fn is_denied(&self, id: ItemId) -> bool {
        let item = self.graph.item(id);
        item.name.is_some() && self.filter.deny.is_match(self.raw_name(item), &self.name(id))
    }

    fn is_forced_opaque(&self, id: ItemId) -> bool {
        let item = self.graph.item(id);
        item.name.is_some() && self.filter.opaque.is_match(self.raw_name(item), &self.name(id))
    }

    /// Add a non-denied item and queue it when its dependencies are needed.
    fn admit(&mut self, id: ItemId) {
        if self.set.contains(id) {
            return;
        }
        let item = self.graph.item(id);
        let emission = if self.is_forced_opaque(id) {
            Emission::Opaque(OpaqueReason::Forced)
        } else if item.flags.contains(ItemFlags::REJECTED_INSTANTIATION) {
            Emission::Opaque(OpaqueReason::RejectedInstantiation)
        } else if item.aggregate().is_some_and(|agg| !agg.is_complete()) {
            Emission::Opaque(OpaqueReason::Incomplete)
        } else {
            Emission::Full
        };
        self.set.insert(id, emission);
        if emission == Emission::Full {
            self.queue.push_back(id);
        }
    }

    /// Follow structural and alias edges from every queued item.
    fn close(&mut self) {
        while let Some(id) = self.queue.pop_front() {
            for edge in self.graph.edges(id) {
                let target = edge.target;
                if self.set.is_accounted(target) {
                    continue;
                }
                if matches!(self.graph.item(target).kind, ItemKind::Template(_)) {
                    continue;
                }
                if self.is_denied(target) {
                    match self.filter.policy {
                        DeniedDependencyPolicy::OpaqueItem => {
                            self.set
                                .insert(target, Emission::Opaque(OpaqueReason::Denied));
                        }
                        DeniedDependencyPolicy::OpaqueField => self.set.deny(target),
                    }
                    tracing::trace!(
                        item = %self.name(target),
                        from = %self.name(id),
                        "denied dependency"
                    );
                    continue;
                }
                self.admit(target);
            }
        }
    }

    /// Typedefs of denied types are denied with them; functions passing a
    /// denied type by value are skipped.
    fn apply_opaque_field(&mut self, diagnostics: &mut DiagnosticQueue) {
        let ids: Vec<ItemId> = self.set.ids().collect();
        for &id in &ids {
            if let ItemKind::TypeAlias(alias) = &self.graph.item(id).kind {
                if self
                    .graph
                    .resolve_item(alias.target)
                    .is_some_and(|target| self.set.is_denied(target))
                {
                    self.set.deny(id);
                }
            }
        }

        for id in ids {
            let item = self.graph.item(id);
            let ItemKind::Function(func) = &item.kind else {
                continue;
            };
            let by_value = std::iter::once(func.ret)
                .chain(func.params.iter().map(|p| p.ty))
                .find_map(|ty| {
                    self.graph
                        .resolve_item(ty)
                        .filter(|target| self.set.is_denied(*target))
                });
            if let Some(denied) = by_value {
                let name = self.name(id);
                tracing::warn!(function = %name, "skipped: passes a denied type by value");
                diagnostics.add(
                    Diagnostic::warning(ErrorCode::E4002)
                        .with_message(format!(
                            "function `{name}` passes denied type `{}` by value",
                            self.name(denied)
                        ))
                        .with_label(
                            Origin::from_location(item.location, self.interner),
                            "declared here",
                        )
                        .with_note("the function is not emitted"),
                );
                self.set.skip(id);
            }
        }
    }

    fn raw_name<'i>(&'i self, item: &Item) -> &'i str {
        item.name.map_or("", |name| self.interner.lookup(name))
    }

    fn name(&self, id: ItemId) -> String {
        self.graph.qualified_name(id, self.interner)
    }
}
