//! The filter's result.

use std::collections::{BTreeMap, BTreeSet};

use weld_ir::ItemId;

use crate::DeniedDependencyPolicy;

/// Why an emitted item has no contents.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum OpaqueReason {
    /// Only forward declarations were seen.
    Incomplete,
    /// Denied, but a kept item depends on it (`OpaqueItem` policy).
    Denied,
    /// Matched an `--opaque-type` pattern.
    Forced,
    /// A template instantiation the instantiation policy rejected.
    RejectedInstantiation,
}

impl OpaqueReason {
    pub fn describe(self) -> &'static str {
        match self {
            OpaqueReason::Incomplete => "incomplete type",
            OpaqueReason::Denied => "denied, but required by an emitted item",
            OpaqueReason::Forced => "opaque by request",
            OpaqueReason::RejectedInstantiation => "template instantiation not materialized",
        }
    }
}

/// How one item is emitted.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Emission {
    Full,
    Opaque(OpaqueReason),
}

/// Items to emit, in id order, plus the denied items kept items refer to.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CodegenSet {
    items: BTreeMap<ItemId, Emission>,
    /// Denied dependencies under the `OpaqueField` policy: not emitted, uses
    /// are rewritten.
    denied: BTreeSet<ItemId>,
    /// Functions left out because their signature needs a denied type.
    skipped: BTreeSet<ItemId>,
    policy: DeniedDependencyPolicy,
}

impl CodegenSet {
    pub fn new(policy: DeniedDependencyPolicy) -> Self {
        CodegenSet {
            policy,
            ..CodegenSet::default()
        }
    }

    pub fn policy(&self) -> DeniedDependencyPolicy {
        self.policy
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.items.contains_key(&id)
    }

    pub fn emission(&self, id: ItemId) -> Option<Emission> {
        self.items.get(&id).copied()
    }

    pub fn opaque_reason(&self, id: ItemId) -> Option<OpaqueReason> {
        match self.items.get(&id) {
            Some(Emission::Opaque(reason)) => Some(*reason),
            _ => None,
        }
    }

    pub fn is_opaque(&self, id: ItemId) -> bool {
        self.opaque_reason(id).is_some()
    }

    pub fn is_denied(&self, id: ItemId) -> bool {
        self.denied.contains(&id)
    }

    pub fn is_skipped(&self, id: ItemId) -> bool {
        self.skipped.contains(&id)
    }

    /// Emitted items in id order.
    pub fn ids(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.items.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ItemId, Emission)> + '_ {
        self.items.iter().map(|(id, emission)| (*id, *emission))
    }

    pub fn denied(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.denied.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub(crate) fn insert(&mut self, id: ItemId, emission: Emission) {
        self.items.insert(id, emission);
    }

    pub(crate) fn deny(&mut self, id: ItemId) {
        self.items.remove(&id);
        self.denied.insert(id);
    }

    pub(crate) fn skip(&mut self, id: ItemId) {
        self.items.remove(&id);
        self.skipped.insert(id);
    }

    /// Whether `id` is emitted or accounted for as a denied dependency.
    pub fn is_accounted(&self, id: ItemId) -> bool {
        self.contains(id) || self.is_denied(id)
    }
}
