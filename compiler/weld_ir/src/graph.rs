//! The item graph and its typed edges.

use crate::{to_u32, Item, ItemId, ItemKind, StringInterner, Ty, TypeId, TypeTable};

/// How one item refers to another.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum EdgeKind {
    /// By-value field or array element: the target's layout is part of the
    /// source's layout.
    Contains,
    /// Through a pointer, reference, or function prototype: the target may
    /// legally be incomplete at the point of reference.
    Indirect,
    /// Base class.
    Base,
    /// Function parameter or return type.
    Signature,
    /// A typedef's target. Nominal: transparent for layout, not for naming.
    Alias,
}

impl EdgeKind {
    /// Structural edges drive reachability.
    #[inline]
    pub fn is_structural(self) -> bool {
        !matches!(self, EdgeKind::Alias)
    }

    /// Edges whose target must be defined before the source is emitted.
    #[inline]
    pub fn orders_definition(self) -> bool {
        matches!(self, EdgeKind::Contains | EdgeKind::Base | EdgeKind::Alias)
    }
}

/// A typed edge to another item.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct Edge {
    pub kind: EdgeKind,
    pub target: ItemId,
}

/// Immutable snapshot produced by the importer.
#[derive(Clone, Debug)]
pub struct ItemGraph {
    items: Vec<Item>,
    types: TypeTable,
    /// Top-level declarations (file or namespace scope), in source order.
    roots: Vec<ItemId>,
}

impl ItemGraph {
    #[inline]
    pub fn item(&self, id: ItemId) -> &Item {
        &self.items[id.index()]
    }

    /// All items in id order.
    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[inline]
    pub fn types(&self) -> &TypeTable {
        &self.types
    }

    #[inline]
    pub fn ty(&self, id: TypeId) -> &Ty {
        self.types.get(id)
    }

    pub fn roots(&self) -> &[ItemId] {
        &self.roots
    }

    /// Outgoing edges of an item, in declaration order, without duplicates.
    pub fn edges(&self, id: ItemId) -> Vec<Edge> {
        let mut out = Vec::new();
        match &self.item(id).kind {
            ItemKind::Struct(agg) | ItemKind::Union(agg) => {
                if let Some(def) = &agg.definition {
                    for &base in &def.bases {
                        self.type_edges(base, EdgeKind::Base, &mut out);
                    }
                    for field in &def.fields {
                        self.type_edges(field.ty, EdgeKind::Contains, &mut out);
                    }
                }
            }
            ItemKind::Function(func) => {
                self.type_edges(func.ret, EdgeKind::Signature, &mut out);
                for param in &func.params {
                    self.type_edges(param.ty, EdgeKind::Signature, &mut out);
                }
            }
            ItemKind::TypeAlias(alias) => {
                self.type_edges(alias.target, EdgeKind::Alias, &mut out);
            }
            ItemKind::Enum(_) | ItemKind::Template(_) => {}
        }
        let mut seen = rustc_hash::FxHashSet::default();
        out.retain(|edge| seen.insert(*edge));
        out
    }

    /// Collect the items a type expression mentions.
    ///
    /// `direct` is the edge kind used for items reached without passing
    /// through a pointer; everything behind a pointer or inside a function
    /// prototype is `Indirect`.
    pub fn type_edges(&self, ty: TypeId, direct: EdgeKind, out: &mut Vec<Edge>) {
        match self.ty(ty) {
            Ty::Item(target) => out.push(Edge {
                kind: direct,
                target: *target,
            }),
            Ty::Pointer { pointee, .. } | Ty::Reference { pointee, .. } => {
                self.type_edges(*pointee, EdgeKind::Indirect, out);
            }
            Ty::Array { element, .. } => self.type_edges(*element, direct, out),
            Ty::Function(sig) => {
                self.type_edges(sig.ret, EdgeKind::Indirect, out);
                for &param in &sig.params {
                    self.type_edges(param, EdgeKind::Indirect, out);
                }
            }
            Ty::Void | Ty::Bool | Ty::Int(_) | Ty::Float(_) | Ty::TemplateParam(_) => {}
        }
    }

    /// Strip typedefs: follow `Ty::Item(alias)` chains to the underlying type.
    ///
    /// Typedef cycles cannot come from valid input; the walk stops after
    /// `len()` steps and returns the last type reached.
    pub fn resolve_alias(&self, ty: TypeId) -> TypeId {
        let mut current = ty;
        for _ in 0..=self.items.len() {
            match self.ty(current) {
                Ty::Item(id) => match &self.item(*id).kind {
                    ItemKind::TypeAlias(alias) => current = alias.target,
                    _ => return current,
                },
                _ => return current,
            }
        }
        current
    }

    /// The item a type names after stripping typedefs, if any.
    pub fn resolve_item(&self, ty: TypeId) -> Option<ItemId> {
        match self.ty(self.resolve_alias(ty)) {
            Ty::Item(id) => Some(*id),
            _ => None,
        }
    }

    /// Source-level name for diagnostics and pattern matching:
    /// namespaces and enclosing aggregates joined with `::`.
    pub fn qualified_name(&self, id: ItemId, interner: &StringInterner) -> String {
        let item = self.item(id);
        let mut segments: Vec<String> = item
            .namespace
            .iter()
            .map(|ns| interner.lookup(*ns).to_owned())
            .collect();
        let mut parents = Vec::new();
        let mut parent = item.parent;
        while let Some(p) = parent {
            let parent_item = self.item(p);
            parents.push(self.simple_name(p, interner));
            parent = parent_item.parent;
        }
        parents.reverse();
        segments.extend(parents);
        segments.push(self.simple_name(id, interner));
        segments.join("::")
    }

    /// The raw name, or a placeholder such as `(anonymous union)`.
    pub fn simple_name(&self, id: ItemId, interner: &StringInterner) -> String {
        let item = self.item(id);
        match item.name {
            Some(name) => interner.lookup(name).to_owned(),
            None => format!("(anonymous {})", item.kind.label()),
        }
    }
}

/// Mutable graph under construction. Only the importer holds one.
#[derive(Clone, Debug, Default)]
pub struct ItemGraphBuilder {
    items: Vec<Item>,
    types: TypeTable,
    roots: Vec<ItemId>,
}

impl ItemGraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next id. The caller must `push` an item with it.
    pub fn next_id(&self) -> ItemId {
        ItemId::new(to_u32(self.items.len(), "items"))
    }

    /// Add an item, returning its id. `item.id` is overwritten.
    pub fn push(&mut self, mut item: Item) -> ItemId {
        let id = self.next_id();
        item.id = id;
        self.items.push(item);
        id
    }

    #[inline]
    pub fn item(&self, id: ItemId) -> &Item {
        &self.items[id.index()]
    }

    #[inline]
    pub fn item_mut(&mut self, id: ItemId) -> &mut Item {
        &mut self.items[id.index()]
    }

    pub fn types(&self) -> &TypeTable {
        &self.types
    }

    pub fn types_mut(&mut self) -> &mut TypeTable {
        &mut self.types
    }

    /// Record a top-level declaration. Repeated roots are ignored.
    pub fn add_root(&mut self, id: ItemId) {
        if !self.roots.contains(&id) {
            self.roots.push(id);
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Freeze into an immutable graph.
    pub fn finish(self) -> ItemGraph {
        ItemGraph {
            items: self.items,
            types: self.types,
            roots: self.roots,
        }
    }
}
