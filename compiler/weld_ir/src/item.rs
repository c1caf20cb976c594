//! Declarations: the nodes of the item graph.

use bitflags::bitflags;
use smallvec::SmallVec;

use crate::{CallConv, IntKind, ItemId, Name, SourceLocation, TypeId};

bitflags! {
    /// Per-item facts recorded by the importer.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct ItemFlags: u16 {
        /// Declared without a name (`struct { ... } x;`, `enum { A };`).
        const ANONYMOUS = 1 << 0;
        /// Declared in a system header.
        const SYSTEM_HEADER = 1 << 1;
        /// Template instantiation the instantiation policy rejected; emitted
        /// as a size-preserving blob.
        const REJECTED_INSTANTIATION = 1 << 2;
        /// C++ class with a non-trivial copy constructor or destructor.
        const NON_TRIVIAL = 1 << 3;
        /// Function with internal linkage (`static`); it has no symbol.
        const INTERNAL_LINKAGE = 1 << 4;
        /// Aggregate that declares C++ member functions (not bound).
        const HAS_METHODS = 1 << 5;
        /// Placeholder created for a reference to an undeclared identity.
        const UNRESOLVED = 1 << 6;
    }
}

/// A declaration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Item {
    pub id: ItemId,
    /// Raw source name; `None` for anonymous declarations.
    pub name: Option<Name>,
    pub location: SourceLocation,
    /// Enclosing C++ namespaces, outermost first.
    pub namespace: SmallVec<[Name; 2]>,
    /// Enclosing aggregate for nested declarations.
    pub parent: Option<ItemId>,
    pub flags: ItemFlags,
    pub kind: ItemKind,
}

impl Item {
    #[inline]
    pub fn is_anonymous(&self) -> bool {
        self.flags.contains(ItemFlags::ANONYMOUS)
    }

    /// The aggregate payload of a struct or union.
    pub fn aggregate(&self) -> Option<&Aggregate> {
        match &self.kind {
            ItemKind::Struct(agg) | ItemKind::Union(agg) => Some(agg),
            _ => None,
        }
    }

    pub fn is_aggregate(&self) -> bool {
        self.aggregate().is_some()
    }

    pub fn is_union(&self) -> bool {
        matches!(self.kind, ItemKind::Union(_))
    }
}

/// Kind-specific payload. The set is closed: every stage matches on it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ItemKind {
    Struct(Aggregate),
    Union(Aggregate),
    Enum(EnumDef),
    Function(FunctionDef),
    TypeAlias(AliasDef),
    Template(TemplateDef),
}

impl ItemKind {
    /// Short lowercase label for diagnostics and logs.
    pub fn label(&self) -> &'static str {
        match self {
            ItemKind::Struct(_) => "struct",
            ItemKind::Union(_) => "union",
            ItemKind::Enum(_) => "enum",
            ItemKind::Function(_) => "function",
            ItemKind::TypeAlias(_) => "typedef",
            ItemKind::Template(_) => "class template",
        }
    }
}

/// Struct or union payload.
///
/// `definition == None` means only forward declarations were seen: the item
/// is incomplete and will be emitted as an opaque handle.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Aggregate {
    pub definition: Option<AggregateDef>,
    /// Set when the aggregate is a class template specialization.
    pub specialization: Option<Specialization>,
}

impl Aggregate {
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.definition.is_some()
    }
}

/// The body of a complete aggregate.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AggregateDef {
    pub fields: Vec<Field>,
    /// Base classes, in declaration order.
    pub bases: Vec<TypeId>,
    /// `__attribute__((packed))` or `#pragma pack(1)`.
    pub packed: bool,
    /// Explicit `alignas`/`__attribute__((aligned(N)))`.
    pub align: Option<u64>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Specialization {
    pub template: ItemId,
    pub args: Vec<TypeId>,
}

/// A struct or union member.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Field {
    /// `None` for unnamed bitfields and anonymous members.
    pub name: Option<Name>,
    pub ty: TypeId,
    pub bit_width: Option<u32>,
    /// Unnamed member whose type is an anonymous aggregate.
    pub anonymous: bool,
}

impl Field {
    #[inline]
    pub fn is_bitfield(&self) -> bool {
        self.bit_width.is_some()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnumDef {
    /// Backing integer type as computed by the front-end.
    pub repr: IntKind,
    pub variants: Vec<Variant>,
    pub complete: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Variant {
    pub name: Name,
    /// Value bits; unsigned backing types above `i64::MAX` wrap.
    pub value: i64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FunctionDef {
    pub params: Vec<Param>,
    pub ret: TypeId,
    pub variadic: bool,
    pub call_conv: CallConv,
    /// Linker symbol when it differs from the source name (C++ mangling).
    pub mangled: Option<Name>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Param {
    pub name: Option<Name>,
    pub ty: TypeId,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AliasDef {
    pub target: TypeId,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TemplateDef {
    pub params: Vec<Name>,
    /// Specializations seen in the input, in first-encountered order.
    pub instantiations: Vec<ItemId>,
}
