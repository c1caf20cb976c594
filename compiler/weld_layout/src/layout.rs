//! Computed layouts and the table that holds them.

use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;
use weld_diagnostic::ErrorCode;
use weld_ir::{ItemGraph, ItemId, ItemKind, Ty, TypeId};

use crate::target::{ScalarLayout, TargetAbi};

/// Size and alignment, in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeLayout {
    pub size: u64,
    /// Always a power of two.
    pub align: u64,
}

impl TypeLayout {
    pub const fn new(size: u64, align: u64) -> Self {
        Self { size, align }
    }

    /// Layout for a zero-sized type.
    pub const fn zero() -> Self {
        Self { size: 0, align: 1 }
    }
}

impl From<ScalarLayout> for TypeLayout {
    fn from(scalar: ScalarLayout) -> Self {
        TypeLayout::new(scalar.size, scalar.align)
    }
}

/// Round `offset` up to a multiple of `align`. `None` on overflow.
#[inline]
pub fn align_to(offset: u64, align: u64) -> Option<u64> {
    if align <= 1 {
        return Some(offset);
    }
    offset.div_ceil(align).checked_mul(align)
}

/// Which member of an aggregate a plan entry stands for.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum FieldSlot {
    /// Index into `AggregateDef::bases`.
    Base(usize),
    /// Index into `AggregateDef::fields`.
    Field(usize),
}

/// Storage type of a bitfield allocation unit.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum UnitStorage {
    U8,
    U16,
    U32,
    U64,
    /// `[u8; N]`, used when no integer of the unit's size sits at a
    /// suitably aligned offset.
    Bytes(u64),
}

impl UnitStorage {
    /// Pick the storage for a unit of `size` bytes at `offset`.
    ///
    /// An integer is only used when Rust would place it at exactly `offset`
    /// without raising the aggregate's alignment.
    pub fn for_unit(size: u64, offset: u64, aggregate_align: u64, packed: bool) -> Self {
        let fits = packed || (offset % size == 0 && size <= aggregate_align);
        match size {
            1 => UnitStorage::U8,
            2 if fits => UnitStorage::U16,
            4 if fits => UnitStorage::U32,
            8 if fits => UnitStorage::U64,
            n => UnitStorage::Bytes(n),
        }
    }

    pub fn size(self) -> u64 {
        match self {
            UnitStorage::U8 => 1,
            UnitStorage::U16 => 2,
            UnitStorage::U32 => 4,
            UnitStorage::U64 => 8,
            UnitStorage::Bytes(n) => n,
        }
    }

    /// Alignment Rust gives the storage type.
    pub fn align(self) -> u64 {
        match self {
            UnitStorage::Bytes(_) => 1,
            other => other.size(),
        }
    }
}

/// One bitfield inside an allocation unit.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct BitSlot {
    /// The aggregate declaring the field (differs from the laid-out item
    /// when the field was flattened in from an anonymous member).
    pub owner: ItemId,
    pub field: usize,
    /// Offset from the start of the unit, in bits.
    pub bit_offset: u64,
    pub width: u32,
    pub signed: bool,
}

/// A run of bitfields sharing storage.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct BitfieldUnit {
    /// Byte offset of the unit within the aggregate.
    pub offset: u64,
    pub storage: UnitStorage,
    pub bits: SmallVec<[BitSlot; 4]>,
}

/// One entry of an emission plan, in offset order.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Member {
    Field {
        owner: ItemId,
        slot: FieldSlot,
        offset: u64,
        layout: TypeLayout,
    },
    Bitfield(BitfieldUnit),
    /// Explicit `[u8; size]` padding.
    Padding { offset: u64, size: u64 },
}

impl Member {
    pub fn offset(&self) -> u64 {
        match self {
            Member::Field { offset, .. } | Member::Padding { offset, .. } => *offset,
            Member::Bitfield(unit) => unit.offset,
        }
    }

    pub fn size(&self) -> u64 {
        match self {
            Member::Field { layout, .. } => layout.size,
            Member::Bitfield(unit) => unit.storage.size(),
            Member::Padding { size, .. } => *size,
        }
    }

    /// Alignment of the member's Rust type.
    pub fn rust_align(&self) -> u64 {
        match self {
            Member::Field { layout, .. } => layout.align,
            Member::Bitfield(unit) => unit.storage.align(),
            Member::Padding { .. } => 1,
        }
    }

    /// Shift to a new base offset (flattening).
    pub(crate) fn shifted(&self, by: u64) -> Member {
        let mut member = self.clone();
        match &mut member {
            Member::Field { offset, .. } | Member::Padding { offset, .. } => *offset += by,
            Member::Bitfield(unit) => unit.offset += by,
        }
        member
    }
}

/// The resolved layout of an aggregate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Layout {
    pub size: u64,
    pub align: u64,
    pub packed: bool,
    /// `align(N)` the emitted type needs on top of its members' alignment.
    pub repr_align: Option<u64>,
    /// Bit offset of every declared field, indexed like `AggregateDef::fields`.
    pub field_offsets: Vec<u64>,
    /// Byte offset of every base, indexed like `AggregateDef::bases`.
    pub base_offsets: Vec<u64>,
    /// Emission plan: fields, bitfield units and padding, in offset order.
    pub members: Vec<Member>,
    /// Ends in a flexible array member.
    pub flexible: bool,
}

impl Layout {
    pub fn type_layout(&self) -> TypeLayout {
        TypeLayout::new(self.size, self.align)
    }

    /// Byte offset of a non-bitfield field.
    pub fn field_offset(&self, index: usize) -> Option<u64> {
        self.field_offsets.get(index).map(|bits| bits / 8)
    }
}

/// Why an aggregate has no usable layout.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum LayoutError {
    #[error("bitfield `{field}` is {width} bits wide but its type has only {max} bits")]
    BitfieldTooWide { field: String, width: u32, max: u64 },
    #[error("bitfield `{field}` does not have an integer type")]
    NonIntegerBitfield { field: String },
    #[error("field `{field}` has incomplete type `{ty}`")]
    IncompleteField { field: String, ty: String },
    #[error("field `{field}` contains `{ty}`, which has no usable layout")]
    DegradedField { field: String, ty: String },
    #[error("`{item}` contains itself by value")]
    ContainmentCycle { item: String },
    #[error("field `{field}` uses `{ty}`, which has no Rust equivalent on {target}")]
    UnsupportedScalar {
        field: String,
        ty: String,
        target: String,
    },
    #[error("`{item}` is packed and also requests alignment {align}")]
    PackedAligned { item: String, align: u64 },
    #[error("alignment {align} requested by `{item}` cannot be expressed")]
    InvalidAlign { item: String, align: u64 },
    #[error("{what} is larger than any object on {target}")]
    ObjectTooLarge { what: String, target: String },
}

impl LayoutError {
    pub fn code(&self) -> ErrorCode {
        match self {
            LayoutError::BitfieldTooWide { .. } | LayoutError::NonIntegerBitfield { .. } => {
                ErrorCode::E2001
            }
            LayoutError::IncompleteField { .. }
            | LayoutError::DegradedField { .. }
            | LayoutError::ObjectTooLarge { .. } => ErrorCode::E2002,
            LayoutError::ContainmentCycle { .. } => ErrorCode::E2003,
            LayoutError::UnsupportedScalar { .. } => ErrorCode::E2004,
            LayoutError::PackedAligned { .. } | LayoutError::InvalidAlign { .. } => {
                ErrorCode::E2005
            }
        }
    }
}

/// Layout state of one aggregate. Absent from the table means unresolved
/// (incomplete aggregates are never resolved).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LayoutState {
    Resolved(Layout),
    /// Degraded to opaque.
    Invalid(LayoutError),
}

/// Layouts keyed by item.
#[derive(Clone, Debug, Default)]
pub struct LayoutTable {
    states: FxHashMap<ItemId, LayoutState>,
    /// Anonymous aggregates whose members were flattened into their parent.
    flattened: FxHashSet<ItemId>,
}

impl LayoutTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, id: ItemId) -> Option<&LayoutState> {
        self.states.get(&id)
    }

    pub fn get(&self, id: ItemId) -> Option<&Layout> {
        match self.states.get(&id) {
            Some(LayoutState::Resolved(layout)) => Some(layout),
            _ => None,
        }
    }

    pub fn error(&self, id: ItemId) -> Option<&LayoutError> {
        match self.states.get(&id) {
            Some(LayoutState::Invalid(err)) => Some(err),
            _ => None,
        }
    }

    pub fn is_invalid(&self, id: ItemId) -> bool {
        self.error(id).is_some()
    }

    pub fn is_flattened(&self, id: ItemId) -> bool {
        self.flattened.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Resolved items in id order.
    pub fn resolved(&self) -> Vec<ItemId> {
        let mut ids: Vec<ItemId> = self
            .states
            .iter()
            .filter(|(_, state)| matches!(state, LayoutState::Resolved(_)))
            .map(|(id, _)| *id)
            .collect();
        ids.sort_unstable();
        ids
    }

    pub(crate) fn insert(&mut self, id: ItemId, state: LayoutState) {
        debug_assert!(!self.states.contains_key(&id), "layout of {id:?} set twice");
        self.states.insert(id, state);
    }

    pub(crate) fn mark_flattened(&mut self, id: ItemId) {
        self.flattened.insert(id);
    }

    /// Size and alignment of a type expression, using the resolved layouts
    /// for aggregates. `None` when any part has no layout.
    pub fn type_layout(&self, graph: &ItemGraph, target: &TargetAbi, ty: TypeId) -> Option<TypeLayout> {
        match graph.ty(ty) {
            Ty::Bool => Some(target.bool_layout().into()),
            Ty::Int(kind) => target.int_layout(*kind).map(Into::into),
            Ty::Float(kind) => target.float_layout(*kind).map(Into::into),
            Ty::Pointer { .. } | Ty::Reference { .. } => Some(target.pointer().into()),
            Ty::Array { element, len } => {
                let elem = self.type_layout(graph, target, *element)?;
                let size = elem.size.checked_mul(len.unwrap_or(0))?;
                Some(TypeLayout::new(size, elem.align))
            }
            Ty::Item(id) => match &graph.item(*id).kind {
                ItemKind::Struct(_) | ItemKind::Union(_) => self.get(*id).map(Layout::type_layout),
                ItemKind::Enum(def) => target.int_layout(def.repr).map(Into::into),
                ItemKind::TypeAlias(alias) => self.type_layout(graph, target, alias.target),
                ItemKind::Function(_) | ItemKind::Template(_) => None,
            },
            Ty::Void | Ty::Function(_) | Ty::TemplateParam(_) => None,
        }
    }
}

#[cfg(test)]
mod tests;
