//! Weld IR - the item graph shared by every pipeline stage.
//!
//! This crate contains the core data structures for the binding generator:
//! - `Name` and `StringInterner` for interned identifiers
//! - `SourceLocation` for declaration origins
//! - `ItemId`/`TypeId` dense graph keys
//! - `Ty` and `TypeTable` for structural type expressions
//! - `Item`/`ItemKind` for declarations (structs, unions, enums, functions,
//!   typedefs, templates)
//! - `ItemGraph` with typed edges (contains, indirect, base, signature, alias)
//!
//! # Design Philosophy
//!
//! - **Intern Everything**: strings become `Name(u32)`, type expressions
//!   become `TypeId(u32)`
//! - **Flatten Everything**: items reference each other only through
//!   `ItemId`, never by inline containment, so self- and mutually-referential
//!   aggregates are ordinary graph cycles
//! - **Immutable Snapshots**: `ItemGraphBuilder` is consumed by
//!   `ItemGraph`; later stages attach data in side tables keyed by `ItemId`

mod graph;
mod ids;
mod interner;
mod item;
mod location;
mod name;
mod ty;

pub use graph::{Edge, EdgeKind, ItemGraph, ItemGraphBuilder};
pub use ids::{ItemId, TuId, TypeId};
pub use interner::StringInterner;
pub use item::{
    Aggregate, AggregateDef, AliasDef, EnumDef, Field, FunctionDef, Item, ItemFlags, ItemKind,
    Param, Specialization, TemplateDef, Variant,
};
pub use location::SourceLocation;
pub use name::Name;
pub use ty::{CallConv, FloatKind, FnSig, IntKind, Ty, TypeTable};

/// Convert a container length into a dense `u32` index.
///
/// # Panics
/// Panics if more than `u32::MAX` entries of `what` were allocated in one run.
#[inline]
pub(crate) fn to_u32(len: usize, what: &str) -> u32 {
    u32::try_from(len).unwrap_or_else(|_| panic!("too many {what}: {len} exceeds u32::MAX"))
}
