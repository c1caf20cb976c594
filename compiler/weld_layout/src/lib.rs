//! Layout resolution for the weld binding generator.
//!
//! - [`TargetAbi`]: scalar sizes, alignments and bitfield rules of a target
//! - [`resolve_layouts`]: sizes, alignments, field offsets and emission plans
//!   for aggregates, held in a [`LayoutTable`]
//! - [`Triviality`]: which aggregates are trivially copyable
//!
//! Every resolved layout is exact: the emission plan materializes all
//! interior and tail padding, so the generated Rust type has the same
//! footprint as the C type without relying on Rust's own layout rules.

mod layout;
mod place;
mod resolver;
mod target;
mod triviality;

pub use layout::{
    align_to, BitSlot, BitfieldUnit, FieldSlot, Layout, LayoutError, LayoutState, LayoutTable,
    Member, TypeLayout, UnitStorage,
};
pub use resolver::{resolve_layouts, LayoutResolver};
pub use target::{
    BitfieldRule, DataModel, ScalarLayout, TargetAbi, TargetError, TargetTripleComponents,
    DEFAULT_TARGET, SUPPORTED_TARGETS,
};
pub use triviality::Triviality;
