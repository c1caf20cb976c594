//! Reachability filter.
//!
//! Decides which items of the graph are emitted. Allow patterns (or, with
//! none given, every top-level declaration outside system headers) select
//! the roots; the closure follows every structural and alias edge so that
//! nothing emitted refers to a type that is neither emitted nor opaque.
//!
//! - [`FilterOptions`] / [`CompiledFilter`]: the user's patterns
//! - [`select`]: compute the closure
//! - [`CodegenSet`]: the result, with the reason each opaque item is opaque

mod codegen_set;
mod pattern;
mod select;

pub use codegen_set::{CodegenSet, Emission, OpaqueReason};
pub use pattern::{CompiledFilter, DeniedDependencyPolicy, FilterError, FilterOptions, PatternList};
pub use select::select;
