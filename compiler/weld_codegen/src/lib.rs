//! Rust source generation for the weld binding generator.
//!
//! Takes the filtered, laid-out and named item graph and prints one Rust
//! source file:
//!
//! - `#[repr(C)]` structs and unions with explicit padding and bitfield
//!   storage, so every emitted type has exactly the C size and alignment
//! - opaque blobs and handles for types emitted without contents
//! - `#[repr(int)]` enums or integer constants
//! - `unsafe extern` blocks for functions
//! - compile-time layout assertions
//!
//! Output is a pure function of its inputs: items are printed in dependency
//! order with ties broken by item id, and nothing depends on hash order.

mod context;
mod emit;
mod emitter;
mod error;
mod generate;
mod order;
mod types;

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod test_support;

pub use context::{CodegenInput, CodegenOptions};
pub use emitter::{Emitter, Printer, StringEmitter};
pub use error::CodegenError;
pub use generate::generate;
pub use order::emission_order;
