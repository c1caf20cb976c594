//! Diagnostic system for the binding generator.
//!
//! Item-scoped problems (an aggregate whose layout cannot be computed, a
//! function that cannot be bound) never abort a run. They become
//! `Diagnostic`s with a stable `ErrorCode`, collected in a `DiagnosticQueue`
//! owned by the run's session, and are reported on stderr after the run.
//!
//! - Error codes for searchability (`E2001`)
//! - Clear messages (what went wrong)
//! - An origin label (which declaration, where it came from)
//! - Notes and help lines (what weld did about it, how to change that)

mod diagnostic;
mod error_code;
pub mod queue;

pub use diagnostic::{Diagnostic, Label, Origin, Severity};
pub use error_code::ErrorCode;
pub use queue::DiagnosticQueue;
