//! Run-scoped failures.
//!
//! Anything in here aborts the run it happened in; no output is written
//! for that input. Item-scoped problems never get here: they are warnings
//! in the run's diagnostic queue.

use std::path::PathBuf;

use weld_codegen::CodegenError;
use weld_diagnostic::{Diagnostic, ErrorCode, Origin};
use weld_filter::FilterError;
use weld_import::ParseError;
use weld_layout::TargetError;
use weld_names::NameCollisionUnresolvable;

use crate::directive::DirectiveError;

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    /// The front-end could not produce a declaration tree.
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Directive(#[from] DirectiveError),

    /// A directive gave a pattern that does not compile.
    #[error(transparent)]
    Filter(#[from] FilterError),

    /// A directive named a target that is not supported.
    #[error(transparent)]
    Target(#[from] TargetError),

    #[error("invalid `--instantiate-matching` pattern: {0}")]
    Instantiation(#[from] regex::Error),

    #[error(transparent)]
    NameCollision(#[from] NameCollisionUnresolvable),

    /// An earlier stage broke an invariant codegen relies on.
    #[error(transparent)]
    Invariant(#[from] CodegenError),

    #[error("cannot write `{}`: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl RunError {
    pub fn code(&self) -> ErrorCode {
        match self {
            RunError::Parse(err) => err.code(),
            RunError::Directive(err) => err.code(),
            RunError::Filter(err) => err.code(),
            RunError::Target(_) | RunError::Instantiation(_) => ErrorCode::E0004,
            RunError::NameCollision(err) => err.code(),
            RunError::Invariant(err) => err.code(),
            RunError::Io { .. } => ErrorCode::E0001,
        }
    }

    /// The error as a diagnostic; `input` labels errors that carry no
    /// position of their own.
    pub fn to_diagnostic(&self, input: &str) -> Diagnostic {
        match self {
            RunError::Parse(err) => err.to_diagnostic(),
            RunError::Directive(err) => err.to_diagnostic(input),
            RunError::Filter(err) => err
                .to_diagnostic()
                .with_label(Origin::new(input, 0, 0), "in a `weld-flags` directive"),
            RunError::NameCollision(err) => err.to_diagnostic(),
            RunError::Invariant(err) => err.to_diagnostic(),
            RunError::Target(_) | RunError::Instantiation(_) => Diagnostic::error(self.code())
                .with_message(self.to_string())
                .with_label(Origin::new(input, 0, 0), "in a `weld-flags` directive"),
            RunError::Io { path, .. } => Diagnostic::error(self.code())
                .with_message(self.to_string())
                .with_label(Origin::new(path.display().to_string(), 0, 0), "output"),
        }
    }
}
