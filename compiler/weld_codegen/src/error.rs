//! Fatal codegen errors.

use weld_diagnostic::{Diagnostic, ErrorCode};

/// An inconsistency between the stages feeding the emitter.
///
/// Item-scoped problems are warnings and the item is left out; these mean an
/// earlier stage handed over something it promised never to, and the run
/// produces no output.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CodegenError {
    #[error("`{user}` refers to `{target}`, which is neither emitted nor denied")]
    Unreachable { user: String, target: String },

    #[error("`{item}` is emitted but was never named")]
    Unnamed { item: String },

    #[error("`{user}` uses {what}, which cannot appear in generated code")]
    Unrenderable { user: String, what: String },
}

impl CodegenError {
    pub fn code(&self) -> ErrorCode {
        ErrorCode::E9001
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::error(self.code())
            .with_message(format!("internal error: {self}"))
            .with_note("this is a bug in weld; please report it with the input that triggered it")
    }
}
