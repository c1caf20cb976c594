//! Collision scopes.

use rustc_hash::FxHashSet;
use weld_diagnostic::{Diagnostic, ErrorCode};

/// No free suffix was left for a name. Indicates a resolver defect.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("no collision-free identifier for `{name}` in {scope}")]
pub struct NameCollisionUnresolvable {
    pub name: String,
    pub scope: String,
}

impl NameCollisionUnresolvable {
    pub fn code(&self) -> ErrorCode {
        ErrorCode::E3001
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::error(self.code())
            .with_message(self.to_string())
            .with_note("this is a bug in weld; please report it with the input that triggered it")
    }
}

/// Identifiers already taken in one Rust namespace of one scope.
#[derive(Clone, Debug, Default)]
pub(crate) struct Scope {
    /// Shown in the collision error.
    label: String,
    taken: FxHashSet<String>,
}

impl Scope {
    pub(crate) fn new(label: impl Into<String>) -> Self {
        Scope {
            label: label.into(),
            taken: FxHashSet::default(),
        }
    }

    /// Take `base` if it is free, else the first free `base_N` for N >= 1.
    pub(crate) fn claim(&mut self, base: String) -> Result<String, NameCollisionUnresolvable> {
        self.claim_bounded(base, u32::MAX)
    }

    pub(crate) fn claim_bounded(
        &mut self,
        base: String,
        attempts: u32,
    ) -> Result<String, NameCollisionUnresolvable> {
        if !self.taken.contains(&base) {
            self.taken.insert(base.clone());
            return Ok(base);
        }
        for n in 1..=attempts {
            let candidate = format!("{base}_{n}");
            if !self.taken.contains(&candidate) {
                self.taken.insert(candidate.clone());
                return Ok(candidate);
            }
        }
        tracing::error!(name = %base, scope = %self.label, "suffixes exhausted");
        Err(NameCollisionUnresolvable {
            name: base,
            scope: self.label.clone(),
        })
    }

    /// Mark `name` as taken without suffixing. Returns whether it was free.
    pub(crate) fn reserve(&mut self, name: &str) -> bool {
        self.taken.insert(name.to_owned())
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;
