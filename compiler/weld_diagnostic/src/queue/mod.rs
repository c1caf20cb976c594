//! Diagnostic queue for collecting, deduplicating, and sorting diagnostics.
//!
//! One queue lives in each run's session. Stages push diagnostics in
//! whatever order they discover them; `flush` hands them back sorted by
//! origin so reports are stable across runs.

use rustc_hash::FxHashSet;

use crate::{Diagnostic, Origin};

/// Queued diagnostic with its insertion index (the sort tiebreaker).
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
struct QueuedDiagnostic {
    diagnostic: Diagnostic,
    seq: usize,
}

/// Queue for collecting, deduplicating, and sorting diagnostics.
///
/// # Example
///
/// ```text
/// let mut queue = DiagnosticQueue::new();
/// queue.add(diagnostic);
/// // ... add more diagnostics
/// let sorted = queue.flush();
/// ```
#[derive(Clone, Debug, Default)]
pub struct DiagnosticQueue {
    diagnostics: Vec<QueuedDiagnostic>,
    /// Exact duplicates are reported once. The same item is often
    /// reached through several paths (e.g. a degraded struct contained by
    /// two parents).
    seen: FxHashSet<Diagnostic>,
    error_count: usize,
    warning_count: usize,
    next_seq: usize,
}

impl DiagnosticQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a diagnostic.
    ///
    /// Returns `true` if the diagnostic was added, `false` if it duplicates
    /// one already queued.
    pub fn add(&mut self, diag: Diagnostic) -> bool {
        if !self.seen.insert(diag.clone()) {
            return false;
        }
        if diag.is_error() {
            self.error_count += 1;
        } else if diag.is_warning() {
            self.warning_count += 1;
        }
        self.diagnostics.push(QueuedDiagnostic {
            diagnostic: diag,
            seq: self.next_seq,
        });
        self.next_seq += 1;
        true
    }

    /// Add every diagnostic from an iterator.
    pub fn extend(&mut self, diags: impl IntoIterator<Item = Diagnostic>) {
        for diag in diags {
            self.add(diag);
        }
    }

    pub fn error_count(&self) -> usize {
        self.error_count
    }

    pub fn warning_count(&self) -> usize {
        self.warning_count
    }

    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Sort diagnostics by origin and return them.
    ///
    /// Diagnostics without an origin come first; ties keep insertion order.
    /// Clears the queue.
    pub fn flush(&mut self) -> Vec<Diagnostic> {
        self.diagnostics.sort_by(|a, b| {
            sort_key(&a.diagnostic)
                .cmp(&sort_key(&b.diagnostic))
                .then(a.seq.cmp(&b.seq))
        });
        let result = self.diagnostics.drain(..).map(|d| d.diagnostic).collect();
        self.seen.clear();
        self.error_count = 0;
        self.warning_count = 0;
        self.next_seq = 0;
        result
    }

    /// Get diagnostics in insertion order without clearing the queue.
    pub fn peek(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().map(|d| &d.diagnostic)
    }
}

fn sort_key(diag: &Diagnostic) -> (Option<&Origin>, crate::ErrorCode) {
    (diag.primary_origin(), diag.code)
}

#[cfg(test)]
mod tests;
