use pretty_assertions::assert_eq;

use super::*;
use crate::ErrorCode;

fn warn_at(code: ErrorCode, file: &str, line: u32, message: &str) -> Diagnostic {
    Diagnostic::warning(code)
        .with_message(message)
        .with_label(Origin::new(file, line, 1), "here")
}

#[test]
fn test_duplicates_dropped() {
    let mut queue = DiagnosticQueue::new();
    assert!(queue.add(warn_at(ErrorCode::E2002, "a.h", 3, "incomplete field")));
    assert!(!queue.add(warn_at(ErrorCode::E2002, "a.h", 3, "incomplete field")));
    assert!(queue.add(warn_at(ErrorCode::E2002, "a.h", 4, "incomplete field")));
    assert_eq!(queue.len(), 2);
    assert_eq!(queue.warning_count(), 2);
}

#[test]
fn test_flush_sorts_by_origin() {
    let mut queue = DiagnosticQueue::new();
    queue.add(warn_at(ErrorCode::E2001, "b.h", 1, "third"));
    queue.add(warn_at(ErrorCode::E2001, "a.h", 9, "second"));
    queue.add(warn_at(ErrorCode::E2001, "a.h", 2, "first"));
    queue.add(Diagnostic::note(ErrorCode::E1005).with_message("no origin"));

    let messages: Vec<String> = queue.flush().into_iter().map(|d| d.message).collect();
    assert_eq!(messages, vec!["no origin", "first", "second", "third"]);
    assert!(queue.is_empty());
}

#[test]
fn test_ties_keep_insertion_order() {
    let mut queue = DiagnosticQueue::new();
    queue.add(warn_at(ErrorCode::E2002, "a.h", 1, "x"));
    queue.add(warn_at(ErrorCode::E2002, "a.h", 1, "y"));
    let messages: Vec<String> = queue.flush().into_iter().map(|d| d.message).collect();
    assert_eq!(messages, vec!["x", "y"]);
}

#[test]
fn test_error_counts() {
    let mut queue = DiagnosticQueue::new();
    queue.add(Diagnostic::error(ErrorCode::E9001).with_message("bad"));
    queue.add(Diagnostic::note(ErrorCode::E4001).with_message("fyi"));
    assert!(queue.has_errors());
    assert_eq!(queue.error_count(), 1);
    assert_eq!(queue.warning_count(), 0);
    queue.flush();
    assert!(!queue.has_errors());
}
