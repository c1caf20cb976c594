use pretty_assertions::assert_eq;

use super::*;

#[test]
fn test_diagnostic_builder() {
    let diag = Diagnostic::warning(ErrorCode::E2001)
        .with_message("bitfield `flags` is wider than `unsigned char`")
        .with_label(Origin::new("a.h", 3, 5), "struct S")
        .with_note("`S` is emitted as an opaque blob")
        .with_suggestion("narrow the bitfield");

    assert_eq!(diag.code, ErrorCode::E2001);
    assert!(diag.is_warning());
    assert!(!diag.is_error());
    assert_eq!(diag.labels.len(), 1);
    assert!(diag.labels[0].is_primary);
    assert_eq!(diag.primary_origin(), Some(&Origin::new("a.h", 3, 5)));
}

#[test]
fn test_diagnostic_display() {
    let diag = Diagnostic::warning(ErrorCode::E1003)
        .with_message("conflicting definitions of `S`")
        .with_label(Origin::new("b.h", 10, 1), "struct S")
        .with_secondary_label(Origin::new("a.h", 2, 1), "first definition")
        .with_note("the first definition is kept");

    assert_eq!(
        diag.to_string(),
        "warning [E1003]: conflicting definitions of `S`\n  \
         --> b.h:10:1: struct S\n  \
         ::: a.h:2:1: first definition\n  \
         = note: the first definition is kept"
    );
}

#[test]
fn test_origin_display() {
    assert_eq!(Origin::new("x.h", 1, 2).to_string(), "x.h:1:2");
    assert_eq!(Origin::new("x.h", 0, 0).to_string(), "x.h");
    assert_eq!(Origin::default().to_string(), "<unknown>");
}

#[test]
fn test_origin_from_location() {
    let mut interner = StringInterner::new();
    let file = interner.intern("include/foo.h");
    let origin = Origin::from_location(SourceLocation::new(file, 7, 3), &interner);
    assert_eq!(origin, Origin::new("include/foo.h", 7, 3));
}

#[test]
fn test_severity_display() {
    assert_eq!(Severity::Error.to_string(), "error");
    assert_eq!(Severity::Note.to_string(), "note");
}
