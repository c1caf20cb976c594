use pretty_assertions::assert_eq;

use super::*;

fn parse(text: &str) -> Result<Vec<TranslationUnit>, ParseError> {
    JsonFrontend.parse(
        &SourceInput::new("t.decls.json", text),
        &FrontendFlags::default(),
    )
}

#[test]
fn test_parses_units_after_directives() {
    let text = "// weld-flags: --allow-type point\n\n{\"version\": 1, \"units\": [{\"file\": \"p.h\"}]}\n";
    let units = parse(text).unwrap();
    assert_eq!(units.len(), 1);
    assert_eq!(units[0].file, "p.h");
    assert!(units[0].decls.is_empty());
}

#[test]
fn test_rejects_unknown_version() {
    let err = parse(r#"{"version": 7, "units": []}"#).unwrap_err();
    assert!(matches!(err, ParseError::UnsupportedVersion { found: 7, .. }));
    assert_eq!(err.code(), ErrorCode::E0003);
}

#[test]
fn test_malformed_position_matches_file() {
    let text = "// weld-flags: --flatten-namespaces\n{\"version\": 1,\n \"units\": [}\n";
    let err = parse(text).unwrap_err();
    let ParseError::Malformed { line, .. } = err else {
        panic!("expected malformed, got {err:?}");
    };
    assert_eq!(line, 3);
}

#[test]
fn test_malformed_diagnostic() {
    let err = parse("not json").unwrap_err();
    let diag = err.to_diagnostic();
    assert_eq!(diag.code, ErrorCode::E0002);
    assert!(diag.is_error());
    assert!(!diag.message.contains(" at line "));
}

#[test]
fn test_blank_leading_comments_keeps_line_count() {
    let text = "// a\n// b\n{}\n// not a header comment\n";
    let blanked = blank_leading_comments(text);
    assert_eq!(blanked, "\n\n{}\n// not a header comment\n");
}

#[test]
fn test_missing_file_is_io_error() {
    let err = SourceInput::read(Path::new("/nonexistent/weld/input.decls.json")).unwrap_err();
    assert_eq!(err.code(), ErrorCode::E0001);
}

#[test]
fn test_flags_merge() {
    let mut base = FrontendFlags {
        include_paths: vec!["inc".into()],
        std: Some("c11".into()),
        ..FrontendFlags::default()
    };
    let over = FrontendFlags {
        include_paths: vec!["more".into()],
        target: Some("i686-unknown-linux-gnu".into()),
        ..FrontendFlags::default()
    };
    base.merge(&over);
    assert_eq!(base.include_paths.len(), 2);
    assert_eq!(base.std.as_deref(), Some("c11"));
    assert_eq!(base.target.as_deref(), Some("i686-unknown-linux-gnu"));
}
