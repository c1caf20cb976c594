use pretty_assertions::assert_eq;
use weld_names::EnumStyle;

use super::*;

#[test]
fn no_directives() {
    assert_eq!(read_directives("{\"version\": 1}").unwrap(), None);
    assert_eq!(read_directives("// just a comment\n{}").unwrap(), None);
}

#[test]
fn directives_apply_in_order() {
    let text = "\
// weld-flags: --allow-type point --enum-style consts
// generated by the dump tool

//weld-flags: --allow-type rect --enum-style rust
{\"version\": 1}
";
    let options = read_directives(text).unwrap().unwrap();
    assert_eq!(options.filter.allow_types, vec!["point", "rect"]);
    assert_eq!(options.enum_style, Some(EnumStyle::Rust));
}

#[test]
fn only_the_leading_comment_block_is_searched() {
    let text = "{\n// weld-flags: --deny x\n}";
    assert_eq!(read_directives(text).unwrap(), None);
}

#[test]
fn quotes_group_words() {
    let options = read_directives("// weld-flags: --allow-type 'a b' --deny \"c\"\n")
        .unwrap()
        .unwrap();
    assert_eq!(options.filter.allow_types, vec!["a b"]);
    assert_eq!(options.filter.deny, vec!["c"]);
}

#[test]
fn bad_directive_reports_its_line() {
    let err = read_directives("// header\n// weld-flags: --bogus\n{}").unwrap_err();
    assert_eq!(err.line, 2);
    assert_eq!(err.source, UsageError::UnknownFlag("--bogus".to_owned()));

    let diag = err.to_diagnostic("api.decls.json");
    assert_eq!(diag.code, ErrorCode::E0004);
    assert!(diag.is_error());
    assert_eq!(
        diag.primary_origin(),
        Some(&Origin::new("api.decls.json", 2, 1))
    );
}

#[test]
fn unterminated_quote() {
    let err = read_directives("// weld-flags: --deny 'x\n").unwrap_err();
    assert!(matches!(err.source, UsageError::InvalidValue { .. }));
}
