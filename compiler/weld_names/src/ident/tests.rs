use pretty_assertions::assert_eq;
use proptest::prelude::*;

use super::*;

#[test]
fn test_sanitize_replaces_template_syntax() {
    assert_eq!(sanitize("vec<int>"), "vec_int");
    assert_eq!(sanitize("std::pair<int, float>"), "std_pair_int_float");
    assert_eq!(sanitize("operator*"), "operator");
    assert_eq!(sanitize("unsigned long"), "unsigned_long");
}

#[test]
fn test_sanitize_keeps_source_underscores() {
    assert_eq!(sanitize("__reserved"), "__reserved");
    assert_eq!(sanitize("tail_"), "tail_");
}

#[test]
fn test_sanitize_prefixes_leading_digit() {
    assert_eq!(sanitize("3d"), "_3d");
}

#[test]
fn test_sanitize_never_empty() {
    assert_eq!(sanitize(""), "_");
    assert_eq!(sanitize("<>"), "_");
}

#[test]
fn test_keywords_are_escaped() {
    assert_eq!(rust_ident("type", false), "type_");
    assert_eq!(rust_ident("Self", false), "Self_");
    assert_eq!(rust_ident("union", true), "union_");
    assert_eq!(rust_ident("_", false), "__");
    assert_eq!(rust_ident("match_", false), "match_");
}

#[test]
fn test_primitives_are_escaped_only_for_types() {
    assert_eq!(rust_ident("u8", true), "u8_");
    assert_eq!(rust_ident("u8", false), "u8");
}

proptest! {
    #[test]
    fn rust_ident_is_always_valid(raw in ".{0,24}", is_type in any::<bool>()) {
        let ident = rust_ident(&raw, is_type);
        prop_assert!(is_valid_ident(&ident), "`{}` from `{}`", ident, raw);
    }

    #[test]
    fn valid_identifiers_survive_sanitize(raw in "[a-z][a-z0-9_]{0,15}") {
        prop_assert_eq!(sanitize(&raw), raw);
    }
}
