use pretty_assertions::assert_eq;

use super::*;

#[test]
fn test_first_claim_keeps_base() {
    let mut scope = Scope::new("the root module");
    assert_eq!(scope.claim("mode".into()).unwrap(), "mode");
    assert!(!scope.reserve("mode"));
}

#[test]
fn test_collisions_get_ascending_suffixes() {
    let mut scope = Scope::new("the root module");
    let names: Vec<String> = (0..3).map(|_| scope.claim("mode".into()).unwrap()).collect();
    assert_eq!(names, vec!["mode", "mode_1", "mode_2"]);
}

#[test]
fn test_suffix_skips_taken_names() {
    let mut scope = Scope::new("the root module");
    scope.reserve("mode");
    scope.reserve("mode_1");
    assert_eq!(scope.claim("mode".into()).unwrap(), "mode_2");
}

#[test]
fn test_exhausted_suffixes_fail() {
    let mut scope = Scope::new("struct `s`");
    scope.reserve("x");
    scope.reserve("x_1");
    scope.reserve("x_2");
    let err = scope.claim_bounded("x".into(), 2).unwrap_err();
    assert_eq!(err.name, "x");
    assert_eq!(err.code(), ErrorCode::E3001);
    assert!(err.to_string().contains("struct `s`"));
}
