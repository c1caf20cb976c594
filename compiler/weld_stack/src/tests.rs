use super::*;

/// A chain of nested aggregates, each containing the next by value.
fn nested_size(depth: u32, leaf: u64) -> u64 {
    with_stack(|| {
        if depth == 0 {
            leaf
        } else {
            nested_size(depth - 1, leaf)
        }
    })
}

#[test]
fn test_shallow_nesting() {
    assert_eq!(nested_size(8, 4), 4);
}

#[test]
fn test_deep_nesting_does_not_overflow() {
    assert_eq!(nested_size(200_000, 16), 16);
}

#[test]
fn test_propagates_result() {
    let r: Result<u64, String> = with_stack(|| Err("cycle".to_owned()));
    assert_eq!(r, Err("cycle".to_owned()));
}
