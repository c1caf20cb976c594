use super::*;

#[test]
fn test_intern_and_lookup() {
    let mut interner = StringInterner::new();

    let hello = interner.intern("hello");
    let world = interner.intern("world");
    let hello2 = interner.intern("hello");

    assert_eq!(hello, hello2);
    assert_ne!(hello, world);

    assert_eq!(interner.lookup(hello), "hello");
    assert_eq!(interner.lookup(world), "world");
}

#[test]
fn test_empty_string() {
    let mut interner = StringInterner::new();
    let empty = interner.intern("");
    assert_eq!(empty, Name::EMPTY);
    assert_eq!(interner.lookup(Name::EMPTY), "");
}

#[test]
fn test_names_follow_interning_order() {
    let mut interner = StringInterner::new();
    let first = interner.intern("zeta");
    let second = interner.intern("alpha");
    assert!(first < second);
}

#[test]
fn test_get_does_not_intern() {
    let mut interner = StringInterner::new();
    assert_eq!(interner.get("missing"), None);
    let before = interner.len();
    let name = interner.intern("present");
    assert_eq!(interner.get("present"), Some(name));
    assert_eq!(interner.len(), before + 1);
}

#[test]
fn test_foreign_name_is_empty() {
    let interner = StringInterner::new();
    assert_eq!(interner.lookup(Name::from_raw(9_999)), "");
}
