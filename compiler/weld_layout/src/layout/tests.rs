use super::*;

#[test]
fn test_align_to() {
    assert_eq!(align_to(0, 8), Some(0));
    assert_eq!(align_to(5, 4), Some(8));
    assert_eq!(align_to(8, 8), Some(8));
    assert_eq!(align_to(3, 1), Some(3));
    assert_eq!(align_to(3, 0), Some(3));
    assert_eq!(align_to(u64::MAX, 1), Some(u64::MAX));
    assert_eq!(align_to(u64::MAX - 2, 8), None);
}

#[test]
fn test_unit_storage_selection() {
    assert_eq!(UnitStorage::for_unit(4, 0, 4, false), UnitStorage::U32);
    assert_eq!(UnitStorage::for_unit(4, 2, 4, false), UnitStorage::Bytes(4));
    assert_eq!(UnitStorage::for_unit(4, 2, 4, true), UnitStorage::U32);
    assert_eq!(UnitStorage::for_unit(8, 8, 4, false), UnitStorage::Bytes(8));
    assert_eq!(UnitStorage::for_unit(3, 1, 4, false), UnitStorage::Bytes(3));
    assert_eq!(UnitStorage::for_unit(1, 7, 1, false), UnitStorage::U8);
}

#[test]
fn test_member_shift() {
    let pad = Member::Padding { offset: 2, size: 2 };
    assert_eq!(pad.shifted(8), Member::Padding { offset: 10, size: 2 });
    assert_eq!(pad.rust_align(), 1);
}

#[test]
fn test_error_codes() {
    let err = LayoutError::ContainmentCycle { item: "a".into() };
    assert_eq!(err.code(), ErrorCode::E2003);
    assert_eq!(err.to_string(), "`a` contains itself by value");
    let err = LayoutError::DegradedField {
        field: "b".into(),
        ty: "c".into(),
    };
    assert_eq!(err.code(), ErrorCode::E2002);
    let err = LayoutError::ObjectTooLarge {
        what: "`big`".into(),
        target: "x86_64-unknown-linux-gnu".into(),
    };
    assert_eq!(err.code(), ErrorCode::E2002);
    assert_eq!(
        err.to_string(),
        "`big` is larger than any object on x86_64-unknown-linux-gnu"
    );
}
