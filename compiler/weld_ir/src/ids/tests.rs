use super::*;

#[test]
fn test_id_roundtrip() {
    let id = ItemId::new(42);
    assert_eq!(id.index(), 42);
    assert_eq!(id.raw(), 42);
}

#[test]
fn test_id_order_is_allocation_order() {
    let mut ids = vec![ItemId::new(3), ItemId::new(1), ItemId::new(2)];
    ids.sort();
    assert_eq!(ids, vec![ItemId::new(1), ItemId::new(2), ItemId::new(3)]);
}

#[test]
fn test_id_debug() {
    assert_eq!(format!("{:?}", ItemId::new(7)), "ItemId(7)");
    assert_eq!(format!("{:?}", TypeId::new(0)), "TypeId(0)");
    assert_eq!(format!("{:?}", TuId::new(1)), "TuId(1)");
}
