use pretty_assertions::assert_eq;

use super::*;

const CHAR: TypeLayout = TypeLayout::new(1, 1);
const INT: TypeLayout = TypeLayout::new(4, 4);
const DOUBLE: TypeLayout = TypeLayout::new(8, 8);

fn value(layout: TypeLayout) -> SlotInput {
    SlotInput::Value { layout }
}

fn bits(width: u32, unit: TypeLayout) -> SlotInput {
    SlotInput::Bitfield {
        width,
        unit,
        named: true,
    }
}

fn offsets(p: &Placement) -> Vec<u64> {
    p.slots.iter().map(|s| s.bit_offset).collect()
}

#[test]
fn test_int_then_double() {
    let p = place_struct(&[value(INT), value(DOUBLE)], BitfieldRule::SysV, false, None).unwrap();
    assert_eq!(offsets(&p), vec![0, 64]);
    assert_eq!((p.size, p.align), (16, 8));
}

#[test]
fn test_packed_removes_padding() {
    let p = place_struct(&[value(CHAR), value(INT)], BitfieldRule::SysV, true, None).unwrap();
    assert_eq!(offsets(&p), vec![0, 8]);
    assert_eq!((p.size, p.align), (5, 1));
}

#[test]
fn test_explicit_align_rounds_size() {
    let p = place_struct(&[value(INT)], BitfieldRule::SysV, false, Some(16)).unwrap();
    assert_eq!((p.size, p.align), (16, 16));
}

#[test]
fn test_sysv_three_and_five_share_a_unit() {
    let p = place_struct(&[bits(3, INT), bits(5, INT)], BitfieldRule::SysV, false, None).unwrap();
    assert_eq!(offsets(&p), vec![0, 3]);
    assert_eq!(p.slots[0].unit, Some((0, 4)));
    assert_eq!(p.slots[1].unit, Some((0, 4)));
    assert_eq!((p.size, p.align), (4, 4));
}

#[test]
fn test_sysv_straddling_bitfield_moves_to_next_unit() {
    let p = place_struct(&[bits(30, INT), bits(4, INT)], BitfieldRule::SysV, false, None).unwrap();
    assert_eq!(offsets(&p), vec![0, 32]);
    assert_eq!(p.size, 8);
}

#[test]
fn test_sysv_mixed_types_share_storage() {
    let p = place_struct(&[bits(4, CHAR), bits(4, INT)], BitfieldRule::SysV, false, None).unwrap();
    assert_eq!(offsets(&p), vec![0, 4]);
    assert_eq!((p.size, p.align), (4, 4));
}

#[test]
fn test_msvc_type_change_starts_new_unit() {
    let p = place_struct(&[bits(4, CHAR), bits(4, INT)], BitfieldRule::Msvc, false, None).unwrap();
    assert_eq!(offsets(&p), vec![0, 32]);
    assert_eq!(p.slots[1].unit, Some((4, 8)));
    assert_eq!((p.size, p.align), (8, 4));
}

#[test]
fn test_msvc_same_type_fills_unit() {
    let p = place_struct(&[bits(3, INT), bits(5, INT)], BitfieldRule::Msvc, false, None).unwrap();
    assert_eq!(offsets(&p), vec![0, 3]);
    assert_eq!(p.size, 4);
}

#[test]
fn test_zero_width_bitfield_closes_unit() {
    let slots = [
        bits(3, INT),
        SlotInput::Bitfield {
            width: 0,
            unit: INT,
            named: false,
        },
        bits(3, INT),
    ];
    let p = place_struct(&slots, BitfieldRule::SysV, false, None).unwrap();
    assert_eq!(offsets(&p), vec![0, 32, 32]);
    assert_eq!(p.slots[1].unit, None);
    assert_eq!(p.size, 8);
}

#[test]
fn test_value_after_bitfield_packs_into_free_bytes() {
    let p = place_struct(&[bits(3, INT), value(CHAR)], BitfieldRule::SysV, false, None).unwrap();
    assert_eq!(offsets(&p), vec![0, 8]);
    assert_eq!((p.size, p.align), (4, 4));
}

#[test]
fn test_union_overlap() {
    let p = place_union(&[value(CHAR), value(DOUBLE), value(INT)], BitfieldRule::SysV, false, None).unwrap();
    assert_eq!(offsets(&p), vec![0, 0, 0]);
    assert_eq!((p.size, p.align), (8, 8));
}

#[test]
fn test_union_rounds_to_max_alignment() {
    let five = TypeLayout::new(5, 1);
    let p = place_union(&[value(five), value(INT)], BitfieldRule::SysV, false, None).unwrap();
    assert_eq!((p.size, p.align), (8, 4));
}

#[test]
fn test_union_bitfield() {
    let p = place_union(&[bits(3, INT)], BitfieldRule::SysV, false, None).unwrap();
    assert_eq!(p.slots[0].unit, Some((0, 4)));
    assert_eq!(p.size, 4);
}

#[test]
fn test_overflowing_offsets_are_rejected() {
    let huge = TypeLayout::new(1 << 63, 4);
    assert_eq!(
        place_struct(&[value(INT), value(huge)], BitfieldRule::SysV, false, None),
        None
    );
    let near_max = TypeLayout::new(u64::MAX - 2, 1);
    assert_eq!(
        place_union(&[value(near_max)], BitfieldRule::SysV, false, Some(8)),
        None
    );
    assert_eq!(
        place_struct(&[bits(3, INT)], BitfieldRule::Msvc, false, None)
            .map(|p| p.size),
        Some(4)
    );
}
