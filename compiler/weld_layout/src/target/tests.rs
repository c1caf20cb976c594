use pretty_assertions::assert_eq;

use super::*;

#[test]
fn test_parse_triple_components() {
    let c = TargetTripleComponents::parse("x86_64-pc-windows-msvc").unwrap();
    assert_eq!(c.arch, "x86_64");
    assert_eq!(c.vendor, "pc");
    assert!(c.is_windows());
    assert_eq!(c.env.as_deref(), Some("msvc"));
    assert_eq!(c.to_string(), "x86_64-pc-windows-msvc");
}

#[test]
fn test_parse_rejects_short_triple() {
    let err = TargetTripleComponents::parse("x86_64-linux").unwrap_err();
    assert!(matches!(err, TargetError::InvalidTripleFormat { .. }));
}

#[test]
fn test_unsupported_target_lists_supported() {
    let err = TargetAbi::from_triple("sparc-sun-solaris").unwrap_err();
    assert!(err.to_string().contains("x86_64-unknown-linux-gnu"));
}

#[test]
fn test_every_supported_target_builds() {
    for triple in SUPPORTED_TARGETS {
        let abi = TargetAbi::from_triple(triple).unwrap();
        assert_eq!(abi.triple(), *triple);
    }
}

#[test]
fn test_default_is_sysv_lp64() {
    let abi = TargetAbi::default();
    assert_eq!(abi.triple(), DEFAULT_TARGET);
    assert_eq!(abi.data_model(), DataModel::Lp64);
    assert_eq!(abi.bitfield_rule(), BitfieldRule::SysV);
    assert_eq!(abi.int_layout(IntKind::Long), Some(ScalarLayout::natural(8)));
    assert_eq!(abi.pointer(), ScalarLayout::natural(8));
    assert!(abi.char_is_signed());
}

#[test]
fn test_windows_is_llp64_msvc() {
    let abi = TargetAbi::from_triple("x86_64-pc-windows-msvc").unwrap();
    assert_eq!(abi.data_model(), DataModel::Llp64);
    assert_eq!(abi.bitfield_rule(), BitfieldRule::Msvc);
    assert_eq!(abi.int_layout(IntKind::ULong), Some(ScalarLayout::natural(4)));
    assert_eq!(abi.int_layout(IntKind::WChar), Some(ScalarLayout::natural(2)));
    assert!(!abi.wchar_is_signed());
    assert_eq!(abi.int_layout(IntKind::Int128), None);
}

#[test]
fn test_i686_linux_aligns_eightbyte_scalars_to_four() {
    let abi = TargetAbi::from_triple("i686-unknown-linux-gnu").unwrap();
    assert_eq!(abi.data_model(), DataModel::Ilp32);
    assert_eq!(abi.float_layout(FloatKind::Double), Some(ScalarLayout::new(8, 4)));
    assert_eq!(abi.int_layout(IntKind::LongLong), Some(ScalarLayout::new(8, 4)));
    assert_eq!(abi.pointer(), ScalarLayout::natural(4));
}

#[test]
fn test_char_signedness() {
    let arm = TargetAbi::from_triple("aarch64-unknown-linux-gnu").unwrap();
    assert!(!arm.is_signed(IntKind::Char));
    let apple = TargetAbi::from_triple("aarch64-apple-darwin").unwrap();
    assert!(apple.is_signed(IntKind::Char));
}

#[test]
fn test_long_double_unsupported() {
    let abi = TargetAbi::default();
    assert_eq!(abi.float_layout(FloatKind::LongDouble), None);
    assert_eq!(abi.float_layout(FloatKind::Float128), None);
}
