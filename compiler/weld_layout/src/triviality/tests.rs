use smallvec::SmallVec;
use weld_diagnostic::DiagnosticQueue;
use weld_ir::{
    Aggregate, AggregateDef, EnumDef, Field, IntKind, Item, ItemGraphBuilder, SourceLocation,
    StringInterner,
};

use super::*;
use crate::{resolve_layouts, TargetAbi};

fn push(builder: &mut ItemGraphBuilder, kind: ItemKind, flags: ItemFlags) -> ItemId {
    builder.push(Item {
        id: ItemId::new(0),
        name: None,
        location: SourceLocation::UNKNOWN,
        namespace: SmallVec::new(),
        parent: None,
        flags,
        kind,
    })
}

fn record(builder: &mut ItemGraphBuilder, fields: &[TypeId], flags: ItemFlags) -> ItemId {
    let def = AggregateDef {
        fields: fields
            .iter()
            .map(|&ty| Field {
                name: None,
                ty,
                bit_width: None,
                anonymous: false,
            })
            .collect(),
        ..AggregateDef::default()
    };
    push(
        builder,
        ItemKind::Struct(Aggregate {
            definition: Some(def),
            specialization: None,
        }),
        flags,
    )
}

fn classify(builder: ItemGraphBuilder, ids: &[ItemId]) -> Vec<bool> {
    let graph = builder.finish();
    let interner = StringInterner::new();
    let mut queue = DiagnosticQueue::new();
    let all: Vec<ItemId> = graph.items().map(|i| i.id).collect();
    let layouts = resolve_layouts(&graph, &interner, &TargetAbi::default(), all, &mut queue);
    let triviality = Triviality::new(&graph, &layouts);
    ids.iter()
        .map(|&id| triviality.is_trivially_copyable(id))
        .collect()
}

#[test]
fn test_scalars_and_enums_are_trivial() {
    let mut b = ItemGraphBuilder::new();
    let int = b.types_mut().intern(Ty::Int(IntKind::Int));
    let color = push(
        &mut b,
        ItemKind::Enum(EnumDef {
            repr: IntKind::UInt,
            variants: Vec::new(),
            complete: true,
        }),
        ItemFlags::ANONYMOUS,
    );
    let color_ty = b.types_mut().item(color);
    let arr = b.types_mut().intern(Ty::Array {
        element: int,
        len: Some(4),
    });
    let point = record(&mut b, &[int, color_ty, arr], ItemFlags::empty());
    assert_eq!(classify(b, &[point]), vec![true]);
}

#[test]
fn test_pointer_members_are_not_trivial() {
    let mut b = ItemGraphBuilder::new();
    let int = b.types_mut().intern(Ty::Int(IntKind::Int));
    let ptr = b.types_mut().intern(Ty::Pointer {
        pointee: int,
        is_const: true,
    });
    let holder = record(&mut b, &[ptr], ItemFlags::empty());
    let holder_ty = b.types_mut().item(holder);
    let outer = record(&mut b, &[int, holder_ty], ItemFlags::empty());
    assert_eq!(classify(b, &[holder, outer]), vec![false, false]);
}

#[test]
fn test_non_trivial_flag_respected() {
    let mut b = ItemGraphBuilder::new();
    let int = b.types_mut().intern(Ty::Int(IntKind::Int));
    let widget = record(&mut b, &[int], ItemFlags::NON_TRIVIAL);
    assert_eq!(classify(b, &[widget]), vec![false]);
}

#[test]
fn test_incomplete_and_flexible_are_not_trivial() {
    let mut b = ItemGraphBuilder::new();
    let handle = push(
        &mut b,
        ItemKind::Struct(Aggregate::default()),
        ItemFlags::empty(),
    );
    let uch = b.types_mut().intern(Ty::Int(IntKind::UChar));
    let flex = b.types_mut().intern(Ty::Array {
        element: uch,
        len: None,
    });
    let buf = record(&mut b, &[uch, flex], ItemFlags::empty());
    assert_eq!(classify(b, &[handle, buf]), vec![false, false]);
}
