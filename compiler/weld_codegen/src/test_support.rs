//! Graph builder and pipeline driver shared by the unit tests.

use smallvec::SmallVec;
use weld_diagnostic::{Diagnostic, DiagnosticQueue};
use weld_filter::{select, CodegenSet, FilterOptions};
use weld_ir::{
    Aggregate, AggregateDef, AliasDef, CallConv, EnumDef, Field, FunctionDef, IntKind, Item,
    ItemFlags, ItemGraph, ItemGraphBuilder, ItemId, ItemKind, Name, Param, SourceLocation,
    StringInterner, Ty, TypeId, Variant,
};
use weld_layout::{resolve_layouts, LayoutTable, TargetAbi};
use weld_names::{resolve_names, NameTable, NamingOptions};

use crate::{generate, CodegenError, CodegenInput, CodegenOptions};

pub(crate) struct Fixture {
    pub(crate) builder: ItemGraphBuilder,
    pub(crate) interner: StringInterner,
    pub(crate) filter: FilterOptions,
    pub(crate) naming: NamingOptions,
    pub(crate) options: CodegenOptions,
    pub(crate) target: TargetAbi,
}

/// The stages' results for one fixture.
pub(crate) struct Stages {
    pub(crate) graph: ItemGraph,
    pub(crate) interner: StringInterner,
    pub(crate) target: TargetAbi,
    pub(crate) set: CodegenSet,
    pub(crate) layouts: LayoutTable,
    pub(crate) names: NameTable,
}

pub(crate) struct Run {
    pub(crate) output: String,
    pub(crate) diagnostics: Vec<Diagnostic>,
}

impl Fixture {
    pub(crate) fn new() -> Self {
        Fixture {
            builder: ItemGraphBuilder::new(),
            interner: StringInterner::new(),
            filter: FilterOptions::default(),
            naming: NamingOptions::default(),
            options: CodegenOptions {
                layout_tests: false,
                derive_debug: true,
            },
            target: TargetAbi::default(),
        }
    }

    pub(crate) fn push(
        &mut self,
        name: Option<&str>,
        namespace: &[&str],
        parent: Option<ItemId>,
        kind: ItemKind,
    ) -> ItemId {
        let mut flags = ItemFlags::empty();
        if name.is_none() {
            flags |= ItemFlags::ANONYMOUS;
        }
        let namespace: SmallVec<[Name; 2]> =
            namespace.iter().map(|ns| self.interner.intern(ns)).collect();
        let id = self.builder.push(Item {
            id: ItemId::new(0),
            name: name.map(|n| self.interner.intern(n)),
            location: SourceLocation::UNKNOWN,
            namespace,
            parent,
            flags,
            kind,
        });
        if parent.is_none() {
            self.builder.add_root(id);
        }
        id
    }

    pub(crate) fn ty(&mut self, ty: Ty) -> TypeId {
        self.builder.types_mut().intern(ty)
    }

    pub(crate) fn int(&mut self, kind: IntKind) -> TypeId {
        self.ty(Ty::Int(kind))
    }

    pub(crate) fn item_ty(&mut self, id: ItemId) -> TypeId {
        self.builder.types_mut().item(id)
    }

    pub(crate) fn ptr(&mut self, pointee: TypeId) -> TypeId {
        self.ty(Ty::Pointer {
            pointee,
            is_const: false,
        })
    }

    pub(crate) fn const_ptr(&mut self, pointee: TypeId) -> TypeId {
        self.ty(Ty::Pointer {
            pointee,
            is_const: true,
        })
    }

    pub(crate) fn array(&mut self, element: TypeId, len: Option<u64>) -> TypeId {
        self.ty(Ty::Array { element, len })
    }

    pub(crate) fn field(&mut self, name: &str, ty: TypeId) -> Field {
        Field {
            name: Some(self.interner.intern(name)),
            ty,
            bit_width: None,
            anonymous: false,
        }
    }

    pub(crate) fn bitfield(&mut self, name: Option<&str>, ty: TypeId, width: u32) -> Field {
        Field {
            name: name.map(|n| self.interner.intern(n)),
            ty,
            bit_width: Some(width),
            anonymous: false,
        }
    }

    pub(crate) fn anonymous_member(&mut self, ty: TypeId) -> Field {
        Field {
            name: None,
            ty,
            bit_width: None,
            anonymous: true,
        }
    }

    pub(crate) fn record(&mut self, name: &str, fields: Vec<Field>) -> ItemId {
        self.record_with(Some(name), &[], None, false, fields, false)
    }

    pub(crate) fn union(&mut self, name: &str, fields: Vec<Field>) -> ItemId {
        self.record_with(Some(name), &[], None, true, fields, false)
    }

    pub(crate) fn record_with(
        &mut self,
        name: Option<&str>,
        namespace: &[&str],
        parent: Option<ItemId>,
        union: bool,
        fields: Vec<Field>,
        packed: bool,
    ) -> ItemId {
        let agg = Aggregate {
            definition: Some(AggregateDef {
                fields,
                packed,
                ..AggregateDef::default()
            }),
            specialization: None,
        };
        let kind = if union {
            ItemKind::Union(agg)
        } else {
            ItemKind::Struct(agg)
        };
        self.push(name, namespace, parent, kind)
    }

    /// Request `aligned(align)` on a defined aggregate.
    pub(crate) fn align(&mut self, id: ItemId, align: u64) {
        if let ItemKind::Struct(agg) | ItemKind::Union(agg) = &mut self.builder.item_mut(id).kind {
            if let Some(def) = &mut agg.definition {
                def.align = Some(align);
            }
        }
    }

    /// Fill in the body of an aggregate created earlier.
    pub(crate) fn define(&mut self, id: ItemId, fields: Vec<Field>) {
        match &mut self.builder.item_mut(id).kind {
            ItemKind::Struct(agg) | ItemKind::Union(agg) => {
                agg.definition = Some(AggregateDef {
                    fields,
                    ..AggregateDef::default()
                });
            }
            _ => panic!("not an aggregate"),
        }
    }

    pub(crate) fn forward(&mut self, name: &str) -> ItemId {
        self.push(Some(name), &[], None, ItemKind::Struct(Aggregate::default()))
    }

    pub(crate) fn enumeration(
        &mut self,
        name: Option<&str>,
        repr: IntKind,
        variants: &[(&str, i64)],
    ) -> ItemId {
        let variants = variants
            .iter()
            .map(|&(variant, value)| Variant {
                name: self.interner.intern(variant),
                value,
            })
            .collect();
        self.push(
            name,
            &[],
            None,
            ItemKind::Enum(EnumDef {
                repr,
                variants,
                complete: true,
            }),
        )
    }

    pub(crate) fn alias(&mut self, name: &str, target: TypeId) -> ItemId {
        self.push(
            Some(name),
            &[],
            None,
            ItemKind::TypeAlias(AliasDef { target }),
        )
    }

    pub(crate) fn function(
        &mut self,
        name: &str,
        params: &[(Option<&str>, TypeId)],
        ret: TypeId,
    ) -> ItemId {
        let params = params
            .iter()
            .map(|&(param, ty)| Param {
                name: param.map(|n| self.interner.intern(n)),
                ty,
            })
            .collect();
        self.push(
            Some(name),
            &[],
            None,
            ItemKind::Function(FunctionDef {
                params,
                ret,
                variadic: false,
                call_conv: CallConv::C,
                mangled: None,
            }),
        )
    }

    /// Run every stage before codegen.
    pub(crate) fn stages(self) -> Stages {
        let graph = self.builder.finish();
        let mut queue = DiagnosticQueue::new();
        let compiled = self.filter.compile().unwrap();
        let set = select(&graph, &self.interner, &compiled, &mut queue);
        let layouts = resolve_layouts(&graph, &self.interner, &self.target, set.ids(), &mut queue);
        let names = resolve_names(&graph, &self.interner, &set, &layouts, &self.naming).unwrap();
        Stages {
            graph,
            interner: self.interner,
            target: self.target,
            set,
            layouts,
            names,
        }
    }

    /// Run the whole pipeline.
    pub(crate) fn run(self) -> Result<Run, CodegenError> {
        let options = self.options;
        let stages = self.stages();
        let mut queue = DiagnosticQueue::new();
        let output = generate(&stages.input(), &options, &mut queue)?;
        Ok(Run {
            output,
            diagnostics: queue.flush(),
        })
    }

    /// Generated source; panics on a fatal error.
    pub(crate) fn output(self) -> String {
        self.run().unwrap().output
    }
}

impl Stages {
    pub(crate) fn input(&self) -> CodegenInput<'_> {
        CodegenInput {
            graph: &self.graph,
            interner: &self.interner,
            target: &self.target,
            set: &self.set,
            layouts: &self.layouts,
            names: &self.names,
        }
    }
}
