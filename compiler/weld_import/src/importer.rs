//! Lowering declaration trees into the item graph.
//!
//! Import is two-phase over every translation unit of a run:
//!
//! 1. **declare**: allocate (or look up) an item for every declaration,
//!    recursively, so that references to declarations appearing later in
//!    the tree resolve;
//! 2. **define**: lower bodies and type references.
//!
//! Both phases go through one deduplication cache keyed by declaration
//! identity. Identities with linkage (USRs of records, enums, typedefs and
//! external functions) are shared by every unit of the run, so a header
//! included twice, or by two units, yields one item. Identities that are
//! local to a unit (internal-linkage functions, anonymous records the
//! front-end gave no USR) are keyed by `(TuId, identity)`; for a record
//! without a USR the identity is its starting file, line and column.

use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;
use weld_diagnostic::{Diagnostic, DiagnosticQueue, ErrorCode, Origin};
use weld_ir::{
    Aggregate, AggregateDef, AliasDef, EnumDef, Field, FnSig, FunctionDef, IntKind, Item,
    ItemFlags, ItemGraph, ItemGraphBuilder, ItemId, ItemKind, Name, Param, SourceLocation,
    Specialization, StringInterner, TemplateDef, TuId, Ty, TypeId, Variant,
};

use crate::decl::{
    ClassTemplateDecl, Decl, EnumDecl, FunctionDecl, Linkage, Loc, RecordDecl, RecordTag,
    SpecializationDecl, TranslationUnit, TypeRef, TypedefDecl,
};
use crate::instantiate::InstantiationPolicy;

/// Import every unit of a run into one graph.
///
/// Item-scoped problems (conflicting redefinitions, undeclared references,
/// unbound C++ constructs) are reported to `diagnostics`; import itself
/// cannot fail.
#[tracing::instrument(level = "debug", skip_all, fields(units = units.len()))]
pub fn import_units(
    units: &[TranslationUnit],
    interner: &mut StringInterner,
    diagnostics: &mut DiagnosticQueue,
    policy: &dyn InstantiationPolicy,
) -> ItemGraph {
    let mut importer = Importer {
        interner,
        diagnostics,
        policy,
        builder: ItemGraphBuilder::new(),
        cache: FxHashMap::default(),
        defined: FxHashSet::default(),
        reported_templates: FxHashSet::default(),
        next_anon: 0,
    };

    let mut pending = Vec::new();
    for (index, unit) in units.iter().enumerate() {
        let tu = TuId::new(u32::try_from(index).unwrap_or(u32::MAX));
        let file = importer.interner.intern(&unit.file);
        let scope = Scope {
            tu,
            file,
            namespace: SmallVec::new(),
            parent: None,
        };
        importer.declare_all(&unit.decls, &scope, &mut pending);
    }
    for p in &pending {
        importer.define(p);
    }

    tracing::debug!(
        items = importer.builder.len(),
        types = importer.builder.types().len(),
        "import complete"
    );
    importer.builder.finish()
}

/// Deduplication key.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct DeclKey {
    /// `Some` for unit-local identities.
    tu: Option<TuId>,
    usr: Box<str>,
}

impl DeclKey {
    fn shared(usr: &str) -> Self {
        DeclKey {
            tu: None,
            usr: usr.into(),
        }
    }

    fn local(tu: TuId, usr: &str) -> Self {
        DeclKey {
            tu: Some(tu),
            usr: usr.into(),
        }
    }
}

/// Where a declaration sits.
#[derive(Clone, Debug)]
struct Scope {
    tu: TuId,
    /// Main file of the unit, the default for locations.
    file: Name,
    namespace: SmallVec<[Name; 2]>,
    /// Enclosing record; `None` at file or namespace scope.
    parent: Option<ItemId>,
}

impl Scope {
    fn is_top_level(&self) -> bool {
        self.parent.is_none()
    }
}

/// A declaration waiting for the define phase.
struct Pending<'d> {
    id: ItemId,
    decl: &'d Decl,
    scope: Scope,
}

struct Importer<'a> {
    interner: &'a mut StringInterner,
    diagnostics: &'a mut DiagnosticQueue,
    policy: &'a dyn InstantiationPolicy,
    builder: ItemGraphBuilder,
    cache: FxHashMap<DeclKey, ItemId>,
    /// Items whose body has been lowered. A second body for one of these is
    /// either a duplicate (ignored) or a conflict (reported).
    defined: FxHashSet<ItemId>,
    /// Templates whose rejected instantiations were already reported.
    reported_templates: FxHashSet<ItemId>,
    next_anon: u32,
}

impl Importer<'_> {
    // Declare phase

    fn declare_all<'d>(
        &mut self,
        decls: &'d [Decl],
        scope: &Scope,
        pending: &mut Vec<Pending<'d>>,
    ) {
        for decl in decls {
            self.declare(decl, scope, pending);
        }
    }

    fn declare<'d>(&mut self, decl: &'d Decl, scope: &Scope, pending: &mut Vec<Pending<'d>>) {
        let id = match decl {
            Decl::Namespace(ns) => {
                let mut inner = scope.clone();
                if let Some(name) = &ns.name {
                    inner.namespace.push(self.interner.intern(name));
                }
                self.declare_all(&ns.decls, &inner, pending);
                return;
            }
            Decl::Record(record) => self.declare_record(record, scope),
            Decl::Specialization(spec) => self.declare_record(&spec.record, scope),
            Decl::Enum(e) => self.declare_enum(e, scope),
            Decl::Function(f) => self.declare_function(f, scope),
            Decl::Typedef(t) => self.declare_typedef(t, scope),
            Decl::ClassTemplate(t) => self.declare_template(t, scope),
        };

        if scope.is_top_level() {
            self.builder.add_root(id);
        }
        pending.push(Pending {
            id,
            decl,
            scope: scope.clone(),
        });

        if let Decl::Record(RecordDecl { nested, .. })
        | Decl::Specialization(SpecializationDecl {
            record: RecordDecl { nested, .. },
            ..
        }) = decl
        {
            let inner = Scope {
                parent: Some(id),
                ..scope.clone()
            };
            self.declare_all(nested, &inner, pending);
        }
    }

    /// Look up `key`, or create an item with `make`.
    fn intern_decl(&mut self, key: DeclKey, make: impl FnOnce(&mut Self) -> Item) -> ItemId {
        if let Some(&id) = self.cache.get(&key) {
            return id;
        }
        let item = make(self);
        let id = self.builder.push(item);
        self.cache.insert(key, id);
        id
    }

    /// Key of a record or enum. Without a USR the declaration is identified
    /// by where it starts in its unit, so a header included twice still
    /// yields one item; a declaration with no position gets a fresh key.
    fn record_key(&mut self, usr: Option<&str>, loc: &Loc, scope: &Scope) -> DeclKey {
        if let Some(usr) = usr {
            return DeclKey::shared(usr);
        }
        if loc.line == 0 {
            self.next_anon += 1;
            return DeclKey::local(scope.tu, &format!("<anon>#{}", self.next_anon));
        }
        let file = match &loc.file {
            Some(file) => file.as_str(),
            None => self.interner.lookup(scope.file),
        };
        DeclKey::local(scope.tu, &format!("<anon>@{file}:{}:{}", loc.line, loc.column))
    }

    fn declare_record(&mut self, record: &RecordDecl, scope: &Scope) -> ItemId {
        let key = self.record_key(record.usr.as_deref(), &record.location, scope);
        self.intern_decl(key, |this| {
            let aggregate = Aggregate::default();
            let kind = match record.tag {
                RecordTag::Union => ItemKind::Union(aggregate),
                RecordTag::Struct | RecordTag::Class => ItemKind::Struct(aggregate),
            };
            this.new_item(record.name.as_deref(), &record.location, scope, kind)
        })
    }

    fn declare_enum(&mut self, e: &EnumDecl, scope: &Scope) -> ItemId {
        let key = self.record_key(e.usr.as_deref(), &e.location, scope);
        self.intern_decl(key, |this| {
            let kind = ItemKind::Enum(EnumDef {
                repr: e.repr.into(),
                variants: Vec::new(),
                complete: false,
            });
            this.new_item(e.name.as_deref(), &e.location, scope, kind)
        })
    }

    fn declare_function(&mut self, f: &FunctionDecl, scope: &Scope) -> ItemId {
        let key = match f.linkage {
            Linkage::External => DeclKey::shared(&f.usr),
            Linkage::Internal => DeclKey::local(scope.tu, &f.usr),
        };
        self.intern_decl(key, |this| {
            let void = this.builder.types_mut().void();
            let kind = ItemKind::Function(FunctionDef {
                params: Vec::new(),
                ret: void,
                variadic: false,
                call_conv: f.call_conv.into(),
                mangled: None,
            });
            let mut item = this.new_item(Some(&f.name), &f.location, scope, kind);
            if f.linkage == Linkage::Internal {
                item.flags |= ItemFlags::INTERNAL_LINKAGE;
            }
            item
        })
    }

    fn declare_typedef(&mut self, t: &TypedefDecl, scope: &Scope) -> ItemId {
        self.intern_decl(DeclKey::shared(&t.usr), |this| {
            let void = this.builder.types_mut().void();
            let kind = ItemKind::TypeAlias(AliasDef { target: void });
            this.new_item(Some(&t.name), &t.location, scope, kind)
        })
    }

    /// Templates have no type references, so they are complete after the
    /// declare phase; specializations add themselves to `instantiations`.
    fn declare_template(&mut self, t: &ClassTemplateDecl, scope: &Scope) -> ItemId {
        self.intern_decl(DeclKey::shared(&t.usr), |this| {
            let params = t.params.iter().map(|p| this.interner.intern(p)).collect();
            let kind = ItemKind::Template(TemplateDef {
                params,
                instantiations: Vec::new(),
            });
            this.new_item(Some(&t.name), &t.location, scope, kind)
        })
    }

    fn new_item(&mut self, name: Option<&str>, loc: &Loc, scope: &Scope, kind: ItemKind) -> Item {
        let mut flags = ItemFlags::empty();
        if name.is_none() {
            flags |= ItemFlags::ANONYMOUS;
        }
        if loc.system {
            flags |= ItemFlags::SYSTEM_HEADER;
        }
        Item {
            id: ItemId::new(0),
            name: name.map(|n| self.interner.intern(n)),
            location: self.location(loc, scope.file),
            namespace: scope.namespace.clone(),
            parent: scope.parent,
            flags,
            kind,
        }
    }

    fn location(&mut self, loc: &Loc, default_file: Name) -> SourceLocation {
        let file = match &loc.file {
            Some(file) => self.interner.intern(file),
            None => default_file,
        };
        SourceLocation::new(file, loc.line, loc.column)
    }

    // Define phase

    fn define(&mut self, p: &Pending<'_>) {
        match p.decl {
            Decl::Record(record) => self.define_record(p, record, None),
            Decl::Specialization(spec) => {
                self.define_record(p, &spec.record, Some((&spec.template, &spec.args)));
            }
            Decl::Enum(e) => self.define_enum(p, e),
            Decl::Function(f) => self.define_function(p, f),
            Decl::Typedef(t) => {
                let target = self.lower_type(&t.target, p);
                let kind = ItemKind::TypeAlias(AliasDef { target });
                self.commit(p.id, kind, &t.location, &p.scope);
            }
            Decl::ClassTemplate(_) | Decl::Namespace(_) => {}
        }
    }

    fn define_record(
        &mut self,
        p: &Pending<'_>,
        record: &RecordDecl,
        specialization: Option<(&str, &[TypeRef])>,
    ) {
        let id = p.id;
        if !record.complete {
            return;
        }
        let is_union = record.tag == RecordTag::Union;
        if self.builder.item(id).is_union() != is_union {
            self.report_conflict(id, &record.location, &p.scope);
            return;
        }

        let mut fields = Vec::with_capacity(record.fields.len());
        for field in &record.fields {
            let ty = self.lower_type(&field.ty, p);
            let anonymous = field.name.is_none()
                && field.bit_width.is_none()
                && match self.builder.types().get(ty) {
                    Ty::Item(target) => {
                        let target = self.builder.item(*target);
                        target.is_aggregate() && target.is_anonymous()
                    }
                    _ => false,
                };
            fields.push(Field {
                name: field.name.as_deref().map(|n| self.interner.intern(n)),
                ty,
                bit_width: field.bit_width,
                anonymous,
            });
        }
        let bases = record.bases.iter().map(|b| self.lower_type(b, p)).collect();
        let definition = AggregateDef {
            fields,
            bases,
            packed: record.packed,
            align: record.align,
        };

        let specialization = specialization.and_then(|(template, args)| {
            self.link_specialization(id, template, args, p, &record.location)
        });
        let aggregate = Aggregate {
            definition: Some(definition),
            specialization,
        };
        let kind = if is_union {
            ItemKind::Union(aggregate)
        } else {
            ItemKind::Struct(aggregate)
        };

        if self.commit(id, kind, &record.location, &p.scope) {
            let item = self.builder.item_mut(id);
            if record.non_trivial {
                item.flags |= ItemFlags::NON_TRIVIAL;
            }
            if record.methods > 0 {
                item.flags |= ItemFlags::HAS_METHODS;
                let name = self.display(id);
                let diag = Diagnostic::warning(ErrorCode::E1001)
                    .with_message(format!(
                        "{} member function(s) of `{name}` are not bound",
                        record.methods
                    ))
                    .with_label(self.origin(id), name)
                    .with_note("only the data layout of C++ classes is translated");
                self.diagnostics.add(diag);
            }
        }
    }

    /// Connect a specialization to its template and apply the instantiation
    /// policy.
    fn link_specialization(
        &mut self,
        id: ItemId,
        template_usr: &str,
        args: &[TypeRef],
        p: &Pending<'_>,
        loc: &Loc,
    ) -> Option<Specialization> {
        let template = self.cache.get(&DeclKey::shared(template_usr)).copied();
        let Some(template) = template else {
            let location = self.location(loc, p.scope.file);
            let origin = Origin::from_location(location, self.interner);
            self.diagnostics.add(
                Diagnostic::warning(ErrorCode::E1004)
                    .with_message(format!(
                        "specialization of undeclared template `{template_usr}`"
                    ))
                    .with_label(origin, self.display(id))
                    .with_note("imported as a plain record"),
            );
            return None;
        };
        let ItemKind::Template(def) = &mut self.builder.item_mut(template).kind else {
            return None;
        };
        if !def.instantiations.contains(&id) {
            def.instantiations.push(id);
        }

        let template_name = self.display(template);
        let spelled: Vec<String> = args.iter().map(TypeRef::spelling).collect();
        if !self.policy.materialize(&template_name, &spelled) {
            self.builder.item_mut(id).flags |= ItemFlags::REJECTED_INSTANTIATION;
            if self.reported_templates.insert(template) {
                let diag = Diagnostic::note(ErrorCode::E1005)
                    .with_message(format!(
                        "instantiations of `{template_name}` are emitted as opaque blobs"
                    ))
                    .with_label(self.origin(template), template_name.clone())
                    .with_suggestion(format!(
                        "pass `--instantiate '{template_name}<.*>'` to bind their fields"
                    ));
                self.diagnostics.add(diag);
            }
        }

        let args = args.iter().map(|a| self.lower_type(a, p)).collect();
        Some(Specialization { template, args })
    }

    fn define_enum(&mut self, p: &Pending<'_>, e: &EnumDecl) {
        if !e.complete {
            return;
        }
        let variants = e
            .variants
            .iter()
            .map(|v| Variant {
                name: self.interner.intern(&v.name),
                value: v.value,
            })
            .collect();
        let kind = ItemKind::Enum(EnumDef {
            repr: e.repr.into(),
            variants,
            complete: true,
        });
        self.commit(p.id, kind, &e.location, &p.scope);
    }

    fn define_function(&mut self, p: &Pending<'_>, f: &FunctionDecl) {
        let params = f
            .params
            .iter()
            .map(|param| Param {
                name: param.name.as_deref().map(|n| self.interner.intern(n)),
                ty: self.lower_type(&param.ty, p),
            })
            .collect();
        let ret = self.lower_type(&f.ret, p);
        let mangled = f
            .mangled
            .as_deref()
            .filter(|m| *m != f.name)
            .map(|m| self.interner.intern(m));
        let kind = ItemKind::Function(FunctionDef {
            params,
            ret,
            variadic: f.variadic,
            call_conv: f.call_conv.into(),
            mangled,
        });
        self.commit(p.id, kind, &f.location, &p.scope);
    }

    /// Install a lowered body. The first body wins: an identical second
    /// body is a repeated inclusion, a different one is reported.
    ///
    /// Returns `true` if `kind` was installed.
    fn commit(&mut self, id: ItemId, kind: ItemKind, loc: &Loc, scope: &Scope) -> bool {
        if self.defined.insert(id) {
            let location = self.location(loc, scope.file);
            let item = self.builder.item_mut(id);
            item.kind = kind;
            item.location = location;
            return true;
        }
        if self.builder.item(id).kind != kind {
            self.report_conflict(id, loc, scope);
        }
        false
    }

    fn report_conflict(&mut self, id: ItemId, loc: &Loc, scope: &Scope) {
        let location = self.location(loc, scope.file);
        let name = self.display(id);
        let diag = Diagnostic::warning(ErrorCode::E1003)
            .with_message(format!("conflicting definitions of `{name}`"))
            .with_label(Origin::from_location(location, self.interner), "ignored definition")
            .with_secondary_label(self.origin(id), "first definition")
            .with_note("the first definition is kept");
        tracing::warn!(item = %name, "conflicting redefinition");
        self.diagnostics.add(diag);
    }

    // Types

    fn lower_type(&mut self, ty: &TypeRef, p: &Pending<'_>) -> TypeId {
        let lowered = match ty {
            TypeRef::Void => Ty::Void,
            TypeRef::Bool => Ty::Bool,
            TypeRef::Int { kind } => Ty::Int(IntKind::from(*kind)),
            TypeRef::Float { kind } => Ty::Float((*kind).into()),
            TypeRef::Pointer { pointee, is_const } => Ty::Pointer {
                pointee: self.lower_type(pointee, p),
                is_const: *is_const,
            },
            TypeRef::Reference { pointee, is_const } => Ty::Reference {
                pointee: self.lower_type(pointee, p),
                is_const: *is_const,
            },
            TypeRef::Array { element, len } => Ty::Array {
                element: self.lower_type(element, p),
                len: *len,
            },
            TypeRef::Function {
                ret,
                params,
                variadic,
                call_conv,
            } => {
                let ret = self.lower_type(ret, p);
                let params = params.iter().map(|t| self.lower_type(t, p)).collect();
                Ty::Function(FnSig {
                    ret,
                    params,
                    variadic: *variadic,
                    call_conv: (*call_conv).into(),
                })
            }
            TypeRef::Decl { usr, name } => Ty::Item(self.resolve_reference(usr, name.as_deref(), p)),
            TypeRef::TemplateParam { name } => Ty::TemplateParam(self.interner.intern(name)),
        };
        self.builder.types_mut().intern(lowered)
    }

    /// Find the item a USR names, creating an opaque placeholder for an
    /// identity the tree never declared.
    fn resolve_reference(&mut self, usr: &str, name: Option<&str>, p: &Pending<'_>) -> ItemId {
        if let Some(&id) = self
            .cache
            .get(&DeclKey::local(p.scope.tu, usr))
            .or_else(|| self.cache.get(&DeclKey::shared(usr)))
        {
            return id;
        }

        let spelled = name.unwrap_or(usr);
        let from = self.display(p.id);
        let origin = self.origin(p.id);
        self.diagnostics.add(
            Diagnostic::warning(ErrorCode::E1004)
                .with_message(format!("reference to undeclared type `{spelled}`"))
                .with_label(origin, format!("used by `{from}`"))
                .with_note("it is emitted as an opaque type"),
        );

        let name = self.interner.intern(spelled);
        let item = Item {
            id: ItemId::new(0),
            name: Some(name),
            location: SourceLocation::UNKNOWN,
            namespace: SmallVec::new(),
            parent: None,
            flags: ItemFlags::UNRESOLVED,
            kind: ItemKind::Struct(Aggregate::default()),
        };
        let id = self.builder.push(item);
        self.cache.insert(DeclKey::shared(usr), id);
        id
    }

    // Helpers

    fn display(&self, id: ItemId) -> String {
        let item = self.builder.item(id);
        match item.name {
            Some(name) => self.interner.lookup(name).to_owned(),
            None => format!("(anonymous {})", item.kind.label()),
        }
    }

    fn origin(&self, id: ItemId) -> Origin {
        Origin::from_location(self.builder.item(id).location, self.interner)
    }
}
