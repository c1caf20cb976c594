//! Assigning identifiers to the codegen set.
//!
//! Names are claimed in a fixed order so that collision suffixes are
//! deterministic:
//!
//! 1. module names (when namespaces are kept), which share the type namespace
//! 2. named declarations in id order, including anonymous aggregates and enums
//!    that a typedef names
//! 3. remaining anonymous declarations, ancestors before descendants
//! 4. typedefs, which may be elided once their target's name is final
//! 5. members, parameters and accessors, each in their own scope

use rustc_hash::FxHashMap;
use weld_filter::{CodegenSet, Emission};
use weld_ir::{Field, ItemGraph, ItemId, ItemKind, Name, StringInterner, Ty};
use weld_layout::{FieldSlot, LayoutTable, Member};

use crate::ident::{escape, rust_ident, sanitize};
use crate::scope::{NameCollisionUnresolvable, Scope};
use crate::table::{Accessor, AggregateNames, EnumNames, FunctionNames, ItemName, ROOT_MODULE};
use crate::{EnumStyle, NameTable, NamingOptions};

/// Name every item of `set`.
///
/// `layouts` must already cover the set: flattened anonymous members get no
/// name, and member names follow each aggregate's emission plan.
#[tracing::instrument(level = "debug", skip_all, fields(items = set.len()))]
pub fn resolve_names(
    graph: &ItemGraph,
    interner: &StringInterner,
    set: &CodegenSet,
    layouts: &LayoutTable,
    options: &NamingOptions,
) -> Result<NameTable, NameCollisionUnresolvable> {
    let mut resolver = Resolver {
        graph,
        interner,
        set,
        layouts,
        options,
        scopes: FxHashMap::default(),
        typedef_names: FxHashMap::default(),
        named_by: FxHashMap::default(),
        anonymous_counters: FxHashMap::default(),
        table: NameTable {
            flatten: options.flatten_namespaces,
            ..NameTable::default()
        },
    };
    resolver.run()?;
    tracing::debug!(named = resolver.table.len(), "names resolved");
    Ok(resolver.table)
}

/// The type and value namespaces of one module.
struct Namespaces {
    types: Scope,
    values: Scope,
}

struct Resolver<'a> {
    graph: &'a ItemGraph,
    interner: &'a StringInterner,
    set: &'a CodegenSet,
    layouts: &'a LayoutTable,
    options: &'a NamingOptions,
    scopes: FxHashMap<Vec<String>, Namespaces>,
    /// Anonymous declaration -> the typedef whose name it takes.
    typedef_names: FxHashMap<ItemId, ItemId>,
    /// The reverse: typedef -> the anonymous declaration it names.
    named_by: FxHashMap<ItemId, ItemId>,
    /// Anonymous declarations numbered so far, per naming ancestor.
    anonymous_counters: FxHashMap<Option<ItemId>, u32>,
    table: NameTable,
}

impl Resolver<'_> {
    fn run(&mut self) -> Result<(), NameCollisionUnresolvable> {
        let emitted: Vec<ItemId> = self
            .set
            .ids()
            .filter(|&id| !self.layouts.is_flattened(id))
            .collect();

        self.collect_typedef_names(&emitted);
        if !self.options.flatten_namespaces {
            self.reserve_modules(&emitted);
        }

        let mut anonymous = Vec::new();
        for &id in &emitted {
            let item = self.graph.item(id);
            if matches!(item.kind, ItemKind::TypeAlias(_)) {
                continue;
            }
            let raw = item
                .name
                .or_else(|| self.typedef_names.get(&id).and_then(|&t| self.graph.item(t).name));
            match raw {
                Some(name) => {
                    let base = rust_ident(self.lookup(name), !is_function(&item.kind));
                    self.name_item(id, base)?;
                }
                None => anonymous.push((self.depth(id), id)),
            }
        }

        anonymous.sort_unstable();
        for (_, id) in anonymous {
            let base = self.anonymous_base(id);
            self.name_item(id, base)?;
        }

        for &id in &emitted {
            if matches!(self.graph.item(id).kind, ItemKind::TypeAlias(_)) {
                self.name_alias(id)?;
            }
        }

        for &id in &emitted {
            match self.graph.item(id).kind {
                ItemKind::Struct(_) | ItemKind::Union(_) => self.name_members(id)?,
                ItemKind::Function(_) => self.name_function(id)?,
                ItemKind::Enum(_) | ItemKind::TypeAlias(_) | ItemKind::Template(_) => {}
            }
        }
        Ok(())
    }

    /// `typedef struct { ... } name;` gives the struct the typedef's name.
    /// The first typedef (by id) wins.
    fn collect_typedef_names(&mut self, emitted: &[ItemId]) {
        for &id in emitted {
            let item = self.graph.item(id);
            let ItemKind::TypeAlias(alias) = &item.kind else {
                continue;
            };
            if item.name.is_none() {
                continue;
            }
            let &Ty::Item(target) = self.graph.ty(alias.target) else {
                continue;
            };
            let target_item = self.graph.item(target);
            let nameable = target_item.name.is_none()
                && matches!(
                    target_item.kind,
                    ItemKind::Struct(_) | ItemKind::Union(_) | ItemKind::Enum(_)
                )
                && self.set.contains(target)
                && !self.layouts.is_flattened(target);
            if nameable && !self.typedef_names.contains_key(&target) {
                self.typedef_names.insert(target, id);
                self.named_by.insert(id, target);
            }
        }
    }

    /// Modules occupy the type namespace of their parent module.
    fn reserve_modules(&mut self, emitted: &[ItemId]) {
        for &id in emitted {
            let module = self.module_of(id);
            for depth in 0..module.len() {
                let parent = module[..depth].to_vec();
                self.namespaces(parent).types.reserve(&module[depth]);
            }
        }
    }

    fn namespaces(&mut self, module: Vec<String>) -> &mut Namespaces {
        let flatten = self.options.flatten_namespaces;
        self.scopes.entry(module).or_insert_with_key(|module| {
            let label = if module.is_empty() {
                "the root module".to_owned()
            } else {
                format!("module `{}`", module.join("::"))
            };
            let mut types = Scope::new(label.clone());
            if !flatten {
                // Every module imports `root`.
                types.reserve(ROOT_MODULE);
            }
            Namespaces {
                types,
                values: Scope::new(label),
            }
        })
    }

    fn module_of(&self, id: ItemId) -> Vec<String> {
        if self.options.flatten_namespaces {
            return Vec::new();
        }
        self.graph
            .item(id)
            .namespace
            .iter()
            .map(|ns| rust_ident(self.lookup(*ns), true))
            .collect()
    }

    fn name_item(&mut self, id: ItemId, base: String) -> Result<(), NameCollisionUnresolvable> {
        let module = self.module_of(id);
        let is_value = is_function(&self.graph.item(id).kind);
        let namespaces = self.namespaces(module.clone());
        let ident = if is_value {
            namespaces.values.claim(base)?
        } else {
            namespaces.types.claim(base)?
        };
        tracing::trace!(item = ?id, %ident, "named");
        self.table.items.insert(
            id,
            ItemName {
                ident,
                module,
                elided_to: None,
            },
        );
        if matches!(self.graph.item(id).kind, ItemKind::Enum(_)) {
            self.name_enum(id)?;
        }
        Ok(())
    }

    /// `<ancestor>_anon_<n>`, where the ancestor is the nearest enclosing
    /// declaration that is emitted on its own or at least has a name.
    fn anonymous_base(&mut self, id: ItemId) -> String {
        let mut parent = self.graph.item(id).parent;
        let (key, prefix) = loop {
            let Some(p) = parent else {
                break (None, None);
            };
            if !self.layouts.is_flattened(p) {
                if let Some(ident) = self.table.ident(p) {
                    break (Some(p), Some(ident.to_owned()));
                }
                if let Some(name) = self.graph.item(p).name {
                    break (Some(p), Some(sanitize(self.lookup(name))));
                }
            }
            parent = self.graph.item(p).parent;
        };
        let counter = self.anonymous_counters.entry(key).or_insert(0);
        *counter += 1;
        match prefix {
            Some(prefix) => format!("{prefix}_anon_{counter}"),
            None => format!("_anon_{counter}"),
        }
    }

    fn depth(&self, id: ItemId) -> usize {
        let mut depth = 0;
        let mut parent = self.graph.item(id).parent;
        while let Some(p) = parent {
            depth += 1;
            parent = self.graph.item(p).parent;
        }
        depth
    }

    fn name_alias(&mut self, id: ItemId) -> Result<(), NameCollisionUnresolvable> {
        let graph = self.graph;
        let item = graph.item(id);
        let ItemKind::TypeAlias(alias) = &item.kind else {
            return Ok(());
        };
        let module = self.module_of(id);
        let base = match item.name {
            Some(name) => rust_ident(self.lookup(name), true),
            // Unnamed typedefs do not come out of the importer.
            None => self.anonymous_base(id),
        };
        let direct_target = match graph.ty(alias.target) {
            Ty::Item(target) => Some(*target),
            _ => None,
        };

        let elided_to = self.named_by.get(&id).copied().or_else(|| {
            // `typedef struct Foo Foo;`
            direct_target.filter(|&target| {
                self.table.ident(target) == Some(base.as_str())
                    && self.table.module(target) == module.as_slice()
            })
        });

        let ident = match elided_to {
            Some(target) => {
                tracing::trace!(typedef = ?id, target = ?target, "typedef elided");
                self.table.ident(target).unwrap_or_default().to_owned()
            }
            None => self.namespaces(module.clone()).types.claim(base)?,
        };
        self.table.items.insert(
            id,
            ItemName {
                ident,
                module,
                elided_to,
            },
        );
        Ok(())
    }

    fn name_enum(&mut self, id: ItemId) -> Result<(), NameCollisionUnresolvable> {
        if self.set.emission(id) != Some(Emission::Full) {
            return Ok(());
        }
        let graph = self.graph;
        let item = graph.item(id);
        let ItemKind::Enum(def) = &item.kind else {
            return Ok(());
        };
        let Some(ident) = self.table.ident(id).map(str::to_owned) else {
            return Ok(());
        };
        let unnamed = item.name.is_none() && !self.typedef_names.contains_key(&id);
        let style = if unnamed || def.variants.is_empty() || !def.complete {
            EnumStyle::Consts
        } else {
            self.options.enum_style
        };

        let mut variants = Vec::with_capacity(def.variants.len());
        match style {
            EnumStyle::Rust => {
                let mut scope = Scope::new(format!("enum `{ident}`"));
                for variant in &def.variants {
                    variants.push(scope.claim(rust_ident(self.lookup(variant.name), false))?);
                }
            }
            EnumStyle::Consts => {
                let module = self.module_of(id);
                for variant in &def.variants {
                    let raw = self.lookup(variant.name);
                    let base = if unnamed {
                        rust_ident(raw, false)
                    } else {
                        escape(format!("{ident}_{}", sanitize(raw)), false)
                    };
                    variants.push(self.namespaces(module.clone()).values.claim(base)?);
                }
            }
        }
        self.table.enums.insert(id, EnumNames { style, variants });
        Ok(())
    }

    fn name_function(&mut self, id: ItemId) -> Result<(), NameCollisionUnresolvable> {
        let graph = self.graph;
        let item = graph.item(id);
        let ItemKind::Function(func) = &item.kind else {
            return Ok(());
        };
        let Some(ident) = self.table.ident(id).map(str::to_owned) else {
            return Ok(());
        };
        let link_name = func
            .mangled
            .or(item.name)
            .map(|symbol| self.lookup(symbol))
            .filter(|symbol| *symbol != ident)
            .map(str::to_owned);

        let mut scope = Scope::new(format!("parameters of `{ident}`"));
        let mut params = Vec::with_capacity(func.params.len());
        for (index, param) in func.params.iter().enumerate() {
            let base = match self.nonempty(param.name) {
                Some(raw) => rust_ident(raw, false),
                None => format!("arg{}", index + 1),
            };
            params.push(scope.claim(base)?);
        }
        self.table
            .functions
            .insert(id, FunctionNames { params, link_name });
        Ok(())
    }

    fn name_members(&mut self, id: ItemId) -> Result<(), NameCollisionUnresolvable> {
        if self.set.emission(id) != Some(Emission::Full) {
            return Ok(());
        }
        let Some(layout) = self.layouts.get(id) else {
            return Ok(());
        };
        let ident = self.table.ident(id).unwrap_or_default().to_owned();
        let mut fields = Scope::new(format!("fields of `{ident}`"));
        let mut methods = Scope::new(format!("methods of `{ident}`"));
        let mut names = AggregateNames::default();
        let (mut units, mut pads, mut anons, mut unnamed) = (0u32, 0u32, 0u32, 0u32);

        for member in &layout.members {
            let base = match member {
                Member::Field {
                    slot: FieldSlot::Base(_),
                    ..
                } => "_base".to_owned(),
                Member::Field {
                    owner,
                    slot: FieldSlot::Field(index),
                    ..
                } => {
                    let field = self.field(*owner, *index);
                    match field.and_then(|f| self.nonempty(f.name)) {
                        Some(raw) => rust_ident(raw, false),
                        None if field.is_some_and(|f| f.anonymous) => {
                            anons += 1;
                            format!("anon_{anons}")
                        }
                        None => {
                            unnamed += 1;
                            format!("unnamed_{unnamed}")
                        }
                    }
                }
                Member::Bitfield(unit) => {
                    for bit in &unit.bits {
                        let raw = self
                            .field(bit.owner, bit.field)
                            .and_then(|f| self.nonempty(f.name));
                        if let Some(raw) = raw {
                            let getter = methods.claim(rust_ident(raw, false))?;
                            let setter =
                                methods.claim(escape(format!("set_{}", sanitize(raw)), false))?;
                            names
                                .accessors
                                .insert((bit.owner, bit.field), Accessor { getter, setter });
                        }
                    }
                    units += 1;
                    format!("_bitfield_{units}")
                }
                Member::Padding { .. } => {
                    pads += 1;
                    format!("__pad_{pads}")
                }
            };
            names.members.push(fields.claim(base)?);
        }
        self.table.aggregates.insert(id, names);
        Ok(())
    }

    fn field(&self, owner: ItemId, index: usize) -> Option<&Field> {
        self.graph
            .item(owner)
            .aggregate()?
            .definition
            .as_ref()?
            .fields
            .get(index)
    }

    fn lookup(&self, name: Name) -> &str {
        self.interner.lookup(name)
    }

    fn nonempty(&self, name: Option<Name>) -> Option<&str> {
        name.map(|n| self.lookup(n)).filter(|s| !s.is_empty())
    }
}

fn is_function(kind: &ItemKind) -> bool {
    matches!(kind, ItemKind::Function(_))
}
