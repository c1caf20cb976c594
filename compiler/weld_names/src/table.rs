//! Resolved names, keyed by item.

use rustc_hash::FxHashMap;
use weld_ir::ItemId;

use crate::EnumStyle;

/// Name of the module every item lives under when namespaces are kept.
pub const ROOT_MODULE: &str = "root";

/// The emitted name of one item.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ItemName {
    pub ident: String,
    /// Module path below [`ROOT_MODULE`]; empty when namespaces are flattened.
    pub module: Vec<String>,
    /// Set for typedefs that are not emitted: uses name this item instead.
    pub elided_to: Option<ItemId>,
}

/// Getter and setter of one bitfield.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Accessor {
    pub getter: String,
    pub setter: String,
}

/// Member names of an aggregate emitted with its contents.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AggregateNames {
    /// Indexed like `Layout::members`.
    pub members: Vec<String>,
    /// Keyed by the declaring aggregate and field index, as in `BitSlot`.
    pub accessors: FxHashMap<(ItemId, usize), Accessor>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FunctionNames {
    pub params: Vec<String>,
    /// Symbol to link against when it differs from the Rust name.
    pub link_name: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnumNames {
    /// Style actually used; variantless and unnamed enums are always consts.
    pub style: EnumStyle,
    /// Indexed like `EnumDef::variants`: variant names for the Rust style,
    /// constant names otherwise.
    pub variants: Vec<String>,
}

/// Every name the emitter needs.
#[derive(Clone, Debug, Default)]
pub struct NameTable {
    pub(crate) flatten: bool,
    pub(crate) items: FxHashMap<ItemId, ItemName>,
    pub(crate) aggregates: FxHashMap<ItemId, AggregateNames>,
    pub(crate) functions: FxHashMap<ItemId, FunctionNames>,
    pub(crate) enums: FxHashMap<ItemId, EnumNames>,
}

impl NameTable {
    pub fn flattened(&self) -> bool {
        self.flatten
    }

    pub fn item(&self, id: ItemId) -> Option<&ItemName> {
        self.items.get(&id)
    }

    pub fn is_elided(&self, id: ItemId) -> bool {
        self.item(id).is_some_and(|name| name.elided_to.is_some())
    }

    /// Follow typedef elision to the item that is actually emitted.
    pub fn canonical(&self, id: ItemId) -> ItemId {
        let mut current = id;
        for _ in 0..=self.items.len() {
            match self.item(current).and_then(|name| name.elided_to) {
                Some(next) => current = next,
                None => return current,
            }
        }
        current
    }

    /// The identifier an item is declared with.
    pub fn ident(&self, id: ItemId) -> Option<&str> {
        self.item(self.canonical(id)).map(|name| name.ident.as_str())
    }

    /// Module path of the emitted item, below the root module.
    pub fn module(&self, id: ItemId) -> &[String] {
        self.item(self.canonical(id))
            .map_or(&[], |name| name.module.as_slice())
    }

    /// The path used to refer to an item from generated code.
    pub fn path(&self, id: ItemId) -> Option<String> {
        let name = self.item(self.canonical(id))?;
        if self.flatten {
            return Some(name.ident.clone());
        }
        let mut path = String::from(ROOT_MODULE);
        for segment in &name.module {
            path.push_str("::");
            path.push_str(segment);
        }
        path.push_str("::");
        path.push_str(&name.ident);
        Some(path)
    }

    pub fn aggregate(&self, id: ItemId) -> Option<&AggregateNames> {
        self.aggregates.get(&id)
    }

    pub fn member(&self, id: ItemId, index: usize) -> Option<&str> {
        self.aggregate(id)?.members.get(index).map(String::as_str)
    }

    pub fn accessor(&self, id: ItemId, owner: ItemId, field: usize) -> Option<&Accessor> {
        self.aggregate(id)?.accessors.get(&(owner, field))
    }

    pub fn function(&self, id: ItemId) -> Option<&FunctionNames> {
        self.functions.get(&id)
    }

    pub fn enumeration(&self, id: ItemId) -> Option<&EnumNames> {
        self.enums.get(&id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
