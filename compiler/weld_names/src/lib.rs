//! Name resolution for the weld binding generator.
//!
//! Produces a valid, collision-free Rust identifier for every emitted item,
//! member, enum variant and parameter:
//!
//! - C spellings are sanitized (`vec<int>` is `vec_int`) and keywords escaped
//!   with a trailing underscore (`type` is `type_`)
//! - collisions within one scope get `_1`, `_2`, ... in item id order
//! - anonymous declarations are named after their enclosing declaration
//!   (`outer_anon_1`), or after the typedef that names them
//! - with namespace flattening off, each C++ namespace becomes a module under
//!   `root`, and collisions are resolved per module
//!
//! Nothing here depends on hashing order or any other run-to-run variation.

mod ident;
mod options;
mod resolve;
mod scope;
mod table;

pub use ident::{is_keyword, is_valid_ident, rust_ident, sanitize};
pub use options::{EnumStyle, NamingOptions};
pub use resolve::resolve_names;
pub use scope::NameCollisionUnresolvable;
pub use table::{
    Accessor, AggregateNames, EnumNames, FunctionNames, ItemName, NameTable, ROOT_MODULE,
};
