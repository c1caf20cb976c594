//! Front-end boundary and declaration importer.
//!
//! - [`decl`]: the declaration tree a C/C++ front-end delivers
//! - [`Frontend`] and [`JsonFrontend`]: producing declaration trees
//! - [`import_units`]: lowering trees into a deduplicated [`weld_ir::ItemGraph`]
//! - [`InstantiationPolicy`]: which class template instantiations get bound

pub mod decl;
mod frontend;
mod importer;
mod instantiate;

pub use frontend::{
    blank_leading_comments, Frontend, FrontendFlags, JsonFrontend, ParseError, SourceInput,
    DUMP_VERSION,
};
pub use importer::import_units;
pub use instantiate::{
    display_name, AllInstantiations, InstantiationPolicy, InstantiationSelection,
    MatchingInstantiations, OpaqueInstantiations,
};
