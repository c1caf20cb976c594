//! Naming configuration.

use std::fmt;
use std::str::FromStr;

/// How C enums are rendered.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum EnumStyle {
    /// `#[repr(int)] pub enum E { ... }`.
    #[default]
    Rust,
    /// `pub type E = int;` plus `pub const E_VARIANT: E = ...;`.
    Consts,
}

impl EnumStyle {
    pub fn as_str(self) -> &'static str {
        match self {
            EnumStyle::Rust => "rust",
            EnumStyle::Consts => "consts",
        }
    }
}

impl fmt::Display for EnumStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EnumStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rust" => Ok(EnumStyle::Rust),
            "consts" => Ok(EnumStyle::Consts),
            other => Err(format!(
                "unknown enum style `{other}` (expected `rust` or `consts`)"
            )),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct NamingOptions {
    /// One global scope instead of a module per C++ namespace.
    pub flatten_namespaces: bool,
    pub enum_style: EnumStyle,
}

impl Default for NamingOptions {
    fn default() -> Self {
        NamingOptions {
            flatten_namespaces: true,
            enum_style: EnumStyle::default(),
        }
    }
}
