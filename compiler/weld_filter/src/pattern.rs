//! User patterns and their compiled form.

use std::fmt;
use std::str::FromStr;

use regex::{Regex, RegexSet};
use weld_diagnostic::{Diagnostic, ErrorCode};

/// What to do with a kept item's dependency on a denied item.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum DeniedDependencyPolicy {
    /// Emit the denied item as an opaque placeholder and stop there.
    #[default]
    OpaqueItem,
    /// Do not emit the denied item; by-value uses become byte blobs and
    /// pointers become `c_void` pointers.
    OpaqueField,
}

impl DeniedDependencyPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            DeniedDependencyPolicy::OpaqueItem => "opaque-item",
            DeniedDependencyPolicy::OpaqueField => "opaque-field",
        }
    }
}

impl fmt::Display for DeniedDependencyPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeniedDependencyPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "opaque-item" => Ok(DeniedDependencyPolicy::OpaqueItem),
            "opaque-field" => Ok(DeniedDependencyPolicy::OpaqueField),
            other => Err(format!(
                "unknown denied-dependency policy `{other}` (expected `opaque-item` or `opaque-field`)"
            )),
        }
    }
}

/// Filter configuration as the user wrote it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilterOptions {
    /// `--allow-item`: any kind of declaration.
    pub allow_items: Vec<String>,
    /// `--allow-type`: structs, unions, enums and typedefs.
    pub allow_types: Vec<String>,
    /// `--allow-function`.
    pub allow_functions: Vec<String>,
    /// `--deny`: overrides every allow.
    pub deny: Vec<String>,
    /// `--opaque-type`: emitted, but without contents.
    pub opaque: Vec<String>,
    pub denied_dependency: DeniedDependencyPolicy,
    /// Consider system-header declarations as default roots too.
    pub include_system_headers: bool,
}

impl FilterOptions {
    /// Layer `other` on top of `self`: pattern lists are appended, the policy
    /// is replaced when `other` changes it, flags are or-ed.
    pub fn merge(&mut self, other: &FilterOptions) {
        self.allow_items.extend(other.allow_items.iter().cloned());
        self.allow_types.extend(other.allow_types.iter().cloned());
        self.allow_functions
            .extend(other.allow_functions.iter().cloned());
        self.deny.extend(other.deny.iter().cloned());
        self.opaque.extend(other.opaque.iter().cloned());
        if other.denied_dependency != DeniedDependencyPolicy::default() {
            self.denied_dependency = other.denied_dependency;
        }
        self.include_system_headers |= other.include_system_headers;
    }

    /// Compile every pattern list.
    pub fn compile(&self) -> Result<CompiledFilter, FilterError> {
        Ok(CompiledFilter {
            allow_items: PatternList::new("--allow-item", &self.allow_items)?,
            allow_types: PatternList::new("--allow-type", &self.allow_types)?,
            allow_functions: PatternList::new("--allow-function", &self.allow_functions)?,
            deny: PatternList::new("--deny", &self.deny)?,
            opaque: PatternList::new("--opaque-type", &self.opaque)?,
            policy: self.denied_dependency,
            include_system_headers: self.include_system_headers,
        })
    }
}

/// A pattern failed to compile.
#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid pattern `{pattern}` for {option}: {source}")]
pub struct FilterError {
    pub option: &'static str,
    pub pattern: String,
    #[source]
    pub source: regex::Error,
}

impl FilterError {
    pub fn code(&self) -> ErrorCode {
        ErrorCode::E4003
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::error(self.code())
            .with_message(self.to_string())
            .with_note("patterns are regular expressions matched against the whole name")
    }
}

/// Anchored regular expressions, matched against whole names.
#[derive(Clone, Debug)]
pub struct PatternList {
    patterns: Vec<String>,
    set: RegexSet,
}

impl PatternList {
    pub fn new(option: &'static str, patterns: &[String]) -> Result<Self, FilterError> {
        let anchored: Vec<String> = patterns.iter().map(|p| format!("^(?:{p})$")).collect();
        // Compile one by one first so the error names the offending pattern.
        for (pattern, source) in patterns.iter().zip(&anchored) {
            Regex::new(source).map_err(|source| FilterError {
                option,
                pattern: pattern.clone(),
                source,
            })?;
        }
        let set = RegexSet::new(&anchored).map_err(|source| FilterError {
            option,
            pattern: patterns.join(", "),
            source,
        })?;
        Ok(PatternList {
            patterns: patterns.to_vec(),
            set,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Whether any pattern matches either spelling of a name.
    pub fn is_match(&self, raw: &str, qualified: &str) -> bool {
        !self.is_empty() && (self.set.is_match(raw) || self.set.is_match(qualified))
    }

    /// Indices of the patterns matching either spelling, ascending.
    pub fn matching(&self, raw: &str, qualified: &str) -> Vec<usize> {
        if self.is_empty() {
            return Vec::new();
        }
        let mut hits: Vec<usize> = self.set.matches(raw).into_iter().collect();
        hits.extend(self.set.matches(qualified).into_iter());
        hits.sort_unstable();
        hits.dedup();
        hits
    }
}

/// Compiled filter configuration.
#[derive(Clone, Debug)]
pub struct CompiledFilter {
    pub allow_items: PatternList,
    pub allow_types: PatternList,
    pub allow_functions: PatternList,
    pub deny: PatternList,
    pub opaque: PatternList,
    pub policy: DeniedDependencyPolicy,
    pub include_system_headers: bool,
}

impl CompiledFilter {
    /// Whether any allow pattern was given. Without one, the default roots
    /// apply.
    pub fn has_allow(&self) -> bool {
        !(self.allow_items.is_empty()
            && self.allow_types.is_empty()
            && self.allow_functions.is_empty())
    }
}

impl Default for CompiledFilter {
    fn default() -> Self {
        let empty = || PatternList {
            patterns: Vec::new(),
            set: RegexSet::empty(),
        };
        CompiledFilter {
            allow_items: empty(),
            allow_types: empty(),
            allow_functions: empty(),
            deny: empty(),
            opaque: empty(),
            policy: DeniedDependencyPolicy::default(),
            include_system_headers: false,
        }
    }
}
