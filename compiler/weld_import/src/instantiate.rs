//! Class template instantiation policy.
//!
//! A specialization seen in the input is always imported as its own item
//! (so its size is known); the policy decides whether its fields are bound
//! or whether it is emitted as a size-preserving blob.

use regex::RegexSet;

/// Decides which class template instantiations are materialized.
pub trait InstantiationPolicy {
    /// `template` is the template's name, `args` the C spelling of each
    /// argument (`["int", "const char*"]`).
    fn materialize(&self, template: &str, args: &[String]) -> bool;
}

/// Never materialize: every instantiation is a blob.
#[derive(Copy, Clone, Debug, Default)]
pub struct OpaqueInstantiations;

impl InstantiationPolicy for OpaqueInstantiations {
    fn materialize(&self, _template: &str, _args: &[String]) -> bool {
        false
    }
}

/// Materialize every instantiation.
#[derive(Copy, Clone, Debug, Default)]
pub struct AllInstantiations;

impl InstantiationPolicy for AllInstantiations {
    fn materialize(&self, _template: &str, _args: &[String]) -> bool {
        true
    }
}

/// Materialize instantiations whose display name (`Box<int>`) matches one of
/// the patterns. Patterns are anchored to the whole name.
#[derive(Clone, Debug)]
pub struct MatchingInstantiations {
    patterns: RegexSet,
}

impl MatchingInstantiations {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, regex::Error> {
        let anchored = patterns.iter().map(|p| format!("^(?:{})$", p.as_ref()));
        Ok(MatchingInstantiations {
            patterns: RegexSet::new(anchored)?,
        })
    }
}

impl InstantiationPolicy for MatchingInstantiations {
    fn materialize(&self, template: &str, args: &[String]) -> bool {
        self.patterns.is_match(&display_name(template, args))
    }
}

/// `Template<a, b>`.
pub fn display_name(template: &str, args: &[String]) -> String {
    format!("{template}<{}>", args.join(", "))
}

/// Configured selection, as parsed from options.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum InstantiationSelection {
    #[default]
    Opaque,
    All,
    Matching(Vec<String>),
}

impl InstantiationSelection {
    /// Build the policy. Fails if a `Matching` pattern is not a valid regex.
    pub fn policy(&self) -> Result<Box<dyn InstantiationPolicy + Send + Sync>, regex::Error> {
        Ok(match self {
            InstantiationSelection::Opaque => Box::new(OpaqueInstantiations),
            InstantiationSelection::All => Box::new(AllInstantiations),
            InstantiationSelection::Matching(patterns) => {
                Box::new(MatchingInstantiations::new(patterns)?)
            }
        })
    }
}
