//! The front-end boundary.
//!
//! Parsing C or C++ source is the job of an external front-end. weld only
//! sees its output: a list of translation units. Any front-end that can
//! produce `TranslationUnit`s plugs in through [`Frontend`]; the one shipped
//! here, [`JsonFrontend`], reads a serialized declaration tree.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use weld_diagnostic::{Diagnostic, ErrorCode, Origin};

use crate::decl::{DeclDump, TranslationUnit};

/// The dump version this build reads.
pub const DUMP_VERSION: u32 = 1;

/// One input file and its text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceInput {
    pub path: PathBuf,
    pub text: String,
}

impl SourceInput {
    pub fn new(path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        SourceInput {
            path: path.into(),
            text: text.into(),
        }
    }

    /// Read an input from disk.
    pub fn read(path: &Path) -> Result<Self, ParseError> {
        let text = std::fs::read_to_string(path).map_err(|source| ParseError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(SourceInput::new(path, text))
    }

    pub fn display_path(&self) -> String {
        self.path.display().to_string()
    }
}

/// Flags forwarded to the front-end: everything after `--` on the command
/// line, plus `--target`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FrontendFlags {
    pub include_paths: Vec<PathBuf>,
    /// `-DNAME` or `-DNAME=VALUE`.
    pub defines: Vec<(String, Option<String>)>,
    /// `-std=c11`, `-std=c++17`.
    pub std: Option<String>,
    pub target: Option<String>,
}

impl FrontendFlags {
    /// Layer `other` on top of `self`: lists are appended, scalars replaced
    /// when set.
    pub fn merge(&mut self, other: &FrontendFlags) {
        self.include_paths.extend(other.include_paths.iter().cloned());
        self.defines.extend(other.defines.iter().cloned());
        if other.std.is_some() {
            self.std.clone_from(&other.std);
        }
        if other.target.is_some() {
            self.target.clone_from(&other.target);
        }
    }
}

/// The front-end could not produce a declaration tree. Fatal for the run.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("cannot read `{path}`: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed declaration dump `{path}` at {line}:{column}: {message}")]
    Malformed {
        path: String,
        line: usize,
        column: usize,
        message: String,
    },
    #[error(
        "`{path}` is declaration dump version {found}; this weld reads version {}",
        DUMP_VERSION
    )]
    UnsupportedVersion { path: String, found: u32 },
}

impl ParseError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ParseError::Io { .. } => ErrorCode::E0001,
            ParseError::Malformed { .. } => ErrorCode::E0002,
            ParseError::UnsupportedVersion { .. } => ErrorCode::E0003,
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        let diag = Diagnostic::error(self.code()).with_message(self.to_string());
        match self {
            ParseError::Io { path, .. } => diag.with_label(Origin::new(path, 0, 0), "input"),
            ParseError::Malformed {
                path, line, column, ..
            } => diag.with_label(
                Origin::new(
                    path,
                    u32::try_from(*line).unwrap_or(u32::MAX),
                    u32::try_from(*column).unwrap_or(u32::MAX),
                ),
                "here",
            ),
            ParseError::UnsupportedVersion { path, .. } => diag
                .with_label(Origin::new(path, 0, 0), "input")
                .with_suggestion("regenerate the dump with a matching front-end"),
        }
    }
}

/// A C/C++ front-end.
pub trait Frontend {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    fn parse(
        &self,
        input: &SourceInput,
        flags: &FrontendFlags,
    ) -> Result<Vec<TranslationUnit>, ParseError>;
}

/// Reads `.decls.json` declaration dumps.
///
/// A dump may start with `//` comment lines (inline `weld-flags`
/// directives); they are blanked before decoding so that decoder positions
/// still match the file.
#[derive(Copy, Clone, Debug, Default)]
pub struct JsonFrontend;

#[derive(Deserialize)]
struct VersionHeader {
    version: u32,
}

impl Frontend for JsonFrontend {
    fn name(&self) -> &'static str {
        "json"
    }

    #[tracing::instrument(level = "debug", skip_all, fields(path = %input.path.display()))]
    fn parse(
        &self,
        input: &SourceInput,
        flags: &FrontendFlags,
    ) -> Result<Vec<TranslationUnit>, ParseError> {
        if flags != &FrontendFlags::default() {
            tracing::debug!(
                includes = flags.include_paths.len(),
                defines = flags.defines.len(),
                "dump is already preprocessed; include paths and defines are not applied"
            );
        }

        let body = blank_leading_comments(&input.text);
        let malformed = |err: &serde_json::Error| ParseError::Malformed {
            path: input.display_path(),
            line: err.line(),
            column: err.column(),
            message: Message(err).to_string(),
        };

        let header: VersionHeader = serde_json::from_str(&body).map_err(|e| malformed(&e))?;
        if header.version != DUMP_VERSION {
            return Err(ParseError::UnsupportedVersion {
                path: input.display_path(),
                found: header.version,
            });
        }

        let dump: DeclDump = serde_json::from_str(&body).map_err(|e| malformed(&e))?;
        tracing::debug!(units = dump.units.len(), "decoded declaration dump");
        Ok(dump.units)
    }
}

/// serde_json appends " at line L column C" to its messages; the position is
/// reported separately.
struct Message<'a>(&'a serde_json::Error);

impl fmt::Display for Message<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let full = self.0.to_string();
        let trimmed = full
            .rfind(" at line ")
            .map_or(full.as_str(), |idx| &full[..idx]);
        f.write_str(trimmed)
    }
}

/// Replace the leading run of `//` comment lines (and blank lines) with
/// empty lines.
pub fn blank_leading_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_header = true;
    for line in text.split_inclusive('\n') {
        let trimmed = line.trim();
        if in_header && (trimmed.is_empty() || trimmed.starts_with("//")) {
            if line.ends_with('\n') {
                out.push('\n');
            }
            continue;
        }
        in_header = false;
        out.push_str(line);
    }
    out
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;
