//! Inline `// weld-flags:` directives.
//!
//! An input may start with comment lines of the form
//!
//! ```text
//! // weld-flags: --allow-type 'point.*' --enum-style consts
//! ```
//!
//! Only the leading run of comment and blank lines is searched. Flags of
//! several directive lines are applied in order.

use weld_diagnostic::{Diagnostic, ErrorCode, Origin};

use crate::options::{parse_flags, BindgenOptions, UsageError};

const PREFIX: &str = "weld-flags:";

/// A directive line that does not parse.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("invalid `weld-flags` directive on line {line}: {source}")]
pub struct DirectiveError {
    /// 1-based.
    pub line: u32,
    #[source]
    pub source: UsageError,
}

impl DirectiveError {
    pub fn code(&self) -> ErrorCode {
        ErrorCode::E0004
    }

    pub fn to_diagnostic(&self, path: &str) -> Diagnostic {
        Diagnostic::error(self.code())
            .with_message(self.to_string())
            .with_label(Origin::new(path, self.line, 1), "directive")
            .with_note("directives take the same flags as the command line, except inputs and `-o`")
    }
}

/// Options given by the directives of `text`, or `None` if it has none.
pub fn read_directives(text: &str) -> Result<Option<BindgenOptions>, DirectiveError> {
    let mut options: Option<BindgenOptions> = None;
    for (index, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let Some(comment) = trimmed.strip_prefix("//") else {
            break;
        };
        let Some(flags) = comment.trim_start().strip_prefix(PREFIX) else {
            continue;
        };

        let line = u32::try_from(index + 1).unwrap_or(u32::MAX);
        let args = split_flags(flags).map_err(|source| DirectiveError { line, source })?;
        let parsed = parse_flags(&args).map_err(|source| DirectiveError { line, source })?;
        tracing::debug!(line, flags = args.len(), "weld-flags directive");
        options.get_or_insert_with(BindgenOptions::default).merge(&parsed);
    }
    Ok(options)
}

/// Split on whitespace; single or double quotes group words.
fn split_flags(text: &str) -> Result<Vec<String>, UsageError> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quote: Option<char> = None;

    for c in text.chars() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => current.push(c),
            None if c == '\'' || c == '"' => {
                quote = Some(c);
                in_word = true;
            }
            None if c.is_whitespace() => {
                if in_word {
                    args.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            None => {
                current.push(c);
                in_word = true;
            }
        }
    }

    if let Some(q) = quote {
        return Err(UsageError::InvalidValue {
            flag: PREFIX.trim_end_matches(':').to_owned(),
            message: format!("unterminated {q} quote"),
        });
    }
    if in_word {
        args.push(current);
    }
    Ok(args)
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;
