//! Declaration origin locations.

use std::fmt;

use crate::{Name, StringInterner};

/// Where a declaration came from: file, line and column (1-based).
///
/// `line == 0` means the front-end did not report a location.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Default)]
pub struct SourceLocation {
    pub file: Name,
    pub line: u32,
    pub column: u32,
}

impl SourceLocation {
    /// Location for synthesized items.
    pub const UNKNOWN: SourceLocation = SourceLocation {
        file: Name::EMPTY,
        line: 0,
        column: 0,
    };

    #[inline]
    pub const fn new(file: Name, line: u32, column: u32) -> Self {
        SourceLocation { file, line, column }
    }

    #[inline]
    pub const fn is_known(&self) -> bool {
        self.line != 0
    }

    /// Render as `file:line:column`.
    pub fn display<'a>(&'a self, interner: &'a StringInterner) -> impl fmt::Display + 'a {
        DisplayLocation {
            location: self,
            interner,
        }
    }
}

impl fmt::Debug for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}@{}:{}", self.file, self.line, self.column)
    }
}

struct DisplayLocation<'a> {
    location: &'a SourceLocation,
    interner: &'a StringInterner,
}

impl fmt::Display for DisplayLocation<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.location.is_known() {
            return write!(f, "<unknown>");
        }
        write!(
            f,
            "{}:{}:{}",
            self.interner.lookup(self.location.file),
            self.location.line,
            self.location.column
        )
    }
}
