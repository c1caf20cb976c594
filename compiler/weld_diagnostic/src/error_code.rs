//! Error codes for all pipeline diagnostics.
//!
//! Each error code is a unique identifier (e.g., `E2001`) with the first digit
//! indicating the pipeline stage.

use std::fmt;

/// Error codes for all pipeline diagnostics.
///
/// Format: E#### where first digit indicates stage:
/// - E0xxx: Front-end / input errors
/// - E1xxx: Import errors
/// - E2xxx: Layout errors
/// - E3xxx: Naming errors
/// - E4xxx: Filter errors
/// - E5xxx: Codegen errors
/// - E9xxx: Internal errors
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub enum ErrorCode {
    // Front-end Errors (E0xxx)
    /// Input file could not be read
    E0001,
    /// Declaration dump is not valid
    E0002,
    /// Declaration dump version is not supported
    E0003,
    /// Invalid inline `weld-flags` directive
    E0004,

    // Import Errors (E1xxx)
    /// C++ construct that is not bound (member functions)
    E1001,
    /// Declaration shape that cannot be imported
    E1002,
    /// Conflicting redefinition of one declaration identity
    E1003,
    /// Reference to an undeclared identity
    E1004,
    /// Template instantiation not materialized
    E1005,

    // Layout Errors (E2xxx)
    /// Bitfield wider than its backing integer
    E2001,
    /// By-value field of an incomplete or degraded type, or an object too
    /// large for the target
    E2002,
    /// Direct containment cycle
    E2003,
    /// Scalar with no Rust equivalent
    E2004,
    /// `packed` combined with an alignment request
    E2005,

    // Naming Errors (E3xxx)
    /// No collision-free identifier could be found
    E3001,

    // Filter Errors (E4xxx)
    /// Allow pattern matched only class templates
    E4001,
    /// Function passes a denied type by value
    E4002,
    /// Pattern is not a valid regular expression
    E4003,
    /// Allow pattern matched nothing
    E4004,

    // Codegen Errors (E5xxx)
    /// Function passes an opaque type by value
    E5001,
    /// Function signature uses a scalar with no Rust equivalent
    E5002,

    // Internal Errors (E9xxx)
    /// Internal invariant violation
    E9001,
}

impl ErrorCode {
    /// All error codes, in declaration order.
    pub const ALL: &[ErrorCode] = &[
        ErrorCode::E0001,
        ErrorCode::E0002,
        ErrorCode::E0003,
        ErrorCode::E0004,
        ErrorCode::E1001,
        ErrorCode::E1002,
        ErrorCode::E1003,
        ErrorCode::E1004,
        ErrorCode::E1005,
        ErrorCode::E2001,
        ErrorCode::E2002,
        ErrorCode::E2003,
        ErrorCode::E2004,
        ErrorCode::E2005,
        ErrorCode::E3001,
        ErrorCode::E4001,
        ErrorCode::E4002,
        ErrorCode::E4003,
        ErrorCode::E4004,
        ErrorCode::E5001,
        ErrorCode::E5002,
        ErrorCode::E9001,
    ];

    /// Get the string representation of this error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::E0001 => "E0001",
            ErrorCode::E0002 => "E0002",
            ErrorCode::E0003 => "E0003",
            ErrorCode::E0004 => "E0004",
            ErrorCode::E1001 => "E1001",
            ErrorCode::E1002 => "E1002",
            ErrorCode::E1003 => "E1003",
            ErrorCode::E1004 => "E1004",
            ErrorCode::E1005 => "E1005",
            ErrorCode::E2001 => "E2001",
            ErrorCode::E2002 => "E2002",
            ErrorCode::E2003 => "E2003",
            ErrorCode::E2004 => "E2004",
            ErrorCode::E2005 => "E2005",
            ErrorCode::E3001 => "E3001",
            ErrorCode::E4001 => "E4001",
            ErrorCode::E4002 => "E4002",
            ErrorCode::E4003 => "E4003",
            ErrorCode::E4004 => "E4004",
            ErrorCode::E5001 => "E5001",
            ErrorCode::E5002 => "E5002",
            ErrorCode::E9001 => "E9001",
        }
    }

    /// Check if this is a front-end error (E0xxx range).
    pub fn is_frontend_error(&self) -> bool {
        matches!(
            self,
            ErrorCode::E0001 | ErrorCode::E0002 | ErrorCode::E0003 | ErrorCode::E0004
        )
    }

    /// Check if this is a layout error (E2xxx range).
    pub fn is_layout_error(&self) -> bool {
        matches!(
            self,
            ErrorCode::E2001
                | ErrorCode::E2002
                | ErrorCode::E2003
                | ErrorCode::E2004
                | ErrorCode::E2005
        )
    }

    /// Check if this is an internal error (E9xxx range).
    pub fn is_internal_error(&self) -> bool {
        matches!(self, ErrorCode::E9001)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Parse an error code string like `"E2001"`. Case-insensitive.
impl std::str::FromStr for ErrorCode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.to_uppercase();
        Self::ALL
            .iter()
            .find(|code| code.as_str() == upper)
            .copied()
            .ok_or(())
    }
}
