//! Error codes for monomorphization diagnostics.
//!
//! Codes are stable identifiers (e.g. `E7001`); the leading digit names the
//! phase.

use std::fmt;

/// Error codes for monomorphization diagnostics.
///
/// Format: E#### where first digit indicates phase:
/// - E7xxx: Monomorphization errors (user-facing)
/// - E91xx: Internal monomorphization errors (compiler bugs)
/// - W7xxx: Monomorphization warnings
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, PartialOrd, Ord)]
pub enum ErrorCode {
    // Monomorphization Errors (E7xxx)
    /// Generic arguments of an instance nested deeper than the recursion limit
    E7001,
    /// A call or coercion cannot be resolved to a concrete instance
    E7002,
    /// An instance's generic arguments exceed the type length limit
    E7003,

    // Internal Errors (E91xx)
    /// Polymorphization analysis disagreed with itself for one item
    E9101,
    /// A codegen unit placement rule was violated
    E9102,
    /// Two distinct instances produced the same symbol name
    E9103,

    // Warnings (W7xxx)
    /// A generic item was listed as a root and skipped
    W7001,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::E7001 => "E7001",
            ErrorCode::E7002 => "E7002",
            ErrorCode::E7003 => "E7003",
            ErrorCode::E9101 => "E9101",
            ErrorCode::E9102 => "E9102",
            ErrorCode::E9103 => "E9103",
            ErrorCode::W7001 => "W7001",
        }
    }

    /// E91xx: the fault is in the compiler, never in user code.
    pub fn is_internal_error(&self) -> bool {
        matches!(self, ErrorCode::E9101 | ErrorCode::E9102 | ErrorCode::E9103)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
