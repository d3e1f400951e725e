//! Diagnostic system for monomorphization errors.
//!
//! Every error the collector, polymorphization analyzer, or partitioner can
//! raise is rendered into a [`Diagnostic`]:
//! - Error codes for searchability (`E7xxx` user-facing, `E91xx` internal)
//! - Clear messages (what went wrong)
//! - Primary span (where it went wrong)
//! - Notes (the instantiation chain that led there)

mod diagnostic;
mod error_code;
mod span;

pub use diagnostic::{Diagnostic, Label, Severity};
pub use error_code::ErrorCode;
pub use span::Span;
