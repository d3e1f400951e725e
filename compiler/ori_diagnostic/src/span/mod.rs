//! Source location spans.
//!
//! Spans are produced by the front end and carried through the typed IR so
//! that monomorphization errors can point back at the call or coercion site
//! that caused them.

use std::fmt;

/// Source location span.
///
/// Layout: 12 bytes total
/// - file: u32 - index of the source file in the front end's file table
/// - start: u32 - byte offset from file start
/// - end: u32 - byte offset (exclusive)
#[derive(Copy, Clone, Eq, PartialEq, Hash, Default, PartialOrd, Ord)]
pub struct Span {
    pub file: u32,
    pub start: u32,
    pub end: u32,
}

impl Span {
    /// Span for compiler-synthesized code (drop glue, vtable shims).
    pub const DUMMY: Span = Span {
        file: 0,
        start: 0,
        end: 0,
    };

    /// Create a new span in `file`.
    #[inline]
    pub const fn new(file: u32, start: u32, end: u32) -> Self {
        Span { file, start, end }
    }

    /// Check if this is the synthesized-code span.
    #[inline]
    pub const fn is_dummy(&self) -> bool {
        self.file == 0 && self.start == 0 && self.end == 0
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}:{}..{}", self.file, self.start, self.end)
    }
}
