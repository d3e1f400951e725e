//! Stable instance identifiers.
//!
//! # Scheme
//!
//! ```text
//! _ori_<crate>$<path>[.G<hash>][.vtshim]
//! _ori_<local crate>.drop.G<hash>
//! ```
//!
//! - `<path>` segments are separated by `$`
//! - markers start with `.`, which identifier encoding always escapes, so
//!   no item path can spell a marker
//! - `<hash>` is 16 hex digits of an `FxHasher` over the crate-qualified
//!   structural rendering of the arguments, so it is identical across runs
//!   and never depends on type handle values
//!
//! This is a unique name, not a demanglable one.

use std::fmt::{self, Write};
use std::hash::Hasher;

use rustc_hash::FxHasher;

use super::{Instance, InstanceDef};
use crate::provider::IrProvider;
use crate::ty::TyPrinter;

/// The prefix for all Ori mangled symbols.
pub const MANGLE_PREFIX: &str = "_ori_";

/// Separator for path components.
const PATH_SEP: char = '$';

/// Starts every marker that follows the path.
const MARKER: char = '.';

#[derive(Clone, Eq, PartialEq, Hash, PartialOrd, Ord, Debug)]
pub struct SymbolName(String);

impl SymbolName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SymbolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Compute the symbol of an instance.
pub fn symbol_name(provider: &dyn IrProvider, instance: &Instance) -> SymbolName {
    let mut out = String::with_capacity(64);
    out.push_str(MANGLE_PREFIX);

    match instance.def {
        InstanceDef::DropGlue => {
            encode_identifier(&mut out, provider.crate_name(provider.local_crate()));
            out.push(MARKER);
            out.push_str("drop");
        }
        InstanceDef::Item(item) | InstanceDef::Static(item) | InstanceDef::VTableShim(item) => {
            let origin = provider.provenance_of(item).origin;
            encode_identifier(&mut out, provider.crate_name(origin));
            out.push(PATH_SEP);
            encode_path(&mut out, &provider.item(item).path);
        }
    }

    if !instance.args.is_empty() {
        let _ = write!(out, "{MARKER}G{:016x}", args_hash(provider, instance));
    }

    if matches!(instance.def, InstanceDef::VTableShim(_)) {
        out.push(MARKER);
        out.push_str("vtshim");
    }

    SymbolName(out)
}

fn args_hash(provider: &dyn IrProvider, instance: &Instance) -> u64 {
    let rendered = TyPrinter::new(provider).qualified().args(&instance.args);
    let mut hasher = FxHasher::default();
    hasher.write(rendered.as_bytes());
    hasher.finish()
}

// -- Encoding helpers --
//
// Alphanumeric and '_' pass through; brackets and punctuation get named
// escapes; everything else is hex-escaped.

/// Encode a character as hex escape (e.g., '@' -> "$40").
#[inline]
fn encode_char_hex(out: &mut String, c: char) {
    let _ = write!(out, "${:02x}", c as u32);
}

/// Encode a `::`-separated path, one identifier per segment.
fn encode_path(out: &mut String, path: &str) {
    for (i, segment) in path.split("::").enumerate() {
        if i > 0 {
            out.push(PATH_SEP);
        }
        encode_identifier(out, segment);
    }
}

fn encode_identifier(out: &mut String, name: &str) {
    for c in name.chars() {
        match c {
            c if c.is_ascii_alphanumeric() || c == '_' => out.push(c),
            '<' => out.push_str("$LT"),
            '>' => out.push_str("$GT"),
            ',' => out.push_str("$C"),
            ' ' => out.push('_'),
            '[' => out.push_str("$LB"),
            ']' => out.push_str("$RB"),
            '(' => out.push_str("$LP"),
            ')' => out.push_str("$RP"),
            ':' => out.push_str("$CC"),
            '-' => out.push_str("$D"),
            _ => encode_char_hex(out, c),
        }
    }
}
