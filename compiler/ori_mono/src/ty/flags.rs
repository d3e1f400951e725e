//! Pre-computed type metadata flags.
//!
//! Computed once when a type is interned so that substitution and the
//! drop-glue classifier can skip whole subtrees without walking them.

use bitflags::bitflags;

bitflags! {
    /// Pre-computed type properties for O(1) queries.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
    pub struct TyFlags: u32 {
        // === Presence ===

        /// Contains a type parameter.
        const HAS_TY_PARAM = 1 << 0;
        /// Contains a const parameter.
        const HAS_CONST_PARAM = 1 << 1;
        /// Contains a trait object.
        const HAS_DYN = 1 << 2;
        /// Contains an owning box.
        const HAS_BOX = 1 << 3;
        /// Contains a nominal type.
        const HAS_ADT = 1 << 4;
        /// Contains a closure type.
        const HAS_CLOSURE = 1 << 5;

        // === Category ===

        /// Built-in scalar, `str`, `!` or `()`.
        const IS_PRIMITIVE = 1 << 8;

        // === Derived ===

        /// Has parameters needing substitution.
        const NEEDS_SUBST = Self::HAS_TY_PARAM.bits() | Self::HAS_CONST_PARAM.bits();
    }
}

impl TyFlags {
    #[inline]
    pub fn has_params(self) -> bool {
        self.intersects(Self::NEEDS_SUBST)
    }

    /// Flags that propagate from a child type to its parent.
    #[inline]
    pub(crate) fn inherited(self) -> Self {
        self - Self::IS_PRIMITIVE
    }
}
