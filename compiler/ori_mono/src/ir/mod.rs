//! The typed IR as monomorphization reads it.
//!
//! This is deliberately a narrow slice of the real IR: item identity,
//! generics, provenance and a body reduced to the operations that can
//! require another instance to exist. Everything else a body does is
//! invisible here.

mod body;


use std::fmt;

use ori_diagnostic::Span;

use crate::ty::{GenericArg, GenericArgs, Ty, TyInterner};

pub use body::{Body, BodyBuilder, CallKind, CallSite, LayoutOp, OpKind, Operation};

/// Identifies an item across the whole program (all crates).
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
#[repr(transparent)]
pub struct ItemId(u32);

impl ItemId {
    #[inline]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "item#{}", self.0)
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord, Debug)]
pub struct CrateId(u32);

impl CrateId {
    /// The crate being compiled.
    pub const LOCAL: Self = Self(0);

    #[inline]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub const fn is_local(self) -> bool {
        self.0 == 0
    }
}

/// A module region: the unit of stable codegen-unit placement.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord, Debug)]
pub struct RegionId(u32);

impl RegionId {
    #[inline]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Visibility {
    Public,
    Crate,
    Private,
}

/// Where an item comes from and how it may be linked.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct Provenance {
    pub origin: CrateId,
    pub visibility: Visibility,
    /// The item's body is available for codegen in downstream crates.
    pub inline_eligible: bool,
    /// Must keep external linkage (exported, `no_mangle`, entry points).
    pub forced_linkage: bool,
}

impl Provenance {
    /// Private, local, not inline: the provenance of compiler-made items.
    pub const SYNTHETIC: Self = Self {
        origin: CrateId::LOCAL,
        visibility: Visibility::Private,
        inline_eligible: false,
        forced_linkage: false,
    };

    #[inline]
    pub fn is_local(&self) -> bool {
        self.origin.is_local()
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum GenericParamKind {
    Type,
    Const,
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub struct GenericParamDef {
    pub name: String,
    pub kind: GenericParamKind,
}

/// Generic parameters of an item.
///
/// `params` is the full list: a closure or impl method starts with the
/// `parent_count` parameters of its parent, followed by its own.
#[derive(Clone, Eq, PartialEq, Debug, Default)]
pub struct Generics {
    pub parent: Option<ItemId>,
    pub parent_count: usize,
    pub params: Vec<GenericParamDef>,
}

impl Generics {
    #[inline]
    pub fn count(&self) -> usize {
        self.params.len()
    }

    #[inline]
    pub fn own_count(&self) -> usize {
        self.params.len().saturating_sub(self.parent_count)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// `[Param(0), Param(1), ..]`: the "not specialized" argument list.
    pub fn identity_args(&self, types: &TyInterner) -> GenericArgs {
        self.params
            .iter()
            .enumerate()
            .map(|(i, param)| identity_arg(types, param.kind, param_index(i)))
            .collect()
    }
}

/// The placeholder for an unspecialized slot.
pub fn identity_arg(types: &TyInterner, kind: GenericParamKind, index: u32) -> GenericArg {
    match kind {
        GenericParamKind::Type => GenericArg::Type(types.mk_param(index)),
        GenericParamKind::Const => GenericArg::Const(crate::ty::Const::Param(index)),
    }
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "generic parameter lists are far below u32::MAX"
)]
#[inline]
pub(crate) fn param_index(i: usize) -> u32 {
    i as u32
}

/// A where-clause: `subject: Trait<args>`.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Predicate {
    pub subject: Ty,
    pub trait_id: ItemId,
    pub args: GenericArgs,
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub enum ItemKind {
    Fn,
    Closure,
    Static,
    Adt { fields: Vec<Ty> },
    Trait { methods: Vec<ItemId> },
    /// A method declaration in a trait; its generics start with `Self`.
    TraitMethod { trait_id: ItemId },
    Impl { trait_id: ItemId, self_ty: Ty },
    ImplMethod { trait_method: ItemId },
}

impl ItemKind {
    /// Whether instances of this item are called.
    pub fn is_callable(&self) -> bool {
        matches!(
            self,
            ItemKind::Fn | ItemKind::Closure | ItemKind::TraitMethod { .. } | ItemKind::ImplMethod { .. }
        )
    }
}

#[derive(Clone, Debug)]
pub struct ItemDef {
    pub name: String,
    /// Path within the defining crate, e.g. `collections::vec::push`.
    pub path: String,
    pub kind: ItemKind,
    pub generics: Generics,
    pub predicates: Vec<Predicate>,
    pub span: Span,
}
