//! Concrete and generic types as seen by monomorphization.
//!
//! `Ty` is a 32-bit handle into a sharded [`TyInterner`]. Interning is
//! structural, so two handles are equal exactly when the types they name
//! are equal. This is what lets an [`Instance`](crate::Instance) hash and
//! compare its argument list in O(n) handle comparisons.
//!
//! # Layout
//!
//! - Primitive types live at fixed handles in shard 0 (`Ty::BOOL` .. `Ty::UNIT`)
//! - Everything else is placed by hashing its [`TyKind`]
//! - [`TyFlags`] are computed once at interning time
//!
//! Substitution lives in [`subst`], rendering in [`format`].

mod flags;
mod format;
mod interner;
mod subst;

#[cfg(test)]
mod tests;

use std::fmt;

use smallvec::SmallVec;

use crate::ir::ItemId;

pub use flags::TyFlags;
pub use format::TyPrinter;
pub use interner::TyInterner;
pub use subst::{subst, subst_args, SubstError};

/// A handle to an interned type.
///
/// Handles are only meaningful together with the [`TyInterner`] that
/// produced them. Use [`TyPrinter`] for anything that must be stable across
/// runs; the raw handle value depends on interning order.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Ty(u32);

impl Ty {
    // === Pre-interned primitives (shard 0, indices 0-17) ===

    pub const BOOL: Self = Self(0);
    pub const CHAR: Self = Self(1);
    pub const I8: Self = Self(2);
    pub const I16: Self = Self(3);
    pub const I32: Self = Self(4);
    pub const I64: Self = Self(5);
    pub const I128: Self = Self(6);
    pub const ISIZE: Self = Self(7);
    pub const U8: Self = Self(8);
    pub const U16: Self = Self(9);
    pub const U32: Self = Self(10);
    pub const U64: Self = Self(11);
    pub const U128: Self = Self(12);
    pub const USIZE: Self = Self(13);
    pub const F32: Self = Self(14);
    pub const F64: Self = Self(15);
    pub const STR: Self = Self(16);
    pub const NEVER: Self = Self(17);
    /// The empty tuple `()`.
    pub const UNIT: Self = Self(18);

    /// Number of pre-interned handles.
    pub(crate) const PRIMITIVE_COUNT: u32 = 19;

    const SHARD_SHIFT: u32 = 28;
    const LOCAL_MASK: u32 = (1 << Self::SHARD_SHIFT) - 1;

    #[inline]
    pub(crate) const fn from_parts(shard: u32, local: u32) -> Self {
        Self((shard << Self::SHARD_SHIFT) | local)
    }

    #[inline]
    pub(crate) const fn shard(self) -> usize {
        (self.0 >> Self::SHARD_SHIFT) as usize
    }

    #[inline]
    pub(crate) const fn local(self) -> usize {
        (self.0 & Self::LOCAL_MASK) as usize
    }

    /// Largest local index a shard can hand out.
    pub(crate) const MAX_LOCAL: u32 = Self::LOCAL_MASK;

    /// Raw handle value, for debugging output only.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ty({}:{})", self.shard(), self.local())
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum IntTy {
    I8,
    I16,
    I32,
    I64,
    I128,
    Isize,
}

impl IntTy {
    pub const fn name(self) -> &'static str {
        match self {
            IntTy::I8 => "i8",
            IntTy::I16 => "i16",
            IntTy::I32 => "i32",
            IntTy::I64 => "i64",
            IntTy::I128 => "i128",
            IntTy::Isize => "isize",
        }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum UintTy {
    U8,
    U16,
    U32,
    U64,
    U128,
    Usize,
}

impl UintTy {
    pub const fn name(self) -> &'static str {
        match self {
            UintTy::U8 => "u8",
            UintTy::U16 => "u16",
            UintTy::U32 => "u32",
            UintTy::U64 => "u64",
            UintTy::U128 => "u128",
            UintTy::Usize => "usize",
        }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum FloatTy {
    F32,
    F64,
}

impl FloatTy {
    pub const fn name(self) -> &'static str {
        match self {
            FloatTy::F32 => "f32",
            FloatTy::F64 => "f64",
        }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Mutability {
    Not,
    Mut,
}

/// A type list stored inline for the common short case.
pub type TyList = SmallVec<[Ty; 4]>;

/// The structure of a type.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum TyKind {
    Bool,
    Char,
    Int(IntTy),
    Uint(UintTy),
    Float(FloatTy),
    Str,
    Never,
    Tuple(TyList),
    Array(Ty, Const),
    Slice(Ty),
    Ref(Ty, Mutability),
    RawPtr(Ty, Mutability),
    /// Owning heap pointer. Dropping it runs the pointee's drop glue.
    Boxed(Ty),
    /// A nominal struct or enum.
    Adt(ItemId, GenericArgs),
    /// A trait object `dyn Trait`.
    Dynamic(ItemId),
    /// The zero-sized type of a specific function item.
    FnDef(ItemId, GenericArgs),
    FnPtr(TyList, Ty),
    Closure(ItemId, GenericArgs),
    /// The type parameter at this position of the enclosing generics.
    Param(u32),
}

impl TyKind {
    /// The fixed handle for kinds that are pre-interned.
    pub(crate) fn primitive(&self) -> Option<Ty> {
        Some(match self {
            TyKind::Bool => Ty::BOOL,
            TyKind::Char => Ty::CHAR,
            TyKind::Int(int) => match int {
                IntTy::I8 => Ty::I8,
                IntTy::I16 => Ty::I16,
                IntTy::I32 => Ty::I32,
                IntTy::I64 => Ty::I64,
                IntTy::I128 => Ty::I128,
                IntTy::Isize => Ty::ISIZE,
            },
            TyKind::Uint(uint) => match uint {
                UintTy::U8 => Ty::U8,
                UintTy::U16 => Ty::U16,
                UintTy::U32 => Ty::U32,
                UintTy::U64 => Ty::U64,
                UintTy::U128 => Ty::U128,
                UintTy::Usize => Ty::USIZE,
            },
            TyKind::Float(FloatTy::F32) => Ty::F32,
            TyKind::Float(FloatTy::F64) => Ty::F64,
            TyKind::Str => Ty::STR,
            TyKind::Never => Ty::NEVER,
            TyKind::Tuple(elems) if elems.is_empty() => Ty::UNIT,
            _ => return None,
        })
    }

    /// Kinds in handle order for `Ty::BOOL..=Ty::UNIT`.
    pub(crate) fn primitives() -> [TyKind; Ty::PRIMITIVE_COUNT as usize] {
        [
            TyKind::Bool,
            TyKind::Char,
            TyKind::Int(IntTy::I8),
            TyKind::Int(IntTy::I16),
            TyKind::Int(IntTy::I32),
            TyKind::Int(IntTy::I64),
            TyKind::Int(IntTy::I128),
            TyKind::Int(IntTy::Isize),
            TyKind::Uint(UintTy::U8),
            TyKind::Uint(UintTy::U16),
            TyKind::Uint(UintTy::U32),
            TyKind::Uint(UintTy::U64),
            TyKind::Uint(UintTy::U128),
            TyKind::Uint(UintTy::Usize),
            TyKind::Float(FloatTy::F32),
            TyKind::Float(FloatTy::F64),
            TyKind::Str,
            TyKind::Never,
            TyKind::Tuple(TyList::new()),
        ]
    }
}

/// A const generic value or parameter.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Const {
    Value(u128),
    Param(u32),
}

/// One slot of a generic argument list.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum GenericArg {
    Type(Ty),
    Const(Const),
}

impl GenericArg {
    pub fn as_type(self) -> Option<Ty> {
        match self {
            GenericArg::Type(ty) => Some(ty),
            GenericArg::Const(_) => None,
        }
    }
}

impl From<Ty> for GenericArg {
    fn from(ty: Ty) -> Self {
        GenericArg::Type(ty)
    }
}

impl From<Const> for GenericArg {
    fn from(ct: Const) -> Self {
        GenericArg::Const(ct)
    }
}

/// An ordered generic argument list, one slot per generic parameter.
pub type GenericArgs = SmallVec<[GenericArg; 4]>;

/// Build a type-only argument list.
pub fn ty_args(tys: &[Ty]) -> GenericArgs {
    tys.iter().copied().map(GenericArg::Type).collect()
}

/// Whether any slot mentions a type or const parameter.
pub fn args_have_params(types: &TyInterner, args: &[GenericArg]) -> bool {
    args.iter().any(|arg| match arg {
        GenericArg::Type(ty) => types.flags(*ty).has_params(),
        GenericArg::Const(Const::Param(_)) => true,
        GenericArg::Const(Const::Value(_)) => false,
    })
}

/// Total type length of an argument list (consts count as one node).
/// Deepest type nesting among the arguments; const arguments count as 1 and
/// an empty list as 0.
///
/// Finitely many type constructors appear in a program, so an unbounded set
/// of instances must have unbounded argument depth.
pub fn args_type_depth(types: &TyInterner, args: &[GenericArg]) -> usize {
    args.iter()
        .map(|arg| match arg {
            GenericArg::Type(ty) => types.type_depth(*ty),
            GenericArg::Const(_) => 1,
        })
        .max()
        .unwrap_or(0)
}

pub fn args_type_length(types: &TyInterner, args: &[GenericArg]) -> usize {
    args.iter().fold(0usize, |acc, arg| {
        let len = match arg {
            GenericArg::Type(ty) => types.type_length(*ty),
            GenericArg::Const(_) => 1,
        };
        acc.saturating_add(len)
    })
}
