//! Substitution of generic arguments into types.
//!
//! `Param(i)` is replaced by slot `i` of the argument list. Subtrees
//! without the `NEEDS_SUBST` flag are returned as-is without being walked.

use thiserror::Error;

use super::{Const, GenericArg, GenericArgs, Ty, TyInterner, TyKind, TyList};

/// A parameter could not be replaced.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
pub enum SubstError {
    /// The parameter index is outside the argument list.
    #[error("parameter #{index} escapes its generics ({arg_count} argument(s) supplied)")]
    EscapingParam { index: u32, arg_count: usize },
    /// A type parameter received a const argument or the other way around.
    #[error("parameter #{index} received an argument of the wrong kind")]
    KindMismatch { index: u32 },
}

/// Replace every parameter in `ty` with the corresponding slot of `args`.
pub fn subst(types: &TyInterner, ty: Ty, args: &[GenericArg]) -> Result<Ty, SubstError> {
    if !types.flags(ty).has_params() {
        return Ok(ty);
    }

    let folded = match types.kind(ty) {
        TyKind::Param(index) => {
            return match lookup(index, args)? {
                GenericArg::Type(arg) => Ok(arg),
                GenericArg::Const(_) => Err(SubstError::KindMismatch { index }),
            };
        }
        TyKind::Tuple(elems) => TyKind::Tuple(subst_list(types, &elems, args)?),
        TyKind::Array(elem, len) => {
            TyKind::Array(subst(types, elem, args)?, subst_const(len, args)?)
        }
        TyKind::Slice(elem) => TyKind::Slice(subst(types, elem, args)?),
        TyKind::Ref(elem, mutbl) => TyKind::Ref(subst(types, elem, args)?, mutbl),
        TyKind::RawPtr(elem, mutbl) => TyKind::RawPtr(subst(types, elem, args)?, mutbl),
        TyKind::Boxed(elem) => TyKind::Boxed(subst(types, elem, args)?),
        TyKind::Adt(adt, inner) => TyKind::Adt(adt, subst_args(types, &inner, args)?),
        TyKind::FnDef(item, inner) => TyKind::FnDef(item, subst_args(types, &inner, args)?),
        TyKind::Closure(item, inner) => {
            TyKind::Closure(item, subst_args(types, &inner, args)?)
        }
        TyKind::FnPtr(inputs, output) => TyKind::FnPtr(
            subst_list(types, &inputs, args)?,
            subst(types, output, args)?,
        ),
        // No parameters below these.
        kind @ (TyKind::Bool
        | TyKind::Char
        | TyKind::Int(_)
        | TyKind::Uint(_)
        | TyKind::Float(_)
        | TyKind::Str
        | TyKind::Never
        | TyKind::Dynamic(_)) => kind,
    };

    Ok(types.intern(folded))
}

/// Substitute into every slot of an argument list.
pub fn subst_args(
    types: &TyInterner,
    inner: &[GenericArg],
    args: &[GenericArg],
) -> Result<GenericArgs, SubstError> {
    inner
        .iter()
        .map(|arg| match *arg {
            GenericArg::Type(ty) => subst(types, ty, args).map(GenericArg::Type),
            GenericArg::Const(ct) => subst_const(ct, args).map(GenericArg::Const),
        })
        .collect()
}

fn subst_list(types: &TyInterner, tys: &[Ty], args: &[GenericArg]) -> Result<TyList, SubstError> {
    tys.iter().map(|&ty| subst(types, ty, args)).collect()
}

fn subst_const(ct: Const, args: &[GenericArg]) -> Result<Const, SubstError> {
    match ct {
        Const::Value(_) => Ok(ct),
        Const::Param(index) => match lookup(index, args)? {
            GenericArg::Const(value) => Ok(value),
            GenericArg::Type(_) => Err(SubstError::KindMismatch { index }),
        },
    }
}

fn lookup(index: u32, args: &[GenericArg]) -> Result<GenericArg, SubstError> {
    args.get(index as usize)
        .copied()
        .ok_or(SubstError::EscapingParam {
            index,
            arg_count: args.len(),
        })
}
