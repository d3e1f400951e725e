//! Trait-method resolution by impl self-type matching.
//!
//! An impl's `self_ty` is a pattern over the impl's own parameters
//! (`impl<T> Show for Vec<T>`). Matching it against the concrete `Self`
//! binds those parameters; the implementing method is then instantiated
//! with the bound impl arguments followed by the method's own arguments.

use smallvec::SmallVec;
use tracing::trace;

use super::Program;
use crate::ir::{ItemId, ItemKind};
use crate::provider::Resolution;
use crate::ty::{Const, GenericArg, GenericArgs, Ty, TyInterner, TyKind};

impl Program {
    pub(super) fn resolve_trait_method(
        &self,
        method: ItemId,
        trait_id: ItemId,
        args: &GenericArgs,
    ) -> Resolution {
        let Some(self_ty) = args.first().and_then(|arg| arg.as_type()) else {
            return Resolution::Unresolved;
        };

        match self.types.kind(self_ty) {
            TyKind::Dynamic(object_trait) if object_trait == trait_id => {
                return Resolution::Virtual;
            }
            TyKind::Param(_) => return Resolution::Unresolved,
            _ => {}
        }

        // The trait method's generics are `Self` followed by its own.
        let method_own = &args[1..];

        for &impl_id in self.impls.get(&trait_id).map_or(&[][..], Vec::as_slice) {
            let impl_def = &self.record(impl_id).def;
            let ItemKind::Impl { self_ty: pattern, .. } = impl_def.kind else {
                continue;
            };
            let mut binds: SmallVec<[Option<GenericArg>; 4]> =
                SmallVec::from_elem(None, impl_def.generics.count());
            if !match_ty(&self.types, pattern, self_ty, &mut binds) {
                continue;
            }
            // Every impl parameter must appear in the self type.
            let Some(impl_args) = binds.into_iter().collect::<Option<GenericArgs>>() else {
                continue;
            };

            if let Some(&target) = self.impl_methods.get(&(impl_id, method)) {
                let mut target_args = impl_args;
                target_args.extend_from_slice(method_own);
                trace!(?method, ?target, "resolved through impl");
                return Resolution::Item(target, target_args);
            }
            // Default method body in the trait.
            if self.record(method).body.is_some() {
                return Resolution::Item(method, args.clone());
            }
            return Resolution::Unresolved;
        }

        Resolution::Unresolved
    }
}

/// Structurally match `pattern` against `concrete`, binding impl parameters.
fn match_ty(
    types: &TyInterner,
    pattern: Ty,
    concrete: Ty,
    binds: &mut [Option<GenericArg>],
) -> bool {
    if pattern == concrete && !types.has_params(pattern) {
        return true;
    }

    match (types.kind(pattern), types.kind(concrete)) {
        (TyKind::Param(index), _) => bind(binds, index, GenericArg::Type(concrete)),
        (TyKind::Tuple(ps), TyKind::Tuple(cs)) => {
            ps.len() == cs.len()
                && ps
                    .iter()
                    .zip(cs.iter())
                    .all(|(&p, &c)| match_ty(types, p, c, binds))
        }
        (TyKind::Array(p, plen), TyKind::Array(c, clen)) => {
            match_ty(types, p, c, binds)
                && match_arg(types, GenericArg::Const(plen), GenericArg::Const(clen), binds)
        }
        (TyKind::Slice(p), TyKind::Slice(c)) | (TyKind::Boxed(p), TyKind::Boxed(c)) => {
            match_ty(types, p, c, binds)
        }
        (TyKind::Ref(p, pm), TyKind::Ref(c, cm)) | (TyKind::RawPtr(p, pm), TyKind::RawPtr(c, cm)) => {
            pm == cm && match_ty(types, p, c, binds)
        }
        (TyKind::Adt(padt, pargs), TyKind::Adt(cadt, cargs)) => {
            padt == cadt && match_args(types, &pargs, &cargs, binds)
        }
        (TyKind::FnPtr(pins, pout), TyKind::FnPtr(cins, cout)) => {
            pins.len() == cins.len()
                && pins
                    .iter()
                    .zip(cins.iter())
                    .all(|(&p, &c)| match_ty(types, p, c, binds))
                && match_ty(types, pout, cout, binds)
        }
        _ => false,
    }
}

fn match_args(
    types: &TyInterner,
    patterns: &[GenericArg],
    concrete: &[GenericArg],
    binds: &mut [Option<GenericArg>],
) -> bool {
    patterns.len() == concrete.len()
        && patterns
            .iter()
            .zip(concrete)
            .all(|(&p, &c)| match_arg(types, p, c, binds))
}

fn match_arg(
    types: &TyInterner,
    pattern: GenericArg,
    concrete: GenericArg,
    binds: &mut [Option<GenericArg>],
) -> bool {
    match (pattern, concrete) {
        (GenericArg::Type(p), GenericArg::Type(c)) => match_ty(types, p, c, binds),
        (GenericArg::Const(Const::Param(index)), GenericArg::Const(_)) => {
            bind(binds, index, concrete)
        }
        (GenericArg::Const(p), GenericArg::Const(c)) => p == c,
        _ => false,
    }
}

fn bind(binds: &mut [Option<GenericArg>], index: u32, value: GenericArg) -> bool {
    let Some(slot) = binds.get_mut(index as usize) else {
        return false;
    };
    match slot {
        Some(existing) => *existing == value,
        None => {
            *slot = Some(value);
            true
        }
    }
}
