//! The presence analysis behind [`Polymorphizer`].
//!
//! A parameter is used when it appears anywhere codegen could observe it:
//! a local's type, an operand type (including layout queries), or the
//! arguments of a callee. Child closures are the one refinement: only the
//! positions the closure itself uses count as uses by the parent.
//! Predicates then spread usage to every parameter they relate.

use crate::ir::{ItemId, ItemKind, OpKind};
use crate::ty::{Const, GenericArg, Ty, TyInterner, TyKind};

use super::{Polymorphizer, UnusedParamSet};

pub(super) fn unused_params(poly: &Polymorphizer<'_>, item: ItemId) -> UnusedParamSet {
    let provider = poly.provider();
    let def = provider.item(item);
    let count = def.generics.count();
    if count == 0 {
        return UnusedParamSet::all_used();
    }
    // Declarations without a body are resolved elsewhere; nothing to prove.
    let Some(body) = provider.body_of(item) else {
        return UnusedParamSet::all_used();
    };

    let types = provider.types();
    let mut unused = UnusedParamSet::all_unused(count);
    let mut mark = |index: u32| unused.mark_used(index as usize);

    for &local in &body.locals {
        visit_ty(types, local, &mut mark);
    }

    for op in &body.ops {
        match &op.kind {
            OpKind::Use { ty } | OpKind::Drop { ty } | OpKind::Layout { ty, .. } => {
                visit_ty(types, *ty, &mut mark);
            }
            OpKind::Unsize { source, target } => {
                visit_ty(types, *source, &mut mark);
                visit_ty(types, *target, &mut mark);
            }
            OpKind::Call { callee, args } | OpKind::ReifyFnPtr { callee, args } => {
                let callee_def = provider.item(*callee);
                let is_child_closure = matches!(callee_def.kind, ItemKind::Closure)
                    && callee_def.generics.parent == Some(item);
                if is_child_closure {
                    let closure_unused = poly.unused_generic_params(*callee);
                    for (i, arg) in args.iter().enumerate() {
                        if !closure_unused.is_unused(i) {
                            visit_arg(types, *arg, &mut mark);
                        }
                    }
                } else {
                    for arg in args {
                        visit_arg(types, *arg, &mut mark);
                    }
                }
            }
            OpKind::StaticRef { .. } => {}
        }
    }

    propagate_predicates(poly, item, &mut unused);
    unused
}

/// Fixpoint: a predicate touching a used parameter uses all it mentions.
fn propagate_predicates(poly: &Polymorphizer<'_>, item: ItemId, unused: &mut UnusedParamSet) {
    let provider = poly.provider();
    let types = provider.types();
    let predicates = &provider.item(item).predicates;
    if predicates.is_empty() {
        return;
    }

    let mentioned: Vec<Vec<u32>> = predicates
        .iter()
        .map(|predicate| {
            let mut params = Vec::new();
            let mut push = |index: u32| params.push(index);
            visit_ty(types, predicate.subject, &mut push);
            for arg in &predicate.args {
                visit_arg(types, *arg, &mut push);
            }
            params
        })
        .collect();

    loop {
        let mut changed = false;
        for params in &mentioned {
            let touches_used = params.iter().any(|&p| !unused.is_unused(p as usize));
            if !touches_used {
                continue;
            }
            for &p in params {
                if unused.is_unused(p as usize) {
                    unused.mark_used(p as usize);
                    changed = true;
                }
            }
        }
        if !changed {
            break;
        }
    }
}

fn visit_arg(types: &TyInterner, arg: GenericArg, f: &mut impl FnMut(u32)) {
    match arg {
        GenericArg::Type(ty) => visit_ty(types, ty, f),
        GenericArg::Const(ct) => visit_const(ct, f),
    }
}

fn visit_const(ct: Const, f: &mut impl FnMut(u32)) {
    if let Const::Param(index) = ct {
        f(index);
    }
}

/// Call `f` for every parameter index mentioned in `ty`.
fn visit_ty(types: &TyInterner, ty: Ty, f: &mut impl FnMut(u32)) {
    if !types.has_params(ty) {
        return;
    }
    match types.kind(ty) {
        TyKind::Param(index) => f(index),
        TyKind::Tuple(elems) => {
            for elem in elems {
                visit_ty(types, elem, f);
            }
        }
        TyKind::Array(elem, len) => {
            visit_ty(types, elem, f);
            visit_const(len, f);
        }
        TyKind::Slice(elem)
        | TyKind::Ref(elem, _)
        | TyKind::RawPtr(elem, _)
        | TyKind::Boxed(elem) => visit_ty(types, elem, f),
        TyKind::Adt(_, args) | TyKind::FnDef(_, args) | TyKind::Closure(_, args) => {
            for arg in args {
                visit_arg(types, arg, f);
            }
        }
        TyKind::FnPtr(inputs, output) => {
            for input in inputs {
                visit_ty(types, input, f);
            }
            visit_ty(types, output, f);
        }
        TyKind::Bool
        | TyKind::Char
        | TyKind::Int(_)
        | TyKind::Uint(_)
        | TyKind::Float(_)
        | TyKind::Str
        | TyKind::Never
        | TyKind::Dynamic(_) => {}
    }
}
