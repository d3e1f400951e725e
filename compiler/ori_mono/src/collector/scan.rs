//! Neighbor discovery: what one instance needs.
//!
//! Function and static bodies are substituted with the instance's
//! arguments and scanned for calls, reifications, static references, drops
//! and unsizing coercions. Drop glue and vtable shims have no stored body;
//! their neighbors follow from the type or method they stand for.

use ori_diagnostic::Span;

use super::usage::UsageKind;
use super::Collector;
use crate::error::{MonoError, UnresolvedReason};
use crate::instance::{make_instance, make_vtable_shim, no_impl, resolve_callee, Instance, InstanceDef};
use crate::ir::{CallKind, ItemId, ItemKind};
use crate::provider::Resolution;
use crate::ty::{subst, subst_args, ty_args, GenericArgs, Ty, TyKind, TyPrinter};

/// One use discovered in a body.
#[derive(Clone, Debug)]
pub(super) struct Neighbor {
    pub instance: Instance,
    pub kind: UsageKind,
    pub span: Span,
}

impl Collector<'_> {
    pub(super) fn scan(&self, instance: &Instance) -> Result<Vec<Neighbor>, MonoError> {
        match instance.def {
            InstanceDef::Item(item) | InstanceDef::Static(item) => self.scan_body(instance, item),
            InstanceDef::DropGlue => self.scan_drop_glue(instance),
            InstanceDef::VTableShim(method) => {
                let target = make_instance(self.poly, method, &instance.args)
                    .map_err(|reason| self.unresolved(method, &instance.args, reason, Span::DUMMY))?;
                Ok(vec![Neighbor {
                    instance: target,
                    kind: UsageKind::Call,
                    span: Span::DUMMY,
                }])
            }
        }
    }

    fn scan_body(&self, instance: &Instance, item: ItemId) -> Result<Vec<Neighbor>, MonoError> {
        let provider = self.provider;
        let types = provider.types();
        let args = &instance.args;
        let Some(body) = provider.body_of(item) else {
            let span = provider.item(item).span;
            return Err(self.unresolved(item, args, UnresolvedReason::MissingBody, span));
        };

        let mut out = Vec::new();

        for site in body.calls() {
            let callee_args = subst_args(types, site.args, args)
                .map_err(|e| self.unresolved(site.callee, site.args, e.into(), site.span))?;
            let resolved = resolve_callee(self.poly, site.callee, &callee_args)
                .map_err(|reason| self.unresolved(site.callee, &callee_args, reason, site.span))?;
            if let Some(target) = resolved {
                let kind = match site.kind {
                    CallKind::Direct => UsageKind::Call,
                    CallKind::FnPointer => UsageKind::FnPointer,
                };
                out.push(Neighbor {
                    instance: target,
                    kind,
                    span: site.span,
                });
            }
        }

        for (target, span) in body.static_refs() {
            let target_instance = make_instance(self.poly, target, &GenericArgs::new())
                .map_err(|reason| self.unresolved(target, &GenericArgs::new(), reason, span))?;
            out.push(Neighbor {
                instance: target_instance,
                kind: UsageKind::Static,
                span,
            });
        }

        for (ty, span) in body.drops() {
            let ty = subst(types, ty, args).map_err(|e| self.unresolved(item, args, e.into(), span))?;
            if let Some(glue) = self.drops.glue_instance(ty) {
                out.push(Neighbor {
                    instance: glue,
                    kind: UsageKind::Drop,
                    span,
                });
            }
        }

        for (source, target, span) in body.unsize_coercions() {
            let source = subst(types, source, args).map_err(|e| self.unresolved(item, args, e.into(), span))?;
            let target = subst(types, target, args).map_err(|e| self.unresolved(item, args, e.into(), span))?;
            if let Some((concrete, trait_id)) = self.unsize_pointees(source, target) {
                self.vtable_entries(concrete, trait_id, span, &mut out)?;
            }
        }

        Ok(out)
    }

    fn scan_drop_glue(&self, instance: &Instance) -> Result<Vec<Neighbor>, MonoError> {
        let Some(ty) = instance.drop_glue_ty() else {
            return Ok(Vec::new());
        };
        let components = self.drops.components(ty).map_err(|e| MonoError::UnresolvedInstance {
            instance: instance.display(self.provider).to_string(),
            reason: e.into(),
            span: Span::DUMMY,
        })?;

        let mut out = Vec::with_capacity(components.children.len() + 1);
        if let Some((method, args)) = components.drop_impl {
            let target = make_instance(self.poly, method, &args)
                .map_err(|reason| self.unresolved(method, &args, reason, Span::DUMMY))?;
            out.push(Neighbor {
                instance: target,
                kind: UsageKind::Call,
                span: Span::DUMMY,
            });
        }
        for child in components.children {
            if let Some(glue) = self.drops.glue_instance(child) {
                out.push(Neighbor {
                    instance: glue,
                    kind: UsageKind::Drop,
                    span: Span::DUMMY,
                });
            }
        }
        Ok(out)
    }

    /// Walk matching pointer layers of a coercion down to `T -> dyn Trait`.
    ///
    /// Returns `None` for coercions that do not create a trait object, and
    /// for `dyn A -> dyn B` where the vtable already exists.
    fn unsize_pointees(&self, source: Ty, target: Ty) -> Option<(Ty, ItemId)> {
        let types = self.provider.types();
        let (mut source, mut target) = (source, target);
        loop {
            match (types.kind(source), types.kind(target)) {
                (TyKind::Dynamic(_), _) => return None,
                (_, TyKind::Dynamic(trait_id)) => return Some((source, trait_id)),
                (TyKind::Ref(s, _), TyKind::Ref(t, _))
                | (TyKind::RawPtr(s, _), TyKind::RawPtr(t, _))
                | (TyKind::Ref(s, _), TyKind::RawPtr(t, _))
                | (TyKind::Boxed(s), TyKind::Boxed(t)) => {
                    source = s;
                    target = t;
                }
                _ => return None,
            }
        }
    }

    /// Everything a vtable for `concrete: trait_id` points at: the drop
    /// glue and one shim per object-safe method.
    fn vtable_entries(
        &self,
        concrete: Ty,
        trait_id: ItemId,
        span: Span,
        out: &mut Vec<Neighbor>,
    ) -> Result<(), MonoError> {
        let provider = self.provider;

        if let Some(glue) = self.drops.glue_instance(concrete) {
            out.push(Neighbor {
                instance: glue,
                kind: UsageKind::VTable,
                span,
            });
        }

        let ItemKind::Trait { methods } = &provider.item(trait_id).kind else {
            return Ok(());
        };
        let self_args = ty_args(&[concrete]);
        for &method in methods {
            // Methods with their own generics cannot be called through a vtable.
            if provider.item(method).generics.own_count() > 0 {
                continue;
            }
            match provider.resolve(method, &self_args) {
                Resolution::Item(target, target_args) => {
                    let shim = make_vtable_shim(self.poly, target, &target_args)
                        .map_err(|reason| self.unresolved(target, &target_args, reason, span))?;
                    out.push(Neighbor {
                        instance: shim,
                        kind: UsageKind::VTable,
                        span,
                    });
                }
                Resolution::Virtual => {}
                Resolution::Unresolved => {
                    let reason = no_impl(provider, method, &self_args);
                    return Err(self.unresolved(method, &self_args, reason, span));
                }
            }
        }
        Ok(())
    }

    pub(super) fn unresolved(
        &self,
        item: ItemId,
        args: &GenericArgs,
        reason: UnresolvedReason,
        span: Span,
    ) -> MonoError {
        let def = self.provider.item(item);
        let printer = TyPrinter::new(self.provider).with_generics(&def.generics);
        MonoError::UnresolvedInstance {
            instance: format!("{}{}", def.path, printer.args(args)),
            reason,
            span,
        }
    }
}
