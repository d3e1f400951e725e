//! Drop-glue classification.
//!
//! Decides whether dropping a concrete type runs any code and, if so, what
//! the synthesized glue calls. Results are memoized; the cache is shared by
//! all collector workers.


use dashmap::DashMap;
use rustc_hash::{FxBuildHasher, FxHashSet};

use crate::instance::Instance;
use crate::ir::{ItemId, ItemKind};
use crate::provider::IrProvider;
use crate::ty::{subst, Const, GenericArgs, SubstError, Ty, TyFlags, TyKind};

/// What a drop-glue body does for one type.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DropComponents {
    /// The user `Drop` method and the ADT's arguments.
    pub drop_impl: Option<(ItemId, GenericArgs)>,
    /// Field or element types whose own glue must run.
    pub children: Vec<Ty>,
}

pub struct DropClassifier<'a> {
    provider: &'a dyn IrProvider,
    cache: DashMap<Ty, bool, FxBuildHasher>,
}

impl<'a> DropClassifier<'a> {
    pub fn new(provider: &'a dyn IrProvider) -> Self {
        Self {
            provider,
            cache: DashMap::with_hasher(FxBuildHasher),
        }
    }

    /// Whether dropping a value of `ty` runs any code.
    pub fn needs_drop(&self, ty: Ty) -> bool {
        let mut in_progress = FxHashSet::default();
        self.classify(ty, &mut in_progress)
    }

    /// The glue instance for dropping `ty`, if one is needed.
    ///
    /// Trait objects have no static glue: their drop goes through the
    /// vtable entry created at the unsizing site.
    pub fn glue_instance(&self, ty: Ty) -> Option<Instance> {
        if matches!(self.provider.types().kind(ty), TyKind::Dynamic(_)) {
            return None;
        }
        self.needs_drop(ty).then(|| Instance::drop_glue(ty))
    }

    /// Core classification with caching and cycle detection.
    fn classify(&self, ty: Ty, in_progress: &mut FxHashSet<Ty>) -> bool {
        if self
            .provider
            .types()
            .flags(ty)
            .contains(TyFlags::IS_PRIMITIVE)
        {
            return false;
        }

        if let Some(cached) = self.cache.get(&ty).map(|entry| *entry) {
            return cached;
        }

        // A type containing itself by value is not representable; whatever
        // the outer query decides covers it.
        if !in_progress.insert(ty) {
            return false;
        }

        let result = self.classify_by_kind(ty, in_progress);

        in_progress.remove(&ty);
        self.cache.insert(ty, result);
        result
    }

    fn classify_by_kind(&self, ty: Ty, in_progress: &mut FxHashSet<Ty>) -> bool {
        let types = self.provider.types();
        match types.kind(ty) {
            TyKind::Bool
            | TyKind::Char
            | TyKind::Int(_)
            | TyKind::Uint(_)
            | TyKind::Float(_)
            | TyKind::Str
            | TyKind::Never
            | TyKind::Ref(..)
            | TyKind::RawPtr(..)
            | TyKind::FnDef(..)
            | TyKind::FnPtr(..)
            | TyKind::Closure(..) => false,

            // Owning pointers and unknowns.
            TyKind::Boxed(_) | TyKind::Dynamic(_) | TyKind::Param(_) => true,

            TyKind::Tuple(elems) => elems.iter().any(|&elem| self.classify(elem, in_progress)),
            TyKind::Array(_, Const::Value(0)) => false,
            TyKind::Array(elem, _) | TyKind::Slice(elem) => self.classify(elem, in_progress),

            TyKind::Adt(adt, args) => {
                if self.provider.drop_impl_of(adt).is_some() {
                    return true;
                }
                let ItemKind::Adt { fields } = &self.provider.item(adt).kind else {
                    return false;
                };
                fields.iter().any(|&field| match subst(types, field, &args) {
                    Ok(field_ty) => self.classify(field_ty, in_progress),
                    Err(_) => true,
                })
            }
        }
    }

    /// What the glue for `ty` calls. Only meaningful when `needs_drop(ty)`.
    pub fn components(&self, ty: Ty) -> Result<DropComponents, SubstError> {
        let types = self.provider.types();
        let mut components = DropComponents::default();

        let candidates: Vec<Ty> = match types.kind(ty) {
            TyKind::Tuple(elems) => elems.to_vec(),
            TyKind::Array(elem, _) | TyKind::Slice(elem) => vec![elem],
            // Boxed trait objects drop through their vtable.
            TyKind::Boxed(inner) => match types.kind(inner) {
                TyKind::Dynamic(_) => Vec::new(),
                _ => vec![inner],
            },
            TyKind::Adt(adt, args) => {
                components.drop_impl = self.provider.drop_impl_of(adt).map(|m| (m, args.clone()));
                match &self.provider.item(adt).kind {
                    ItemKind::Adt { fields } => fields
                        .iter()
                        .map(|&field| subst(types, field, &args))
                        .collect::<Result<_, _>>()?,
                    _ => Vec::new(),
                }
            }
            _ => Vec::new(),
        };

        components.children = candidates
            .into_iter()
            .filter(|&child| self.needs_drop(child))
            .collect();
        Ok(components)
    }
}
