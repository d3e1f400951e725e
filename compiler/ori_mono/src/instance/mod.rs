//! Instances: an item (or compiler-made body) paired with its arguments.
//!
//! The arguments stored in an [`Instance`] are already normalized by the
//! polymorphization analyzer, so equality and hashing are equality of the
//! code that will be generated.

mod call_site;
mod symbol;


use std::fmt;

use crate::error::UnresolvedReason;
use crate::ir::{ItemId, ItemKind, Provenance, RegionId};
use crate::polymorphize::{normalize_with, Polymorphizer, UnusedParamSet};
use crate::provider::{IrProvider, Resolution};
use crate::ty::{GenericArg, GenericArgs, Ty, TyPrinter};

pub use call_site::resolve_call_site;
pub use symbol::{symbol_name, SymbolName};

/// What an instance instantiates.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum InstanceDef {
    /// A function, closure or method body.
    Item(ItemId),
    /// A static's initializer.
    Static(ItemId),
    /// Compiler-made drop glue for `args[0]`.
    DropGlue,
    /// Entry in a vtable forwarding to the implementing method.
    VTableShim(ItemId),
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum InstanceKind {
    Fn,
    Static,
    DropGlue,
    VTableShim,
}

impl InstanceDef {
    pub fn kind(self) -> InstanceKind {
        match self {
            InstanceDef::Item(_) => InstanceKind::Fn,
            InstanceDef::Static(_) => InstanceKind::Static,
            InstanceDef::DropGlue => InstanceKind::DropGlue,
            InstanceDef::VTableShim(_) => InstanceKind::VTableShim,
        }
    }

    /// The item behind this instance; `None` for drop glue.
    pub fn item(self) -> Option<ItemId> {
        match self {
            InstanceDef::Item(item) | InstanceDef::Static(item) | InstanceDef::VTableShim(item) => {
                Some(item)
            }
            InstanceDef::DropGlue => None,
        }
    }
}

#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct Instance {
    pub def: InstanceDef,
    pub args: GenericArgs,
}

impl Instance {
    /// Drop glue for a concrete type.
    pub fn drop_glue(ty: Ty) -> Self {
        Self {
            def: InstanceDef::DropGlue,
            args: std::iter::once(GenericArg::Type(ty)).collect(),
        }
    }

    pub fn kind(&self) -> InstanceKind {
        self.def.kind()
    }

    pub fn item(&self) -> Option<ItemId> {
        self.def.item()
    }

    /// The type a drop-glue instance drops.
    pub fn drop_glue_ty(&self) -> Option<Ty> {
        match self.def {
            InstanceDef::DropGlue => self.args.first().and_then(|arg| arg.as_type()),
            _ => None,
        }
    }

    /// Human-readable form, e.g. `peach<u64>` or `drop-glue<Vec<u8>>`.
    pub fn display<'a>(&'a self, provider: &'a dyn IrProvider) -> InstanceDisplay<'a> {
        InstanceDisplay {
            instance: self,
            provider,
        }
    }
}

pub struct InstanceDisplay<'a> {
    instance: &'a Instance,
    provider: &'a dyn IrProvider,
}

impl fmt::Display for InstanceDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let printer = TyPrinter::new(self.provider);
        let args = &self.instance.args;
        match self.instance.def {
            InstanceDef::DropGlue => write!(f, "drop-glue{}", printer.args(args)),
            InstanceDef::Item(item) | InstanceDef::Static(item) => {
                let def = self.provider.item(item);
                let printer = printer.with_generics(&def.generics);
                write!(f, "{}{}", def.path, printer.args(args))
            }
            InstanceDef::VTableShim(item) => {
                let def = self.provider.item(item);
                let printer = printer.with_generics(&def.generics);
                write!(f, "vtable-shim({}{})", def.path, printer.args(args))
            }
        }
    }
}

/// Build the normalized instance of `item` for `args`.
///
/// Unused slots are replaced by identity placeholders, so
/// `foo::<u16, u32>` and `foo::<u64, u32>` yield the same instance when
/// parameter 0 is unused.
pub fn make_instance(
    poly: &Polymorphizer<'_>,
    item: ItemId,
    args: &GenericArgs,
) -> Result<Instance, UnresolvedReason> {
    let provider = poly.provider();
    check_arity(provider, item, args)?;
    let unused = poly.unused_generic_params(item);
    Ok(build(provider, item, args, unused))
}

/// Resolve a callee against concrete arguments and build its instance.
///
/// `Ok(None)` means the call is virtual and needs no instance.
pub(crate) fn resolve_callee(
    poly: &Polymorphizer<'_>,
    callee: ItemId,
    args: &GenericArgs,
) -> Result<Option<Instance>, UnresolvedReason> {
    let provider = poly.provider();
    match provider.resolve(callee, args) {
        Resolution::Item(target, target_args) => {
            if !provider.item(target).kind.is_callable() {
                return Err(UnresolvedReason::NotCallable);
            }
            make_instance(poly, target, &target_args).map(Some)
        }
        Resolution::Virtual => Ok(None),
        Resolution::Unresolved => Err(no_impl(provider, callee, args)),
    }
}

/// Describe a failed trait-method resolution.
pub(crate) fn no_impl(
    provider: &dyn IrProvider,
    callee: ItemId,
    args: &GenericArgs,
) -> UnresolvedReason {
    let ItemKind::TraitMethod { trait_id } = provider.item(callee).kind else {
        return UnresolvedReason::NotCallable;
    };
    let printer = TyPrinter::new(provider);
    let self_ty = args
        .first()
        .and_then(|arg| arg.as_type())
        .map_or_else(|| "?".to_owned(), |ty| printer.ty(ty));
    UnresolvedReason::NoImpl {
        trait_path: printer.item_path(trait_id),
        self_ty,
    }
}

/// The vtable entry forwarding to `method` with `args`.
pub fn make_vtable_shim(
    poly: &Polymorphizer<'_>,
    method: ItemId,
    args: &GenericArgs,
) -> Result<Instance, UnresolvedReason> {
    let provider = poly.provider();
    check_arity(provider, method, args)?;
    let unused = poly.unused_generic_params(method);
    Ok(Instance {
        def: InstanceDef::VTableShim(method),
        args: normalize_with(provider, method, args, unused),
    })
}

fn check_arity(
    provider: &dyn IrProvider,
    item: ItemId,
    args: &GenericArgs,
) -> Result<(), UnresolvedReason> {
    let expected = provider.item(item).generics.count();
    if args.len() == expected {
        Ok(())
    } else {
        Err(UnresolvedReason::ArgCountMismatch {
            expected,
            found: args.len(),
        })
    }
}

fn build(
    provider: &dyn IrProvider,
    item: ItemId,
    args: &GenericArgs,
    unused: UnusedParamSet,
) -> Instance {
    let def = match provider.item(item).kind {
        ItemKind::Static => InstanceDef::Static(item),
        _ => InstanceDef::Item(item),
    };
    Instance {
        def,
        args: normalize_with(provider, item, args, unused),
    }
}

/// Derived data the partitioner needs about each instance.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct InstanceInfo {
    pub provenance: Provenance,
    /// Region of the characteristic item; `None` places it in the fallback
    /// region.
    pub region: Option<RegionId>,
    /// Instantiates a generic item, or is compiler-made.
    pub is_generic: bool,
    pub size_estimate: usize,
    /// The body is generated in this crate. False for external,
    /// non-generic, non-inline items, which are linked instead.
    pub codegen_locally: bool,
}

impl InstanceInfo {
    pub fn is_local(&self) -> bool {
        self.provenance.is_local()
    }
}
