//! Late call-site resolution against a frozen analyzer table.
//!
//! Code generation resolves calls after collection has finished. It must
//! pick exactly the instance the collector produced, so the unused set is
//! recomputed from scratch and compared with the frozen table before the
//! instance is built.

use ori_diagnostic::Span;

use super::{build, check_arity, no_impl, Instance};
use crate::config::MonoConfig;
use crate::error::{MonoError, UnresolvedReason};
use crate::ir::ItemId;
use crate::polymorphize::{Polymorphizer, UnusedParamTable};
use crate::provider::{IrProvider, Resolution};
use crate::ty::{GenericArgs, TyPrinter};

/// Resolve `callee::<args>` to its normalized instance.
///
/// Fails with `AnalyzerInconsistency` when the fresh analysis disagrees
/// with `table`.
pub fn resolve_call_site(
    provider: &dyn IrProvider,
    config: &MonoConfig,
    table: &UnusedParamTable,
    callee: ItemId,
    args: &GenericArgs,
) -> Result<Instance, MonoError> {
    let unresolved = |reason: UnresolvedReason| {
        let def = provider.item(callee);
        let printer = TyPrinter::new(provider).with_generics(&def.generics);
        MonoError::UnresolvedInstance {
            instance: format!("{}{}", def.path, printer.args(args)),
            reason,
            span: Span::DUMMY,
        }
    };

    let (target, target_args) = match provider.resolve(callee, args) {
        Resolution::Item(target, target_args) => (target, target_args),
        Resolution::Virtual => return Err(unresolved(UnresolvedReason::VirtualCall)),
        Resolution::Unresolved => return Err(unresolved(no_impl(provider, callee, args))),
    };
    check_arity(provider, target, &target_args).map_err(unresolved)?;

    let checker = Polymorphizer::with_cache(provider, config, table);
    let unused = checker.verify(target);
    checker.freeze()?;

    Ok(build(provider, target, &target_args, unused))
}
