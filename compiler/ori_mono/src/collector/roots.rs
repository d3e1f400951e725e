//! Collection roots.

use ori_diagnostic::{Diagnostic, ErrorCode};
use rustc_hash::FxHashSet;
use tracing::warn;

use crate::config::{CollectionMode, MonoConfig};
use crate::ir::{ItemId, ItemKind};
use crate::provider::IrProvider;

/// Items whose instances seed the walk, sorted by id.
///
/// Generic candidates cannot be instantiated without arguments; they are
/// skipped and reported as `W7001` warnings.
pub(super) fn collect_roots(
    provider: &dyn IrProvider,
    config: &MonoConfig,
) -> (Vec<ItemId>, Vec<Diagnostic>) {
    let mut candidates: Vec<ItemId> = provider.entry_points().to_vec();

    for &item in provider.items() {
        let provenance = provider.provenance_of(item);
        if !provenance.is_local() {
            continue;
        }
        let def = provider.item(item);
        let instantiable = def.kind.is_callable() || matches!(def.kind, ItemKind::Static);
        if !instantiable {
            continue;
        }

        let eager_fn = config.collection_mode == CollectionMode::Eager
            && matches!(def.kind, ItemKind::Fn | ItemKind::ImplMethod { .. })
            && def.generics.is_empty()
            && provider.body_of(item).is_some();

        if provenance.forced_linkage || matches!(def.kind, ItemKind::Static) || eager_fn {
            candidates.push(item);
        }
    }

    let mut seen = FxHashSet::default();
    let mut roots = Vec::with_capacity(candidates.len());
    let mut warnings = Vec::new();

    for item in candidates {
        if !seen.insert(item) {
            continue;
        }
        let def = provider.item(item);
        if def.generics.is_empty() {
            roots.push(item);
        } else {
            let warning = Diagnostic::warning(ErrorCode::W7001)
                .with_message(format!(
                    "`{}` is generic and cannot be a monomorphization root",
                    def.path
                ))
                .with_label(def.span, "declared here");
            warn!(item = %def.path, "{warning}");
            warnings.push(warning);
        }
    }

    roots.sort_unstable();
    (roots, warnings)
}
