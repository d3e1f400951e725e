//! Monomorphization for the Ori compiler.
//!
//! Turns a whole-program view of typed, generic IR into the concrete set of
//! instances code generation has to emit, grouped into codegen units.
//!
//! # Pipeline
//!
//! ```text
//! IrProvider ──► collector ──► MonoItems ──► partition ──► Vec<CodegenUnit>
//!                    │
//!                    └── Polymorphizer (unused generic parameters)
//! ```
//!
//! - [`collector`]: reachability from entry points, statics and
//!   forced-linkage items, producing instances and a usage graph
//! - [`polymorphize`]: which generic parameters an item never depends on,
//!   so instantiations differing only there share one instance
//! - [`partition`]: placement into stable, volatile and external units,
//!   merging, internalization
//!
//! Front ends implement [`IrProvider`]; [`program::Program`] is a
//! ready-made in-memory implementation.
//!
//! # Debug Environment Variables
//!
//! - `RUST_LOG=ori_mono=debug`: phase summaries (roots, unit counts,
//!   polymorphized items).
//! - `RUST_LOG=ori_mono::collector=trace`: every instance as it is claimed.

pub mod collector;
pub mod config;
pub mod error;
pub mod instance;
pub mod ir;
pub mod partition;
pub mod polymorphize;
pub mod program;
pub mod provider;
pub mod ty;

#[cfg(test)]
mod test_helpers;


use std::fmt::Write;
use std::sync::Once;

pub use collector::{collect, MonoItems, NodeId, UsageGraph, UsageKind};
pub use config::{CollectionMode, MonoConfig};
pub use error::{MonoError, UnresolvedReason};
pub use instance::{
    make_instance, make_vtable_shim, resolve_call_site, symbol_name, Instance, InstanceDef,
    InstanceInfo, InstanceKind, SymbolName,
};
pub use partition::{partition, CodegenUnit, Linkage, MonoItemData};
pub use polymorphize::{Polymorphizer, UnusedParamSet, UnusedParamTable};
pub use provider::{IrProvider, Resolution};

static TRACING_INIT: Once = Once::new();

/// Initialize tracing from `RUST_LOG`.
///
/// Does nothing when `RUST_LOG` is unset. Safe to call more than once.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .init();
        }
    });
}

/// Everything one monomorphization run produces.
#[derive(Debug)]
pub struct MonoOutput {
    pub items: MonoItems,
    /// Sorted by cost (descending), then name.
    pub units: Vec<CodegenUnit>,
    /// Frozen analyzer results, for late call-site resolution and mangling.
    pub unused_params: UnusedParamTable,
}

impl MonoOutput {
    /// Line-oriented dump, one line per instance:
    ///
    /// ```text
    /// MONO_ITEM peach<u64> @@ app.fruit[External]
    /// ```
    ///
    /// Instances linked from another crate have no `@@` part.
    pub fn render_report(&self, provider: &dyn IrProvider) -> String {
        let mut placements: Vec<(String, Vec<String>)> = Vec::with_capacity(self.items.len());
        for id in self.items.node_ids() {
            let instance = self.items.instance(id);
            let homes = self
                .units
                .iter()
                .filter_map(|unit| {
                    unit.get(instance)
                        .map(|data| format!("{}[{}]", unit.name(), data.linkage.as_str()))
                })
                .collect();
            placements.push((instance.display(provider).to_string(), homes));
        }
        placements.sort();

        let mut out = String::new();
        for (instance, homes) in placements {
            if homes.is_empty() {
                let _ = writeln!(out, "MONO_ITEM {instance}");
            } else {
                let _ = writeln!(out, "MONO_ITEM {instance} @@ {}", homes.join(" "));
            }
        }
        out
    }
}

/// Collect, freeze the analyzer and partition.
///
/// On failure every error is returned; a fatal collection error is
/// returned alone.
pub fn collect_and_partition(
    provider: &dyn IrProvider,
    config: &MonoConfig,
) -> Result<MonoOutput, Vec<MonoError>> {
    let poly = Polymorphizer::new(provider, config);
    let collected = collector::collect(provider, &poly, config);
    let (items, unused_params) = settle(poly, collected)?;
    let units = partition::partition(provider, &items, config).map_err(|error| vec![error])?;
    Ok(MonoOutput {
        items,
        units,
        unused_params,
    })
}

/// Freeze the analyzer before surfacing collection errors: an analyzer
/// inconsistency outranks them.
fn settle(
    poly: Polymorphizer<'_>,
    collected: Result<MonoItems, Vec<MonoError>>,
) -> Result<(MonoItems, UnusedParamTable), Vec<MonoError>> {
    let unused_params = poly.freeze().map_err(|error| vec![error])?;
    Ok((collected?, unused_params))
}
