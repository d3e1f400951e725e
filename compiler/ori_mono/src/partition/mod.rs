//! Codegen unit partitioning.
//!
//! # Pipeline
//!
//! 1. **Place**: each collected instance goes to the bucket its provenance
//!    selects (see [`placement`]); external non-inline instances are left
//!    out and linked from their own crate.
//! 2. **Merge**: while there are more units than `codegen_units`, the
//!    smallest unit is folded into the second smallest.
//! 3. **Internalize**: local non-public instances used only from inside
//!    their own unit get internal linkage.
//! 4. **Validate** every placement rule, then sort units by cost
//!    (descending) and name, and items by symbol.
//!
//! Units are never split below bucket granularity; one oversized bucket
//! stays one unit.

mod merge;
mod placement;
mod validate;


use rayon::prelude::*;
use tracing::debug;

use crate::collector::{MonoItems, NodeId};
use crate::config::MonoConfig;
use crate::error::MonoError;
use crate::instance::{Instance, SymbolName};
use crate::ir::Visibility;
use crate::provider::IrProvider;

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Linkage {
    External,
    Internal,
    /// Local copy of another crate's item, shared between units of this
    /// crate. Yields to the defining crate's symbol at link time.
    LinkOnceOdr,
}

impl Linkage {
    pub fn as_str(self) -> &'static str {
        match self {
            Linkage::External => "External",
            Linkage::Internal => "Internal",
            Linkage::LinkOnceOdr => "LinkOnceOdr",
        }
    }
}

/// What code generation needs to know about one placed instance.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct MonoItemData {
    pub symbol: SymbolName,
    pub linkage: Linkage,
    pub visibility: Visibility,
    pub size_estimate: usize,
}

#[derive(Clone, Debug)]
pub struct CodegenUnit {
    name: String,
    /// Sorted by symbol.
    items: Vec<(Instance, MonoItemData)>,
    cost: usize,
}

impl CodegenUnit {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn items(&self) -> &[(Instance, MonoItemData)] {
        &self.items
    }

    /// Sum of the size estimates of the items.
    pub fn cost(&self) -> usize {
        self.cost
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, instance: &Instance) -> Option<&MonoItemData> {
        self.items
            .iter()
            .find(|(candidate, _)| candidate == instance)
            .map(|(_, data)| data)
    }

    pub fn contains(&self, instance: &Instance) -> bool {
        self.get(instance).is_some()
    }
}

/// Partition the collected instances into codegen units.
#[tracing::instrument(level = "debug", skip_all)]
pub fn partition(
    provider: &dyn IrProvider,
    items: &MonoItems,
    config: &MonoConfig,
) -> Result<Vec<CodegenUnit>, MonoError> {
    let placement = placement::place(provider, items);
    debug!(
        units = placement.units.len(),
        excluded = placement.excluded.len(),
        "initial placement"
    );

    let mut units = placement.units;
    merge::merge_units(&mut units, config.codegen_units);
    validate::validate(provider, items, &units, &placement.excluded)?;

    let mut unit_of: Vec<Option<usize>> = vec![None; items.len()];
    for (index, unit) in units.iter().enumerate() {
        for &id in &unit.nodes {
            unit_of[id.index()] = Some(index);
        }
    }

    let krate = provider.crate_name(provider.local_crate());
    let mut result: Vec<CodegenUnit> = units
        .into_iter()
        .enumerate()
        .map(|(index, unit)| {
            let items_data = unit
                .nodes
                .iter()
                .map(|&id| {
                    let info = items.info(id);
                    let data = MonoItemData {
                        symbol: items.symbol(id).clone(),
                        linkage: linkage_of(items, &unit_of, id, index),
                        visibility: info.provenance.visibility,
                        size_estimate: info.size_estimate,
                    };
                    (items.instance(id).clone(), data)
                })
                .collect();
            let name = if config.human_readable_cgu_names {
                unit.name
            } else {
                merge::hashed_name(krate, &unit.name)
            };
            CodegenUnit {
                name,
                items: items_data,
                cost: unit.cost,
            }
        })
        .collect();

    result
        .par_iter_mut()
        .for_each(|unit| unit.items.sort_by(|a, b| a.1.symbol.cmp(&b.1.symbol)));
    result.sort_by(|a, b| b.cost.cmp(&a.cost).then_with(|| a.name.cmp(&b.name)));

    debug!(units = result.len(), "partitioning finished");
    Ok(result)
}

/// Internal when nothing outside the unit can reference the instance.
///
/// Copies of external items are never exported: they carry the defining
/// crate's symbol.
fn linkage_of(items: &MonoItems, unit_of: &[Option<usize>], id: NodeId, unit: usize) -> Linkage {
    let provenance = items.info(id).provenance;
    let users_inside = items
        .graph()
        .users(id)
        .iter()
        .all(|user| unit_of[user.index()] == Some(unit));

    if !provenance.is_local() {
        return if users_inside {
            Linkage::Internal
        } else {
            Linkage::LinkOnceOdr
        };
    }

    let private = provenance.visibility != Visibility::Public
        && !provenance.forced_linkage
        && !items.is_root(id);
    if private && users_inside {
        Linkage::Internal
    } else {
        Linkage::External
    }
}
