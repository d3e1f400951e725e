//! Initial placement: every instance into the bucket its provenance picks.

use std::collections::BTreeMap;

use crate::collector::{MonoItems, NodeId};
use crate::instance::{InstanceInfo, InstanceKind};
use crate::ir::{CrateId, RegionId};
use crate::provider::IrProvider;

/// Name of the region used when an instance has no characteristic item.
pub(super) const FALLBACK_REGION: &str = "fallback";

/// Where an instance's provenance sends it.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord, Debug)]
pub(super) enum BucketKey {
    /// Local non-generic code of one region.
    Stable(RegionId),
    /// Local generic instances and compiler-made bodies of one region.
    Volatile(Option<RegionId>),
    /// External non-generic items whose bodies are inlinable.
    ExternInline,
    /// External generic items, grouped by the crate defining them.
    ExternGeneric(CrateId),
}

/// One unit under construction.
#[derive(Clone, Debug)]
pub(super) struct PlacedUnit {
    pub name: String,
    pub buckets: Vec<BucketKey>,
    pub nodes: Vec<NodeId>,
    pub cost: usize,
}

#[derive(Debug, Default)]
pub(super) struct Placement {
    /// Units sorted by name.
    pub units: Vec<PlacedUnit>,
    /// External instances linked from their defining crate.
    pub excluded: Vec<NodeId>,
}

/// `None` when the instance is not generated in this crate at all.
pub(super) fn bucket_of(info: &InstanceInfo, kind: InstanceKind) -> Option<BucketKey> {
    if !info.codegen_locally {
        return None;
    }
    let synthetic = matches!(kind, InstanceKind::DropGlue | InstanceKind::VTableShim);
    let key = if synthetic {
        BucketKey::Volatile(info.region)
    } else if info.is_local() {
        if info.is_generic {
            BucketKey::Volatile(info.region)
        } else {
            match info.region {
                Some(region) => BucketKey::Stable(region),
                None => BucketKey::Volatile(None),
            }
        }
    } else if info.is_generic {
        BucketKey::ExternGeneric(info.provenance.origin)
    } else {
        BucketKey::ExternInline
    };
    Some(key)
}

/// Unit name for a bucket.
///
/// Buckets whose names coincide (two crates with an equally named region)
/// share one unit.
pub(super) fn unit_name(provider: &dyn IrProvider, key: BucketKey) -> String {
    let krate = provider.crate_name(provider.local_crate());
    match key {
        BucketKey::Stable(region) => format!("{krate}.{}", region_segment(provider, region)),
        BucketKey::Volatile(Some(region)) => {
            format!("{krate}.{}-volatile", region_segment(provider, region))
        }
        BucketKey::Volatile(None) => format!("{krate}.{FALLBACK_REGION}-volatile"),
        BucketKey::ExternInline => format!("{krate}.extern-inline"),
        BucketKey::ExternGeneric(dep) => {
            format!("{krate}.extern-generic.{}", provider.crate_name(dep))
        }
    }
}

fn region_segment(provider: &dyn IrProvider, region: RegionId) -> String {
    provider.region_name(region).replace("::", "-")
}

pub(super) fn place(provider: &dyn IrProvider, items: &MonoItems) -> Placement {
    let mut by_name: BTreeMap<String, PlacedUnit> = BTreeMap::new();
    let mut excluded = Vec::new();

    for id in items.node_ids() {
        let info = items.info(id);
        let Some(key) = bucket_of(info, items.instance(id).kind()) else {
            excluded.push(id);
            continue;
        };
        let name = unit_name(provider, key);
        let unit = by_name.entry(name).or_insert_with_key(|name| PlacedUnit {
            name: name.clone(),
            buckets: Vec::new(),
            nodes: Vec::new(),
            cost: 0,
        });
        if !unit.buckets.contains(&key) {
            unit.buckets.push(key);
        }
        unit.nodes.push(id);
        unit.cost = unit.cost.saturating_add(info.size_estimate);
    }

    Placement {
        units: by_name.into_values().collect(),
        excluded,
    }
}
