//! Post-partitioning invariant checks.
//!
//! Any failure here is a bug in placement or merging, reported as
//! `PartitionConstraintViolation`.

use rustc_hash::FxHashMap;

use super::placement::{bucket_of, BucketKey, PlacedUnit};
use crate::collector::{MonoItems, NodeId};
use crate::error::MonoError;
use crate::provider::IrProvider;

pub(super) fn validate(
    provider: &dyn IrProvider,
    items: &MonoItems,
    units: &[PlacedUnit],
    excluded: &[NodeId],
) -> Result<(), MonoError> {
    let violation = |detail: String| MonoError::PartitionConstraintViolation { detail };
    let describe = |id: NodeId| items.instance(id).display(provider).to_string();

    let mut unit_of: Vec<Option<usize>> = vec![None; items.len()];
    let mut bucket_home: FxHashMap<BucketKey, usize> = FxHashMap::default();

    for (index, unit) in units.iter().enumerate() {
        if unit.nodes.is_empty() {
            return Err(violation(format!("codegen unit `{}` is empty", unit.name)));
        }
        for &bucket in &unit.buckets {
            if let Some(&other) = bucket_home.get(&bucket) {
                if other != index {
                    return Err(violation(format!(
                        "bucket {bucket:?} is split across `{}` and `{}`",
                        units[other].name, unit.name
                    )));
                }
            }
            bucket_home.insert(bucket, index);
        }
        for &id in &unit.nodes {
            if let Some(other) = unit_of[id.index()].replace(index) {
                return Err(violation(format!(
                    "`{}` is placed in both `{}` and `{}`",
                    describe(id),
                    units[other].name,
                    unit.name
                )));
            }
        }
    }

    for &id in excluded {
        if let Some(index) = unit_of[id.index()] {
            return Err(violation(format!(
                "`{}` is linked externally but placed in `{}`",
                describe(id),
                units[index].name
            )));
        }
    }

    for id in items.node_ids() {
        let Some(key) = bucket_of(items.info(id), items.instance(id).kind()) else {
            continue;
        };
        match unit_of[id.index()] {
            None => {
                return Err(violation(format!("`{}` is not placed in any unit", describe(id))));
            }
            Some(index) if bucket_home.get(&key) != Some(&index) => {
                return Err(violation(format!(
                    "`{}` is separated from its bucket {key:?}",
                    describe(id)
                )));
            }
            Some(_) => {}
        }
    }

    Ok(())
}
