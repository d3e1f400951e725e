//! Merging units down to the configured count, and unit naming.

use std::hash::Hasher;

use rustc_hash::FxHasher;

use super::placement::PlacedUnit;

/// Merge the smallest unit into the second smallest until at most `target`
/// units remain. Buckets always move whole.
pub(super) fn merge_units(units: &mut Vec<PlacedUnit>, target: usize) {
    let target = target.max(1);
    while units.len() > target {
        // Largest first; ties broken by name so the result is deterministic.
        units.sort_by(|a, b| b.cost.cmp(&a.cost).then_with(|| a.name.cmp(&b.name)));
        let (Some(smallest), Some(second)) = (units.pop(), units.last_mut()) else {
            return;
        };
        second.name = format!("{}--{}", second.name, smallest.name);
        second.buckets.extend(smallest.buckets);
        second.nodes.extend(smallest.nodes);
        second.cost = second.cost.saturating_add(smallest.cost);
    }
}

/// `<crate>.cgu.<hash>` for a readable unit name.
pub(super) fn hashed_name(krate: &str, readable: &str) -> String {
    let mut hasher = FxHasher::default();
    hasher.write(readable.as_bytes());
    format!("{krate}.cgu.{:016x}", hasher.finish())
}
