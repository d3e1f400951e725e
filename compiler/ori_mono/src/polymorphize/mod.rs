//! Polymorphization: which generic parameters an item never depends on.
//!
//! Two instantiations of an item that differ only in unused parameters
//! produce identical code, so [`make_instance`](crate::make_instance)
//! replaces those slots with identity placeholders and they collapse into
//! one instance.
//!
//! # Lifecycle
//!
//! A [`Polymorphizer`] lives for one collection run. Results are computed
//! lazily per item and memoized in a concurrent cache; rayon workers may
//! race to compute the same item, which is harmless as long as they agree.
//! After collection [`Polymorphizer::freeze`] turns the cache into an
//! immutable [`UnusedParamTable`] and reports any disagreement.

mod analysis;


use std::fmt;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;
use rustc_hash::{FxBuildHasher, FxHashMap};
use tracing::debug;

use crate::config::MonoConfig;
use crate::error::MonoError;
use crate::ir::{identity_arg, param_index, ItemId};
use crate::provider::IrProvider;
use crate::ty::{GenericArg, GenericArgs};

/// Bit `i` set means parameter `i` is unused.
///
/// Parameters at index 64 and above are always treated as used.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Default)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct UnusedParamSet(u64);

impl UnusedParamSet {
    /// Width of the set.
    pub const MAX_PARAMS: usize = 64;

    /// Every parameter used: nothing collapses.
    pub const fn all_used() -> Self {
        Self(0)
    }

    /// The first `count` parameters unused (capped at 64).
    pub fn all_unused(count: usize) -> Self {
        if count >= Self::MAX_PARAMS {
            Self(u64::MAX)
        } else {
            Self((1u64 << count) - 1)
        }
    }

    #[inline]
    pub fn is_unused(self, index: usize) -> bool {
        index < Self::MAX_PARAMS && self.0 & (1 << index) != 0
    }

    #[inline]
    pub fn mark_used(&mut self, index: usize) {
        if index < Self::MAX_PARAMS {
            self.0 &= !(1 << index);
        }
    }

    /// True when no parameter is unused.
    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn count(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn iter(self) -> impl Iterator<Item = usize> {
        (0..Self::MAX_PARAMS).filter(move |&i| self.is_unused(i))
    }
}

impl fmt::Debug for UnusedParamSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UnusedParamSet({self})")
    }
}

impl fmt::Display for UnusedParamSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (n, index) in self.iter().enumerate() {
            if n > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{index}")?;
        }
        f.write_str("}")
    }
}

/// Per-run memoizing analyzer.
pub struct Polymorphizer<'a> {
    provider: &'a dyn IrProvider,
    enabled: bool,
    cache: DashMap<ItemId, UnusedParamSet, FxBuildHasher>,
    inconsistencies: Mutex<Vec<MonoError>>,
}

impl<'a> Polymorphizer<'a> {
    pub fn new(provider: &'a dyn IrProvider, config: &MonoConfig) -> Self {
        Self {
            provider,
            enabled: config.polymorphize,
            cache: DashMap::with_hasher(FxBuildHasher),
            inconsistencies: Mutex::new(Vec::new()),
        }
    }

    /// Seed the cache with a table saved by an earlier run.
    ///
    /// Entries are still cross-checked: a recomputation that disagrees with
    /// a seeded entry is reported by `freeze` like any other race.
    pub fn with_cache(
        provider: &'a dyn IrProvider,
        config: &MonoConfig,
        table: &UnusedParamTable,
    ) -> Self {
        let analyzer = Self::new(provider, config);
        for (&item, &unused) in &table.entries {
            analyzer.cache.insert(item, unused);
        }
        analyzer
    }

    pub fn provider(&self) -> &'a dyn IrProvider {
        self.provider
    }

    /// Unused parameters of `item`, computed at most once per run.
    pub fn unused_generic_params(&self, item: ItemId) -> UnusedParamSet {
        if let Some(cached) = self.cache.get(&item) {
            return *cached;
        }

        // Computed without holding any cache lock: closures recurse into
        // their own entries.
        let computed = self.compute(item);

        match self.cache.entry(item) {
            Entry::Occupied(entry) => {
                let stored = *entry.get();
                if stored != computed {
                    self.report_inconsistency(item, stored, computed);
                }
                stored
            }
            Entry::Vacant(entry) => {
                entry.insert(computed);
                computed
            }
        }
    }

    /// Recompute `item` ignoring the cache and check it against the cached
    /// value, if any.
    pub fn verify(&self, item: ItemId) -> UnusedParamSet {
        let fresh = self.compute(item);
        if let Some(stored) = self.cache.get(&item).map(|entry| *entry) {
            if stored != fresh {
                self.report_inconsistency(item, stored, fresh);
            }
        }
        fresh
    }

    fn compute(&self, item: ItemId) -> UnusedParamSet {
        if !self.enabled {
            return UnusedParamSet::all_used();
        }
        let unused = analysis::unused_params(self, item);
        if !unused.is_empty() {
            debug!(item = %self.provider.item(item).path, %unused, "polymorphized");
        }
        unused
    }

    fn report_inconsistency(&self, item: ItemId, first: UnusedParamSet, second: UnusedParamSet) {
        self.inconsistencies.lock().push(MonoError::AnalyzerInconsistency {
            item: self.provider.item(item).path.clone(),
            first,
            second,
        });
    }

    /// Replace every unused slot of `args` with its identity placeholder.
    pub fn normalize(&self, item: ItemId, args: &[GenericArg]) -> GenericArgs {
        let unused = self.unused_generic_params(item);
        normalize_with(self.provider, item, args, unused)
    }

    /// End the run: the cache becomes an immutable table.
    pub fn freeze(self) -> Result<UnusedParamTable, MonoError> {
        if let Some(first) = self.inconsistencies.into_inner().into_iter().next() {
            return Err(first);
        }
        let entries = self.cache.into_iter().collect();
        Ok(UnusedParamTable { entries })
    }
}

/// Apply an already computed set to an argument list.
pub(crate) fn normalize_with(
    provider: &dyn IrProvider,
    item: ItemId,
    args: &[GenericArg],
    unused: UnusedParamSet,
) -> GenericArgs {
    if unused.is_empty() {
        return args.iter().copied().collect();
    }
    let generics = &provider.item(item).generics;
    let types = provider.types();
    args.iter()
        .enumerate()
        .map(|(i, &arg)| match generics.params.get(i) {
            Some(param) if unused.is_unused(i) => identity_arg(types, param.kind, param_index(i)),
            _ => arg,
        })
        .collect()
}

/// Frozen analyzer results of one run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UnusedParamTable {
    entries: FxHashMap<ItemId, UnusedParamSet>,
}

impl UnusedParamTable {
    pub fn get(&self, item: ItemId) -> Option<UnusedParamSet> {
        self.entries.get(&item).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries sorted by item.
    pub fn sorted(&self) -> Vec<(ItemId, UnusedParamSet)> {
        let mut entries: Vec<_> = self.entries.iter().map(|(&k, &v)| (k, v)).collect();
        entries.sort_unstable_by_key(|&(item, _)| item);
        entries
    }

    /// Serialize for reuse by a later run.
    #[cfg(feature = "cache")]
    pub fn export_cache(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(&self.sorted())
    }

    #[cfg(feature = "cache")]
    pub fn import_cache(bytes: &[u8]) -> Result<Self, bincode::Error> {
        let entries: Vec<(ItemId, UnusedParamSet)> = bincode::deserialize(bytes)?;
        Ok(Self {
            entries: entries.into_iter().collect(),
        })
    }
}
