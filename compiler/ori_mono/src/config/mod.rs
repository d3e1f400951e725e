//! Monomorphization settings.

#[cfg(test)]
mod tests;

use std::thread;

/// Which items seed the reachability walk.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum CollectionMode {
    /// Entry points, forced-linkage items and statics only.
    #[default]
    Lazy,
    /// Additionally every local non-generic function (library builds).
    Eager,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MonoConfig {
    /// How many times one item may appear on a single instantiation chain.
    pub recursion_limit: usize,
    /// Largest allowed total type length of an instance's arguments.
    pub type_length_limit: usize,
    /// Share instances across unused generic parameters.
    pub polymorphize: bool,
    pub collection_mode: CollectionMode,
    /// Target number of codegen units after merging.
    pub codegen_units: usize,
    /// Readable unit names (`app.net-volatile`) instead of hashed ones.
    pub human_readable_cgu_names: bool,
    /// Number of worker threads (0 = auto-detect).
    pub jobs: usize,
}

impl Default for MonoConfig {
    fn default() -> Self {
        Self {
            recursion_limit: 128,
            type_length_limit: 1_048_576,
            polymorphize: true,
            collection_mode: CollectionMode::Lazy,
            codegen_units: 16,
            human_readable_cgu_names: true,
            jobs: 0,
        }
    }
}

impl MonoConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_recursion_limit(mut self, limit: usize) -> Self {
        self.recursion_limit = limit;
        self
    }

    #[must_use]
    pub fn with_type_length_limit(mut self, limit: usize) -> Self {
        self.type_length_limit = limit;
        self
    }

    #[must_use]
    pub fn with_polymorphize(mut self, enabled: bool) -> Self {
        self.polymorphize = enabled;
        self
    }

    #[must_use]
    pub fn with_collection_mode(mut self, mode: CollectionMode) -> Self {
        self.collection_mode = mode;
        self
    }

    /// Set the codegen unit target. Zero is treated as one.
    #[must_use]
    pub fn with_codegen_units(mut self, units: usize) -> Self {
        self.codegen_units = units.max(1);
        self
    }

    #[must_use]
    pub fn with_human_readable_cgu_names(mut self, readable: bool) -> Self {
        self.human_readable_cgu_names = readable;
        self
    }

    #[must_use]
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs;
        self
    }

    /// Get the effective number of jobs.
    #[must_use]
    pub fn effective_jobs(&self) -> usize {
        if self.jobs == 0 {
            thread::available_parallelism()
                .map(std::num::NonZero::get)
                .unwrap_or(1)
        } else {
            self.jobs
        }
    }
}
