//! In-memory whole program.
//!
//! [`Program`] is a plain-data [`IrProvider`]: crates, regions, items,
//! bodies and impls held in vectors and maps. Tools that want to drive
//! monomorphization without a full front end build one with
//! [`ProgramBuilder`].

mod builder;
mod resolve;

#[cfg(test)]
mod tests;

use rustc_hash::FxHashMap;

use crate::ir::{Body, CrateId, ItemDef, ItemId, ItemKind, Provenance, RegionId};
use crate::provider::{IrProvider, Resolution};
use crate::ty::{GenericArgs, TyInterner};

pub use builder::{ItemDecl, ProgramBuilder};

struct ItemRecord {
    def: ItemDef,
    body: Option<Body>,
    provenance: Provenance,
    region: RegionId,
}

pub struct Program {
    types: TyInterner,
    crates: Vec<String>,
    /// Root region of each crate, indexed by `CrateId`.
    crate_regions: Vec<RegionId>,
    regions: Vec<String>,
    records: Vec<ItemRecord>,
    ids: Vec<ItemId>,
    entry_points: Vec<ItemId>,
    /// Trait -> impl blocks implementing it, in declaration order.
    impls: FxHashMap<ItemId, Vec<ItemId>>,
    /// (impl block, trait method) -> implementing method.
    impl_methods: FxHashMap<(ItemId, ItemId), ItemId>,
    drop_impls: FxHashMap<ItemId, ItemId>,
}

impl Program {
    fn record(&self, id: ItemId) -> &ItemRecord {
        &self.records[id.index()]
    }

    pub fn crate_count(&self) -> usize {
        self.crates.len()
    }

    /// Look an item up by its crate-local path.
    pub fn find(&self, krate: CrateId, path: &str) -> Option<ItemId> {
        self.ids.iter().copied().find(|&id| {
            let record = self.record(id);
            record.provenance.origin == krate && record.def.path == path
        })
    }
}

impl IrProvider for Program {
    fn types(&self) -> &TyInterner {
        &self.types
    }

    fn crate_name(&self, krate: CrateId) -> &str {
        &self.crates[krate.index()]
    }

    fn entry_points(&self) -> &[ItemId] {
        &self.entry_points
    }

    fn items(&self) -> &[ItemId] {
        &self.ids
    }

    fn item(&self, id: ItemId) -> &ItemDef {
        &self.record(id).def
    }

    fn body_of(&self, id: ItemId) -> Option<&Body> {
        self.record(id).body.as_ref()
    }

    fn provenance_of(&self, id: ItemId) -> Provenance {
        self.record(id).provenance
    }

    fn module_region_of(&self, id: ItemId) -> RegionId {
        self.record(id).region
    }

    fn region_name(&self, region: RegionId) -> &str {
        &self.regions[region.index()]
    }

    fn resolve(&self, item: ItemId, args: &GenericArgs) -> Resolution {
        match self.record(item).def.kind {
            ItemKind::TraitMethod { trait_id } => self.resolve_trait_method(item, trait_id, args),
            _ => Resolution::Item(item, args.clone()),
        }
    }

    fn drop_impl_of(&self, adt: ItemId) -> Option<ItemId> {
        self.drop_impls.get(&adt).copied()
    }
}
