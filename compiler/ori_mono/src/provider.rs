//! The read interface monomorphization consumes.
//!
//! Front ends implement [`IrProvider`] over whatever storage they have; the
//! collector, analyzer and partitioner see nothing else. It must be `Sync`
//! because collection walks roots on a rayon pool.

use crate::ir::{Body, CrateId, ItemDef, ItemId, Provenance, RegionId};
use crate::ty::{GenericArgs, TyInterner};

/// Outcome of resolving a callee against concrete arguments.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resolution {
    /// Calls this item with these arguments.
    Item(ItemId, GenericArgs),
    /// Dispatched through a vtable at run time; no instance is needed.
    Virtual,
    /// No implementation exists for the concrete arguments.
    Unresolved,
}

pub trait IrProvider: Sync {
    fn types(&self) -> &TyInterner;

    fn local_crate(&self) -> CrateId {
        CrateId::LOCAL
    }

    fn crate_name(&self, krate: CrateId) -> &str;

    fn entry_points(&self) -> &[ItemId];

    /// Every item of every crate, in a fixed order.
    fn items(&self) -> &[ItemId];

    fn item(&self, id: ItemId) -> &ItemDef;

    /// The generic body, or `None` for declarations and foreign items.
    fn body_of(&self, id: ItemId) -> Option<&Body>;

    fn provenance_of(&self, id: ItemId) -> Provenance;

    fn module_region_of(&self, id: ItemId) -> RegionId;

    /// Region path, e.g. `net::http`.
    fn region_name(&self, region: RegionId) -> &str;

    /// Resolve a call of `item` with concrete `args`.
    ///
    /// Plain functions resolve to themselves; trait methods resolve to the
    /// implementing method selected by `args[0]` (the `Self` type).
    fn resolve(&self, item: ItemId, args: &GenericArgs) -> Resolution;

    /// The `Drop::drop` implementation method for an ADT, if it has one.
    fn drop_impl_of(&self, adt: ItemId) -> Option<ItemId>;
}
