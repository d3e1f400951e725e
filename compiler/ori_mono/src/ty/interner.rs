//! Sharded type interner.
//!
//! Same layout as the string interner in the front end: a fixed array of
//! `RwLock`-guarded shards picked by hash, with a read-locked fast path and
//! a double-checked write-locked slow path. The collector interns
//! substituted types from many rayon workers at once, so contention is
//! spread across shards instead of one global lock.

use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::RwLock;
use rustc_hash::{FxHashMap, FxHasher};

use super::{Const, GenericArg, GenericArgs, Mutability, Ty, TyFlags, TyKind, TyList};
use crate::ir::ItemId;

const NUM_SHARDS: usize = 16;

/// Interned data for one type.
struct TyEntry {
    kind: TyKind,
    flags: TyFlags,
    length: usize,
    depth: usize,
}

struct TyShard {
    map: FxHashMap<TyKind, u32>,
    entries: Vec<TyEntry>,
}

impl TyShard {
    fn new() -> Self {
        Self {
            map: FxHashMap::default(),
            entries: Vec::with_capacity(64),
        }
    }

    /// Shard 0 holds the primitives at their fixed handles.
    ///
    /// They are stored for lookup only; `intern` short-circuits them before
    /// touching any map.
    fn with_primitives() -> Self {
        let mut shard = Self::new();
        for kind in TyKind::primitives() {
            shard.entries.push(TyEntry {
                kind,
                flags: TyFlags::IS_PRIMITIVE,
                length: 1,
                depth: 1,
            });
        }
        shard
    }
}

/// Sharded, concurrently internable type pool.
pub struct TyInterner {
    shards: [RwLock<TyShard>; NUM_SHARDS],
    total_count: AtomicUsize,
}

impl TyInterner {
    pub fn new() -> Self {
        let shards = std::array::from_fn(|i| {
            if i == 0 {
                RwLock::new(TyShard::with_primitives())
            } else {
                RwLock::new(TyShard::new())
            }
        });
        Self {
            shards,
            total_count: AtomicUsize::new(Ty::PRIMITIVE_COUNT as usize),
        }
    }

    #[inline]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "reduced modulo NUM_SHARDS (16)"
    )]
    fn shard_for(kind: &TyKind) -> usize {
        let mut hasher = FxHasher::default();
        kind.hash(&mut hasher);
        (hasher.finish() % NUM_SHARDS as u64) as usize
    }

    /// Intern a type, returning its handle.
    ///
    /// # Panics
    /// Panics if a shard exceeds 2^28 entries.
    pub fn intern(&self, kind: TyKind) -> Ty {
        if let Some(ty) = kind.primitive() {
            return ty;
        }

        let shard_idx = Self::shard_for(&kind);
        #[expect(
            clippy::cast_possible_truncation,
            reason = "shard_idx is bounded by NUM_SHARDS (16)"
        )]
        let shard_idx_u32 = shard_idx as u32;
        let shard = &self.shards[shard_idx];

        // Fast path: already interned
        {
            let guard = shard.read();
            if let Some(&local) = guard.map.get(&kind) {
                return Ty::from_parts(shard_idx_u32, local);
            }
        }

        // Children are read before taking the write lock: they may live in
        // this same shard.
        let (flags, length, depth) = self.compute_metadata(&kind);

        let mut guard = shard.write();
        if let Some(&local) = guard.map.get(&kind) {
            return Ty::from_parts(shard_idx_u32, local);
        }

        let local = u32::try_from(guard.entries.len())
            .ok()
            .filter(|local| *local <= Ty::MAX_LOCAL)
            .unwrap_or_else(|| {
                panic!(
                    "type interner shard {shard_idx} exceeded capacity of {} entries",
                    Ty::MAX_LOCAL
                )
            });
        guard.map.insert(kind.clone(), local);
        guard.entries.push(TyEntry {
            kind,
            flags,
            length,
            depth,
        });
        self.total_count.fetch_add(1, Ordering::Relaxed);

        Ty::from_parts(shard_idx_u32, local)
    }

    /// The structure of an interned type.
    pub fn kind(&self, ty: Ty) -> TyKind {
        self.shards[ty.shard()].read().entries[ty.local()].kind.clone()
    }

    pub fn flags(&self, ty: Ty) -> TyFlags {
        self.shards[ty.shard()].read().entries[ty.local()].flags
    }

    /// Number of type nodes (plus const nodes) in this type.
    pub fn type_length(&self, ty: Ty) -> usize {
        self.shards[ty.shard()].read().entries[ty.local()].length
    }

    /// Nesting depth: 1 for a type without type children.
    pub fn type_depth(&self, ty: Ty) -> usize {
        self.shards[ty.shard()].read().entries[ty.local()].depth
    }

    pub fn has_params(&self, ty: Ty) -> bool {
        self.flags(ty).has_params()
    }

    /// Total interned types including primitives (O(1)).
    pub fn len(&self) -> usize {
        self.total_count.load(Ordering::Relaxed)
    }

    /// True when only the primitives are present.
    pub fn is_empty(&self) -> bool {
        self.len() <= Ty::PRIMITIVE_COUNT as usize
    }

    fn compute_metadata(&self, kind: &TyKind) -> (TyFlags, usize, usize) {
        let mut flags = TyFlags::empty();
        let mut length = 1usize;
        let mut deepest_child = 0usize;

        let mut add_ty = |flags: &mut TyFlags, ty: Ty| {
            let entry_flags = self.flags(ty);
            *flags |= entry_flags.inherited();
            length = length.saturating_add(self.type_length(ty));
            deepest_child = deepest_child.max(self.type_depth(ty));
        };

        match kind {
            TyKind::Bool
            | TyKind::Char
            | TyKind::Int(_)
            | TyKind::Uint(_)
            | TyKind::Float(_)
            | TyKind::Str
            | TyKind::Never => flags |= TyFlags::IS_PRIMITIVE,
            TyKind::Tuple(elems) => {
                for &elem in elems {
                    add_ty(&mut flags, elem);
                }
            }
            TyKind::Array(elem, len) => {
                add_ty(&mut flags, *elem);
                if matches!(len, Const::Param(_)) {
                    flags |= TyFlags::HAS_CONST_PARAM;
                }
            }
            TyKind::Slice(elem) | TyKind::Ref(elem, _) | TyKind::RawPtr(elem, _) => {
                add_ty(&mut flags, *elem);
            }
            TyKind::Boxed(elem) => {
                flags |= TyFlags::HAS_BOX;
                add_ty(&mut flags, *elem);
            }
            TyKind::Adt(_, args) => {
                flags |= TyFlags::HAS_ADT;
                Self::add_args(&mut flags, &mut add_ty, args);
            }
            TyKind::Closure(_, args) => {
                flags |= TyFlags::HAS_CLOSURE;
                Self::add_args(&mut flags, &mut add_ty, args);
            }
            TyKind::FnDef(_, args) => Self::add_args(&mut flags, &mut add_ty, args),
            TyKind::Dynamic(_) => flags |= TyFlags::HAS_DYN,
            TyKind::FnPtr(inputs, output) => {
                for &input in inputs {
                    add_ty(&mut flags, input);
                }
                add_ty(&mut flags, *output);
            }
            TyKind::Param(_) => flags |= TyFlags::HAS_TY_PARAM,
        }

        // Const slots count as one node each.
        let const_nodes = match kind {
            TyKind::Array(..) => 1,
            TyKind::Adt(_, args) | TyKind::Closure(_, args) | TyKind::FnDef(_, args) => args
                .iter()
                .filter(|arg| matches!(arg, GenericArg::Const(_)))
                .count(),
            _ => 0,
        };
        (
            flags,
            length.saturating_add(const_nodes),
            deepest_child.saturating_add(1),
        )
    }

    fn add_args(
        flags: &mut TyFlags,
        add_ty: &mut impl FnMut(&mut TyFlags, Ty),
        args: &GenericArgs,
    ) {
        for arg in args {
            match arg {
                GenericArg::Type(ty) => add_ty(flags, *ty),
                GenericArg::Const(Const::Param(_)) => *flags |= TyFlags::HAS_CONST_PARAM,
                GenericArg::Const(Const::Value(_)) => {}
            }
        }
    }

    // === Constructors ===

    pub fn mk_tuple(&self, elems: &[Ty]) -> Ty {
        self.intern(TyKind::Tuple(elems.iter().copied().collect()))
    }

    pub fn mk_array(&self, elem: Ty, len: Const) -> Ty {
        self.intern(TyKind::Array(elem, len))
    }

    pub fn mk_slice(&self, elem: Ty) -> Ty {
        self.intern(TyKind::Slice(elem))
    }

    pub fn mk_ref(&self, pointee: Ty) -> Ty {
        self.intern(TyKind::Ref(pointee, Mutability::Not))
    }

    pub fn mk_mut_ref(&self, pointee: Ty) -> Ty {
        self.intern(TyKind::Ref(pointee, Mutability::Mut))
    }

    pub fn mk_raw_ptr(&self, pointee: Ty, mutbl: Mutability) -> Ty {
        self.intern(TyKind::RawPtr(pointee, mutbl))
    }

    pub fn mk_box(&self, pointee: Ty) -> Ty {
        self.intern(TyKind::Boxed(pointee))
    }

    pub fn mk_adt(&self, adt: ItemId, args: GenericArgs) -> Ty {
        self.intern(TyKind::Adt(adt, args))
    }

    pub fn mk_dyn(&self, trait_id: ItemId) -> Ty {
        self.intern(TyKind::Dynamic(trait_id))
    }

    pub fn mk_fn_def(&self, item: ItemId, args: GenericArgs) -> Ty {
        self.intern(TyKind::FnDef(item, args))
    }

    pub fn mk_fn_ptr(&self, inputs: &[Ty], output: Ty) -> Ty {
        self.intern(TyKind::FnPtr(TyList::from_slice(inputs), output))
    }

    pub fn mk_closure(&self, closure: ItemId, args: GenericArgs) -> Ty {
        self.intern(TyKind::Closure(closure, args))
    }

    pub fn mk_param(&self, index: u32) -> Ty {
        self.intern(TyKind::Param(index))
    }
}

impl Default for TyInterner {
    fn default() -> Self {
        Self::new()
    }
}
