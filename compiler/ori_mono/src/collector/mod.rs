//! Reachability collection.
//!
//! Starting from the roots, every instance the program needs is discovered
//! by scanning bodies with concrete arguments. The walk is an explicit-stack
//! DFS per root so the current instantiation chain is always known: it
//! becomes the note trail of an overflow error.
//!
//! # Limits
//!
//! Both limits are properties of the instance alone, never of the path that
//! reached it: `recursion_limit` bounds the nesting depth of the generic
//! arguments, `type_length_limit` their total size. Whether a program
//! overflows therefore does not depend on root order or scheduling.
//!
//! # Parallelism
//!
//! Roots are distributed over a rayon pool. Instances are claimed through a
//! concurrent seen-set: the worker whose insert succeeds scans the instance
//! and records its edges, everyone else skips it. A fatal error raises a
//! shared abort flag. Which worker fails first is a race, so the run is
//! then repeated sequentially and that walk's error is the one reported.
//!
//! # Output
//!
//! [`MonoItems`] orders instances by symbol name, so two runs over the same
//! program produce identical node ids regardless of thread scheduling.

mod drop_glue;
mod roots;
mod scan;
pub mod usage;


use std::sync::atomic::{AtomicBool, Ordering};

use dashmap::{DashMap, DashSet};
use ori_diagnostic::{Diagnostic, Span};
use parking_lot::Mutex;
use rayon::prelude::*;
use rustc_hash::{FxBuildHasher, FxHashMap};
use tracing::{debug, trace, warn};

use crate::config::MonoConfig;
use crate::error::MonoError;
use crate::instance::{make_instance, symbol_name, Instance, InstanceDef, InstanceInfo, SymbolName};
use crate::ir::{Body, Provenance, RegionId};
use crate::polymorphize::Polymorphizer;
use crate::provider::IrProvider;
use crate::ty::{args_type_depth, args_type_length, GenericArgs, Ty, TyKind};

pub use drop_glue::{DropClassifier, DropComponents};
pub use usage::{NodeId, UsageEdge, UsageGraph, UsageKind};

use scan::Neighbor;

/// The collected instance set.
///
/// Node `i` of the usage graph, `infos[i]` and `symbols[i]` describe the
/// same instance; nodes are sorted by symbol.
#[derive(Debug)]
pub struct MonoItems {
    graph: UsageGraph,
    infos: Vec<InstanceInfo>,
    symbols: Vec<SymbolName>,
    index: FxHashMap<Instance, NodeId>,
    roots: Vec<NodeId>,
    warnings: Vec<Diagnostic>,
}

impl MonoItems {
    pub fn len(&self) -> usize {
        self.graph.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.is_empty()
    }

    pub fn graph(&self) -> &UsageGraph {
        &self.graph
    }

    pub fn instance(&self, id: NodeId) -> &Instance {
        self.graph.node(id)
    }

    pub fn info(&self, id: NodeId) -> &InstanceInfo {
        &self.infos[id.index()]
    }

    pub fn symbol(&self, id: NodeId) -> &SymbolName {
        &self.symbols[id.index()]
    }

    pub fn node_of(&self, instance: &Instance) -> Option<NodeId> {
        self.index.get(instance).copied()
    }

    pub fn contains(&self, instance: &Instance) -> bool {
        self.index.contains_key(instance)
    }

    /// Root instances, by node id.
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn is_root(&self, id: NodeId) -> bool {
        self.roots.binary_search(&id).is_ok()
    }

    /// Warnings raised while choosing roots.
    pub fn warnings(&self) -> &[Diagnostic] {
        &self.warnings
    }

    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> {
        self.graph.node_ids()
    }

    /// Instances in symbol order.
    pub fn instances(&self) -> impl Iterator<Item = &Instance> {
        self.graph.node_ids().map(|id| self.graph.node(id))
    }
}

/// Collect every instance reachable from the roots of `provider`.
///
/// A fatal error (overflow, type length, internal) is returned alone.
/// Otherwise every unresolved instance is reported, sorted by message.
#[tracing::instrument(level = "debug", skip_all)]
pub fn collect(
    provider: &dyn IrProvider,
    poly: &Polymorphizer<'_>,
    config: &MonoConfig,
) -> Result<MonoItems, Vec<MonoError>> {
    let (root_items, warnings) = roots::collect_roots(provider, config);
    let collector = Collector::new(provider, poly, config);

    let empty = GenericArgs::new();
    let mut root_instances = Vec::with_capacity(root_items.len());
    for item in root_items {
        match make_instance(poly, item, &empty) {
            Ok(instance) => root_instances.push(instance),
            Err(reason) => {
                let error = collector.unresolved(item, &empty, reason, provider.item(item).span);
                collector.errors.lock().push(error);
            }
        }
    }
    debug!(roots = root_instances.len(), "collection roots");

    collector.run(&root_instances);
    collector.finish(&root_instances, warnings)
}

/// One DFS frame: an instance and the neighbors not yet entered.
struct Frame {
    instance: Instance,
    pending: std::vec::IntoIter<Neighbor>,
}

/// Shared state of one collection run.
struct Collector<'c> {
    provider: &'c dyn IrProvider,
    poly: &'c Polymorphizer<'c>,
    drops: DropClassifier<'c>,
    config: &'c MonoConfig,
    visited: DashSet<Instance, FxBuildHasher>,
    edges: DashMap<Instance, Vec<(Instance, UsageKind)>, FxBuildHasher>,
    infos: DashMap<Instance, InstanceInfo, FxBuildHasher>,
    /// Non-fatal unresolved instances.
    errors: Mutex<Vec<MonoError>>,
    fatal: Mutex<Option<MonoError>>,
    abort: AtomicBool,
}

impl<'c> Collector<'c> {
    fn new(
        provider: &'c dyn IrProvider,
        poly: &'c Polymorphizer<'c>,
        config: &'c MonoConfig,
    ) -> Self {
        Self {
            provider,
            poly,
            drops: DropClassifier::new(provider),
            config,
            visited: DashSet::with_hasher(FxBuildHasher),
            edges: DashMap::with_hasher(FxBuildHasher),
            infos: DashMap::with_hasher(FxBuildHasher),
            errors: Mutex::new(Vec::new()),
            fatal: Mutex::new(None),
            abort: AtomicBool::new(false),
        }
    }

    fn run(&self, roots: &[Instance]) {
        let jobs = self.config.effective_jobs();
        if jobs <= 1 || roots.len() <= 1 {
            self.walk_sequential(roots);
            return;
        }

        match rayon::ThreadPoolBuilder::new().num_threads(jobs).build() {
            Ok(pool) => {
                pool.install(|| {
                    roots
                        .par_iter()
                        .for_each(|root| self.walk_root(root.clone()));
                });
                if self.abort.load(Ordering::Relaxed) {
                    debug!("parallel collection failed, repeating sequentially");
                    self.restart();
                    self.walk_sequential(roots);
                }
            }
            Err(error) => {
                warn!(%error, "failed to build collection thread pool, collecting sequentially");
                self.walk_sequential(roots);
            }
        }
    }

    fn walk_sequential(&self, roots: &[Instance]) {
        for root in roots {
            if self.abort.load(Ordering::Relaxed) {
                return;
            }
            self.walk_root(root.clone());
        }
    }

    /// Forget everything claimed so far. Unresolved errors are kept: a
    /// repeated walk reports only its fatal error.
    fn restart(&self) {
        self.visited.clear();
        self.edges.clear();
        self.infos.clear();
        *self.fatal.lock() = None;
        self.abort.store(false, Ordering::Relaxed);
    }

    fn walk_root(&self, root: Instance) {
        let mut stack: Vec<Frame> = Vec::new();

        if let Some(frame) = self.enter(root, Span::DUMMY, &stack) {
            stack.push(frame);
        }

        loop {
            if self.abort.load(Ordering::Relaxed) {
                return;
            }
            let Some(top) = stack.last_mut() else {
                return;
            };
            if let Some(neighbor) = top.pending.next() {
                if let Some(frame) = self.enter(neighbor.instance, neighbor.span, &stack) {
                    stack.push(frame);
                }
            } else {
                stack.pop();
            }
        }
    }

    /// Claim and scan `instance`. Returns the frame to push when its
    /// neighbors still need visiting.
    fn enter(&self, instance: Instance, span: Span, stack: &[Frame]) -> Option<Frame> {
        if !self.visited.insert(instance.clone()) {
            return None;
        }
        let provider = self.provider;
        trace!(instance = %instance.display(provider), "collecting");

        let length = args_type_length(provider.types(), &instance.args);
        if length > self.config.type_length_limit {
            self.fail(MonoError::TypeLengthLimit {
                instance: instance.display(provider).to_string(),
                length,
                limit: self.config.type_length_limit,
                span,
            });
            return None;
        }

        if args_type_depth(provider.types(), &instance.args) > self.config.recursion_limit {
            let chain = stack
                .iter()
                .map(|frame| &frame.instance)
                .chain(std::iter::once(&instance))
                .map(|link| link.display(provider).to_string())
                .collect();
            self.fail(MonoError::InstantiationOverflow {
                instance: instance.display(provider).to_string(),
                limit: self.config.recursion_limit,
                chain,
                span,
            });
            return None;
        }

        let mut info = self.instance_info(&instance);
        if !info.codegen_locally {
            self.record(instance, info, Vec::new());
            return None;
        }

        match self.scan(&instance) {
            Ok(neighbors) => {
                if instance.def == InstanceDef::DropGlue {
                    info.size_estimate = neighbors.len() + 1;
                }
                let edges = neighbors
                    .iter()
                    .map(|n| (n.instance.clone(), n.kind))
                    .collect();
                self.record(instance.clone(), info, edges);
                Some(Frame {
                    instance,
                    pending: neighbors.into_iter(),
                })
            }
            Err(error) if error.is_fatal() => {
                self.fail(error);
                None
            }
            Err(error) => {
                self.errors.lock().push(error);
                self.record(instance, info, Vec::new());
                None
            }
        }
    }

    fn record(&self, instance: Instance, info: InstanceInfo, edges: Vec<(Instance, UsageKind)>) {
        self.infos.insert(instance.clone(), info);
        self.edges.insert(instance, edges);
    }

    /// Keep the first fatal error and stop every worker.
    fn fail(&self, error: MonoError) {
        let mut slot = self.fatal.lock();
        if slot.is_none() {
            *slot = Some(error);
        }
        self.abort.store(true, Ordering::Relaxed);
    }

    fn instance_info(&self, instance: &Instance) -> InstanceInfo {
        let provider = self.provider;
        match instance.def {
            InstanceDef::Item(item) | InstanceDef::Static(item) => {
                let provenance = provider.provenance_of(item);
                let is_generic = !provider.item(item).generics.is_empty();
                let codegen_locally =
                    provenance.is_local() || is_generic || provenance.inline_eligible;
                let size_estimate = if codegen_locally {
                    provider.body_of(item).map_or(1, Body::size_estimate)
                } else {
                    0
                };
                InstanceInfo {
                    provenance,
                    region: Some(provider.module_region_of(item)),
                    is_generic,
                    size_estimate,
                    codegen_locally,
                }
            }
            InstanceDef::VTableShim(method) => InstanceInfo {
                provenance: Provenance::SYNTHETIC,
                region: Some(provider.module_region_of(method)),
                is_generic: true,
                size_estimate: 1,
                codegen_locally: true,
            },
            InstanceDef::DropGlue => InstanceInfo {
                provenance: Provenance::SYNTHETIC,
                region: instance
                    .drop_glue_ty()
                    .and_then(|ty| self.characteristic_region(ty)),
                is_generic: true,
                size_estimate: 1,
                codegen_locally: true,
            },
        }
    }

    /// Region of the item a type is "about": the ADT, closure or trait at
    /// its core. `None` for types built only from primitives.
    fn characteristic_region(&self, ty: Ty) -> Option<RegionId> {
        let provider = self.provider;
        match provider.types().kind(ty) {
            TyKind::Adt(item, _)
            | TyKind::Closure(item, _)
            | TyKind::FnDef(item, _)
            | TyKind::Dynamic(item) => Some(provider.module_region_of(item)),
            TyKind::Ref(inner, _)
            | TyKind::RawPtr(inner, _)
            | TyKind::Boxed(inner)
            | TyKind::Array(inner, _)
            | TyKind::Slice(inner) => self.characteristic_region(inner),
            TyKind::Tuple(elems) => elems
                .iter()
                .find_map(|&elem| self.characteristic_region(elem)),
            _ => None,
        }
    }

    fn finish(
        self,
        roots: &[Instance],
        warnings: Vec<Diagnostic>,
    ) -> Result<MonoItems, Vec<MonoError>> {
        if let Some(error) = self.fatal.into_inner() {
            return Err(vec![error]);
        }

        let mut unresolved = self.errors.into_inner();
        if !unresolved.is_empty() {
            unresolved.sort_by_cached_key(ToString::to_string);
            unresolved.dedup();
            return Err(unresolved);
        }

        let provider = self.provider;
        let mut entries: Vec<(SymbolName, Instance, InstanceInfo)> = self
            .infos
            .into_iter()
            .collect::<Vec<_>>()
            .into_par_iter()
            .map(|(instance, info)| (symbol_name(provider, &instance), instance, info))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));

        for pair in entries.windows(2) {
            if pair[0].0 == pair[1].0 {
                return Err(vec![MonoError::SymbolCollision {
                    symbol: pair[0].0.to_string(),
                    first: pair[0].1.display(provider).to_string(),
                    second: pair[1].1.display(provider).to_string(),
                }]);
            }
        }

        let index: FxHashMap<Instance, NodeId> = entries
            .iter()
            .enumerate()
            .map(|(i, (_, instance, _))| (instance.clone(), NodeId::from_index(i)))
            .collect();

        let edges = self.edges;
        let uses = entries
            .iter()
            .map(|(_, instance, _)| {
                edges
                    .remove(instance)
                    .map(|(_, targets)| {
                        targets
                            .into_iter()
                            .filter_map(|(target, kind)| {
                                index.get(&target).map(|&target| UsageEdge { target, kind })
                            })
                            .collect()
                    })
                    .unwrap_or_default()
            })
            .collect();

        let mut root_ids: Vec<NodeId> = roots.iter().filter_map(|r| index.get(r).copied()).collect();
        root_ids.sort_unstable();
        root_ids.dedup();

        let mut symbols = Vec::with_capacity(entries.len());
        let mut infos = Vec::with_capacity(entries.len());
        let mut nodes = Vec::with_capacity(entries.len());
        for (symbol, instance, info) in entries {
            symbols.push(symbol);
            infos.push(info);
            nodes.push(instance);
        }
        let graph = UsageGraph::from_parts(nodes, uses);
        debug!(
            instances = graph.len(),
            edges = graph.edge_count(),
            "collection finished"
        );

        Ok(MonoItems {
            graph,
            infos,
            symbols,
            index,
            roots: root_ids,
            warnings,
        })
    }
}
