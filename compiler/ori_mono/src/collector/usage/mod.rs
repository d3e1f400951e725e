//! Usage graph: which instance needs which.
//!
//! Nodes are instances in an arena indexed by [`NodeId`]; forward edges
//! say how the source uses the target, and a reverse index lists every
//! user of a node. The partitioner reads the reverse index to decide which
//! instances can be internalized.
//!
//! The graph is built once after collection and never mutated, so both
//! indices are plain vectors sorted by node id.

#[cfg(test)]
mod tests;

use std::collections::VecDeque;
use std::fmt::Write;

use crate::instance::Instance;

#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord, Debug)]
pub struct NodeId(u32);

impl NodeId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[expect(
        clippy::cast_possible_truncation,
        reason = "instance counts are far below u32::MAX"
    )]
    #[inline]
    pub(crate) const fn from_index(index: usize) -> Self {
        Self(index as u32)
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord, Debug)]
pub enum UsageKind {
    Call,
    FnPointer,
    Static,
    Drop,
    VTable,
}

impl UsageKind {
    pub fn as_str(self) -> &'static str {
        match self {
            UsageKind::Call => "call",
            UsageKind::FnPointer => "fn-ptr",
            UsageKind::Static => "static",
            UsageKind::Drop => "drop",
            UsageKind::VTable => "vtable",
        }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord, Debug)]
pub struct UsageEdge {
    pub target: NodeId,
    pub kind: UsageKind,
}

#[derive(Debug, Default)]
pub struct UsageGraph {
    nodes: Vec<Instance>,
    /// Forward index: node -> its uses, sorted and deduplicated.
    uses: Vec<Vec<UsageEdge>>,
    /// Reverse index: node -> nodes using it, sorted and deduplicated.
    users: Vec<Vec<NodeId>>,
}

impl UsageGraph {
    /// Build from nodes and their outgoing edges (`uses[i]` belongs to
    /// `nodes[i]`).
    pub(crate) fn from_parts(nodes: Vec<Instance>, mut uses: Vec<Vec<UsageEdge>>) -> Self {
        uses.resize_with(nodes.len(), Vec::new);
        let mut users = vec![Vec::new(); nodes.len()];

        for (source, edges) in uses.iter_mut().enumerate() {
            edges.sort_unstable();
            edges.dedup();
            for edge in edges.iter() {
                users[edge.target.index()].push(NodeId::from_index(source));
            }
        }
        for list in &mut users {
            list.dedup();
        }

        Self { nodes, uses, users }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> &Instance {
        &self.nodes[id.index()]
    }

    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len()).map(NodeId::from_index)
    }

    /// What `id` uses.
    pub fn uses(&self, id: NodeId) -> &[UsageEdge] {
        &self.uses[id.index()]
    }

    /// Who uses `id`.
    pub fn users(&self, id: NodeId) -> &[NodeId] {
        &self.users[id.index()]
    }

    pub fn edge_count(&self) -> usize {
        self.uses.iter().map(Vec::len).sum()
    }

    /// Every node reachable from `roots` (roots included), by BFS.
    pub fn reachable_from(&self, roots: &[NodeId]) -> Vec<NodeId> {
        let mut seen = vec![false; self.nodes.len()];
        let mut queue: VecDeque<NodeId> = VecDeque::new();
        for &root in roots {
            if !seen[root.index()] {
                seen[root.index()] = true;
                queue.push_back(root);
            }
        }

        let mut order = Vec::new();
        while let Some(current) = queue.pop_front() {
            order.push(current);
            for edge in self.uses(current) {
                if !seen[edge.target.index()] {
                    seen[edge.target.index()] = true;
                    queue.push_back(edge.target);
                }
            }
        }
        order.sort_unstable();
        order
    }

    /// All transitive users of `id` (excluding `id` unless it is on a cycle).
    pub fn transitive_users(&self, id: NodeId) -> Vec<NodeId> {
        let mut seen = vec![false; self.nodes.len()];
        let mut queue = VecDeque::from([id]);
        let mut result = Vec::new();

        while let Some(current) = queue.pop_front() {
            for &user in self.users(current) {
                if !seen[user.index()] {
                    seen[user.index()] = true;
                    result.push(user);
                    queue.push_back(user);
                }
            }
        }
        result.sort_unstable();
        result
    }

    /// Graphviz rendering; `label` names each node.
    pub fn to_dot(&self, label: impl Fn(NodeId) -> String) -> String {
        let mut out = String::from("digraph usage {\n    node [shape=box];\n");
        for id in self.node_ids() {
            let _ = writeln!(out, "    n{} [label=\"{}\"];", id.index(), escape(&label(id)));
        }
        for id in self.node_ids() {
            for edge in self.uses(id) {
                let _ = writeln!(
                    out,
                    "    n{} -> n{} [label=\"{}\"];",
                    id.index(),
                    edge.target.index(),
                    edge.kind.as_str()
                );
            }
        }
        out.push_str("}\n");
        out
    }
}

fn escape(label: &str) -> String {
    label.replace('\\', "\\\\").replace('"', "\\\"")
}
