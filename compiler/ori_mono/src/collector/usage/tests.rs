use pretty_assertions::assert_eq;

use super::*;
use crate::ty::Ty;

fn id(index: usize) -> NodeId {
    NodeId::from_index(index)
}

fn edge(target: usize, kind: UsageKind) -> UsageEdge {
    UsageEdge {
        target: id(target),
        kind,
    }
}

/// 0 -> 1 -> 2, 0 -> 2, 3 -> 3; node 4 is isolated.
fn sample() -> UsageGraph {
    let nodes = [Ty::U8, Ty::U16, Ty::U32, Ty::U64, Ty::BOOL]
        .into_iter()
        .map(Instance::drop_glue)
        .collect();
    UsageGraph::from_parts(
        nodes,
        vec![
            vec![edge(2, UsageKind::Drop), edge(1, UsageKind::Call), edge(1, UsageKind::Call)],
            vec![edge(2, UsageKind::Static)],
            vec![],
            vec![edge(3, UsageKind::Call)],
        ],
    )
}

#[test]
fn test_from_parts_sorts_and_dedups() {
    let graph = sample();

    assert_eq!(graph.len(), 5);
    assert_eq!(
        graph.uses(id(0)),
        &[edge(1, UsageKind::Call), edge(2, UsageKind::Drop)]
    );
    assert_eq!(graph.edge_count(), 4);
    // Missing trailing edge lists are treated as empty.
    assert!(graph.uses(id(4)).is_empty());
    assert_eq!(graph.node(id(2)), &Instance::drop_glue(Ty::U32));
}

#[test]
fn test_reverse_index() {
    let graph = sample();

    assert_eq!(graph.users(id(2)), &[id(0), id(1)]);
    assert_eq!(graph.users(id(1)), &[id(0)]);
    assert_eq!(graph.users(id(3)), &[id(3)]);
    assert!(graph.users(id(0)).is_empty());
}

#[test]
fn test_same_target_with_two_kinds_keeps_one_user() {
    let nodes = vec![Instance::drop_glue(Ty::U8), Instance::drop_glue(Ty::U16)];
    let graph = UsageGraph::from_parts(
        nodes,
        vec![vec![edge(1, UsageKind::Call), edge(1, UsageKind::FnPointer)]],
    );

    assert_eq!(graph.uses(id(0)).len(), 2);
    assert_eq!(graph.users(id(1)), &[id(0)]);
}

#[test]
fn test_reachable_from() {
    let graph = sample();

    assert_eq!(graph.reachable_from(&[id(1)]), vec![id(1), id(2)]);
    assert_eq!(graph.reachable_from(&[id(0), id(3)]), vec![id(0), id(1), id(2), id(3)]);
    assert!(graph.reachable_from(&[]).is_empty());
}

#[test]
fn test_transitive_users() {
    let graph = sample();

    assert_eq!(graph.transitive_users(id(2)), vec![id(0), id(1)]);
    assert!(graph.transitive_users(id(0)).is_empty());
    // A node on a cycle is its own user.
    assert_eq!(graph.transitive_users(id(3)), vec![id(3)]);
}

#[test]
fn test_to_dot() {
    let nodes = vec![Instance::drop_glue(Ty::U8), Instance::drop_glue(Ty::U16)];
    let graph = UsageGraph::from_parts(nodes, vec![vec![edge(1, UsageKind::VTable)]]);

    let dot = graph.to_dot(|node| format!("n\"{}\"", node.index()));
    assert_eq!(
        dot,
        "digraph usage {\n    node [shape=box];\n    n0 [label=\"n\\\"0\\\"\"];\n    n1 [label=\"n\\\"1\\\"\"];\n    n0 -> n1 [label=\"vtable\"];\n}\n"
    );
}

#[test]
fn test_usage_kind_names() {
    let names: Vec<&str> = [
        UsageKind::Call,
        UsageKind::FnPointer,
        UsageKind::Static,
        UsageKind::Drop,
        UsageKind::VTable,
    ]
    .into_iter()
    .map(UsageKind::as_str)
    .collect();
    assert_eq!(names, vec!["call", "fn-ptr", "static", "drop", "vtable"]);
}
