use cfa::graph::{CfGraph, EdgeLabel, Edges, GraphError};

#[test]
fn add_node_with_edges() {
    let mut graph: CfGraph<u32> = CfGraph::new();
    let target = graph.add_node(23, Edges::new()).unwrap();
    assert!(graph.contains(target));

    let source = graph.add_node(47, Edges::new().next(target)).unwrap();
    assert!(graph.contains(source));
    assert_eq!(graph.edge(source, EdgeLabel::Next), Some(target));
    assert_eq!(graph.edges_to(target), vec![(source, EdgeLabel::Next)]);
    assert_eq!(graph.node(source), Some(&47));
}

#[test]
fn add_node_without_edges() {
    let mut graph: CfGraph<u32> = CfGraph::new();
    let node = graph.add_node(23, Edges::new()).unwrap();
    assert!(graph.contains(node));
    assert_eq!(graph.edge_labels(node), vec![]);
}

#[test]
fn add_node_edge_to_removed_node() {
    let mut graph: CfGraph<u32> = CfGraph::new();
    let stale = graph.add_node(23, Edges::new()).unwrap();
    graph.remove_node(stale).unwrap();

    let result = graph.add_node(47, Edges::new().next(stale));
    assert_eq!(result, Err(GraphError::MissingTarget(stale)));
}

#[test]
fn setting_a_label_twice_keeps_the_later_target() {
    let mut graph: CfGraph<u32> = CfGraph::new();
    let first = graph.add_node(1, Edges::new()).unwrap();
    let second = graph.add_node(2, Edges::new()).unwrap();

    let source = graph
        .add_node(3, Edges::new().next(first).next(second))
        .unwrap();
    assert_eq!(graph.edge(source, EdgeLabel::Next), Some(second));
    assert_eq!(graph.edge_labels(source), vec![EdgeLabel::Next]);
    assert_eq!(graph.edges_to(first), vec![]);
}

#[test]
fn remove_node() {
    let mut graph: CfGraph<u32> = CfGraph::new();
    let node = graph.add_node(47, Edges::new()).unwrap();
    assert!(graph.contains(node));
    graph.remove_node(node).unwrap();
    assert!(!graph.contains(node));
}

#[test]
fn remove_nonexistent_node() {
    let mut graph: CfGraph<u32> = CfGraph::new();
    let node = graph.add_node(47, Edges::new()).unwrap();
    graph.remove_node(node).unwrap();
    assert_eq!(graph.remove_node(node), Err(GraphError::NotPresent(node)));
}

#[test]
fn remove_node_with_forward_edges() {
    let mut graph: CfGraph<u32> = CfGraph::new();
    let target = graph.add_node(24, Edges::new()).unwrap();
    let source = graph.add_node(23, Edges::new().next(target)).unwrap();

    assert_eq!(graph.remove_node(source), Err(GraphError::NotIsolated(source)));
    assert!(graph.contains(source));
}

#[test]
fn remove_node_with_back_edges() {
    let mut graph: CfGraph<u32> = CfGraph::new();
    let target = graph.add_node(24, Edges::new()).unwrap();
    let source = graph.add_node(23, Edges::new().next(target)).unwrap();

    assert_eq!(graph.remove_node(target), Err(GraphError::NotIsolated(target)));
    assert!(graph.contains(target));
    assert_eq!(graph.edge(source, EdgeLabel::Next), Some(target));
}

#[test]
fn collapse_node() {
    let mut graph: CfGraph<u32> = CfGraph::new();
    let target = graph.add_node(3, Edges::new()).unwrap();
    let dummy = graph.add_node(2, Edges::new()).unwrap();
    let step_source = graph.add_node(1, Edges::new().enter(dummy)).unwrap();
    let next_source = graph.add_node(0, Edges::new().next(dummy)).unwrap();

    assert!(graph.contains(dummy));
    assert_eq!(graph.edge_labels(dummy), vec![]);
    assert_eq!(graph.edge(step_source, EdgeLabel::Enter), Some(dummy));
    assert_eq!(graph.edge(next_source, EdgeLabel::Next), Some(dummy));
    assert_eq!(graph.edges_to(target), vec![]);

    graph.collapse_node(dummy, target).unwrap();

    assert!(!graph.contains(dummy));
    assert_eq!(graph.edge_labels(step_source), vec![EdgeLabel::Enter]);
    assert_eq!(graph.edge(step_source, EdgeLabel::Enter), Some(target));
    assert_eq!(graph.edge(next_source, EdgeLabel::Next), Some(target));
    assert_eq!(
        graph.edges_to(target),
        vec![(step_source, EdgeLabel::Enter), (next_source, EdgeLabel::Next)]
    );
}

#[test]
fn collapse_node_with_forward_edges() {
    let mut graph: CfGraph<u32> = CfGraph::new();
    let target = graph.add_node(3, Edges::new()).unwrap();
    let dummy = graph.add_node(2, Edges::new().next(target)).unwrap();

    assert_eq!(
        graph.collapse_node(dummy, target),
        Err(GraphError::HasOutgoingEdges(dummy))
    );
    assert!(graph.contains(dummy));
}

#[test]
fn collapse_node_with_unknown_node() {
    let mut graph: CfGraph<u32> = CfGraph::new();
    let target = graph.add_node(3, Edges::new()).unwrap();
    let gone = graph.add_node(1, Edges::new()).unwrap();
    graph.remove_node(gone).unwrap();

    assert_eq!(graph.collapse_node(gone, target), Err(GraphError::NotPresent(gone)));
    assert_eq!(graph.collapse_node(target, gone), Err(GraphError::NotPresent(gone)));
}

#[test]
fn collapse_node_onto_itself() {
    let mut graph: CfGraph<u32> = CfGraph::new();
    let node = graph.add_node(3, Edges::new()).unwrap();

    assert_eq!(graph.collapse_node(node, node), Err(GraphError::CollapseOntoSelf(node)));
}

#[test]
fn collapse_node_can_create_self_loop() {
    let mut graph: CfGraph<u32> = CfGraph::new();
    let dummy = graph.add_node(0, Edges::new()).unwrap();
    let node = graph.add_node(1, Edges::new().next(dummy)).unwrap();

    graph.collapse_node(dummy, node).unwrap();

    assert_eq!(graph.edge(node, EdgeLabel::Next), Some(node));
    assert_eq!(graph.edges_to(node), vec![(node, EdgeLabel::Next)]);
}

#[test]
fn parallel_edges_with_distinct_labels() {
    let mut graph: CfGraph<u32> = CfGraph::new();
    let target = graph.add_node(0, Edges::new()).unwrap();
    let source = graph
        .add_node(1, Edges::new().enter(target).else_(target).error(target))
        .unwrap();

    assert_eq!(
        graph.edge_labels(source),
        vec![EdgeLabel::Error, EdgeLabel::Enter, EdgeLabel::Else]
    );
    assert_eq!(graph.edge(source, EdgeLabel::Enter), Some(target));
    assert_eq!(graph.edge(source, EdgeLabel::Else), Some(target));
    assert_eq!(graph.edge(source, EdgeLabel::Error), Some(target));
    assert_eq!(graph.edges_to(target).len(), 3);
}

#[test]
fn graph_serializes_to_json() {
    let mut graph: CfGraph<u32> = CfGraph::new();
    let target = graph.add_node(1, Edges::new()).unwrap();
    graph.add_node(2, Edges::new().next(target)).unwrap();

    let json = serde_json::to_string(&graph).unwrap();
    assert!(!json.is_empty());
}

#[test]
fn predecessors_of_untouched_node_is_none() {
    let mut graph: CfGraph<u32> = CfGraph::new();
    let lone = graph.add_node(0, Edges::new()).unwrap();
    assert!(graph.predecessors(lone).is_none());

    let source = graph.add_node(1, Edges::new().next(lone)).unwrap();
    assert_eq!(graph.predecessors(lone).unwrap().into_vec(), vec![source]);
}
