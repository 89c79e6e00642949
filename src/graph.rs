use std::fmt::Display;

use itertools::Itertools;
use log::trace;
use petgraph::graph::NodeIndex;
use petgraph::stable_graph::StableDiGraph;
use petgraph::visit::EdgeRef;
use petgraph::Direction::{Incoming, Outgoing};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use vec1::Vec1;

/// A node index is essentially just a number. Indices stay valid across
/// removals of other nodes.
pub type NodeIdx = NodeIndex<u32>;

/// The four edge labels of the control-flow graph.
///
/// - `Next`:  control passes to the next statement (no error occurred)
/// - `Error`: control passes to the error path (an exception was raised)
/// - `Enter`: control enters the body of an if / loop / except / with block
/// - `Else`:  control passes on when a condition does not apply
#[derive(PartialEq,Eq,PartialOrd,Ord,Clone,Copy,Debug,Hash,Serialize,Deserialize)]
pub enum EdgeLabel {
    Next,
    Error,
    Enter,
    Else,
}

impl Display for EdgeLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            EdgeLabel::Next => "next",
            EdgeLabel::Error => "error",
            EdgeLabel::Enter => "enter",
            EdgeLabel::Else => "else",
        };
        write!(f, "{}", label)
    }
}

/// The out-edges of a node about to be added, at most one target per label.
///
/// Holding one optional target per label makes a duplicate label
/// unrepresentable; setting the same label twice keeps the later target.
#[derive(Clone,Copy,Debug,Default)]
pub struct Edges {
    next: Option<NodeIdx>,
    error: Option<NodeIdx>,
    enter: Option<NodeIdx>,
    else_: Option<NodeIdx>,
}

impl Edges {
    pub fn new() -> Self {
        Edges::default()
    }

    pub fn next(mut self, target: NodeIdx) -> Self {
        self.next = Some(target);
        self
    }

    pub fn error(mut self, target: NodeIdx) -> Self {
        self.error = Some(target);
        self
    }

    pub fn enter(mut self, target: NodeIdx) -> Self {
        self.enter = Some(target);
        self
    }

    pub fn else_(mut self, target: NodeIdx) -> Self {
        self.else_ = Some(target);
        self
    }

    fn entries(&self) -> Vec<(EdgeLabel, NodeIdx)> {
        let mut entries = Vec::new();
        if let Some(target) = self.next {
            entries.push((EdgeLabel::Next, target));
        }
        if let Some(target) = self.error {
            entries.push((EdgeLabel::Error, target));
        }
        if let Some(target) = self.enter {
            entries.push((EdgeLabel::Enter, target));
        }
        if let Some(target) = self.else_ {
            entries.push((EdgeLabel::Else, target));
        }
        entries
    }
}

/// A structural invariant of the graph was about to be broken. These are
/// programmer errors, never silently suppressed.
#[derive(PartialEq,Eq,Clone,Debug,Error)]
pub enum GraphError {
    #[error("edge target {0:?} is not in the graph")]
    MissingTarget(NodeIdx),
    #[error("node {0:?} is not in the graph")]
    NotPresent(NodeIdx),
    #[error("node {0:?} is not isolated: an edge still touches it")]
    NotIsolated(NodeIdx),
    #[error("node {0:?} cannot be collapsed: it has outgoing edges")]
    HasOutgoingEdges(NodeIdx),
    #[error("node {0:?} cannot be collapsed onto itself")]
    CollapseOntoSelf(NodeIdx),
}

/// The directed graph underlying the control flow graph.
///
/// Node payloads are arbitrary; the analyser instantiates it with
/// [`CfNode`](crate::node::CfNode). Per node there is at most one out-edge
/// per label, and the incoming-edge index is kept in lockstep with the
/// outgoing one by petgraph itself. The set of operations that can mutate
/// the graph is small:
///
/// - a new node can be added, together with edges to existing nodes;
/// - an isolated node can be removed;
/// - a node with no outgoing edges can be collapsed onto another node.
///
/// Self-loops cannot be constructed directly (a node's index does not exist
/// until it is inserted) but may arise from a collapse; that is the only
/// way a cycle ever enters the graph.
#[derive(Debug,Serialize)]
pub struct CfGraph<N> {
    graph: StableDiGraph<N, EdgeLabel>,
}

impl<N> CfGraph<N> {
    pub fn new() -> Self {
        CfGraph { graph: StableDiGraph::new() }
    }

    // Functions that change the state of the graph.

    /// Add a new node, along with edges to existing nodes.
    ///
    /// All targets must already be in the graph, otherwise `MissingTarget`
    /// is returned and the graph is unchanged.
    pub fn add_node(&mut self, weight: N, edges: Edges) -> Result<NodeIdx, GraphError> {
        let entries = edges.entries();
        for &(_, target) in &entries {
            if !self.graph.contains_node(target) {
                return Err(GraphError::MissingTarget(target));
            }
        }
        let node = self.graph.add_node(weight);
        for (label, target) in entries {
            self.graph.add_edge(node, target, label);
        }
        Ok(node)
    }

    /// Remove an isolated node. A node with any edge, incoming or outgoing,
    /// cannot be removed.
    pub fn remove_node(&mut self, node: NodeIdx) -> Result<(), GraphError> {
        if !self.graph.contains_node(node) {
            return Err(GraphError::NotPresent(node));
        }
        let isolated = self.graph.edges_directed(node, Outgoing).next().is_none()
            && self.graph.edges_directed(node, Incoming).next().is_none();
        if !isolated {
            return Err(GraphError::NotIsolated(node));
        }
        self.graph.remove_node(node);
        Ok(())
    }

    /// Identify `dummy` with `target`: rewrite every incoming edge of
    /// `dummy` to point at `target`, then remove `dummy`.
    ///
    /// `dummy` must have no outgoing edges. This is the only operation that
    /// can close a cycle; in particular the rewritten edges may become
    /// self-loops when a predecessor of `dummy` is `target` itself.
    pub fn collapse_node(&mut self, dummy: NodeIdx, target: NodeIdx) -> Result<(), GraphError> {
        if !self.graph.contains_node(dummy) {
            return Err(GraphError::NotPresent(dummy));
        }
        if !self.graph.contains_node(target) {
            return Err(GraphError::NotPresent(target));
        }
        if dummy == target {
            return Err(GraphError::CollapseOntoSelf(dummy));
        }
        if self.graph.edges_directed(dummy, Outgoing).next().is_some() {
            return Err(GraphError::HasOutgoingEdges(dummy));
        }

        trace!("collapsing {:?} onto {:?}", dummy, target);
        let incoming: Vec<_> = self
            .graph
            .edges_directed(dummy, Incoming)
            .map(|edge| (edge.id(), edge.source(), *edge.weight()))
            .collect();
        for (id, source, label) in incoming {
            self.graph.remove_edge(id);
            self.graph.add_edge(source, target, label);
        }
        self.graph.remove_node(dummy);
        Ok(())
    }

    // Functions for examining or traversing the graph.

    /// Whether the given node is in the graph.
    pub fn contains(&self, node: NodeIdx) -> bool {
        self.graph.contains_node(node)
    }

    /// The payload of a node, or `None` for an index not in the graph.
    pub fn node(&self, node: NodeIdx) -> Option<&N> {
        self.graph.node_weight(node)
    }

    /// All nodes of the graph, in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = NodeIdx> + '_ {
        self.graph.node_indices()
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// The target of the given edge, if present.
    pub fn edge(&self, source: NodeIdx, label: EdgeLabel) -> Option<NodeIdx> {
        self.graph
            .edges_directed(source, Outgoing)
            .find(|edge| *edge.weight() == label)
            .map(|edge| edge.target())
    }

    /// The labels of all out-edges of a node, in label order.
    pub fn edge_labels(&self, source: NodeIdx) -> Vec<EdgeLabel> {
        self.graph
            .edges_directed(source, Outgoing)
            .map(|edge| *edge.weight())
            .sorted()
            .collect()
    }

    /// All (source, label) pairs of edges pointing at the given node.
    pub fn edges_to(&self, target: NodeIdx) -> Vec<(NodeIdx, EdgeLabel)> {
        self.graph
            .edges_directed(target, Incoming)
            .map(|edge| (edge.source(), *edge.weight()))
            .sorted()
            .collect()
    }

    /// The predecessor nodes of a given node, one entry per incoming edge.
    /// A node with no predecessors yields `None`.
    pub fn predecessors(&self, target: NodeIdx) -> Option<Vec1<NodeIdx>> {
        let sources: Vec<_> = self
            .graph
            .edges_directed(target, Incoming)
            .map(|edge| edge.source())
            .collect();
        Vec1::try_from_vec(sources).ok()
    }
}

impl<N> Default for CfGraph<N> {
    fn default() -> Self {
        CfGraph::new()
    }
}
