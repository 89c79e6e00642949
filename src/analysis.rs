use crate::ast::Stmt;
use crate::graph::{CfGraph, EdgeLabel, NodeIdx};
use crate::node::CfNode;

/// The result of a control-flow analysis of one module, function,
/// coroutine or class body.
///
/// `entry_node` is the first node executed when control enters the unit.
/// The three terminal nodes are present only when reachable: `leave_node`
/// is reached by a plain `return` or by falling off the end, `return_node`
/// by a `return` with a value, and `raise_node` by an uncaught exception.
///
/// The graph is read-only from here on.
#[derive(Debug)]
pub struct Analysis<'a> {
    graph: CfGraph<CfNode<'a>>,
    pub entry_node: NodeIdx,
    pub leave_node: Option<NodeIdx>,
    pub raise_node: Option<NodeIdx>,
    pub return_node: Option<NodeIdx>,
}

impl<'a> Analysis<'a> {
    pub(crate) fn new(
        graph: CfGraph<CfNode<'a>>,
        entry_node: NodeIdx,
        leave_node: Option<NodeIdx>,
        raise_node: Option<NodeIdx>,
        return_node: Option<NodeIdx>,
    ) -> Self {
        Analysis { graph, entry_node, leave_node, raise_node, return_node }
    }

    /// The underlying control-flow graph.
    pub fn graph(&self) -> &CfGraph<CfNode<'a>> {
        &self.graph
    }

    /// All nodes of the graph.
    pub fn nodes(&self) -> impl Iterator<Item = NodeIdx> + '_ {
        self.graph.nodes()
    }

    /// The payload of a node.
    pub fn node(&self, node: NodeIdx) -> Option<&CfNode<'a>> {
        self.graph.node(node)
    }

    /// The target of the given edge, if present.
    pub fn edge(&self, source: NodeIdx, label: EdgeLabel) -> Option<NodeIdx> {
        self.graph.edge(source, label)
    }

    /// The labels of all out-edges of a node, in label order.
    pub fn edge_labels(&self, source: NodeIdx) -> Vec<EdgeLabel> {
        self.graph.edge_labels(source)
    }

    /// All (source, label) pairs of edges pointing at the given node.
    pub fn edges_to(&self, target: NodeIdx) -> Vec<(NodeIdx, EdgeLabel)> {
        self.graph.edges_to(target)
    }

    /// The nodes whose AST back-reference is the given statement, compared
    /// by identity. Usually one node; statements inside a `finally` block
    /// yield one node per analysed copy of the block.
    pub fn nodes_for(&self, statement: &Stmt) -> Vec<NodeIdx> {
        self.graph
            .nodes()
            .filter(|&node| match self.graph.node(node) {
                Some(payload) => payload.ast.map_or(false, |ast| ast.is_stmt(statement)),
                None => false,
            })
            .collect()
    }
}
