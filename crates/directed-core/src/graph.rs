//! Program graphs and the arena that owns them.
//!
//! A [`Graph`] stores its nodes in a petgraph `StableGraph` and realizes the
//! ordered parent/child lists as positional ports on edge weights: each edge
//! records its position in the source's out-edge order and the target's
//! in-edge order, assigned at insertion. Multi-edges between the same pair
//! of nodes are legal and keep distinct ports.
//!
//! Node-to-node references are arena indices ([`NodeId`]), never direct
//! references, so the cyclic topology has a single owner. A [`Program`] is
//! the arena of graphs for one linked compilation; sub-graph node types
//! refer into it by [`GraphId`].

use indexmap::IndexMap;

use petgraph::graph::NodeIndex;
use petgraph::stable_graph::StableGraph;
use petgraph::visit::EdgeRef;
use petgraph::{Directed, Direction};
use serde::{Deserialize, Serialize};

use crate::diagnostics::SourcePos;
use crate::error::LoadError;
use crate::id::{GraphId, NodeId};
use crate::node::Node;
use crate::node_type::NodeType;

/// Positional ports giving parent and child lists their order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    /// Position in the source node's child order.
    pub from_port: u16,
    /// Position in the target node's parent order.
    pub to_port: u16,
}

/// One graph definition: nodes, ordered edges, and input metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Graph {
    name: String,
    nparameters: usize,
    nargs: usize,
    topo: StableGraph<Node, Edge, Directed, u32>,
    /// Parameter input nodes first, then runtime-argument input nodes.
    input_nodes: Vec<NodeId>,
}

impl Graph {
    pub fn new(name: impl Into<String>, nparameters: usize, nargs: usize) -> Self {
        Graph {
            name: name.into(),
            nparameters,
            nargs,
            topo: StableGraph::new(),
            input_nodes: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn nparameters(&self) -> usize {
        self.nparameters
    }

    pub fn nargs(&self) -> usize {
        self.nargs
    }

    pub fn node_count(&self) -> usize {
        self.topo.node_count()
    }

    pub fn add_node(&mut self, node: Node) -> NodeId {
        NodeId::from(self.topo.add_node(node))
    }

    /// Connects `from` to `to`, appending to the source's child order and
    /// the target's parent order. Both ids must come from
    /// [`add_node`](Self::add_node) on this graph.
    pub fn add_edge(&mut self, from: NodeId, to: NodeId) {
        let from_port = self
            .topo
            .edges_directed(from.into(), Direction::Outgoing)
            .count() as u16;
        let to_port = self
            .topo
            .edges_directed(to.into(), Direction::Incoming)
            .count() as u16;
        self.topo
            .add_edge(from.into(), to.into(), Edge { from_port, to_port });
    }

    /// Marks a node as the next input, in declaration order.
    pub fn mark_input(&mut self, id: NodeId) {
        self.input_nodes.push(id);
    }

    pub fn input_nodes(&self) -> &[NodeId] {
        &self.input_nodes
    }

    pub fn node(&self, id: NodeId) -> &Node {
        let idx: NodeIndex<u32> = id.into();
        &self.topo[idx]
    }

    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.topo.node_indices().map(NodeId::from)
    }

    /// Children in out-edge order.
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        let mut edges: Vec<(u16, NodeId)> = self
            .topo
            .edges_directed(id.into(), Direction::Outgoing)
            .map(|edge| (edge.weight().from_port, NodeId::from(edge.target())))
            .collect();
        edges.sort_by_key(|(port, _)| *port);
        edges.into_iter().map(|(_, target)| target).collect()
    }

    /// Parents in in-edge order.
    pub fn parents(&self, id: NodeId) -> Vec<NodeId> {
        let mut edges: Vec<(u16, NodeId)> = self
            .topo
            .edges_directed(id.into(), Direction::Incoming)
            .map(|edge| (edge.weight().to_port, NodeId::from(edge.source())))
            .collect();
        edges.sort_by_key(|(port, _)| *port);
        edges.into_iter().map(|(_, source)| source).collect()
    }

    pub fn parent_count(&self, id: NodeId) -> usize {
        self.topo
            .edges_directed(id.into(), Direction::Incoming)
            .count()
    }

    /// Position of `from` in `target`'s parent order; the lowest port wins
    /// when the same node is a parent through several edges.
    pub fn parent_index(&self, target: NodeId, from: NodeId) -> Option<usize> {
        self.topo
            .edges_directed(target.into(), Direction::Incoming)
            .filter(|edge| NodeId::from(edge.source()) == from)
            .map(|edge| edge.weight().to_port as usize)
            .min()
    }

    /// Nodes with no parents that are not input nodes, in insertion order.
    pub fn parentless_nodes(&self) -> Vec<NodeId> {
        self.node_ids()
            .filter(|&id| self.parent_count(id) == 0 && !self.input_nodes.contains(&id))
            .collect()
    }

    /// Structural validation, run once the topology is complete.
    ///
    /// Rejects node types that demand parameters but carry none, and
    /// junction-typed nodes whose in-edge count falls outside the range
    /// their type declares.
    pub fn validate(&self) -> Result<(), LoadError> {
        for id in self.node_ids() {
            let node = self.node(id);
            if node.ty.requires_parameters() {
                return Err(LoadError::MissingParameters {
                    type_name: node.ty.to_string(),
                    pos: node.pos.clone(),
                });
            }
            if let Some(range) = node.ty.junction_range() {
                let found = self.parent_count(id);
                if !range.contains(found) {
                    return Err(LoadError::InEdgeCount {
                        type_name: node.ty.to_string(),
                        expected: range,
                        found,
                        pos: node.pos.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Incremental construction of a [`Graph`] with label resolution.
///
/// Front ends materialize a parsed definition through this builder: declare
/// named nodes, connect them (by id or by name), mark the inputs in
/// declaration order, then [`finish`](Self::finish) to validate.
#[derive(Debug)]
pub struct GraphBuilder {
    graph: Graph,
    names: IndexMap<String, NodeId>,
}

impl GraphBuilder {
    pub fn new(name: impl Into<String>, nparameters: usize, nargs: usize) -> Self {
        GraphBuilder {
            graph: Graph::new(name, nparameters, nargs),
            names: IndexMap::new(),
        }
    }

    /// Adds a named node. Fails when the name is already taken.
    pub fn declare(
        &mut self,
        name: &str,
        ty: NodeType,
        pos: SourcePos,
    ) -> Result<NodeId, LoadError> {
        if self.names.contains_key(name) {
            return Err(LoadError::RedeclaredName {
                name: name.to_string(),
                pos,
            });
        }
        let id = self.graph.add_node(Node::named(ty, name, pos));
        self.names.insert(name.to_string(), id);
        Ok(id)
    }

    /// Adds an unnamed node (literals, inline operators).
    pub fn add_anonymous(&mut self, ty: NodeType, pos: SourcePos) -> NodeId {
        self.graph.add_node(Node::new(ty, pos))
    }

    /// Resolves a declared name.
    pub fn lookup(&self, name: &str, pos: &SourcePos) -> Result<NodeId, LoadError> {
        self.names
            .get(name)
            .copied()
            .ok_or_else(|| LoadError::UnknownVariable {
                name: name.to_string(),
                pos: pos.clone(),
            })
    }

    pub fn connect(&mut self, from: NodeId, to: NodeId) {
        self.graph.add_edge(from, to);
    }

    /// Connects two nodes by their declared names.
    pub fn connect_named(&mut self, from: &str, to: &str, pos: &SourcePos) -> Result<(), LoadError> {
        let from = self.lookup(from, pos)?;
        let to = self.lookup(to, pos)?;
        self.connect(from, to);
        Ok(())
    }

    /// Marks a node as the next input, in declaration order.
    pub fn mark_input(&mut self, id: NodeId) {
        self.graph.mark_input(id);
    }

    /// Validates and returns the finished graph.
    pub fn finish(self) -> Result<Graph, LoadError> {
        debug_assert_eq!(
            self.graph.input_nodes.len(),
            self.graph.nparameters + self.graph.nargs,
            "input nodes must cover every parameter and argument"
        );
        self.graph.validate()?;
        Ok(self.graph)
    }
}

/// Arena of graphs for one linked program.
///
/// Graphs are immutable once added; instances hold the program by shared
/// reference for their whole run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Program {
    graphs: Vec<Graph>,
}

impl Program {
    pub fn new() -> Self {
        Program::default()
    }

    pub fn add_graph(&mut self, graph: Graph) -> GraphId {
        let id = GraphId(self.graphs.len() as u32);
        self.graphs.push(graph);
        id
    }

    pub fn graph(&self, id: GraphId) -> &Graph {
        &self.graphs[id.0 as usize]
    }

    pub fn graph_count(&self) -> usize {
        self.graphs.len()
    }

    pub fn graphs(&self) -> impl Iterator<Item = (GraphId, &Graph)> {
        self.graphs
            .iter()
            .enumerate()
            .map(|(index, graph)| (GraphId(index as u32), graph))
    }
}
