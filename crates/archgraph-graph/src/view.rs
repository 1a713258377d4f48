use crate::ReplaceMap;
use archgraph_core::{Edge, EdgeId, Graph, Node, NodeId};
use std::collections::BTreeMap;

/// An abstracted (sub-)graph keyed by id, together with the map that produced it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GraphView {
    pub nodes: BTreeMap<NodeId, Node>,
    pub edges: BTreeMap<EdgeId, Edge>,
    pub replace_map: ReplaceMap,
}

impl GraphView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parts(
        nodes: impl IntoIterator<Item = Node>,
        edges: impl IntoIterator<Item = Edge>,
    ) -> Self {
        Self {
            nodes: nodes.into_iter().map(|n| (n.id.clone(), n)).collect(),
            edges: edges.into_iter().map(|e| (e.id.clone(), e)).collect(),
            replace_map: ReplaceMap::default(),
        }
    }

    pub fn with_replace_map(mut self, replace_map: ReplaceMap) -> Self {
        self.replace_map = replace_map;
        self
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn edge(&self, id: &str) -> Option<&Edge> {
        self.edges.get(id)
    }

    pub fn mark_cycle_edge(&mut self, id: &str) -> bool {
        match self.edges.get_mut(id) {
            Some(edge) => {
                edge.properties.cycle = true;
                true
            }
            None => false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    /// Rendered form, nodes and edges ordered by id.
    pub fn into_graph(self, name: impl Into<String>) -> Graph {
        Graph {
            name: name.into(),
            nodes: self.nodes.into_values().collect(),
            edges: self.edges.into_values().collect(),
        }
    }
}
