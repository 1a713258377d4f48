// ABOUTME: Raw traversal records as returned by the graph store (paths and elementary cycles)
// ABOUTME: Only ids are trusted; every node property is optional and defaulted on conversion

use crate::{EdgeId, Interaction, Node, NodeId, NodeProperties};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeRecordProperties {
    #[serde(default)]
    pub simple_name: Option<String>,
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub depth: Option<u32>,
    /// Back-reference to the original element when this node was produced by lifting.
    #[serde(default)]
    pub lifted_from: Option<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeRecord {
    pub element_id: NodeId,
    /// The first label is the structural layer (`Domain`, `Layer`, `Module`, ...).
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub properties: NodeRecordProperties,
}

impl NodeRecord {
    pub fn new(element_id: impl Into<NodeId>, layer: impl Into<String>) -> Self {
        Self {
            element_id: element_id.into(),
            labels: vec![layer.into()],
            properties: NodeRecordProperties::default(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.properties.simple_name = Some(name.into());
        self
    }

    pub fn with_depth(mut self, depth: u32) -> Self {
        self.properties.depth = Some(depth);
        self
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.properties.kind = Some(kind.into());
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.properties.color = Some(color.into());
        self
    }

    pub fn lifted_from(mut self, original: impl Into<NodeId>) -> Self {
        self.properties.lifted_from = Some(original.into());
        self
    }

    pub fn layer(&self) -> &str {
        self.labels.first().map(String::as_str).unwrap_or_default()
    }

    /// The id this node stands for in the visible graph before abstraction.
    pub fn origin_id(&self) -> &str {
        self.properties
            .lifted_from
            .as_deref()
            .unwrap_or(&self.element_id)
    }

    pub fn to_node(&self) -> Node {
        let props = &self.properties;
        Node {
            id: self.element_id.clone(),
            label: props.simple_name.clone().unwrap_or_default(),
            properties: NodeProperties {
                kind: props.kind.clone().unwrap_or_default(),
                layer: self.layer().to_string(),
                color: props.color.clone().unwrap_or_default(),
                depth: props.depth.unwrap_or(Node::DEFAULT_DEPTH),
                selected: false,
            },
            parent: None,
            depth_defaulted: props.depth.is_none(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeRecord {
    pub element_id: EdgeId,
    pub start_element_id: NodeId,
    pub end_element_id: NodeId,
    #[serde(rename = "type")]
    pub rel_type: String,
}

impl EdgeRecord {
    pub fn new(
        element_id: impl Into<EdgeId>,
        start: impl Into<NodeId>,
        end: impl Into<NodeId>,
        rel_type: impl Into<String>,
    ) -> Self {
        Self {
            element_id: element_id.into(),
            start_element_id: start.into(),
            end_element_id: end.into(),
            rel_type: rel_type.into(),
        }
    }

    pub fn contains(
        element_id: impl Into<EdgeId>,
        parent: impl Into<NodeId>,
        child: impl Into<NodeId>,
    ) -> Self {
        Self::new(element_id, parent, child, crate::CONTAINS)
    }

    pub fn interaction(&self) -> Interaction {
        Interaction::from_relationship_type(&self.rel_type)
    }
}

/// One traversal result: `source`, `target` and every intermediate node, plus the ordered edges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathRecord {
    pub source: NodeRecord,
    pub target: NodeRecord,
    #[serde(default)]
    pub edges: Vec<EdgeRecord>,
    /// Intermediate nodes, in any order.
    #[serde(default)]
    pub nodes: Vec<NodeRecord>,
}

impl PathRecord {
    pub fn new(source: NodeRecord, target: NodeRecord, edges: Vec<EdgeRecord>) -> Self {
        Self {
            source,
            target,
            edges,
            nodes: Vec::new(),
        }
    }

    pub fn with_nodes(mut self, nodes: Vec<NodeRecord>) -> Self {
        self.nodes = nodes;
        self
    }

    /// Source, target and intermediates, source first.
    pub fn all_nodes(&self) -> impl Iterator<Item = &NodeRecord> {
        std::iter::once(&self.source)
            .chain(std::iter::once(&self.target))
            .chain(self.nodes.iter())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleSegment {
    pub edge: EdgeRecord,
    pub start: NodeRecord,
    pub end: NodeRecord,
}

/// An elementary cycle reported by the cycle finder. The first segment starts and the last
/// segment ends at `anchor`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleRecord {
    pub anchor: NodeRecord,
    pub segments: Vec<CycleSegment>,
    #[serde(default)]
    pub length: usize,
}

impl CycleRecord {
    pub fn new(anchor: NodeRecord, segments: Vec<CycleSegment>) -> Self {
        let length = segments.len();
        Self {
            anchor,
            segments,
            length,
        }
    }

    pub fn node_ids(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().flat_map(|s| {
            [s.start.element_id.as_str(), s.end.element_id.as_str()]
        })
    }
}
