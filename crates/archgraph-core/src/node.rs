use crate::NodeId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeProperties {
    pub kind: String,
    pub layer: String,
    pub color: String,
    pub depth: u32,
    pub selected: bool,
}

/// A node of the rendered graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub label: String,
    pub properties: NodeProperties,
    /// Containing node, set by containment projection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<NodeId>,
    /// True when the raw record carried no depth and `properties.depth` holds the default.
    #[serde(skip)]
    pub depth_defaulted: bool,
}

impl Node {
    pub const DEFAULT_DEPTH: u32 = 0;

    /// A node known only by id, used when a resolved id has no record in the request.
    pub fn placeholder(id: impl Into<NodeId>) -> Self {
        Self {
            id: id.into(),
            label: String::new(),
            properties: NodeProperties::default(),
            parent: None,
            depth_defaulted: true,
        }
    }

    pub fn with_parent(mut self, parent: impl Into<NodeId>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn selected(mut self) -> Self {
        self.properties.selected = true;
        self
    }

    pub fn layer(&self) -> &str {
        &self.properties.layer
    }
}
