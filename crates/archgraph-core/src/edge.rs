use crate::{EdgeId, Interaction, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeProperties {
    pub weight: u32,
    /// Set when the edge takes part in at least one realized dependency cycle.
    #[serde(default)]
    pub cycle: bool,
}

impl Default for EdgeProperties {
    fn default() -> Self {
        Self {
            weight: 1,
            cycle: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
    pub interaction: Interaction,
    pub properties: EdgeProperties,
    /// Raw edges this edge stands for. Merging edges unions these sets.
    #[serde(skip)]
    pub raw_ids: BTreeSet<EdgeId>,
}

impl Edge {
    pub fn new(
        id: impl Into<EdgeId>,
        source: impl Into<NodeId>,
        target: impl Into<NodeId>,
        interaction: Interaction,
    ) -> Self {
        let id = id.into();
        Self {
            raw_ids: BTreeSet::from([id.clone()]),
            id,
            source: source.into(),
            target: target.into(),
            interaction,
            properties: EdgeProperties::default(),
        }
    }

    pub fn dependency(
        id: impl Into<EdgeId>,
        source: impl Into<NodeId>,
        target: impl Into<NodeId>,
    ) -> Self {
        Self::new(id, source, target, Interaction::Dependency)
    }

    pub fn with_weight(mut self, weight: u32) -> Self {
        self.properties.weight = weight;
        self
    }

    /// Ids of the raw edges behind this edge; an edge with no recorded origin stands for itself.
    pub fn raw_edge_ids(&self) -> Vec<&str> {
        if self.raw_ids.is_empty() {
            vec![self.id.as_str()]
        } else {
            self.raw_ids.iter().map(String::as_str).collect()
        }
    }

    pub fn is_self_edge(&self) -> bool {
        self.source == self.target
    }

    /// Id of the rendered edge standing for every raw edge merged onto `source -> target`.
    pub fn derived_id(source: &str, target: &str) -> EdgeId {
        format!("{}->{}", source, target)
    }
}
