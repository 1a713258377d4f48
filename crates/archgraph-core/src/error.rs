use std::fmt;

use thiserror::Error;

use crate::{EdgeId, NodeId};

#[derive(Error, Debug)]
pub enum ArchGraphError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("merged graph has {} dangling edge(s): {}", .0.len(), join_dangling(.0))]
    DanglingEdges(Vec<DanglingEdge>),

    #[error("no unambiguous root layer, candidates: [{}]", .candidates.join(", "))]
    AmbiguousRootLayer { candidates: Vec<String> },

    #[error("Malformed path record #{index}: {reason}")]
    MalformedPath { index: usize, reason: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, ArchGraphError>;

/// An edge whose source and/or target is absent from the node set it was merged into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DanglingEdge {
    pub edge_id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
    pub missing_source: bool,
    pub missing_target: bool,
}

impl fmt::Display for DanglingEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let missing = match (self.missing_source, self.missing_target) {
            (true, true) => format!("missing source {} and target {}", self.source, self.target),
            (true, false) => format!("missing source {}", self.source),
            (false, true) => format!("missing target {}", self.target),
            (false, false) => "no missing endpoint".to_string(),
        };
        write!(
            f,
            "edge {} ({} -> {}): {}",
            self.edge_id, self.source, self.target, missing
        )
    }
}

fn join_dangling(edges: &[DanglingEdge]) -> String {
    edges
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
