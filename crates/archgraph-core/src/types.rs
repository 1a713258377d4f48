use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub type NodeId = String;
pub type EdgeId = String;

/// Relationship type name the graph store uses for structural containment.
pub const CONTAINS: &str = "CONTAINS";

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Interaction {
    Containment,
    #[default]
    Dependency,
}

impl Interaction {
    /// Classifies a raw relationship type. Anything other than `CONTAINS` is a dependency.
    pub fn from_relationship_type(rel_type: &str) -> Self {
        if rel_type.eq_ignore_ascii_case(CONTAINS) {
            Interaction::Containment
        } else {
            Interaction::Dependency
        }
    }

    pub fn is_containment(self) -> bool {
        self == Interaction::Containment
    }
}

impl fmt::Display for Interaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Interaction::Containment => "containment",
            Interaction::Dependency => "dependency",
        };
        write!(f, "{}", s)
    }
}

/// Which way dependency traversal ran when the records were produced.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Dependencies of the selection.
    #[default]
    Outgoing,
    /// Dependents of the selection.
    Incoming,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Outgoing => write!(f, "outgoing"),
            Direction::Incoming => write!(f, "incoming"),
        }
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "outgoing" | "dependencies" => Ok(Direction::Outgoing),
            "incoming" | "dependents" => Ok(Direction::Incoming),
            other => Err(format!("unknown direction: {}", other)),
        }
    }
}

/// Restricts dependency relations relative to the selected node's containment subtree.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum RelationScope {
    #[default]
    All,
    /// Both endpoints lie inside the selection.
    Internal,
    /// Exactly one endpoint lies inside the selection.
    External,
}
