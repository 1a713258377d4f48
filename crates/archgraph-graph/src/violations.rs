// ABOUTME: Re-expresses raw elementary cycles at the granularity of the rendered graph
// ABOUTME: Collapses self steps, drops unrealized cycles, merges cycles abstracting to one path

use crate::GraphView;
use archgraph_core::{CycleRecord, CycleSegment, Edge, EdgeId, Node, NodeId, NodeRecord};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, instrument};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleStep {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
    pub source_node: Node,
    pub target_node: Node,
}

impl CycleStep {
    pub fn is_self_step(&self) -> bool {
        self.source == self.target
    }

    fn from_segment(segment: &CycleSegment) -> Self {
        Self {
            id: segment.edge.element_id.clone(),
            source: segment.start.element_id.clone(),
            target: segment.end.element_id.clone(),
            source_node: segment.start.to_node(),
            target_node: segment.end.to_node(),
        }
    }
}

/// A cycle exactly as the cycle finder reported it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActualCycle {
    pub anchor: Node,
    pub path: Vec<CycleStep>,
    pub length: usize,
}

impl ActualCycle {
    fn from_record(record: &CycleRecord) -> Self {
        let path: Vec<CycleStep> = record.segments.iter().map(CycleStep::from_segment).collect();
        let length = if record.length > 0 {
            record.length
        } else {
            path.len()
        };
        Self {
            anchor: record.anchor.to_node(),
            path,
            length,
        }
    }
}

/// One rendered cycle annotation, standing for every raw cycle that abstracts onto it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyCycle {
    pub id: String,
    pub anchor: Node,
    pub path: Vec<CycleStep>,
    pub length: usize,
    pub actual_cycles: Vec<ActualCycle>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Violations {
    pub dependency_cycles: Vec<DependencyCycle>,
}

impl Violations {
    pub fn is_empty(&self) -> bool {
        self.dependency_cycles.is_empty()
    }

    /// Ids of rendered edges taking part in at least one cycle.
    pub fn edge_ids(&self) -> BTreeSet<&str> {
        self.dependency_cycles
            .iter()
            .flat_map(|c| c.path.iter().map(|s| s.id.as_str()))
            .collect()
    }
}

pub struct ViolationProjector<'a> {
    view: &'a GraphView,
    pairs: BTreeMap<(&'a str, &'a str), &'a str>,
    /// Raw edge id to the id of the rendered edge standing for it.
    raw: BTreeMap<&'a str, &'a str>,
    allow_list: Option<&'a BTreeSet<NodeId>>,
}

impl<'a> ViolationProjector<'a> {
    pub fn new(view: &'a GraphView) -> Self {
        let pairs = view
            .edges
            .values()
            .map(|e| ((e.source.as_str(), e.target.as_str()), e.id.as_str()))
            .collect();
        let raw = view
            .edges
            .values()
            .flat_map(|e| e.raw_edge_ids().into_iter().map(move |raw| (raw, e.id.as_str())))
            .collect();
        Self {
            view,
            pairs,
            raw,
            allow_list: None,
        }
    }

    /// Only cycles whose every node is in `allow_list` are projected.
    pub fn restrict_to(mut self, allow_list: &'a BTreeSet<NodeId>) -> Self {
        self.allow_list = Some(allow_list);
        self
    }

    #[instrument(skip_all, fields(cycles = cycles.len()))]
    pub fn project(&self, cycles: &[CycleRecord]) -> Violations {
        let mut merged: BTreeMap<String, DependencyCycle> = BTreeMap::new();
        let mut unrealized = 0usize;

        for cycle in cycles.iter().filter(|c| self.allowed(c)) {
            let path = collapse_self_steps(
                cycle
                    .segments
                    .iter()
                    .map(|s| self.rewrite_segment(s))
                    .collect(),
            );
            if !path.iter().any(|s| self.view.edges.contains_key(&s.id)) {
                unrealized += 1;
                continue;
            }

            let anchor_id = self.resolve(&cycle.anchor);
            let key = cycle_key(&anchor_id, &path);
            merged
                .entry(key)
                .or_insert_with_key(|key| DependencyCycle {
                    id: format!("{:x}", Sha256::digest(key.as_bytes())),
                    anchor: self.node_data(&anchor_id, &cycle.anchor),
                    length: path.len(),
                    path,
                    actual_cycles: Vec::new(),
                })
                .actual_cycles
                .push(ActualCycle::from_record(cycle));
        }

        debug!(
            realized = merged.len(),
            unrealized, "projected dependency cycles"
        );
        Violations {
            dependency_cycles: merged.into_values().collect(),
        }
    }

    fn allowed(&self, cycle: &CycleRecord) -> bool {
        match self.allow_list {
            Some(allow) => cycle.node_ids().all(|id| allow.contains(id)),
            None => true,
        }
    }

    /// A lifted node stands for its original; everything passes through the replace map.
    fn resolve(&self, record: &NodeRecord) -> NodeId {
        self.view.replace_map.resolve(record.origin_id()).to_string()
    }

    fn node_data(&self, id: &str, record: &NodeRecord) -> Node {
        match self.view.node(id) {
            Some(node) => node.clone(),
            None if record.element_id == id => record.to_node(),
            None => Node::placeholder(id),
        }
    }

    fn rewrite_segment(&self, segment: &CycleSegment) -> CycleStep {
        let raw_id = segment.edge.element_id.as_str();
        let rendered = self.raw.get(raw_id).copied().unwrap_or(raw_id);
        if let Some(edge) = self.view.edge(rendered) {
            return CycleStep {
                id: edge.id.clone(),
                source: edge.source.clone(),
                target: edge.target.clone(),
                source_node: self.node_data(&edge.source, &segment.start),
                target_node: self.node_data(&edge.target, &segment.end),
            };
        }

        let source = self.resolve(&segment.start);
        let target = self.resolve(&segment.end);
        let id = self
            .pairs
            .get(&(source.as_str(), target.as_str()))
            .map(|id| id.to_string())
            .unwrap_or_else(|| Edge::derived_id(&source, &target));
        CycleStep {
            id,
            source_node: self.node_data(&source, &segment.start),
            target_node: self.node_data(&target, &segment.end),
            source,
            target,
        }
    }
}

/// Removes steps that became self loops. A cycle made only of self loops keeps its first one.
pub fn collapse_self_steps(steps: Vec<CycleStep>) -> Vec<CycleStep> {
    if steps.iter().all(CycleStep::is_self_step) {
        return steps.into_iter().take(1).collect();
    }
    steps.into_iter().filter(|s| !s.is_self_step()).collect()
}

fn cycle_key(anchor: &str, path: &[CycleStep]) -> String {
    let mut key = String::from(anchor);
    for step in path {
        key.push('|');
        key.push_str(&step.id);
    }
    key
}

/// Projects `cycles` onto `view` and flags every rendered edge on a realized cycle.
pub fn project_violations(
    view: &mut GraphView,
    cycles: &[CycleRecord],
    allow_list: Option<&BTreeSet<NodeId>>,
) -> Violations {
    let violations = {
        let projector = ViolationProjector::new(view);
        let projector = match allow_list {
            Some(allow) => projector.restrict_to(allow),
            None => projector,
        };
        projector.project(cycles)
    };
    for id in violations.edge_ids() {
        view.mark_cycle_edge(id);
    }
    violations
}
