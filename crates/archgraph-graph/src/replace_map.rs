use crate::preprocess::{root_first, DecomposedPath};
use archgraph_core::NodeId;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::warn;

/// The abstraction map: a partial function collapsing node ids onto an ancestor.
///
/// Targets are never themselves keys, so [`ReplaceMap::resolve`] is idempotent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReplaceMap {
    entries: BTreeMap<NodeId, NodeId>,
}

/// Collects every proposed `from -> to` pair before any choice is made, so the resulting map
/// does not depend on the order proposals arrive in.
#[derive(Debug, Default)]
pub struct ReplaceMapBuilder {
    candidates: BTreeMap<NodeId, BTreeSet<NodeId>>,
}

impl ReplaceMapBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn propose(&mut self, from: &str, to: &str) {
        if from == to {
            return;
        }
        self.candidates
            .entry(from.to_string())
            .or_default()
            .insert(to.to_string());
    }

    /// Proposes the collapse of one containment chunk: with the chunk ordered root-first,
    /// every edge from index `max_depth` on is cut and its child maps to the parent of the
    /// first cut edge.
    pub fn propose_chunk(&mut self, chunk: &[archgraph_core::EdgeRecord], max_depth: usize) {
        let ordered = root_first(chunk);
        if ordered.len() <= max_depth {
            return;
        }
        let anchor = ordered[max_depth].start_element_id.as_str();
        for edge in &ordered[max_depth..] {
            self.propose(&edge.end_element_id, anchor);
        }
    }

    pub fn propose_map(&mut self, map: &ReplaceMap) {
        for (from, to) in map.iter() {
            self.propose(from, to);
        }
    }

    /// Picks one target per id (shallowest by `depth_of`, then smallest id) and compresses
    /// chains so no target is also a key.
    pub fn build(self, depth_of: impl Fn(&str) -> Option<u32>) -> ReplaceMap {
        let mut entries = BTreeMap::new();
        for (from, targets) in self.candidates {
            let rank = |id: &str| depth_of(id).unwrap_or(u32::MAX);
            let chosen = targets
                .iter()
                .min_by(|a, b| rank(a.as_str()).cmp(&rank(b.as_str())).then_with(|| a.cmp(b)))
                .cloned();
            if targets.len() > 1 {
                warn!(
                    node = %from,
                    targets = ?targets,
                    chosen = ?chosen,
                    "conflicting collapse targets"
                );
            }
            if let Some(to) = chosen {
                entries.insert(from, to);
            }
        }
        ReplaceMap::compressed(entries)
    }
}

impl ReplaceMap {
    /// Builds the map for a set of decomposed paths at the given depth cutoff.
    pub fn from_paths(
        records: &[DecomposedPath],
        max_depth: usize,
        depth_of: impl Fn(&str) -> Option<u32>,
    ) -> Self {
        let mut builder = ReplaceMapBuilder::new();
        for record in records {
            for chunk in record.containment_chunks() {
                builder.propose_chunk(chunk, max_depth);
            }
        }
        builder.build(depth_of)
    }

    fn compressed(raw: BTreeMap<NodeId, NodeId>) -> Self {
        let mut entries = BTreeMap::new();
        for from in raw.keys() {
            let mut seen: Vec<&str> = vec![from.as_str()];
            let mut current = raw[from].as_str();
            let fixed = loop {
                match raw.get(current) {
                    Some(next) if !seen.contains(&current) => {
                        seen.push(current);
                        current = next.as_str();
                    }
                    Some(_) => {
                        // Looped: everything on the loop collapses onto its smallest id.
                        let start = seen.iter().position(|s| *s == current).unwrap_or(0);
                        break seen[start..].iter().copied().min().unwrap_or(current);
                    }
                    None => break current,
                }
            };
            if fixed != from {
                entries.insert(from.clone(), fixed.to_string());
            }
        }
        Self { entries }
    }

    pub fn get(&self, id: &str) -> Option<&NodeId> {
        self.entries.get(id)
    }

    /// The id `id` is rendered as; identity when unmapped.
    pub fn resolve<'a>(&'a self, id: &'a str) -> &'a str {
        self.entries.get(id).map(String::as_str).unwrap_or(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NodeId, &NodeId)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
