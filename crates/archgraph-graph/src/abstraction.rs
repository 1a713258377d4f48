// ABOUTME: Collapses pre-processed paths to a depth-bounded view (replace map, rewrite, dedup)
// ABOUTME: Containment edges become parent pointers; self-edge and neighbor filters run per record

use crate::preprocess::{root_first, DecomposedPath, PreprocessedPaths};
use crate::{GraphView, ReplaceMap};
use archgraph_core::{
    Edge, EdgeId, EdgeRecord, Node, NodeId, RelationScope, RequestConfig,
};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, instrument, warn};

pub struct AbstractionEngine<'a> {
    config: &'a RequestConfig,
}

impl<'a> AbstractionEngine<'a> {
    pub fn new(config: &'a RequestConfig) -> Self {
        Self { config }
    }

    #[instrument(
        skip_all,
        fields(records = paths.records.len(), max_depth = self.config.max_depth)
    )]
    pub fn abstract_paths(&self, paths: &PreprocessedPaths) -> GraphView {
        let depth_of = |id: &str| paths.nodes.get(id).and_then(|n| n.properties.depth);
        let replace_map = ReplaceMap::from_paths(&paths.records, self.config.max_depth, depth_of);

        let parents = containment_parents(&paths.records);
        let records: Vec<&DecomposedPath> = paths
            .records
            .iter()
            .filter(|r| self.within_dependency_depth(r))
            .filter(|r| self.in_scope(r, &parents))
            .collect();
        let records = self.filter_by_neighbors(records, &replace_map);

        let dependencies = dedupe_edges(rewrite_dependencies(&records, &replace_map));
        let containment = surviving_containment(&records, self.config.max_depth, &replace_map);

        // Endpoints of suppressed self edges still count as referenced.
        let mut referenced: BTreeSet<&str> = BTreeSet::new();
        for edge in &dependencies {
            referenced.insert(&edge.source);
            referenced.insert(&edge.target);
        }
        for (parent, child) in containment.values() {
            referenced.insert(parent);
            referenced.insert(child);
        }

        let mut nodes: BTreeMap<NodeId, Node> = BTreeMap::new();
        for id in referenced {
            match paths.nodes.get(id) {
                Some(record) => {
                    nodes.insert(id.to_string(), record.to_node());
                }
                None => warn!(node = id, "edge references a node absent from every path"),
            }
        }

        project_containment(&mut nodes, &containment);

        let edges: BTreeMap<EdgeId, Edge> = dependencies
            .into_iter()
            .filter(|e| self.config.self_edges || !e.is_self_edge())
            .map(|e| (e.id.clone(), e))
            .collect();

        if let Some(selected) = self.config.selected.as_deref() {
            if let Some(node) = nodes.get_mut(selected) {
                node.properties.selected = true;
            }
        }

        debug!(
            kept_records = records.len(),
            nodes = nodes.len(),
            edges = edges.len(),
            collapsed = replace_map.len(),
            "abstracted view"
        );

        GraphView {
            nodes,
            edges,
            replace_map,
        }
    }

    fn within_dependency_depth(&self, record: &DecomposedPath) -> bool {
        self.config
            .dependency_depth
            .map_or(true, |depth| record.dependencies.len() <= depth)
    }

    fn in_scope(&self, record: &DecomposedPath, parents: &BTreeMap<&str, &str>) -> bool {
        let Some(selected) = self.config.selected.as_deref() else {
            return true;
        };
        let (Some(first), Some(last)) = (record.dependencies.first(), record.dependencies.last())
        else {
            return true;
        };
        let inside = |id: &str| is_within(id, selected, parents);
        let source_inside = inside(&first.start_element_id);
        let target_inside = inside(&last.end_element_id);
        match self.config.scope {
            RelationScope::All => true,
            RelationScope::Internal => source_inside && target_inside,
            RelationScope::External => source_inside != target_inside,
        }
    }

    /// Drops records whose anchor has a distinct-neighbor count outside the configured bounds.
    /// Outgoing anchors are the source of a record's first dependency step, incoming anchors
    /// the target of its last one; both are counted at the abstraction granularity.
    fn filter_by_neighbors<'r>(
        &self,
        records: Vec<&'r DecomposedPath>,
        replace_map: &ReplaceMap,
    ) -> Vec<&'r DecomposedPath> {
        let outgoing = self.config.outgoing;
        let incoming = self.config.incoming;
        if outgoing.is_unbounded() && incoming.is_unbounded() {
            return records;
        }

        let count = |step: fn(&DecomposedPath, &ReplaceMap) -> Option<(NodeId, NodeId)>| {
            let mut neighbors: BTreeMap<NodeId, BTreeSet<NodeId>> = BTreeMap::new();
            for record in &records {
                if let Some((anchor, neighbor)) = step(record, replace_map) {
                    let entry = neighbors.entry(anchor.clone()).or_default();
                    if anchor != neighbor || self.config.self_edges {
                        entry.insert(neighbor);
                    }
                }
            }
            neighbors
        };
        let outgoing_counts = count(outgoing_step);
        let incoming_counts = count(incoming_step);

        let within = |bounds: archgraph_core::NeighborBounds,
                      counts: &BTreeMap<NodeId, BTreeSet<NodeId>>,
                      step: Option<(NodeId, NodeId)>| {
            match step {
                Some((anchor, _)) if !bounds.is_unbounded() => {
                    bounds.contains(counts.get(&anchor).map_or(0, BTreeSet::len))
                }
                _ => true,
            }
        };

        let before = records.len();
        let kept: Vec<&DecomposedPath> = records
            .iter()
            .copied()
            .filter(|r| {
                within(outgoing, &outgoing_counts, outgoing_step(r, replace_map))
                    && within(incoming, &incoming_counts, incoming_step(r, replace_map))
            })
            .collect();
        debug!(
            dropped = before - kept.len(),
            "applied neighbor-count bounds"
        );
        kept
    }
}

/// Convenience wrapper running the engine once.
pub fn abstract_view(paths: &PreprocessedPaths, config: &RequestConfig) -> GraphView {
    AbstractionEngine::new(config).abstract_paths(paths)
}

fn outgoing_step(record: &DecomposedPath, map: &ReplaceMap) -> Option<(NodeId, NodeId)> {
    let edge = record.dependencies.first()?;
    Some((
        map.resolve(&edge.start_element_id).to_string(),
        map.resolve(&edge.end_element_id).to_string(),
    ))
}

fn incoming_step(record: &DecomposedPath, map: &ReplaceMap) -> Option<(NodeId, NodeId)> {
    let edge = record.dependencies.last()?;
    Some((
        map.resolve(&edge.end_element_id).to_string(),
        map.resolve(&edge.start_element_id).to_string(),
    ))
}

/// Raw child -> parent index over every containment edge in the request.
fn containment_parents(records: &[DecomposedPath]) -> BTreeMap<&str, &str> {
    let mut parents = BTreeMap::new();
    for edge in records.iter().flat_map(DecomposedPath::containment_edges) {
        parents
            .entry(edge.end_element_id.as_str())
            .or_insert(edge.start_element_id.as_str());
    }
    parents
}

fn is_within(id: &str, ancestor: &str, parents: &BTreeMap<&str, &str>) -> bool {
    let mut current = id;
    let mut steps = 0;
    loop {
        if current == ancestor {
            return true;
        }
        match parents.get(current) {
            Some(parent) if steps <= parents.len() => {
                current = *parent;
                steps += 1;
            }
            _ => return false,
        }
    }
}

/// Distinct raw dependency edges (by id) with endpoints substituted through the map.
pub fn rewrite_dependencies(records: &[&DecomposedPath], map: &ReplaceMap) -> Vec<Edge> {
    let mut raw: BTreeMap<&str, &EdgeRecord> = BTreeMap::new();
    for edge in records.iter().flat_map(|r| r.dependencies.iter()) {
        raw.entry(edge.element_id.as_str()).or_insert(edge);
    }
    raw.into_values()
        .map(|e| {
            Edge::dependency(
                e.element_id.clone(),
                map.resolve(&e.start_element_id),
                map.resolve(&e.end_element_id),
            )
        })
        .collect()
}

/// Merges edges sharing `(source, target)`. A pair standing for a single raw edge keeps that
/// edge untouched; otherwise the merged edge gets the derived id `source->target`, the union of
/// the raw ids and a weight equal to the number of distinct raw edges. Re-running it over
/// already merged edges (as the merger does across views) counts each raw edge once.
pub fn dedupe_edges(edges: impl IntoIterator<Item = Edge>) -> Vec<Edge> {
    let mut pairs: BTreeMap<(NodeId, NodeId), Vec<Edge>> = BTreeMap::new();
    for edge in edges {
        pairs
            .entry((edge.source.clone(), edge.target.clone()))
            .or_default()
            .push(edge);
    }
    pairs
        .into_iter()
        .filter_map(|((source, target), mut group)| {
            let raw_ids: BTreeSet<EdgeId> = group
                .iter()
                .flat_map(Edge::raw_edge_ids)
                .map(str::to_string)
                .collect();
            if group.len() == 1 && raw_ids.len() == 1 {
                return group.pop();
            }
            let mut merged = group.into_iter().next()?;
            merged.id = match raw_ids.iter().next() {
                Some(only) if raw_ids.len() == 1 => only.clone(),
                _ => Edge::derived_id(&source, &target),
            };
            merged.properties.weight = u32::try_from(raw_ids.len()).unwrap_or(u32::MAX);
            merged.raw_ids = raw_ids;
            Some(merged)
        })
        .collect()
}

/// Containment edges above the cutoff, keyed by edge id, as `(parent, child)`.
fn surviving_containment(
    records: &[&DecomposedPath],
    max_depth: usize,
    map: &ReplaceMap,
) -> BTreeMap<EdgeId, (NodeId, NodeId)> {
    let mut kept = BTreeMap::new();
    for record in records {
        for chunk in record.containment_chunks() {
            for edge in root_first(chunk).into_iter().take(max_depth) {
                let parent = map.resolve(&edge.start_element_id);
                let child = map.resolve(&edge.end_element_id);
                if parent != child {
                    kept.entry(edge.element_id.clone())
                        .or_insert_with(|| (parent.to_string(), child.to_string()));
                }
            }
        }
    }
    kept
}

fn project_containment(
    nodes: &mut BTreeMap<NodeId, Node>,
    containment: &BTreeMap<EdgeId, (NodeId, NodeId)>,
) {
    for (edge_id, (parent, child)) in containment {
        if !nodes.contains_key(parent) {
            continue;
        }
        let Some(node) = nodes.get_mut(child) else {
            continue;
        };
        match node.parent.as_deref() {
            None => node.parent = Some(parent.clone()),
            Some(existing) if existing != parent => warn!(
                node = %child,
                existing,
                ignored = %parent,
                edge = %edge_id,
                "node has more than one container"
            ),
            Some(_) => {}
        }
    }
}
