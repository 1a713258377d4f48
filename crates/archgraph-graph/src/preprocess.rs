// ABOUTME: Splits raw traversal paths into leading containment, dependency and trailing containment
// ABOUTME: Deduplicates nodes across paths and drops shorter ancestor chains of a dependency run

use archgraph_core::{
    ArchGraphError, Direction, EdgeId, EdgeRecord, Interaction, NodeId, NodeRecord, PathRecord,
    Result,
};
use std::collections::BTreeMap;
use tracing::debug;

/// A path record cut into its three contiguous chunks. Any chunk may be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecomposedPath {
    pub leading: Vec<EdgeRecord>,
    pub dependencies: Vec<EdgeRecord>,
    pub trailing: Vec<EdgeRecord>,
}

impl DecomposedPath {
    pub fn chunk_lengths(&self) -> (usize, usize, usize) {
        (
            self.leading.len(),
            self.dependencies.len(),
            self.trailing.len(),
        )
    }

    /// Ids of the dependency chunk, in path order.
    pub fn dependency_key(&self) -> Vec<EdgeId> {
        self.dependencies
            .iter()
            .map(|e| e.element_id.clone())
            .collect()
    }

    pub fn containment_chunks(&self) -> [&[EdgeRecord]; 2] {
        [&self.leading, &self.trailing]
    }

    pub fn containment_edges(&self) -> impl Iterator<Item = &EdgeRecord> {
        self.leading.iter().chain(self.trailing.iter())
    }
}

#[derive(Debug, Clone, Default)]
pub struct PreprocessedPaths {
    /// Every distinct node across the input, first occurrence wins.
    pub nodes: BTreeMap<NodeId, NodeRecord>,
    pub records: Vec<DecomposedPath>,
}

impl PreprocessedPaths {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

pub fn preprocess(paths: &[PathRecord], direction: Direction) -> Result<PreprocessedPaths> {
    let nodes = dedupe_nodes(paths);
    let records = paths
        .iter()
        .enumerate()
        .map(|(index, path)| decompose(index, &path.edges, direction))
        .collect::<Result<Vec<_>>>()?;
    let before = records.len();
    let records = keep_longest_ancestor_chains(records);
    debug!(
        paths = paths.len(),
        nodes = nodes.len(),
        kept = records.len(),
        dropped = before - records.len(),
        "preprocessed paths"
    );
    Ok(PreprocessedPaths { nodes, records })
}

pub fn dedupe_nodes(paths: &[PathRecord]) -> BTreeMap<NodeId, NodeRecord> {
    let mut nodes = BTreeMap::new();
    for node in paths.iter().flat_map(PathRecord::all_nodes) {
        nodes
            .entry(node.element_id.clone())
            .or_insert_with(|| node.clone());
    }
    nodes
}

/// Cuts an edge sequence into `[containment][dependency][containment]`.
pub fn decompose(
    index: usize,
    edges: &[EdgeRecord],
    direction: Direction,
) -> Result<DecomposedPath> {
    let runs = runs(edges);
    let chunk = |r: &(Interaction, usize, usize)| edges[r.1..r.2].to_vec();

    use Interaction::{Containment as C, Dependency as D};
    let kinds: Vec<Interaction> = runs.iter().map(|r| r.0).collect();
    let path = match kinds.as_slice() {
        [] => DecomposedPath::default(),
        [C] => split_containment(index, edges, direction)?,
        [D] => DecomposedPath {
            dependencies: chunk(&runs[0]),
            ..Default::default()
        },
        [C, D] => DecomposedPath {
            leading: chunk(&runs[0]),
            dependencies: chunk(&runs[1]),
            trailing: Vec::new(),
        },
        [D, C] => DecomposedPath {
            leading: Vec::new(),
            dependencies: chunk(&runs[0]),
            trailing: chunk(&runs[1]),
        },
        [C, D, C] => DecomposedPath {
            leading: chunk(&runs[0]),
            dependencies: chunk(&runs[1]),
            trailing: chunk(&runs[2]),
        },
        _ => {
            return Err(ArchGraphError::MalformedPath {
                index,
                reason: format!(
                    "expected at most one dependency run between containment runs, got {} runs",
                    runs.len()
                ),
            })
        }
    };
    Ok(path)
}

/// Maximal runs of equal interaction as `(interaction, start, end)`.
fn runs(edges: &[EdgeRecord]) -> Vec<(Interaction, usize, usize)> {
    let mut runs: Vec<(Interaction, usize, usize)> = Vec::new();
    for (i, edge) in edges.iter().enumerate() {
        let interaction = edge.interaction();
        match runs.last_mut() {
            Some(last) if last.0 == interaction => last.2 = i + 1,
            _ => runs.push((interaction, i, i + 1)),
        }
    }
    runs
}

/// Positions where a containment-only path changes vertical direction. A split at `k` puts
/// `edges[..k]` before the turn and `edges[k..]` after it.
pub fn turn_points(edges: &[EdgeRecord]) -> Vec<usize> {
    edges
        .windows(2)
        .enumerate()
        .filter(|(_, pair)| {
            pair[0].start_element_id == pair[1].start_element_id
                || pair[0].end_element_id == pair[1].end_element_id
        })
        .map(|(i, _)| i + 1)
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainOrientation {
    Single,
    /// Parent to child in path order.
    RootFirst,
    /// Child to parent in path order.
    LeafFirst,
    Broken,
}

pub fn orientation(chunk: &[EdgeRecord]) -> ChainOrientation {
    if chunk.len() < 2 {
        return ChainOrientation::Single;
    }
    let chained = |f: fn(&[EdgeRecord]) -> bool| chunk.windows(2).all(f);
    if chained(|p| p[0].end_element_id == p[1].start_element_id) {
        ChainOrientation::RootFirst
    } else if chained(|p| p[0].start_element_id == p[1].end_element_id) {
        ChainOrientation::LeafFirst
    } else {
        ChainOrientation::Broken
    }
}

/// The chunk ordered from its top-most edge down.
pub fn root_first(chunk: &[EdgeRecord]) -> Vec<&EdgeRecord> {
    let mut edges: Vec<&EdgeRecord> = chunk.iter().collect();
    if orientation(chunk) == ChainOrientation::LeafFirst {
        edges.reverse();
    }
    edges
}

fn split_containment(
    index: usize,
    edges: &[EdgeRecord],
    direction: Direction,
) -> Result<DecomposedPath> {
    let turns = turn_points(edges);
    let split = match direction {
        Direction::Outgoing => turns.first(),
        Direction::Incoming => turns.last(),
    };
    if let Some(&k) = split {
        return Ok(DecomposedPath {
            leading: edges[..k].to_vec(),
            dependencies: Vec::new(),
            trailing: edges[k..].to_vec(),
        });
    }

    let as_leading = match orientation(edges) {
        ChainOrientation::RootFirst => true,
        ChainOrientation::LeafFirst => false,
        ChainOrientation::Single => direction == Direction::Outgoing,
        ChainOrientation::Broken => {
            return Err(ArchGraphError::MalformedPath {
                index,
                reason: "containment edges do not form a chain".to_string(),
            })
        }
    };
    let chunk = edges.to_vec();
    Ok(if as_leading {
        DecomposedPath {
            leading: chunk,
            ..Default::default()
        }
    } else {
        DecomposedPath {
            trailing: chunk,
            ..Default::default()
        }
    })
}

/// Within each group of records sharing a dependency-edge sequence, keeps only the records
/// whose trailing containment chunk is the longest in the group. Containment-only records have
/// no dependency run to share and are always kept.
pub fn keep_longest_ancestor_chains(records: Vec<DecomposedPath>) -> Vec<DecomposedPath> {
    let mut longest: BTreeMap<Vec<EdgeId>, usize> = BTreeMap::new();
    for record in records.iter().filter(|r| !r.dependencies.is_empty()) {
        let len = longest.entry(record.dependency_key()).or_insert(0);
        *len = (*len).max(record.trailing.len());
    }
    records
        .into_iter()
        .filter(|r| {
            r.dependencies.is_empty()
                || longest.get(&r.dependency_key()) == Some(&r.trailing.len())
        })
        .collect()
}
