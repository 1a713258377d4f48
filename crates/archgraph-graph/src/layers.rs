use crate::GraphView;
use archgraph_core::{ArchGraphError, Result};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use tracing::{debug, warn};

/// A layer (primary node label) and its distance from the root layer of the containment
/// hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayerInfo {
    pub name: String,
    pub depth: u32,
}

/// Orders the layers seen in `view` by containment.
///
/// A parent pointer from a node in layer `A` to a node in layer `B != A` makes `A` contain
/// `B`. Exactly one participating layer may be uncontained; anything else is
/// [`ArchGraphError::AmbiguousRootLayer`].
pub fn summarize_layers(view: &GraphView) -> Result<Vec<LayerInfo>> {
    let mut contains: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    for node in view.nodes.values() {
        let Some(parent) = node.parent.as_deref().and_then(|p| view.node(p)) else {
            continue;
        };
        let (outer, inner) = (parent.layer(), node.layer());
        if outer.is_empty() || inner.is_empty() || outer == inner {
            continue;
        }
        contains.entry(outer).or_default().insert(inner);
    }
    if contains.is_empty() {
        return Ok(Vec::new());
    }

    let contained: BTreeSet<&str> = contains.values().flatten().copied().collect();
    let participating: BTreeSet<&str> = contains
        .keys()
        .copied()
        .chain(contained.iter().copied())
        .collect();
    let roots: Vec<&str> = participating
        .iter()
        .copied()
        .filter(|layer| !contained.contains(layer))
        .collect();
    let [root] = roots.as_slice() else {
        return Err(ArchGraphError::AmbiguousRootLayer {
            candidates: roots.iter().map(|r| r.to_string()).collect(),
        });
    };

    let mut depths: BTreeMap<&str, u32> = BTreeMap::from([(*root, 0)]);
    let mut queue = VecDeque::from([*root]);
    while let Some(layer) = queue.pop_front() {
        let depth = depths[layer];
        for &inner in contains.get(layer).into_iter().flatten() {
            if !depths.contains_key(inner) {
                depths.insert(inner, depth + 1);
                queue.push_back(inner);
            }
        }
    }

    for layer in participating.iter().filter(|l| !depths.contains_key(*l)) {
        warn!(layer, "layer not reachable from the root layer");
    }

    let mut layers: Vec<LayerInfo> = depths
        .into_iter()
        .map(|(name, depth)| LayerInfo {
            name: name.to_string(),
            depth,
        })
        .collect();
    layers.sort_by(|a, b| a.depth.cmp(&b.depth).then_with(|| a.name.cmp(&b.name)));
    debug!(root = *root, layers = layers.len(), "summarized layers");
    Ok(layers)
}

/// Gives nodes whose source record carried no depth the depth of their layer.
pub fn apply_layer_depths(view: &mut GraphView, layers: &[LayerInfo]) {
    let by_name: BTreeMap<&str, u32> = layers
        .iter()
        .map(|l| (l.name.as_str(), l.depth))
        .collect();
    for node in view.nodes.values_mut().filter(|n| n.depth_defaulted) {
        if let Some(depth) = by_name.get(node.layer()) {
            node.properties.depth = *depth;
            node.depth_defaulted = false;
        }
    }
}
