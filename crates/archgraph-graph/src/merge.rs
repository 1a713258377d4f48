// ABOUTME: Unions independently abstracted views (ancestors, descendants, dependencies, dependents)
// ABOUTME: Fails the whole build when any edge points at a node missing from the union

use crate::abstraction::dedupe_edges;
use crate::replace_map::ReplaceMapBuilder;
use crate::GraphView;
use archgraph_core::{ArchGraphError, DanglingEdge, Result};
use tracing::{debug, instrument};

/// Unions `views` by id and validates that every edge's endpoints exist in the result.
///
/// Nodes sharing an id are taken to be identical; the first occurrence wins except that the
/// `selected` marker is OR-ed and a missing `parent` is filled in from later views. Edges are
/// deduplicated again by endpoint pair over the union, so an edge one view rendered under a
/// raw id and another under a derived id end up as a single edge counting each raw edge once.
#[instrument(skip_all, fields(views = views.len()))]
pub fn merge_views(views: Vec<GraphView>) -> Result<GraphView> {
    let mut merged = GraphView::new();
    let mut maps = ReplaceMapBuilder::new();

    for view in views {
        for (id, node) in view.nodes {
            match merged.nodes.get_mut(&id) {
                Some(existing) => {
                    existing.properties.selected |= node.properties.selected;
                    if existing.parent.is_none() {
                        existing.parent = node.parent;
                    }
                }
                None => {
                    merged.nodes.insert(id, node);
                }
            }
        }
        for (id, edge) in view.edges {
            match merged.edges.get_mut(&id) {
                Some(existing) => existing.raw_ids.extend(edge.raw_ids),
                None => {
                    merged.edges.insert(id, edge);
                }
            }
        }
        maps.propose_map(&view.replace_map);
    }

    let edges = std::mem::take(&mut merged.edges);
    merged.edges = dedupe_edges(edges.into_values())
        .into_iter()
        .map(|edge| (edge.id.clone(), edge))
        .collect();

    let nodes = &merged.nodes;
    merged.replace_map =
        maps.build(|id| nodes.get(id).map(|n| n.properties.depth));

    validate(&merged)?;
    debug!(
        nodes = merged.nodes.len(),
        edges = merged.edges.len(),
        "merged views"
    );
    Ok(merged)
}

/// Every edge must reference two nodes of the view. All offenders are reported at once.
pub fn validate(view: &GraphView) -> Result<()> {
    let dangling: Vec<DanglingEdge> = view
        .edges
        .values()
        .filter_map(|edge| {
            let missing_source = !view.nodes.contains_key(&edge.source);
            let missing_target = !view.nodes.contains_key(&edge.target);
            (missing_source || missing_target).then(|| DanglingEdge {
                edge_id: edge.id.clone(),
                source: edge.source.clone(),
                target: edge.target.clone(),
                missing_source,
                missing_target,
            })
        })
        .collect();

    if dangling.is_empty() {
        Ok(())
    } else {
        Err(ArchGraphError::DanglingEdges(dangling))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use archgraph_core::{Edge, Node};

    fn node(id: &str) -> Node {
        Node::placeholder(id)
    }

    #[test]
    fn union_keeps_first_and_ors_selection() {
        let first = GraphView::from_parts(vec![node("a")], vec![]);
        let second =
            GraphView::from_parts(vec![node("a").selected().with_parent("p"), node("p")], vec![]);
        let merged = merge_views(vec![first, second]).unwrap();
        assert_eq!(merged.nodes.len(), 2);
        assert!(merged.nodes["a"].properties.selected);
        assert_eq!(merged.nodes["a"].parent.as_deref(), Some("p"));
    }

    #[test]
    fn edges_are_unioned_by_id() {
        let edge = Edge::dependency("e1", "a", "b").with_weight(2);
        let first = GraphView::from_parts(vec![node("a"), node("b")], vec![edge.clone()]);
        let second = GraphView::from_parts(vec![node("a"), node("b")], vec![edge.clone()]);
        let merged = merge_views(vec![first, second]).unwrap();
        assert_eq!(merged.edges.len(), 1);
        assert_eq!(merged.edges["e1"], edge);
    }

    #[test]
    fn parallel_edges_from_different_views_collapse_by_pair() {
        let nodes = || vec![node("a"), node("b")];
        let combined = dedupe_edges(vec![
            Edge::dependency("e1", "a", "b"),
            Edge::dependency("e2", "a", "b"),
        ]);
        let first = GraphView::from_parts(nodes(), combined);
        let second = GraphView::from_parts(nodes(), vec![Edge::dependency("e1", "a", "b")]);
        let merged = merge_views(vec![first, second]).unwrap();
        assert_eq!(merged.edges.len(), 1);
        assert_eq!(merged.edges["a->b"].properties.weight, 2);
        assert_eq!(merged.edges["a->b"].raw_edge_ids(), vec!["e1", "e2"]);
    }

    #[test]
    fn every_dangling_edge_is_reported() {
        let view = GraphView::from_parts(
            vec![node("a")],
            vec![
                Edge::dependency("ok", "a", "a"),
                Edge::dependency("e1", "a", "ghost"),
                Edge::dependency("e2", "void", "ghost"),
            ],
        );
        match merge_views(vec![view]) {
            Err(ArchGraphError::DanglingEdges(edges)) => {
                assert_eq!(edges.len(), 2);
                assert_eq!(edges[0].edge_id, "e1");
                assert!(!edges[0].missing_source && edges[0].missing_target);
                assert!(edges[1].missing_source && edges[1].missing_target);
            }
            other => panic!("expected dangling edges, got {:?}", other),
        }
    }

    #[test]
    fn empty_input_merges_to_empty_view() {
        let merged = merge_views(Vec::new()).unwrap();
        assert!(merged.is_empty());
    }
}
