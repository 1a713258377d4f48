use archgraph_core::{
    ArchGraphError, CycleRecord, CycleSegment, Edge, EdgeRecord, Interaction, Node, NodeRecord,
    PathRecord, RequestConfig,
};
use archgraph_graph::*;
use std::collections::BTreeMap;

fn uses(id: &str, from: &str, to: &str) -> EdgeRecord {
    EdgeRecord::new(id, from, to, "USES")
}

/// Three-level hierarchy: d1 contains l1, l2; l1 contains m1, m2; l2 contains m3.
struct Hierarchy {
    nodes: BTreeMap<&'static str, NodeRecord>,
    parents: BTreeMap<&'static str, &'static str>,
}

impl Hierarchy {
    fn new() -> Self {
        let nodes = [
            ("d1", "Domain", 0),
            ("l1", "Layer", 1),
            ("l2", "Layer", 1),
            ("m1", "Module", 2),
            ("m2", "Module", 2),
            ("m3", "Module", 2),
        ]
        .into_iter()
        .map(|(id, layer, depth)| (id, NodeRecord::new(id, layer).with_name(id).with_depth(depth)))
        .collect();
        let parents = BTreeMap::from([
            ("l1", "d1"),
            ("l2", "d1"),
            ("m1", "l1"),
            ("m2", "l1"),
            ("m3", "l2"),
        ]);
        Self { nodes, parents }
    }

    fn node(&self, id: &str) -> NodeRecord {
        self.nodes[id].clone()
    }

    /// Containment edges from `id` up to the root, leaf first.
    fn ascent(&self, id: &str) -> Vec<EdgeRecord> {
        let mut edges = Vec::new();
        let mut current = id;
        while let Some(&parent) = self.parents.get(current) {
            edges.push(EdgeRecord::contains(format!("c-{}", current), parent, current));
            current = parent;
        }
        edges
    }

    /// A dependency framed by the full ancestry of both endpoints.
    fn framed(&self, dependency: EdgeRecord) -> PathRecord {
        let from = dependency.start_element_id.clone();
        let to = dependency.end_element_id.clone();
        let mut edges: Vec<EdgeRecord> = self.ascent(&from).into_iter().rev().collect();
        edges.push(dependency);
        edges.extend(self.ascent(&to));
        let intermediates = self.nodes.values().cloned().collect();
        PathRecord::new(self.node("d1"), self.node("d1"), edges).with_nodes(intermediates)
    }

    fn segment(&self, id: &str, from: &str, to: &str) -> CycleSegment {
        CycleSegment {
            edge: uses(id, from, to),
            start: self.node(from),
            end: self.node(to),
        }
    }

    fn paths(&self) -> Vec<PathRecord> {
        vec![
            self.framed(uses("u1", "m1", "m3")),
            self.framed(uses("u2", "m2", "m3")),
            self.framed(uses("u3", "m3", "m1")),
            self.framed(uses("u4", "m1", "m2")),
            // Shorter ancestry of u1; dropped in favor of the full chain.
            PathRecord::new(self.node("m1"), self.node("m3"), vec![uses("u1", "m1", "m3")]),
        ]
    }

    fn cycles(&self) -> Vec<CycleRecord> {
        vec![
            CycleRecord::new(
                self.node("m1"),
                vec![self.segment("u1", "m1", "m3"), self.segment("u3", "m3", "m1")],
            ),
            CycleRecord::new(
                self.node("m2"),
                vec![
                    self.segment("u2", "m2", "m3"),
                    self.segment("u3", "m3", "m1"),
                    self.segment("u4", "m1", "m2"),
                ],
            ),
        ]
    }
}

fn build(config: RequestConfig, paths: Vec<PathRecord>, cycles: Vec<CycleRecord>) -> GraphResponse {
    GraphBuilder::new(config)
        .with_view("dependencies", paths)
        .with_cycles(cycles)
        .build()
        .unwrap()
}

#[test]
fn scenario_a_cutoff_zero_collapses_onto_domain() {
    let d = NodeRecord::new("D", "Domain").with_depth(0);
    let m1 = NodeRecord::new("M1", "Module").with_depth(1);
    let m2 = NodeRecord::new("M2", "Module").with_depth(1);
    let path = PathRecord::new(
        d.clone(),
        d,
        vec![
            EdgeRecord::contains("c1", "D", "M1"),
            uses("u1", "M1", "M2"),
            EdgeRecord::contains("c2", "D", "M2"),
        ],
    )
    .with_nodes(vec![m1, m2]);

    let config = RequestConfig::default().with_max_depth(0);
    let response = build(config.clone(), vec![path.clone()], Vec::new());
    let graph = response.graph;
    assert_eq!(graph.nodes.len(), 1);
    assert_eq!(graph.nodes[0].id, "D");
    assert_eq!(graph.edges.len(), 1);
    let edge = &graph.edges[0];
    assert_eq!((edge.source.as_str(), edge.target.as_str()), ("D", "D"));
    assert_eq!(edge.properties.weight, 1);

    let response = build(config.with_self_edges(false), vec![path], Vec::new());
    assert_eq!(response.graph.nodes.len(), 1);
    assert!(response.graph.edges.is_empty());
}

#[test]
fn scenario_b_parallel_raw_edges_merge_into_one_weighted_edge() {
    let a = NodeRecord::new("A", "Module");
    let b = NodeRecord::new("B", "Module");
    let paths = vec![
        PathRecord::new(a.clone(), b.clone(), vec![uses("e1", "A", "B")]),
        PathRecord::new(a, b, vec![uses("e2", "A", "B")]),
    ];
    let graph = build(RequestConfig::default(), paths, Vec::new()).graph;
    assert_eq!(graph.edges.len(), 1);
    let edge = graph.edge_between("A", "B").unwrap();
    assert_eq!(edge.id, Edge::derived_id("A", "B"));
    assert_eq!(edge.properties.weight, 2);
}

#[test]
fn parallel_edges_split_across_views_render_once() {
    let a = NodeRecord::new("A", "Module");
    let b = NodeRecord::new("B", "Module");
    let path = |id: &str| PathRecord::new(a.clone(), b.clone(), vec![uses(id, "A", "B")]);
    let response = GraphBuilder::new(RequestConfig::default())
        .with_view("dependencies", vec![path("e1"), path("e2")])
        .with_view("dependents", vec![path("e1")])
        .build()
        .unwrap();
    let edges: Vec<(&str, u32)> = response
        .graph
        .edges
        .iter()
        .map(|e| (e.id.as_str(), e.properties.weight))
        .collect();
    assert_eq!(edges, vec![("A->B", 2)]);
}

#[test]
fn scenario_c_collapsed_cycle_keeps_one_self_step() {
    let a = NodeRecord::new("A", "Layer").with_depth(0);
    let b = NodeRecord::new("B", "Module").with_depth(1);
    let c = NodeRecord::new("C", "Module").with_depth(1);
    let paths = vec![
        PathRecord::new(a.clone(), b.clone(), vec![uses("e1", "A", "B")]),
        PathRecord::new(
            a.clone(),
            a.clone(),
            vec![
                EdgeRecord::contains("cb", "A", "B"),
                uses("e2", "B", "C"),
                EdgeRecord::contains("cc", "A", "C"),
            ],
        )
        .with_nodes(vec![b.clone(), c.clone()]),
        PathRecord::new(c.clone(), a.clone(), vec![uses("e3", "C", "A")]),
    ];
    let segment = |id: &str, start: &NodeRecord, end: &NodeRecord| CycleSegment {
        edge: uses(id, &start.element_id, &end.element_id),
        start: start.clone(),
        end: end.clone(),
    };
    let cycle = CycleRecord::new(
        a.clone(),
        vec![segment("e1", &a, &b), segment("e2", &b, &c), segment("e3", &c, &a)],
    );

    let response = build(RequestConfig::default().with_max_depth(0), paths, vec![cycle]);
    let violations = response.violations.unwrap();
    assert_eq!(violations.dependency_cycles.len(), 1);
    let projected = &violations.dependency_cycles[0];
    assert_eq!(projected.length, 1);
    assert_eq!(projected.path.len(), 1);
    let step = &projected.path[0];
    assert_eq!((step.source.as_str(), step.target.as_str()), ("A", "A"));
    assert_eq!(projected.actual_cycles[0].length, 3);

    let rendered = response.graph.edge(&step.id).unwrap();
    assert_eq!(rendered.properties.weight, 3);
    assert!(rendered.properties.cycle);
}

#[test]
fn scenario_d_views_merge_and_dangling_edges_fail() {
    let node = |id: &str| NodeRecord::new(id, "Module");
    let response = GraphBuilder::new(RequestConfig::default())
        .with_view(
            "dependencies",
            vec![PathRecord::new(node("X"), node("Y"), vec![uses("xy", "X", "Y")])],
        )
        .with_view(
            "dependents",
            vec![PathRecord::new(node("Y"), node("Z"), vec![uses("yz", "Y", "Z")])],
        )
        .build()
        .unwrap();
    let ids: Vec<&str> = response.graph.nodes.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(ids, vec!["X", "Y", "Z"]);
    let edges: Vec<&str> = response.graph.edges.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(edges, vec!["xy", "yz"]);

    let g1 = GraphView::from_parts(
        vec![Node::placeholder("X"), Node::placeholder("Y")],
        vec![Edge::dependency("xy", "X", "Y")],
    );
    let g2 = GraphView::from_parts(
        vec![Node::placeholder("Y"), Node::placeholder("Z")],
        vec![Edge::dependency("y-ghost", "Y", "ghost")],
    );
    let err = merge_views(vec![g1, g2]).unwrap_err();
    assert!(matches!(err, ArchGraphError::DanglingEdges(ref edges) if edges.len() == 1));
    assert!(err.to_string().contains("y-ghost"));
}

#[test]
fn hierarchy_collapses_to_layers_with_projected_cycles() {
    let hierarchy = Hierarchy::new();
    let response = build(
        RequestConfig::default().with_max_depth(1),
        hierarchy.paths(),
        hierarchy.cycles(),
    );
    let graph = &response.graph;

    let nodes: Vec<(&str, Option<&str>)> = graph
        .nodes
        .iter()
        .map(|n| (n.id.as_str(), n.parent.as_deref()))
        .collect();
    assert_eq!(
        nodes,
        vec![("d1", None), ("l1", Some("d1")), ("l2", Some("d1"))]
    );

    let edges: Vec<(&str, &str, &str, u32)> = graph
        .edges
        .iter()
        .map(|e| (e.id.as_str(), e.source.as_str(), e.target.as_str(), e.properties.weight))
        .collect();
    assert_eq!(
        edges,
        vec![
            ("l1->l2", "l1", "l2", 2),
            ("u3", "l2", "l1", 1),
            ("u4", "l1", "l1", 1),
        ]
    );

    let violations = response.violations.as_ref().unwrap();
    assert_eq!(violations.dependency_cycles.len(), 1);
    let cycle = &violations.dependency_cycles[0];
    assert_eq!(cycle.anchor.id, "l1");
    assert_eq!(cycle.actual_cycles.len(), 2);
    let path: Vec<&str> = cycle.path.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(path, vec!["l1->l2", "u3"]);

    let flagged: Vec<&str> = graph
        .edges
        .iter()
        .filter(|e| e.properties.cycle)
        .map(|e| e.id.as_str())
        .collect();
    assert_eq!(flagged, vec!["l1->l2", "u3"]);

    let layers: Vec<(&str, u32)> = response
        .layers
        .iter()
        .map(|l| (l.name.as_str(), l.depth))
        .collect();
    assert_eq!(layers, vec![("Domain", 0), ("Layer", 1)]);
}

#[test]
fn result_does_not_depend_on_record_order() {
    let hierarchy = Hierarchy::new();
    let config = RequestConfig::default().with_max_depth(1);
    let expected = build(config.clone(), hierarchy.paths(), hierarchy.cycles());

    let mut rng = fastrand::Rng::with_seed(0x5eed);
    for _ in 0..16 {
        let mut paths = hierarchy.paths();
        rng.shuffle(&mut paths);
        let shuffled = build(config.clone(), paths, hierarchy.cycles());
        assert_eq!(shuffled, expected);
    }
}

#[test]
fn rendered_graphs_have_no_orphans_and_no_containment_edges() {
    let hierarchy = Hierarchy::new();
    for max_depth in 0..4 {
        let graph = build(
            RequestConfig::default().with_max_depth(max_depth),
            hierarchy.paths(),
            Vec::new(),
        )
        .graph;
        for edge in &graph.edges {
            assert_ne!(edge.interaction, Interaction::Containment, "depth {}", max_depth);
            assert!(graph.node(&edge.source).is_some(), "depth {}", max_depth);
            assert!(graph.node(&edge.target).is_some(), "depth {}", max_depth);
        }
        for node in &graph.nodes {
            if let Some(parent) = &node.parent {
                assert!(graph.node(parent).is_some(), "depth {}", max_depth);
            }
        }
    }
}

#[test]
fn deep_cutoff_keeps_every_module() {
    let hierarchy = Hierarchy::new();
    let graph = build(
        RequestConfig::default().with_max_depth(2),
        hierarchy.paths(),
        Vec::new(),
    )
    .graph;
    let ids: Vec<&str> = graph.edges.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, vec!["u1", "u2", "u3", "u4"]);
    assert_eq!(graph.node("m3").and_then(|n| n.parent.as_deref()), Some("l2"));
}
