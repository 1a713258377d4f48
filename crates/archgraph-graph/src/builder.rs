// ABOUTME: End-to-end pipeline from raw path and cycle records to the rendered, annotated graph
// ABOUTME: Each view is preprocessed and abstracted on its own before merging and projection

use crate::abstraction::AbstractionEngine;
use crate::layers::{apply_layer_depths, summarize_layers, LayerInfo};
use crate::merge::merge_views;
use crate::preprocess::preprocess;
use crate::violations::{project_violations, Violations};
use archgraph_core::{CycleRecord, Graph, NodeId, PathRecord, RequestConfig, Result};
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::{debug, info, instrument};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphResponse {
    pub graph: Graph,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub violations: Option<Violations>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub layers: Vec<LayerInfo>,
}

/// Collects the record sets of one request and runs the abstraction pipeline over them.
///
/// ```
/// use archgraph_core::{EdgeRecord, NodeRecord, PathRecord, RequestConfig};
/// use archgraph_graph::GraphBuilder;
///
/// let path = PathRecord::new(
///     NodeRecord::new("a", "Module"),
///     NodeRecord::new("b", "Module"),
///     vec![EdgeRecord::new("e1", "a", "b", "USES")],
/// );
/// let response = GraphBuilder::new(RequestConfig::default())
///     .with_view("dependencies", vec![path])
///     .build()
///     .unwrap();
/// assert_eq!(response.graph.edges.len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct GraphBuilder {
    config: RequestConfig,
    views: Vec<(String, Vec<PathRecord>)>,
    cycles: Option<Vec<CycleRecord>>,
    cycle_allow_list: Option<BTreeSet<NodeId>>,
}

impl GraphBuilder {
    pub fn new(config: RequestConfig) -> Self {
        Self {
            config,
            views: Vec::new(),
            cycles: None,
            cycle_allow_list: None,
        }
    }

    pub fn add_view(&mut self, name: impl Into<String>, records: Vec<PathRecord>) -> &mut Self {
        self.views.push((name.into(), records));
        self
    }

    pub fn with_view(mut self, name: impl Into<String>, records: Vec<PathRecord>) -> Self {
        self.add_view(name, records);
        self
    }

    /// Cycle records to project onto the merged graph. Without them the response carries
    /// no violations.
    pub fn with_cycles(mut self, cycles: Vec<CycleRecord>) -> Self {
        self.cycles = Some(cycles);
        self
    }

    pub fn restrict_cycles_to(mut self, ids: impl IntoIterator<Item = NodeId>) -> Self {
        self.cycle_allow_list = Some(ids.into_iter().collect());
        self
    }

    #[instrument(skip_all, fields(graph = %self.config.name, views = self.views.len()))]
    pub fn build(self) -> Result<GraphResponse> {
        self.config.validate()?;
        let engine = AbstractionEngine::new(&self.config);

        let mut views = Vec::with_capacity(self.views.len());
        for (name, records) in &self.views {
            let paths = preprocess(records, self.config.direction)?;
            let view = engine.abstract_paths(&paths);
            debug!(
                view = %name,
                nodes = view.nodes.len(),
                edges = view.edges.len(),
                "view abstracted"
            );
            views.push(view);
        }

        let mut merged = merge_views(views)?;
        let layers = summarize_layers(&merged)?;
        apply_layer_depths(&mut merged, &layers);

        let violations = self.cycles.as_deref().map(|cycles| {
            project_violations(&mut merged, cycles, self.cycle_allow_list.as_ref())
        });

        let graph = merged.into_graph(self.config.name.clone());
        info!(
            nodes = graph.nodes.len(),
            edges = graph.edges.len(),
            cycles = violations.as_ref().map_or(0, |v| v.dependency_cycles.len()),
            "graph built"
        );
        Ok(GraphResponse {
            graph,
            violations,
            layers,
        })
    }
}
