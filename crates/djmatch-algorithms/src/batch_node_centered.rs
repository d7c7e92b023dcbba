//! Batch variant of the node-centered algorithm.

use djmatch_core::{
    ArcId, DiGraph, EdgeWeight, FastPropertyMap, Result, VertexId, WeightMap,
};
use djmatch_coloring::{ColorOpCounts, FreeExts, TimedArtifactSet};

use crate::aggregation::{aggregate_weights, Aggregate};
use crate::base::{AlgorithmCommon, DisjointMatching, MatchingConfig};

/// Node-centered coloring restricted to the vertices touched by the
/// current delta. Their incident positive arcs are collected (and uncolored
/// for reassignment), then colored by the same heavy/light two-pass scheme
/// as the static variant.
#[derive(Debug)]
pub struct BatchNodeCentered {
    aggregate: Aggregate,
    threshold: f64,
    common: AlgorithmCommon<FreeExts>,
    vertices_to_process: TimedArtifactSet<VertexId>,
    global_max: EdgeWeight,
    nodes: Vec<VertexId>,
    incidence: FastPropertyMap<VertexId, Vec<ArcId>>,
    node_weights: FastPropertyMap<VertexId, EdgeWeight>,
}

impl BatchNodeCentered {
    pub fn new(aggregate: Aggregate, threshold: f64) -> Self {
        Self {
            aggregate,
            threshold: threshold.clamp(0.0, 1.0),
            common: AlgorithmCommon::default(),
            vertices_to_process: TimedArtifactSet::default(),
            global_max: 0,
            nodes: Vec::new(),
            incidence: FastPropertyMap::default(),
            node_weights: FastPropertyMap::default(),
        }
    }

    fn prepare_nodes(&mut self, graph: &DiGraph, weights: &WeightMap) {
        let b = self.common.coloring.num_colors();
        let coloring = &mut self.common.coloring;
        self.nodes.reserve(self.vertices_to_process.len());
        for &v in self.vertices_to_process.as_slice() {
            let mut edges = std::mem::take(self.incidence.get_mut(v));
            for arc in graph.incident_arcs(v) {
                if weights.get(arc) > 0 {
                    edges.push(arc);
                    if coloring.is_colored(arc) {
                        coloring.uncolor(graph, weights, arc);
                    }
                }
            }
            if edges.is_empty() {
                continue;
            }
            edges.sort_by(|&a, &b| weights.get(b).cmp(&weights.get(a)));

            self.nodes.push(v);
            self.global_max = self.global_max.max(weights.get(edges[0]));
            let node_weight = aggregate_weights(&edges, weights, self.aggregate, b);
            self.node_weights.set(v, node_weight);
            self.incidence.set(v, edges);
        }
        let node_weights = &self.node_weights;
        self.nodes
            .sort_by(|&u, &v| node_weights.get(v).cmp(node_weights.get(u)));
    }

    fn color_heavy_edges(
        &mut self,
        graph: &DiGraph,
        weights: &WeightMap,
        remaining_edges: &mut Vec<ArcId>,
    ) {
        let global_threshold = self.global_max as f64 * self.threshold;
        let coloring = &mut self.common.coloring;
        for &v in &self.nodes {
            for &arc in self.incidence.get(v) {
                if coloring.no_color_free(v) {
                    break;
                }
                if coloring.is_colored(arc) {
                    continue;
                }
                if weights.get(arc) as f64 >= global_threshold {
                    let (tail, head) = graph.endpoints(arc);
                    if let Some(color) = coloring.common_free_color(tail, head) {
                        coloring.color(graph, weights, arc, color);
                    }
                } else {
                    remaining_edges.push(arc);
                }
            }
        }
    }

    fn color_light_edges(
        &mut self,
        graph: &DiGraph,
        weights: &WeightMap,
        remaining_edges: &mut Vec<ArcId>,
    ) {
        remaining_edges.sort_by(|&a, &b| weights.get(b).cmp(&weights.get(a)));
        let coloring = &mut self.common.coloring;
        for &arc in remaining_edges.iter() {
            let (tail, head) = graph.endpoints(arc);
            if coloring.no_color_free(tail)
                || coloring.no_color_free(head)
                || coloring.is_colored(arc)
            {
                continue;
            }
            if let Some(color) = coloring.common_free_color(tail, head) {
                coloring.color(graph, weights, arc, color);
            }
        }
    }
}

impl DisjointMatching for BatchNodeCentered {
    fn name(&self) -> String {
        format!(
            "Batch-NodeCentered-{}-{:.1}",
            self.aggregate.label(),
            self.threshold
        )
    }

    fn short_name(&self) -> String {
        format!("bat-NC-{}-{:.1}", self.aggregate.label(), self.threshold)
    }

    fn configure(&mut self, config: &MatchingConfig) {
        self.common.configure(config);
    }

    fn set_num_matchings(&mut self, b: u32) {
        self.common.set_num_matchings(b);
    }

    fn init(&mut self) {
        self.common.init();
        self.vertices_to_process.reset();
        self.incidence.reset_all();
    }

    fn reset(&mut self) {
        self.common.reset();
        self.vertices_to_process.reset();
        self.global_max = 0;
        self.nodes.clear();
        self.incidence.reset_all();
        self.node_weights.reset_all();
    }

    fn on_weight_change(
        &mut self,
        graph: &DiGraph,
        weights: &WeightMap,
        arc: ArcId,
        old: EdgeWeight,
        new: EdgeWeight,
    ) {
        let coloring = &mut self.common.coloring;
        coloring.on_weight_change(arc, old, new);
        if new == 0 && coloring.is_colored(arc) {
            coloring.uncolor(graph, weights, arc);
        }
        self.vertices_to_process.add(graph.tail(arc));
        self.vertices_to_process.add(graph.head(arc));
    }

    fn run(&mut self, graph: &DiGraph, weights: &WeightMap) {
        self.global_max = 0;
        self.nodes.clear();
        self.incidence.reset_all();

        self.prepare_nodes(graph, weights);

        let mut remaining_edges = Vec::new();
        self.color_heavy_edges(graph, weights, &mut remaining_edges);
        self.color_light_edges(graph, weights, &mut remaining_edges);

        self.vertices_to_process.next_round();
    }

    fn post_run(&mut self, graph: &DiGraph, weights: &WeightMap) -> Result<()> {
        self.common.post_run(graph, weights)
    }

    fn deliver(&self) -> EdgeWeight {
        self.common.deliver()
    }

    fn fine_counts(&self) -> ColorOpCounts {
        self.common.fine_counts()
    }

    fn coarse_counts(&self) -> ColorOpCounts {
        self.common.coarse_counts()
    }
}
