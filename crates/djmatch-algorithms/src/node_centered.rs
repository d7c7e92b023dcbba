//! The static node-centered algorithm.

use djmatch_core::{
    ArcId, DiGraph, EdgeWeight, FastPropertyMap, Result, VertexId, WeightMap,
};
use djmatch_coloring::{ColorOpCounts, FreeExts};

use crate::aggregation::{aggregate_weights, Aggregate};
use crate::base::{AlgorithmCommon, DisjointMatching, MatchingConfig};

/// Orders vertices by an aggregate of their incident arc weights and colors
/// greedily in two passes: heavy arcs (at least `threshold` times the
/// global maximum) are taken while walking each vertex's incidence list,
/// light arcs are deferred and placed afterwards in global weight order.
#[derive(Debug)]
pub struct NodeCentered {
    aggregate: Aggregate,
    threshold: f64,
    common: AlgorithmCommon<FreeExts>,
    global_max: EdgeWeight,
    nodes: Vec<VertexId>,
    incidence: FastPropertyMap<VertexId, Vec<ArcId>>,
    node_weights: FastPropertyMap<VertexId, EdgeWeight>,
}

impl NodeCentered {
    pub fn new(aggregate: Aggregate, threshold: f64) -> Self {
        Self {
            aggregate,
            threshold: threshold.clamp(0.0, 1.0),
            common: AlgorithmCommon::default(),
            global_max: 0,
            nodes: Vec::new(),
            incidence: FastPropertyMap::default(),
            node_weights: FastPropertyMap::default(),
        }
    }

    fn prepare_nodes(&mut self, graph: &DiGraph, weights: &WeightMap) {
        let b = self.common.coloring.num_colors();
        self.nodes.reserve(graph.size());
        for v in graph.vertices() {
            let edges = self.incidence.get_mut(v);
            edges.extend(graph.incident_arcs(v).filter(|&a| weights.get(a) > 0));
            if edges.is_empty() {
                continue;
            }
            edges.sort_by(|&a, &b| weights.get(b).cmp(&weights.get(a)));

            self.nodes.push(v);
            self.global_max = self.global_max.max(weights.get(edges[0]));
            let node_weight = aggregate_weights(edges, weights, self.aggregate, b);
            self.node_weights.set(v, node_weight);
        }
        let node_weights = &self.node_weights;
        self.nodes
            .sort_by(|&u, &v| node_weights.get(v).cmp(node_weights.get(u)));
    }
}

impl DisjointMatching for NodeCentered {
    fn name(&self) -> String {
        format!(
            "NodeCentered-{}-{:.1}",
            self.aggregate.label(),
            self.threshold
        )
    }

    fn short_name(&self) -> String {
        format!("NC-{}-{:.1}", self.aggregate.label(), self.threshold)
    }

    fn configure(&mut self, config: &MatchingConfig) {
        self.common.configure(config);
    }

    fn set_num_matchings(&mut self, b: u32) {
        self.common.set_num_matchings(b);
    }

    fn init(&mut self) {
        self.common.init();
    }

    fn reset(&mut self) {
        self.common.reset();
        self.global_max = 0;
        self.nodes.clear();
        self.incidence.reset_all();
        self.node_weights.reset_all();
    }

    fn on_weight_change(
        &mut self,
        _graph: &DiGraph,
        _weights: &WeightMap,
        arc: ArcId,
        old: EdgeWeight,
        new: EdgeWeight,
    ) {
        self.common.coloring.on_weight_change(arc, old, new);
    }

    fn run(&mut self, graph: &DiGraph, weights: &WeightMap) {
        self.reset();
        self.prepare_nodes(graph, weights);
        let global_threshold = self.global_max as f64 * self.threshold;
        let coloring = &mut self.common.coloring;

        let mut remaining_edges = Vec::new();
        for &v in &self.nodes {
            for &arc in self.incidence.get(v) {
                if coloring.no_color_free(v) {
                    // This vertex ran out of colors.
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

        remaining_edges.sort_by(|&a, &b| weights.get(b).cmp(&weights.get(a)));
        for arc in remaining_edges {
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
