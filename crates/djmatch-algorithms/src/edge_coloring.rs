//! Dynamic k-edge-coloring via fan rotation and cd-path inversion.

use serde::Deserialize;

use djmatch_core::{ArcId, Color, DiGraph, EdgeWeight, Result, VertexId, WeightMap};
use djmatch_coloring::{
    compute_fan, find_heaviest_incident_uncolored_arc, invert_cd_path, make_coloring_maximal,
    rotate_fan, ColorOpCounts, FullExts, MaximalityPostProcessor,
};

use crate::base::{AlgorithmCommon, DisjointMatching, MatchingConfig, UpdateFilter};

/// How the edge coloring reacts to deltas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    /// Rebuild the coloring from scratch on every `run`.
    Static,
    /// Purely incremental.
    Dynamic,
    /// Incremental, but rebuild when the previous delta brought more than
    /// `hybrid_threshold · |V|` updates.
    Hybrid,
}

/// Outcome of one attempt to color an edge through its fan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColorEdgeOutcome {
    Colored,
    /// The fan center has no free color.
    NoFreeAtCenter,
    /// No rotation target offers a free color; the caller may retry with
    /// the other endpoint as the center.
    NoFreeAtFanEnd,
}

/// Maintains a proper partial edge coloring in the style of Vizing's
/// theorem: an uncolored arc is colored by computing the fan at one
/// endpoint, inverting a cd-alternating path when the two free colors
/// disagree, and rotating the fan up to the first arc whose far endpoint
/// has the target color free.
#[derive(Debug)]
pub struct KEdgeColoring {
    mode: RunMode,
    common_color: bool,
    rotate_long: bool,
    post_process: bool,
    improved_pp: bool,
    hybrid_threshold: f64,
    filter: UpdateFilter,
    post_processor: MaximalityPostProcessor,
    compute_from_scratch: bool,
    update_count: usize,
    delta_over: bool,
    common: AlgorithmCommon<FullExts>,
}

impl KEdgeColoring {
    pub fn new(
        mode: RunMode,
        common_color: bool,
        rotate_long: bool,
        post_process: bool,
        improved_pp: bool,
        hybrid_threshold: f64,
        filter_threshold: f64,
    ) -> Self {
        debug_assert!(!improved_pp || post_process);
        Self {
            mode,
            common_color,
            rotate_long,
            post_process,
            improved_pp,
            hybrid_threshold,
            filter: UpdateFilter::new(filter_threshold),
            post_processor: MaximalityPostProcessor::default(),
            compute_from_scratch: false,
            update_count: 0,
            delta_over: false,
            common: AlgorithmCommon::default(),
        }
    }

    /// Colors the edge `xy` with `x` as the center of the fan.
    fn color_edge(
        &mut self,
        graph: &DiGraph,
        weights: &WeightMap,
        xy: ArcId,
        x: VertexId,
    ) -> ColorEdgeOutcome {
        let coloring = &mut self.common.coloring;
        if self.common_color {
            let (tail, head) = graph.endpoints(xy);
            if let Some(color) = coloring.common_free_color(tail, head) {
                coloring.color(graph, weights, xy, color);
                return ColorEdgeOutcome::Colored;
            }
        }

        let Some(c) = coloring.get_any_free_color(x) else {
            return ColorEdgeOutcome::NoFreeAtCenter;
        };

        let fan = compute_fan(coloring, graph, x, xy);
        debug_assert!(!fan.is_empty());
        let Some(d) = coloring.get_any_free_color(graph.other(*fan.last().unwrap(), x)) else {
            return ColorEdgeOutcome::NoFreeAtFanEnd;
        };

        let mut inverted = false;
        if !coloring.is_color_free(x, d) && c != d {
            invert_cd_path(coloring, graph, weights, x, c, d);
            inverted = true;
        }

        // By default rotate the whole fan and color its last arc.
        let mut rotate_end = fan.len();
        let mut target = *fan.last().unwrap();
        if !self.rotate_long || inverted {
            // Rotate only up to the first arc whose far endpoint can take
            // d. After an inversion the fan's tail may no longer qualify.
            match fan
                .iter()
                .position(|&a| coloring.is_color_free(graph.other(a, x), d))
            {
                Some(pos) => {
                    target = fan[pos];
                    rotate_end = pos + 1;
                }
                None => return ColorEdgeOutcome::NoFreeAtFanEnd,
            }
        }
        rotate_fan(coloring, graph, weights, &fan[..rotate_end]);
        coloring.color(graph, weights, target, d);
        ColorEdgeOutcome::Colored
    }

    /// Rebuilds the coloring from scratch, heaviest arcs first.
    fn compute_edge_coloring(&mut self, graph: &DiGraph, weights: &WeightMap) {
        let mut edges: Vec<ArcId> = graph.arcs().filter(|&a| weights.get(a) > 0).collect();
        edges.sort_by(|&a, &b| weights.get(b).cmp(&weights.get(a)));

        for arc in edges {
            let (tail, head) = graph.endpoints(arc);
            if self.common.coloring.any_color_free(tail)
                && self.common.coloring.any_color_free(head)
            {
                let outcome = self.color_edge(graph, weights, arc, tail);
                if outcome == ColorEdgeOutcome::NoFreeAtFanEnd {
                    self.color_edge(graph, weights, arc, head);
                }
            }
        }
    }

    /// Attempts to color the uncolored `arc`, displacing the lightest
    /// colored edge at each saturated endpoint when the exchange pays off.
    fn attempt_match(&mut self, graph: &DiGraph, weights: &WeightMap, arc: ArcId) -> bool {
        let coloring = &mut self.common.coloring;
        debug_assert!(!coloring.is_colored(arc));
        let (tail, head) = graph.endpoints(arc);

        let mut lightest_tail: Option<(ArcId, Color)> = None;
        let mut lightest_head: Option<(ArcId, Color)> = None;
        let mut replace_weight: EdgeWeight = 0;
        if coloring.no_color_free(tail) {
            let a = coloring
                .get_lightest_colored_edge(weights, tail)
                .expect("saturated vertex has colored arcs");
            replace_weight += weights.get(a);
            lightest_tail = Some((a, coloring.get_color(a)));
        }
        if coloring.no_color_free(head) {
            let a = coloring
                .get_lightest_colored_edge(weights, head)
                .expect("saturated vertex has colored arcs");
            replace_weight += weights.get(a);
            lightest_head = Some((a, coloring.get_color(a)));
        }

        if weights.get(arc) <= replace_weight {
            // Matching the arc instead of the displaced edges does not
            // improve the solution.
            return false;
        }
        for (a, _) in lightest_tail.iter().chain(lightest_head.iter()) {
            coloring.uncolor(graph, weights, *a);
        }

        self.color_edge(graph, weights, arc, tail);
        if !self.common.coloring.is_colored(arc) {
            self.color_edge(graph, weights, arc, head);
        }

        let coloring = &mut self.common.coloring;
        if !coloring.is_colored(arc) {
            // Reinstate the displaced edges.
            for (a, color) in lightest_tail.iter().chain(lightest_head.iter()) {
                if coloring.can_color(graph, *a, *color) {
                    coloring.color(graph, weights, *a, *color);
                }
            }
            false
        } else {
            // Re-place the displaced edges in the cheapest way possible.
            for (a, _) in lightest_tail.iter().chain(lightest_head.iter()) {
                let (a_tail, a_head) = graph.endpoints(*a);
                if let Some(color) = coloring.common_free_color(a_tail, a_head) {
                    coloring.color(graph, weights, *a, color);
                }
            }
            true
        }
    }

    fn register_neighbors_for_post_processing(&mut self, graph: &DiGraph, arc: ArcId) {
        for vertex in [graph.tail(arc), graph.head(arc)] {
            for incident in graph.incident_arcs(vertex) {
                self.post_processor.register_arc(incident);
            }
        }
    }

    fn mode_fragment(&self, short: bool) -> String {
        match self.mode {
            RunMode::Static => if short { "s".into() } else { "static".into() },
            RunMode::Dynamic => if short { "d".into() } else { "dynamic".into() },
            RunMode::Hybrid => format!("h-{:.2}", self.hybrid_threshold),
        }
    }
}

impl DisjointMatching for KEdgeColoring {
    fn name(&self) -> String {
        let mut name = format!("k-EdgeColoring-{}", self.mode_fragment(false));
        if self.mode != RunMode::Static {
            name += &self.filter.name_suffix();
        }
        if self.post_process {
            name += "-p";
            if self.improved_pp {
                name += "+";
            }
        }
        name
    }

    fn short_name(&self) -> String {
        let mut name = format!("k-EC-{}", self.mode_fragment(true));
        if self.mode != RunMode::Static {
            name += &self.filter.name_suffix();
        }
        if self.post_process {
            name += "p";
        }
        name
    }

    fn configure(&mut self, config: &MatchingConfig) {
        self.common.configure(config);
    }

    fn set_num_matchings(&mut self, b: u32) {
        self.common.set_num_matchings(b);
    }

    fn init(&mut self) {
        self.common.init();
        self.post_processor.reset();
        self.compute_from_scratch = false;
        self.update_count = 0;
        self.delta_over = false;
    }

    fn reset(&mut self) {
        self.common.reset();
        self.post_processor.reset();
        self.compute_from_scratch = false;
        self.update_count = 0;
        self.delta_over = false;
    }

    fn on_weight_change(
        &mut self,
        graph: &DiGraph,
        weights: &WeightMap,
        arc: ArcId,
        old: EdgeWeight,
        new: EdgeWeight,
    ) {
        self.common.coloring.on_weight_change(arc, old, new);
        if self.mode == RunMode::Static {
            return;
        }

        if self.filter.is_filtered(old, new) {
            if self.improved_pp {
                if old > new && self.common.coloring.is_colored(arc) {
                    self.register_neighbors_for_post_processing(graph, arc);
                } else if old < new && !self.common.coloring.is_colored(arc) {
                    self.post_processor.register_arc(arc);
                }
            }
            return;
        }

        if self.mode == RunMode::Hybrid {
            self.update_count += 1;
            if self.delta_over {
                // Decide on the rebuild from the size of the delta that
                // just finished.
                self.compute_from_scratch =
                    self.update_count as f64 / graph.size() as f64 >= self.hybrid_threshold;
                self.update_count = 0;
                self.delta_over = false;
            }
            if self.compute_from_scratch {
                return;
            }
        }

        if new > old && !self.common.coloring.is_colored(arc) {
            let arc_got_colored = self.attempt_match(graph, weights, arc);
            if self.improved_pp && !arc_got_colored {
                self.post_processor.register_arc(arc);
            }
        } else if new < old && self.common.coloring.is_colored(arc) {
            if new == 0 {
                self.common.coloring.uncolor(graph, weights, arc);
            }
            let heaviest_tail =
                find_heaviest_incident_uncolored_arc(&self.common.coloring, graph, weights, graph.tail(arc));
            let heaviest_head =
                find_heaviest_incident_uncolored_arc(&self.common.coloring, graph, weights, graph.head(arc));
            for a in heaviest_tail.into_iter().chain(heaviest_head) {
                if !self.common.coloring.is_colored(a) {
                    self.attempt_match(graph, weights, a);
                }
            }
            if self.improved_pp {
                self.register_neighbors_for_post_processing(graph, arc);
            }
        }
    }

    fn run(&mut self, graph: &DiGraph, weights: &WeightMap) {
        match self.mode {
            RunMode::Static => {
                self.reset();
                self.compute_edge_coloring(graph, weights);
            }
            RunMode::Hybrid => {
                self.delta_over = true;
                if self.compute_from_scratch {
                    log::debug!("large delta, rebuilding the edge coloring from scratch");
                    self.common.reset();
                    self.compute_edge_coloring(graph, weights);
                }
            }
            RunMode::Dynamic => {}
        }

        if self.post_process {
            let full_pass = self.mode == RunMode::Static
                || (self.mode == RunMode::Hybrid && self.compute_from_scratch)
                || !self.improved_pp;
            if full_pass {
                make_coloring_maximal(&mut self.common.coloring, graph, weights);
            } else {
                self.post_processor
                    .perform_post_processing(&mut self.common.coloring, graph, weights);
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
