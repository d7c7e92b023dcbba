//! The replace-and-recurse dynamic greedy.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use djmatch_core::{
    AdjacentArcPair, ArcId, Color, DiGraph, EdgeWeight, Result, VertexId, WeightMap,
};
use djmatch_coloring::{
    make_coloring_maximal, ColorOpCounts, FullExts, MaximalityPostProcessor,
};

use crate::base::{AlgorithmCommon, DisjointMatching, MatchingConfig, UpdateFilter};

/// Reacts to every weight change that passes the update filter.
///
/// A weight increase on an uncolored arc tries a common free color, then
/// the color whose adjacent mate pair is lightest; if that pair is lighter
/// than the arc, the mates are displaced and the arc takes their slot,
/// recursing on the displaced arcs up to a configured depth. A weight
/// decrease on a colored arc searches for a strictly heavier pair of
/// uncolored replacement arcs, one per endpoint. Candidate and color
/// searches are either exhaustive or randomized with a configured number
/// of samples.
#[derive(Debug)]
pub struct DynamicGreedy {
    recursion_depth: u32,
    post_process: bool,
    improved_pp: bool,
    random_samples: usize,
    filter: UpdateFilter,
    rng: StdRng,
    post_processor: MaximalityPostProcessor,
    common: AlgorithmCommon<FullExts>,
}

impl DynamicGreedy {
    pub fn new(
        recursion_depth: u32,
        post_process: bool,
        improved_pp: bool,
        filter_threshold: f64,
        random_samples: usize,
    ) -> Self {
        // Registered candidates are only ever consumed by the
        // post-processing pass.
        debug_assert!(!improved_pp || post_process);
        Self {
            recursion_depth,
            post_process,
            improved_pp,
            random_samples,
            filter: UpdateFilter::new(filter_threshold),
            rng: StdRng::seed_from_u64(0),
            post_processor: MaximalityPostProcessor::default(),
            common: AlgorithmCommon::default(),
        }
    }

    fn attempt_match(&mut self, graph: &DiGraph, weights: &WeightMap, arc: ArcId) -> bool {
        let coloring = &mut self.common.coloring;
        debug_assert!(!coloring.is_colored(arc));
        let (tail, head) = graph.endpoints(arc);
        if let Some(color) = coloring.common_free_color(tail, head) {
            coloring.color(graph, weights, arc, color);
            return true;
        }
        false
    }

    /// Attempts to place the uncolored `arc` in some matching, displacing
    /// a lighter adjacent mate pair if necessary.
    fn increase_weight(&mut self, graph: &DiGraph, weights: &WeightMap, arc: ArcId, recurse: u32) {
        debug_assert!(!self.common.coloring.is_colored(arc));

        if self.attempt_match(graph, weights, arc) {
            return;
        }
        let (pair, color) = self.pick_pair_to_replace(graph, weights, arc);
        if pair.weight < weights.get(arc) {
            let coloring = &mut self.common.coloring;
            for a in pair.arcs() {
                coloring.uncolor(graph, weights, a);
            }
            debug_assert!(coloring.can_color(graph, arc, color));
            coloring.color(graph, weights, arc, color);
            if recurse > 0 {
                for a in pair.arcs() {
                    self.increase_weight(graph, weights, a, recurse - 1);
                }
            }
        } else if self.improved_pp {
            // The arc stays uncolored with increased weight, so the
            // maximality invariant may be violated at it now.
            self.post_processor.register_arc(arc);
        }
    }

    /// Attempts to replace the colored `arc` by heavier adjacent arcs in
    /// its matching. A deleted arc (weight zero) always ends up uncolored.
    fn decrease_weight(&mut self, graph: &DiGraph, weights: &WeightMap, arc: ArcId) {
        debug_assert!(self.common.coloring.is_colored(arc));

        let is_deletion = weights.get(arc) == 0;
        let arc_color = self.common.coloring.get_color(arc);
        let pair = self.find_heavy_candidates(graph, weights, arc, arc_color, weights.get(arc));

        let coloring = &mut self.common.coloring;
        coloring.uncolor(graph, weights, arc);
        let mut colored_something_else = false;
        if pair.weight > weights.get(arc) {
            for a in pair.arcs() {
                debug_assert!(coloring.can_color(graph, a, arc_color));
                coloring.color(graph, weights, a, arc_color);
                colored_something_else = true;
            }
        }

        if !is_deletion {
            if !colored_something_else {
                // No heavier replacement; the arc keeps its slot at the
                // lower weight, which may leave its neighborhood below the
                // maximality bar.
                self.common
                    .coloring
                    .color(graph, weights, arc, arc_color);
                if self.improved_pp {
                    self.register_neighbors_for_post_processing(graph, arc);
                }
            } else {
                self.increase_weight(graph, weights, arc, 0);
            }
        } else if self.improved_pp {
            self.register_neighbors_for_post_processing(graph, arc);
        }

        debug_assert!(!is_deletion || !self.common.coloring.is_colored(arc));
    }

    /// Finds uncolored candidate arcs at both endpoints of `arc` that could
    /// take over its color, and picks the heaviest non-overlapping pair.
    /// The nested pair search always runs when both candidate lists are
    /// populated and the two list fronts did not already lock in a pair, so
    /// a lower-ranked non-overlapping combination can still win.
    fn find_heavy_candidates(
        &mut self,
        graph: &DiGraph,
        weights: &WeightMap,
        arc: ArcId,
        arc_color: Color,
        weight_to_beat: EdgeWeight,
    ) -> AdjacentArcPair {
        let (arc_tail, arc_head) = graph.endpoints(arc);
        let candidates_tail = self.collect_candidates(graph, weights, arc, arc_color, arc_tail);
        let candidates_head = self.collect_candidates(graph, weights, arc, arc_color, arc_head);

        let mut best = AdjacentArcPair::default();
        if let Some(&front) = candidates_tail.first() {
            best = AdjacentArcPair {
                tail_arc: Some(front),
                head_arc: None,
                weight: weights.get(front),
            };
        }
        if let Some(&front) = candidates_head.first() {
            if weights.get(front) > best.weight {
                match best.tail_arc {
                    // If the two list fronts have distinct far endpoints
                    // they dominate every other pair.
                    Some(tail_front)
                        if graph.other(tail_front, arc_tail)
                            != graph.other(front, arc_head) =>
                    {
                        return AdjacentArcPair {
                            tail_arc: Some(tail_front),
                            head_arc: Some(front),
                            weight: weights.get(tail_front) + weights.get(front),
                        };
                    }
                    _ => {
                        best = AdjacentArcPair {
                            tail_arc: None,
                            head_arc: Some(front),
                            weight: weights.get(front),
                        };
                    }
                }
            }
        }
        if candidates_tail.is_empty() || candidates_head.is_empty() {
            return best;
        }

        for &tail_cand in &candidates_tail {
            let tail_weight = weights.get(tail_cand);
            for &head_cand in &candidates_head {
                let sum = tail_weight + weights.get(head_cand);
                // Both lists are sorted, so once the sum drops below the
                // current best or the weight to beat, later head candidates
                // cannot help either.
                if sum <= weight_to_beat || sum <= best.weight {
                    break;
                }
                if graph.other(tail_cand, arc_tail) != graph.other(head_cand, arc_head) {
                    best = AdjacentArcPair {
                        tail_arc: Some(tail_cand),
                        head_arc: Some(head_cand),
                        weight: sum,
                    };
                }
            }
        }
        best
    }

    /// Uncolored positive-weight arcs at `endpoint` whose far endpoint has
    /// `arc_color` free, sorted by descending weight. Either an exhaustive
    /// scan or a fixed number of random incident samples.
    fn collect_candidates(
        &mut self,
        graph: &DiGraph,
        weights: &WeightMap,
        arc: ArcId,
        arc_color: Color,
        endpoint: VertexId,
    ) -> Vec<ArcId> {
        let coloring = &self.common.coloring;
        let mut candidates = Vec::new();
        let accepts = |candidate: ArcId| {
            candidate != arc
                && !coloring.is_colored(candidate)
                && weights.get(candidate) > 0
                && coloring.is_color_free(graph.other(candidate, endpoint), arc_color)
        };
        if self.random_samples > 0 {
            let out_deg = graph.out_degree(endpoint);
            let in_deg = graph.in_degree(endpoint);
            if out_deg + in_deg == 0 {
                return candidates;
            }
            let out_prob = out_deg as f64 / (out_deg + in_deg) as f64;
            candidates.reserve(self.random_samples);
            for _ in 0..self.random_samples {
                let candidate = if self.rng.gen::<f64>() < out_prob {
                    graph.outgoing_arc_at(endpoint, self.rng.gen_range(0..out_deg))
                } else {
                    graph.incoming_arc_at(endpoint, self.rng.gen_range(0..in_deg))
                };
                if accepts(candidate) {
                    candidates.push(candidate);
                }
            }
        } else {
            candidates.extend(graph.incident_arcs(endpoint).filter(|&a| accepts(a)));
        }
        candidates.sort_by(|&a, &b| weights.get(b).cmp(&weights.get(a)));
        candidates
    }

    /// The color whose mate pair at the endpoints of `arc` is lightest,
    /// from the arc-mate extension or from a random sample of colors.
    fn pick_pair_to_replace(
        &mut self,
        graph: &DiGraph,
        weights: &WeightMap,
        arc: ArcId,
    ) -> (AdjacentArcPair, Color) {
        let coloring = &self.common.coloring;
        if self.random_samples == 0 {
            return coloring.lightest_adjacent_colored_arcs(graph, weights, arc);
        }
        let (tail, head) = graph.endpoints(arc);
        let mut best = AdjacentArcPair {
            tail_arc: None,
            head_arc: None,
            weight: EdgeWeight::MAX,
        };
        let mut min_color = 0;
        for _ in 0..self.random_samples {
            let color = self.rng.gen_range(0..coloring.num_colors());
            let tail_mate = coloring.get_arc_to_mate(color, tail);
            let head_mate = coloring.get_arc_to_mate(color, head);
            let weight: EdgeWeight = tail_mate
                .into_iter()
                .chain(head_mate)
                .map(|a| weights.get(a))
                .sum();
            if weight < best.weight {
                min_color = color;
                best = AdjacentArcPair {
                    tail_arc: tail_mate,
                    head_arc: head_mate,
                    weight,
                };
            }
        }
        (best, min_color)
    }

    fn register_neighbors_for_post_processing(&mut self, graph: &DiGraph, arc: ArcId) {
        for vertex in [graph.tail(arc), graph.head(arc)] {
            for incident in graph.incident_arcs(vertex) {
                self.post_processor.register_arc(incident);
            }
        }
    }
}

impl DisjointMatching for DynamicGreedy {
    fn name(&self) -> String {
        let mut name = String::from("dynamic-greedy-");
        if self.random_samples > 0 {
            name += &format!("random{}-", self.random_samples);
        }
        name += &self.recursion_depth.to_string();
        if self.post_process {
            name += "-p";
            if self.improved_pp {
                name += "+";
            }
        }
        name + &self.filter.name_suffix()
    }

    fn short_name(&self) -> String {
        let mut name = String::from("dyn-gr-");
        if self.random_samples > 0 {
            name += &format!("r{}-", self.random_samples);
        }
        name += &self.recursion_depth.to_string();
        if self.post_process {
            name += "-p";
            if self.improved_pp {
                name += "+";
            }
        }
        name + &self.filter.name_suffix()
    }

    fn configure(&mut self, config: &MatchingConfig) {
        self.common.configure(config);
        self.rng = StdRng::seed_from_u64(config.seed);
    }

    fn set_num_matchings(&mut self, b: u32) {
        self.common.set_num_matchings(b);
    }

    fn init(&mut self) {
        self.common.init();
        self.post_processor.reset();
        self.rng = StdRng::seed_from_u64(self.common.seed);
    }

    fn reset(&mut self) {
        self.common.reset();
        self.post_processor.reset();
        self.rng = StdRng::seed_from_u64(self.common.seed);
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
        if new > old {
            if !self.common.coloring.is_colored(arc) {
                self.increase_weight(graph, weights, arc, self.recursion_depth);
            }
        } else if self.common.coloring.is_colored(arc) {
            // Deletions of colored arcs land here as the new = 0 case;
            // deletions of uncolored arcs need no treatment.
            self.decrease_weight(graph, weights, arc);
        }
    }

    fn run(&mut self, graph: &DiGraph, weights: &WeightMap) {
        if self.post_process {
            if self.improved_pp {
                self.post_processor
                    .perform_post_processing(&mut self.common.coloring, graph, weights);
            } else {
                make_coloring_maximal(&mut self.common.coloring, graph, weights);
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
