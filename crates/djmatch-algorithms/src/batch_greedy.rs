//! Batch variant of the iterative greedy.

use djmatch_core::{ArcId, DiGraph, EdgeWeight, Result, WeightMap};
use djmatch_coloring::{ArtifactMarker, ColorOpCounts, CoreExts, TimedArtifactSet};

use crate::base::{AlgorithmCommon, DisjointMatching, MatchingConfig};

/// Collects the arcs touched by the current delta — every updated arc plus
/// all arcs incident to its endpoints, uncolored on collection — and runs
/// the per-color greedy over that candidate set only.
#[derive(Debug, Default)]
pub struct BatchIterativeGreedy {
    local_swaps: bool,
    common: AlgorithmCommon<CoreExts>,
    update_marker: ArtifactMarker<ArcId>,
    arcs_to_process: TimedArtifactSet<ArcId>,
}

impl BatchIterativeGreedy {
    pub fn new(local_swaps: bool) -> Self {
        Self {
            local_swaps,
            ..Self::default()
        }
    }
}

impl DisjointMatching for BatchIterativeGreedy {
    fn name(&self) -> String {
        if self.local_swaps {
            "batch_greedy-loc".into()
        } else {
            "batch_greedy".into()
        }
    }

    fn short_name(&self) -> String {
        if self.local_swaps {
            "bat_gr-l".into()
        } else {
            "bat_gr".into()
        }
    }

    fn configure(&mut self, config: &MatchingConfig) {
        self.common.configure(config);
    }

    fn set_num_matchings(&mut self, b: u32) {
        self.common.set_num_matchings(b);
    }

    fn init(&mut self) {
        self.common.init();
        self.update_marker.reset();
        self.arcs_to_process.reset();
    }

    fn reset(&mut self) {
        self.common.reset();
        self.update_marker.reset();
        self.arcs_to_process.reset();
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
        if !self.update_marker.is_marked(arc) {
            self.update_marker.mark(arc);
            self.arcs_to_process.add(arc);
            if coloring.is_colored(arc) {
                coloring.uncolor(graph, weights, arc);
            }
            for endpoint in [graph.tail(arc), graph.head(arc)] {
                for incident in graph.incident_arcs(endpoint) {
                    self.arcs_to_process.add(incident);
                    if coloring.is_colored(incident) {
                        coloring.uncolor(graph, weights, incident);
                    }
                }
            }
        }
    }

    fn run(&mut self, graph: &DiGraph, weights: &WeightMap) {
        let coloring = &mut self.common.coloring;

        let arcs_vector = self.arcs_to_process.vector_mut();
        arcs_vector.sort_by(|&a, &b| weights.get(b).cmp(&weights.get(a)));
        // The zero-weight tail is of no use to any color.
        if let Some(first_zero) = arcs_vector.iter().position(|&a| weights.get(a) == 0) {
            arcs_vector.truncate(first_zero);
        }

        let mut arcs: Vec<ArcId> = arcs_vector.clone();
        let mut remaining_arcs = Vec::with_capacity(arcs.len());
        let mut recently_matched = Vec::new();
        for color in coloring.color_range() {
            for &arc in &arcs {
                if coloring.is_colored(arc) {
                    continue;
                }
                if coloring.can_color(graph, arc, color) {
                    coloring.color(graph, weights, arc, color);
                    if self.local_swaps {
                        recently_matched.push(arc);
                    }
                } else {
                    remaining_arcs.push(arc);
                }
            }

            let mut swapped = false;
            if self.local_swaps {
                for &arc in &recently_matched {
                    swapped |= coloring.local_swap(graph, weights, arc);
                }
                recently_matched.clear();
            }

            if !swapped {
                std::mem::swap(&mut arcs, &mut remaining_arcs);
            }
            remaining_arcs.clear();
        }

        self.update_marker.next_round();
        self.arcs_to_process.next_round();
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
