//! The static iterative greedy baseline.

use djmatch_core::{ArcId, DiGraph, EdgeWeight, Result, WeightMap};
use djmatch_coloring::{ColorOpCounts, CoreExts};

use crate::base::{AlgorithmCommon, DisjointMatching, MatchingConfig};

/// Recomputes the solution from scratch each delta: arcs sorted by
/// descending weight are scanned once per color, coloring every arc whose
/// endpoints still have the color free; the uncolored tail of the list is
/// carried into the next color. With local swaps enabled, each color pass
/// is followed by a swap attempt on the arcs it matched.
#[derive(Debug, Default)]
pub struct IterativeGreedy {
    local_swaps: bool,
    common: AlgorithmCommon<CoreExts>,
}

impl IterativeGreedy {
    pub fn new(local_swaps: bool) -> Self {
        Self {
            local_swaps,
            ..Self::default()
        }
    }
}

impl DisjointMatching for IterativeGreedy {
    fn name(&self) -> String {
        if self.local_swaps {
            "GreedyIt-local".into()
        } else {
            "GreedyIt".into()
        }
    }

    fn short_name(&self) -> String {
        if self.local_swaps {
            "GrIt-loc".into()
        } else {
            "GrIt".into()
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
    }

    fn reset(&mut self) {
        self.common.reset();
    }

    fn on_weight_change(
        &mut self,
        _graph: &DiGraph,
        _weights: &WeightMap,
        arc: ArcId,
        old: EdgeWeight,
        new: EdgeWeight,
    ) {
        // Static algorithm: only the weight bookkeeping reacts per event.
        self.common.coloring.on_weight_change(arc, old, new);
    }

    fn run(&mut self, graph: &DiGraph, weights: &WeightMap) {
        self.common.reset();
        let coloring = &mut self.common.coloring;

        let mut arcs_sorted: Vec<ArcId> =
            graph.arcs().filter(|&a| weights.get(a) > 0).collect();
        arcs_sorted.sort_by(|&a, &b| weights.get(b).cmp(&weights.get(a)));

        let mut remaining_arcs = Vec::with_capacity(arcs_sorted.len());
        let mut recently_matched = Vec::new();
        for color in 0..coloring.num_colors() {
            for &arc in &arcs_sorted {
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

            // A swap may have uncolored arcs again, so only narrow the scan
            // to the leftovers when nothing was swapped.
            if !swapped {
                std::mem::swap(&mut arcs_sorted, &mut remaining_arcs);
            }
            remaining_arcs.clear();
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
