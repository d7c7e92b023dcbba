//! The uniform algorithm interface and shared driver plumbing.

use serde::Deserialize;

use djmatch_core::{ArcId, DiGraph, EdgeWeight, Result, WeightMap};
use djmatch_coloring::{ColorOpCounts, ColoringExt, HasStats, KColoring};

/// Run-wide configuration shared by all algorithms.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MatchingConfig {
    /// Numbers of matchings to sweep.
    pub all_bs: Vec<u32>,

    /// RNG seed for randomized variants.
    pub seed: u64,

    /// Seed for shuffling the algorithm order across the sweep; 0 keeps the
    /// configured order.
    pub algorithm_order_seed: u64,

    /// Exhaustively verify the coloring invariants after each run.
    pub sanity_check: bool,

    /// Track per-delta coloring operation counts.
    pub count_coloring_ops: bool,

    /// Write the result table to this file instead of stdout.
    pub output_file: Option<std::path::PathBuf>,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            all_bs: vec![1],
            seed: 123,
            algorithm_order_seed: 0,
            sanity_check: false,
            count_coloring_ops: false,
            output_file: None,
        }
    }
}

/// Filters weight updates by relative change.
///
/// An update is filtered (ignored by the dynamic algorithms) when both the
/// old and new weight are nonzero and their ratio lies within `[1/t, t]`.
/// Insertions and deletions always pass.
#[derive(Debug, Clone, Copy)]
pub struct UpdateFilter {
    up_threshold: f64,
    down_threshold: f64,
}

impl UpdateFilter {
    pub fn new(threshold: f64) -> Self {
        debug_assert!(threshold >= 1.0);
        Self {
            up_threshold: threshold,
            down_threshold: 1.0 / threshold,
        }
    }

    /// Whether the update should be ignored.
    pub fn is_filtered(&self, old: EdgeWeight, new: EdgeWeight) -> bool {
        if old == 0 || new == 0 {
            return false;
        }
        let ratio = new as f64 / old as f64;
        ratio >= self.down_threshold && ratio <= self.up_threshold
    }

    pub fn up_threshold(&self) -> f64 {
        self.up_threshold
    }

    /// Name fragment for filtered variants, empty at the neutral threshold.
    pub fn name_suffix(&self) -> String {
        if self.up_threshold != 1.0 {
            format!("-ft{:.2}", self.up_threshold)
        } else {
            String::new()
        }
    }
}

/// The interface every disjoint matching algorithm implements.
///
/// The driver delivers weight changes synchronously between `init` and the
/// per-delta `run`; `deliver` reads the current solution weight. All
/// invariants of the coloring hold after every `on_weight_change` return
/// and after `run`; transient violations are confined to the inside of a
/// call.
pub trait DisjointMatching {
    fn name(&self) -> String;

    fn short_name(&self) -> String;

    fn configure(&mut self, config: &MatchingConfig);

    /// Resizes and clears the coloring for `b` matchings.
    fn set_num_matchings(&mut self, b: u32);

    /// Prepares for a run over a fresh delta stream.
    fn init(&mut self);

    /// Clears all algorithm state, including the coloring.
    fn reset(&mut self);

    /// Reacts to one weight update. Implementations must update the
    /// coloring's weight bookkeeping before any algorithmic reaction.
    fn on_weight_change(
        &mut self,
        graph: &DiGraph,
        weights: &WeightMap,
        arc: ArcId,
        old: EdgeWeight,
        new: EdgeWeight,
    );

    /// Executes deferred work after a delta has been fully delivered.
    fn run(&mut self, graph: &DiGraph, weights: &WeightMap);

    /// Sanity checks and operation-count snapshots after `run`.
    fn post_run(&mut self, graph: &DiGraph, weights: &WeightMap) -> Result<()>;

    /// Current total weight of the colored arcs.
    fn deliver(&self) -> EdgeWeight;

    fn fine_counts(&self) -> ColorOpCounts;

    fn coarse_counts(&self) -> ColorOpCounts;
}

/// State every algorithm carries: the coloring plus the configuration
/// snapshot and the per-delta count snapshots.
#[derive(Debug)]
pub struct AlgorithmCommon<E: ColoringExt + HasStats> {
    pub coloring: KColoring<E>,
    pub seed: u64,
    sanity_check: bool,
    count_ops: bool,
    fine: ColorOpCounts,
    coarse: ColorOpCounts,
}

impl<E: ColoringExt + HasStats> Default for AlgorithmCommon<E> {
    fn default() -> Self {
        Self {
            coloring: KColoring::new(1),
            seed: 0,
            sanity_check: false,
            count_ops: false,
            fine: ColorOpCounts::default(),
            coarse: ColorOpCounts::default(),
        }
    }
}

impl<E: ColoringExt + HasStats> AlgorithmCommon<E> {
    pub fn configure(&mut self, config: &MatchingConfig) {
        self.sanity_check = config.sanity_check;
        self.count_ops = config.count_coloring_ops;
        self.seed = config.seed;
        self.coloring
            .ext_mut()
            .stats_mut()
            .set_tracking(config.count_coloring_ops);
    }

    pub fn set_num_matchings(&mut self, b: u32) {
        self.coloring.set_num_colors(b);
        self.coloring.reset();
    }

    pub fn init(&mut self) {
        self.coloring.reset();
        if self.count_ops {
            self.coloring.ext_mut().stats_mut().reset_arc_diffs();
        }
    }

    pub fn reset(&mut self) {
        self.coloring.reset();
    }

    pub fn post_run(&mut self, graph: &DiGraph, weights: &WeightMap) -> Result<()> {
        if self.sanity_check {
            self.coloring.sanity_check(graph, weights)?;
        }
        if self.count_ops {
            let stats = self.coloring.ext_mut().stats_mut();
            stats.compute_coarse_counts_and_reset();
            self.fine = stats.fine_counts();
            self.coarse = stats.coarse_counts();
            stats.reset_fine_counts();
        }
        Ok(())
    }

    pub fn deliver(&self) -> EdgeWeight {
        self.coloring.total_weight()
    }

    pub fn fine_counts(&self) -> ColorOpCounts {
        self.fine
    }

    pub fn coarse_counts(&self) -> ColorOpCounts {
        self.coarse
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_filter_passes_insertions_and_deletions() {
        let filter = UpdateFilter::new(2.0);
        assert!(!filter.is_filtered(0, 10));
        assert!(!filter.is_filtered(10, 0));
    }

    #[test]
    fn test_update_filter_window() {
        let filter = UpdateFilter::new(2.0);
        assert!(filter.is_filtered(10, 10));
        assert!(filter.is_filtered(10, 20));
        assert!(filter.is_filtered(10, 5));
        assert!(!filter.is_filtered(10, 21));
        assert!(!filter.is_filtered(10, 4));
    }

    #[test]
    fn test_update_filter_neutral_threshold() {
        let filter = UpdateFilter::new(1.0);
        assert!(filter.is_filtered(10, 10));
        assert!(!filter.is_filtered(10, 11));
        assert!(filter.name_suffix().is_empty());
        assert_eq!(UpdateFilter::new(2.0).name_suffix(), "-ft2.00");
    }
}
