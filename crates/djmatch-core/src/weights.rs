//! The mutable arc weight map.
//!
//! Weight changes are the engine's only update primitive: insertions are
//! 0 → w transitions, deletions w → 0, and every change is delivered
//! synchronously to the active algorithm by the driver that performed the
//! `set`. The coloring's own bookkeeping runs first inside each handler so
//! the running solution weight stays consistent before any algorithmic
//! reaction (see `djmatch_coloring::KColoring::on_weight_change`).

use crate::types::{ArcId, EdgeWeight};

/// Dense per-arc edge weights.
#[derive(Debug, Clone, Default)]
pub struct WeightMap {
    weights: Vec<EdgeWeight>,
}

impl WeightMap {
    pub fn with_num_arcs(num_arcs: usize) -> Self {
        Self {
            weights: vec![0; num_arcs],
        }
    }

    pub fn get(&self, arc: ArcId) -> EdgeWeight {
        self.weights[arc.0 as usize]
    }

    /// Writes a new weight and returns the previous one.
    pub fn set(&mut self, arc: ArcId, weight: EdgeWeight) -> EdgeWeight {
        std::mem::replace(&mut self.weights[arc.0 as usize], weight)
    }

    /// Zeroes all weights.
    pub fn reset_all(&mut self) {
        self.weights.fill(0);
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }
}
