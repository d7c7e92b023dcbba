//! The dynamic weighted graph container.
//!
//! Owns the host graph, the weight map and an ordered list of deltas. Every
//! arc that ever exists is constructed up front; an arc is "absent" while
//! its weight is zero. A delta is one batch of weight updates; the driver
//! replays deltas one at a time, delivering each update synchronously to the
//! active algorithm, and calls the algorithm's `run` after each batch.

use crate::graph::DiGraph;
use crate::types::{ArcId, EdgeWeight};
use crate::weights::WeightMap;

/// One batch of weight updates, applied in order.
pub type Delta = Vec<(ArcId, EdgeWeight)>;

/// A weighted graph evolving through a stream of deltas.
#[derive(Debug)]
pub struct DynamicWeightedDiGraph {
    graph: DiGraph,
    weights: WeightMap,
    deltas: Vec<Delta>,
    cursor: usize,
    last_delta_size: usize,
}

impl DynamicWeightedDiGraph {
    pub fn new(graph: DiGraph, deltas: Vec<Delta>) -> Self {
        let weights = WeightMap::with_num_arcs(graph.num_arcs());
        Self {
            graph,
            weights,
            deltas,
            cursor: 0,
            last_delta_size: 0,
        }
    }

    pub fn graph(&self) -> &DiGraph {
        &self.graph
    }

    pub fn weights(&self) -> &WeightMap {
        &self.weights
    }

    pub fn num_deltas(&self) -> usize {
        self.deltas.len()
    }

    /// Number of updates in the most recently applied delta.
    pub fn last_delta_size(&self) -> usize {
        self.last_delta_size
    }

    /// Rewinds to the empty initial state: all weights zero, no deltas
    /// applied.
    pub fn reset_to_big_bang(&mut self) {
        self.weights.reset_all();
        self.cursor = 0;
        self.last_delta_size = 0;
    }

    /// Applies the next delta, invoking `on_change(graph, weights, arc, old,
    /// new)` for every update after the weight map has been written.
    /// Returns `false` when the stream is exhausted.
    pub fn apply_next_delta<F>(&mut self, mut on_change: F) -> bool
    where
        F: FnMut(&DiGraph, &WeightMap, ArcId, EdgeWeight, EdgeWeight),
    {
        if self.cursor >= self.deltas.len() {
            return false;
        }
        let num_updates = self.deltas[self.cursor].len();
        for i in 0..num_updates {
            let (arc, new) = self.deltas[self.cursor][i];
            let old = self.weights.set(arc, new);
            on_change(&self.graph, &self.weights, arc, old, new);
        }
        self.last_delta_size = num_updates;
        self.cursor += 1;
        true
    }
}
