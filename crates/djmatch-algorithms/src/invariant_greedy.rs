//! The invariant-maintaining greedy batch algorithm.

use serde::Deserialize;

use djmatch_core::{ArcId, DiGraph, EdgeWeight, Result, WeightMap};
use djmatch_coloring::{
    process_maximal_queue, ApproxArcQueue, ArcQueue, ColorOpCounts, FullExts, MaxQueue,
    TimedArtifactSet,
};

use crate::base::{AlgorithmCommon, DisjointMatching, MatchingConfig};

/// Which priority queue drives the maximality loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueKind {
    /// Exact binary max-heap.
    #[default]
    Binary,
    /// Log-bucketed approximate queue; pops may be off by a factor of two.
    Bucket,
}

#[derive(Debug)]
enum Queue {
    Binary(MaxQueue),
    Bucket(ApproxArcQueue),
}

impl ArcQueue for Queue {
    fn push(&mut self, arc: ArcId, weight: EdgeWeight) {
        match self {
            Queue::Binary(q) => q.push(arc, weight),
            Queue::Bucket(q) => q.push(arc, weight),
        }
    }

    fn pop(&mut self) -> Option<(ArcId, EdgeWeight)> {
        match self {
            Queue::Binary(q) => q.pop(),
            Queue::Bucket(q) => q.pop(),
        }
    }

    fn clear(&mut self) {
        match self {
            Queue::Binary(q) => q.clear(),
            Queue::Bucket(q) => q.clear(),
        }
    }
}

/// Maintains the 1/2-approximation invariant: every uncolored arc has, for
/// every color, at least one adjacent colored arc at least as heavy.
///
/// Each event registers the arcs whose invariant may have been invalidated
/// (an increased uncolored arc; the uncolored neighborhood of a decreased
/// colored arc). `run` seeds the maximality queue with the registered
/// candidates and processes it to a fixpoint.
#[derive(Debug)]
pub struct InvariantGreedy {
    queue: Queue,
    queue_kind: QueueKind,
    arcs_to_update: TimedArtifactSet<ArcId>,
    common: AlgorithmCommon<FullExts>,
}

impl InvariantGreedy {
    pub fn new(queue_kind: QueueKind) -> Self {
        let queue = match queue_kind {
            QueueKind::Binary => Queue::Binary(MaxQueue::default()),
            QueueKind::Bucket => Queue::Bucket(ApproxArcQueue::default()),
        };
        Self {
            queue,
            queue_kind,
            arcs_to_update: TimedArtifactSet::default(),
            common: AlgorithmCommon::default(),
        }
    }
}

impl DisjointMatching for InvariantGreedy {
    fn name(&self) -> String {
        match self.queue_kind {
            QueueKind::Binary => "batch-invariant-greedy".into(),
            QueueKind::Bucket => "batch-invariant-greedy-bq".into(),
        }
    }

    fn short_name(&self) -> String {
        match self.queue_kind {
            QueueKind::Binary => "bat-inv-gr".into(),
            QueueKind::Bucket => "bat-inv-gr-bq".into(),
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
        self.queue.clear();
        self.arcs_to_update.reset();
    }

    fn reset(&mut self) {
        self.common.reset();
        self.queue.clear();
        self.arcs_to_update.reset();
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

        if old < new && !coloring.is_colored(arc) {
            self.arcs_to_update.add(arc);
        } else if old > new && coloring.is_colored(arc) {
            // The decreased arc may no longer dominate its uncolored
            // neighbors.
            for vertex in [graph.tail(arc), graph.head(arc)] {
                for a in graph.incident_arcs(vertex) {
                    if a != arc && !coloring.is_colored(a) {
                        self.arcs_to_update.add(a);
                    }
                }
            }
        }
        if new == 0 && coloring.is_colored(arc) {
            coloring.uncolor(graph, weights, arc);
        }
    }

    fn run(&mut self, graph: &DiGraph, weights: &WeightMap) {
        for &arc in self.arcs_to_update.as_slice() {
            let arc_weight = weights.get(arc);
            if arc_weight > 0 && !self.common.coloring.is_colored(arc) {
                self.queue.push(arc, arc_weight);
            }
        }
        process_maximal_queue(&mut self.queue, &mut self.common.coloring, graph, weights);
        self.arcs_to_update.next_round();
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
