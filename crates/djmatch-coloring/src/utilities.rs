//! Shared machinery over the coloring: Vizing-style fans, cd-path
//! inversion, and the maximality loop with its priority queues.
//!
//! The maximality loop enforces the 1/2-approximation invariant: every
//! uncolored arc with positive weight has, for every color, an incident
//! colored arc at least as heavy. A violation lets the loop strictly
//! improve the solution weight, which is also the termination argument —
//! an arc may be uncolored, requeued and recolored several times within
//! one pass.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use djmatch_core::{ArcId, Color, DiGraph, EdgeWeight, FastPropertyMap, VertexId, WeightMap};

use crate::bucket_queue::ApproximateBucketQueue;
use crate::coloring::KColoring;
use crate::extensions::{ColoringExt, HasArcMates, HasFreeColors};
use crate::marker::TimedArtifactSet;

// ---------------------------------------------------------------------------
// Queues
// ---------------------------------------------------------------------------

/// Max-priority queue over arcs keyed by weight, abstracting over the exact
/// binary heap and the approximate bucket queue.
pub trait ArcQueue {
    fn push(&mut self, arc: ArcId, weight: EdgeWeight);
    fn pop(&mut self) -> Option<(ArcId, EdgeWeight)>;
    fn clear(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct HeapEntry {
    weight: EdgeWeight,
    seq: u64,
    arc: ArcId,
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Heaviest first; ties resolved by insertion order.
        self.weight
            .cmp(&other.weight)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Binary max-heap with insertion-order tie-breaking.
#[derive(Debug, Default)]
pub struct MaxQueue {
    heap: BinaryHeap<HeapEntry>,
    seq: u64,
}

impl ArcQueue for MaxQueue {
    fn push(&mut self, arc: ArcId, weight: EdgeWeight) {
        self.heap.push(HeapEntry {
            weight,
            seq: self.seq,
            arc,
        });
        self.seq += 1;
    }

    fn pop(&mut self) -> Option<(ArcId, EdgeWeight)> {
        self.heap.pop().map(|entry| (entry.arc, entry.weight))
    }

    fn clear(&mut self) {
        self.heap.clear();
        self.seq = 0;
    }
}

/// The approximate bucket queue adapted to the [`ArcQueue`] surface. The
/// pushed priority is remembered per arc so pops report the weight the arc
/// was enqueued with.
#[derive(Debug, Default)]
pub struct ApproxArcQueue {
    queue: ApproximateBucketQueue<ArcId>,
    priorities: FastPropertyMap<ArcId, EdgeWeight>,
}

impl ArcQueue for ApproxArcQueue {
    fn push(&mut self, arc: ArcId, weight: EdgeWeight) {
        self.queue.push(arc, weight);
        self.priorities.set(arc, weight);
    }

    fn pop(&mut self) -> Option<(ArcId, EdgeWeight)> {
        let arc = self.queue.pop_max()?;
        Some((arc, *self.priorities.get(arc)))
    }

    fn clear(&mut self) {
        self.queue.clear();
        self.priorities.reset_all();
    }
}

// ---------------------------------------------------------------------------
// Fan construction and cd-path inversion
// ---------------------------------------------------------------------------

/// Computes the fan at `x` centered on the uncolored arc `xy`: a maximal
/// sequence of arcs incident to `x` in which each appended arc is colored
/// and its color is free at the far endpoint of the previous fan arc.
/// Stops early, with that arc last, when an appended arc's far endpoint has
/// no free color at all.
pub fn compute_fan<E>(
    coloring: &KColoring<E>,
    graph: &DiGraph,
    x: VertexId,
    xy: ArcId,
) -> Vec<ArcId>
where
    E: ColoringExt + HasArcMates + HasFreeColors,
{
    let mut fan = vec![xy];

    let mut colored_arcs = coloring.get_colored_arcs(x);
    let mut leftover = Vec::with_capacity(colored_arcs.len());
    loop {
        let mut extended = false;
        leftover.clear();
        for &arc in &colored_arcs {
            let fan_end = graph.other(*fan.last().unwrap(), x);
            if coloring.is_color_free(fan_end, coloring.get_color(arc)) {
                fan.push(arc);
                if coloring.no_color_free(graph.other(arc, x)) {
                    return fan;
                }
                extended = true;
            } else {
                leftover.push(arc);
            }
        }
        std::mem::swap(&mut colored_arcs, &mut leftover);
        if !extended {
            return fan;
        }
    }
}

/// Rotates colors one step toward the fan tail: each arc takes the color of
/// its successor, and the last arc of `fan` ends up uncolored.
pub fn rotate_fan<E: ColoringExt>(
    coloring: &mut KColoring<E>,
    graph: &DiGraph,
    weights: &WeightMap,
    fan: &[ArcId],
) {
    let mut previous = match fan.first() {
        Some(&first) => first,
        None => return,
    };
    for &arc in &fan[1..] {
        let color = coloring.get_color(arc);
        coloring.uncolor(graph, weights, arc);
        coloring.color(graph, weights, previous, color);
        previous = arc;
    }
}

/// Inverts the maximal alternating path of colors `c` and `d` starting at
/// `x`, whose first arc is the `d`-colored arc at `x`. Walks the path
/// iteratively, recoloring in place; properness and the total weight are
/// preserved.
pub fn invert_cd_path<E>(
    coloring: &mut KColoring<E>,
    graph: &DiGraph,
    weights: &WeightMap,
    x: VertexId,
    c: Color,
    d: Color,
) where
    E: ColoringExt + HasArcMates,
{
    let mut arc_to_recolor = coloring
        .get_arc_to_mate(d, x)
        .expect("cd-path inversion requires a d-colored arc at the start vertex");
    let mut next_color = c;
    let mut other_color = d;
    let mut x = x;

    coloring.uncolor(graph, weights, arc_to_recolor);
    loop {
        x = graph.other(arc_to_recolor, x);
        match coloring.get_arc_to_mate(next_color, x) {
            Some(next_arc) => {
                coloring.uncolor(graph, weights, next_arc);
                coloring.color(graph, weights, arc_to_recolor, next_color);
                arc_to_recolor = next_arc;
                std::mem::swap(&mut next_color, &mut other_color);
            }
            None => {
                coloring.color(graph, weights, arc_to_recolor, next_color);
                break;
            }
        }
    }
}

/// Heaviest uncolored positive-weight arc incident to `vertex`.
pub fn find_heaviest_incident_uncolored_arc<E: ColoringExt>(
    coloring: &KColoring<E>,
    graph: &DiGraph,
    weights: &WeightMap,
    vertex: VertexId,
) -> Option<ArcId> {
    let mut heaviest = None;
    let mut max_weight = 0;
    for arc in graph.incident_arcs(vertex) {
        if !coloring.is_colored(arc) && weights.get(arc) > max_weight {
            heaviest = Some(arc);
            max_weight = weights.get(arc);
        }
    }
    heaviest
}

// ---------------------------------------------------------------------------
// Maximality
// ---------------------------------------------------------------------------

/// Drains `queue`, restoring the 1/2-approximation invariant for every
/// popped arc: color it on a common free color if one exists; otherwise,
/// for each color whose two adjacent mates are all lighter and together
/// lighter than the arc, displace them (requeueing each) and take their
/// slot; otherwise leave the arc uncolored.
pub fn process_maximal_queue<E, Q>(
    queue: &mut Q,
    coloring: &mut KColoring<E>,
    graph: &DiGraph,
    weights: &WeightMap,
) where
    E: ColoringExt + HasArcMates + HasFreeColors,
    Q: ArcQueue,
{
    while let Some((arc, arc_weight)) = queue.pop() {
        let (tail, head) = graph.endpoints(arc);
        if let Some(color) = coloring.common_free_color(tail, head) {
            coloring.color(graph, weights, arc, color);
            continue;
        }
        // The invariant demands a heavier colored neighbor in every color.
        // A color with only lighter mates whose sum is below the arc's
        // weight yields a strict improvement.
        for color in coloring.color_range() {
            let mate_tail = coloring.get_arc_to_mate(color, tail);
            let mate_head = coloring.get_arc_to_mate(color, head);
            let mut one_heavier_neighbor = false;
            let mut sum_weight: EdgeWeight = 0;
            for mate in mate_tail.into_iter().chain(mate_head) {
                let mate_weight = weights.get(mate);
                one_heavier_neighbor |= mate_weight >= arc_weight;
                sum_weight += mate_weight;
            }
            if !one_heavier_neighbor && sum_weight < arc_weight {
                for mate in mate_tail.into_iter().chain(mate_head) {
                    coloring.uncolor(graph, weights, mate);
                    if weights.get(mate) > 0 {
                        queue.push(mate, weights.get(mate));
                    }
                }
                coloring.color(graph, weights, arc, color);
                break;
            }
        }
    }
}

/// Restores the maximality invariant for the whole graph by seeding the
/// queue with every uncolored positive-weight arc.
pub fn make_coloring_maximal<E>(
    coloring: &mut KColoring<E>,
    graph: &DiGraph,
    weights: &WeightMap,
) where
    E: ColoringExt + HasArcMates + HasFreeColors,
{
    let mut queue = MaxQueue::default();
    for arc in graph.arcs() {
        if !coloring.is_colored(arc) && weights.get(arc) > 0 {
            queue.push(arc, weights.get(arc));
        }
    }
    process_maximal_queue(&mut queue, coloring, graph, weights);
}

/// Restores the maximality invariant on a registered candidate set instead
/// of the whole graph. Candidates are deduplicated per round through a
/// timed set and the queue is retained across rounds.
#[derive(Debug, Default)]
pub struct MaximalityPostProcessor {
    arcs_to_process: TimedArtifactSet<ArcId>,
    queue: MaxQueue,
}

impl MaximalityPostProcessor {
    pub fn register_arc(&mut self, arc: ArcId) {
        self.arcs_to_process.add(arc);
    }

    pub fn reset(&mut self) {
        self.arcs_to_process.reset();
        self.queue.clear();
    }

    pub fn perform_post_processing<E>(
        &mut self,
        coloring: &mut KColoring<E>,
        graph: &DiGraph,
        weights: &WeightMap,
    ) where
        E: ColoringExt + HasArcMates + HasFreeColors,
    {
        self.queue.clear();
        let mut seeded = 0usize;
        for &arc in self.arcs_to_process.as_slice() {
            if weights.get(arc) > 0 && !coloring.is_colored(arc) {
                self.queue.push(arc, weights.get(arc));
                seeded += 1;
            }
        }
        log::debug!(
            "post-processing {} of {} registered arcs",
            seeded,
            self.arcs_to_process.len()
        );
        process_maximal_queue(&mut self.queue, coloring, graph, weights);
        self.arcs_to_process.next_round();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extensions::FullExts;

    fn triangle() -> (DiGraph, WeightMap, Vec<ArcId>) {
        let mut graph = DiGraph::with_vertices(3);
        let a = graph.add_arc(VertexId(0), VertexId(1)); // u - v
        let b = graph.add_arc(VertexId(1), VertexId(2)); // v - w
        let c = graph.add_arc(VertexId(0), VertexId(2)); // u - w
        let mut weights = WeightMap::with_num_arcs(3);
        weights.set(a, 5);
        weights.set(b, 3);
        weights.set(c, 4);
        (graph, weights, vec![a, b, c])
    }

    fn assert_maximal(
        coloring: &KColoring<FullExts>,
        graph: &DiGraph,
        weights: &WeightMap,
    ) {
        for arc in graph.arcs() {
            if coloring.is_colored(arc) || weights.get(arc) == 0 {
                continue;
            }
            let (tail, head) = graph.endpoints(arc);
            for color in coloring.color_range() {
                let dominated = [tail, head].iter().any(|&v| {
                    coloring
                        .get_arc_to_mate(color, v)
                        .is_some_and(|m| weights.get(m) >= weights.get(arc))
                });
                assert!(
                    dominated,
                    "arc {arc} has no heavier {color}-colored neighbor"
                );
            }
        }
    }

    #[test]
    fn test_make_maximal_triangle_one_matching() {
        let (graph, weights, arcs) = triangle();
        let mut coloring: KColoring<FullExts> = KColoring::new(1);
        make_coloring_maximal(&mut coloring, &graph, &weights);
        assert_eq!(coloring.total_weight(), 5);
        assert!(coloring.is_colored(arcs[0]));
        assert_maximal(&coloring, &graph, &weights);
        assert!(coloring.sanity_check(&graph, &weights).is_ok());
    }

    #[test]
    fn test_make_maximal_triangle_two_matchings() {
        let (graph, weights, _) = triangle();
        let mut coloring: KColoring<FullExts> = KColoring::new(2);
        make_coloring_maximal(&mut coloring, &graph, &weights);
        // (u,v) takes slot 0 and (u,w) slot 1; (v,w) finds no common free
        // slot and is dominated in both colors, so it stays out.
        assert_eq!(coloring.total_weight(), 9);
        assert_maximal(&coloring, &graph, &weights);
        assert!(coloring.sanity_check(&graph, &weights).is_ok());
    }

    #[test]
    fn test_maximality_displaces_lighter_mates() {
        // Path u - v - w - x: (v,w) is heavy but blocked by two light arcs.
        let mut graph = DiGraph::with_vertices(4);
        let uv = graph.add_arc(VertexId(0), VertexId(1));
        let vw = graph.add_arc(VertexId(1), VertexId(2));
        let wx = graph.add_arc(VertexId(2), VertexId(3));
        let mut weights = WeightMap::with_num_arcs(3);
        weights.set(uv, 2);
        weights.set(vw, 10);
        weights.set(wx, 3);

        let mut coloring: KColoring<FullExts> = KColoring::new(1);
        coloring.color(&graph, &weights, uv, 0);
        coloring.color(&graph, &weights, wx, 0);

        let mut queue = MaxQueue::default();
        queue.push(vw, 10);
        process_maximal_queue(&mut queue, &mut coloring, &graph, &weights);

        // 2 + 3 < 10, so both mates get displaced and stay uncolored (no
        // free endpoints remain for them).
        assert!(coloring.is_colored(vw));
        assert!(!coloring.is_colored(uv));
        assert!(!coloring.is_colored(wx));
        assert_eq!(coloring.total_weight(), 10);
        assert_maximal(&coloring, &graph, &weights);
    }

    #[test]
    fn test_fan_on_star() {
        // Star centered at x with leaves a, b, c; xa colored 0, xb colored
        // 1, xc uncolored.
        let mut graph = DiGraph::with_vertices(4);
        let x = VertexId(0);
        let xa = graph.add_arc(x, VertexId(1));
        let xb = graph.add_arc(x, VertexId(2));
        let xc = graph.add_arc(x, VertexId(3));
        let mut weights = WeightMap::with_num_arcs(3);
        weights.set(xa, 1);
        weights.set(xb, 2);
        weights.set(xc, 6);

        let mut coloring: KColoring<FullExts> = KColoring::new(2);
        coloring.color(&graph, &weights, xa, 0);
        coloring.color(&graph, &weights, xb, 1);

        let fan = compute_fan(&coloring, &graph, x, xc);
        assert_eq!(fan, vec![xc, xa, xb]);

        rotate_fan(&mut coloring, &graph, &weights, &fan);
        assert_eq!(coloring.get_color(xc), 0);
        assert_eq!(coloring.get_color(xa), 1);
        assert!(!coloring.is_colored(xb));
        assert!(coloring.sanity_check(&graph, &weights).is_ok());
    }

    #[test]
    fn test_invert_cd_path_preserves_properness_and_weight() {
        // Alternating path x - p - q - r colored d, c, d.
        let mut graph = DiGraph::with_vertices(4);
        let xp = graph.add_arc(VertexId(0), VertexId(1));
        let pq = graph.add_arc(VertexId(1), VertexId(2));
        let qr = graph.add_arc(VertexId(2), VertexId(3));
        let mut weights = WeightMap::with_num_arcs(3);
        weights.set(xp, 4);
        weights.set(pq, 5);
        weights.set(qr, 6);

        let c = 0;
        let d = 1;
        let mut coloring: KColoring<FullExts> = KColoring::new(2);
        coloring.color(&graph, &weights, xp, d);
        coloring.color(&graph, &weights, pq, c);
        coloring.color(&graph, &weights, qr, d);

        let weight_before = coloring.total_weight();
        invert_cd_path(&mut coloring, &graph, &weights, VertexId(0), c, d);

        assert_eq!(coloring.get_color(xp), c);
        assert_eq!(coloring.get_color(pq), d);
        assert_eq!(coloring.get_color(qr), c);
        assert_eq!(coloring.total_weight(), weight_before);
        assert!(coloring.sanity_check(&graph, &weights).is_ok());
        // After inversion, d is free at the start vertex.
        assert!(coloring.is_color_free(VertexId(0), d));
    }

    #[test]
    fn test_max_queue_breaks_ties_by_insertion_order() {
        let mut queue = MaxQueue::default();
        queue.push(ArcId(7), 5);
        queue.push(ArcId(3), 5);
        queue.push(ArcId(9), 6);
        assert_eq!(queue.pop(), Some((ArcId(9), 6)));
        assert_eq!(queue.pop(), Some((ArcId(7), 5)));
        assert_eq!(queue.pop(), Some((ArcId(3), 5)));
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn test_post_processor_registers_once_per_round() {
        let (graph, weights, arcs) = triangle();
        let mut coloring: KColoring<FullExts> = KColoring::new(1);
        let mut pp = MaximalityPostProcessor::default();
        pp.register_arc(arcs[0]);
        pp.register_arc(arcs[0]);
        pp.register_arc(arcs[1]);
        pp.register_arc(arcs[2]);
        pp.perform_post_processing(&mut coloring, &graph, &weights);
        assert_eq!(coloring.total_weight(), 5);
        assert_maximal(&coloring, &graph, &weights);

        // Next round starts empty.
        pp.perform_post_processing(&mut coloring, &graph, &weights);
        assert_eq!(coloring.total_weight(), 5);
    }
}
