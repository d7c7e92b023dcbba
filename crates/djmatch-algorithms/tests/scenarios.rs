//! End-to-end scenarios: algorithms driven through delta streams.

use djmatch_core::{ArcId, DiGraph, DynamicWeightedDiGraph, EdgeWeight, VertexId};
use djmatch_algorithms::{
    Aggregate, BatchIterativeGreedy, BatchNodeCentered, DisjointMatching, DynamicGreedy,
    InvariantGreedy, IterativeGreedy, KEdgeColoring, MatchingConfig, NodeCentered, QueueKind,
    RunMode,
};

fn checked_config() -> MatchingConfig {
    MatchingConfig {
        sanity_check: true,
        count_coloring_ops: true,
        ..MatchingConfig::default()
    }
}

/// Replays the whole delta stream, returning the solution weight after each
/// delta. Sanity checks run after every delta.
fn drive(
    algorithm: &mut dyn DisjointMatching,
    dynamic: &mut DynamicWeightedDiGraph,
    b: u32,
) -> Vec<EdgeWeight> {
    algorithm.configure(&checked_config());
    dynamic.reset_to_big_bang();
    algorithm.set_num_matchings(b);
    algorithm.init();

    let mut totals = Vec::new();
    loop {
        let applied = dynamic.apply_next_delta(|graph, weights, arc, old, new| {
            algorithm.on_weight_change(graph, weights, arc, old, new);
        });
        if !applied {
            break;
        }
        algorithm.run(dynamic.graph(), dynamic.weights());
        algorithm
            .post_run(dynamic.graph(), dynamic.weights())
            .expect("coloring invariants must hold after run");
        totals.push(algorithm.deliver());
    }
    totals
}

/// Triangle u-v-w with arcs (u,v) = 5, (v,w) = 3, (u,w) = 4, inserted in
/// one delta.
fn triangle(extra_deltas: Vec<Vec<(ArcId, EdgeWeight)>>) -> DynamicWeightedDiGraph {
    let mut graph = DiGraph::with_vertices(3);
    let a = graph.add_arc(VertexId(0), VertexId(1));
    let b = graph.add_arc(VertexId(1), VertexId(2));
    let c = graph.add_arc(VertexId(0), VertexId(2));
    let mut deltas = vec![vec![(a, 5), (b, 3), (c, 4)]];
    deltas.extend(extra_deltas);
    DynamicWeightedDiGraph::new(graph, deltas)
}

/// Path u - v - w - x with three arcs.
fn path(weights: [EdgeWeight; 3], extra_deltas: Vec<Vec<(ArcId, EdgeWeight)>>) -> DynamicWeightedDiGraph {
    let mut graph = DiGraph::with_vertices(4);
    let a0 = graph.add_arc(VertexId(0), VertexId(1));
    let a1 = graph.add_arc(VertexId(1), VertexId(2));
    let a2 = graph.add_arc(VertexId(2), VertexId(3));
    let mut deltas = vec![vec![(a0, weights[0]), (a1, weights[1]), (a2, weights[2])]];
    deltas.extend(extra_deltas);
    DynamicWeightedDiGraph::new(graph, deltas)
}

#[test]
fn test_invariant_greedy_triangle_single_matching() {
    let mut dynamic = triangle(vec![]);
    let mut algo = InvariantGreedy::new(QueueKind::Binary);
    let totals = drive(&mut algo, &mut dynamic, 1);
    // Only the heaviest arc fits; both others are dominated in color 0.
    assert_eq!(totals, vec![5]);
}

#[test]
fn test_invariant_greedy_triangle_two_matchings() {
    let mut dynamic = triangle(vec![]);
    let mut algo = InvariantGreedy::new(QueueKind::Binary);
    let totals = drive(&mut algo, &mut dynamic, 2);
    // The 5-arc and the 4-arc take slots 0 and 1 at their shared vertex;
    // the 3-arc finds no common free slot and is dominated in both colors.
    assert_eq!(totals, vec![9]);
}

#[test]
fn test_invariant_greedy_bucket_queue_triangle() {
    let mut dynamic = triangle(vec![]);
    let mut algo = InvariantGreedy::new(QueueKind::Bucket);
    let totals = drive(&mut algo, &mut dynamic, 1);
    // The 5- and 4-arcs share a bucket, but displacement resolves either
    // pop order to the same maximal solution.
    assert_eq!(totals, vec![5]);
}

#[test]
fn test_invariant_greedy_deletion_recolors_neighborhood() {
    // Deleting the colored 5-arc frees both its slots; the 3-arc moves in.
    let mut dynamic = triangle(vec![vec![(ArcId(0), 0)]]);
    let mut algo = InvariantGreedy::new(QueueKind::Binary);
    let totals = drive(&mut algo, &mut dynamic, 2);
    assert_eq!(totals, vec![9, 7]);
}

#[test]
fn test_invariant_greedy_increase_on_colored_arc_adjusts_total() {
    let mut dynamic = triangle(vec![
        vec![(ArcId(0), 0)],
        vec![(ArcId(1), 10)],
    ]);
    let mut algo = InvariantGreedy::new(QueueKind::Binary);
    let totals = drive(&mut algo, &mut dynamic, 2);
    // The last delta only raises the weight of an already colored arc.
    assert_eq!(totals, vec![9, 7, 14]);
}

#[test]
fn test_dynamic_greedy_triangle_displaces_lighter_pair() {
    let mut dynamic = triangle(vec![]);
    let mut algo = DynamicGreedy::new(1, false, false, 2.0, 0);
    let totals = drive(&mut algo, &mut dynamic, 2);
    // Inserting the 4-arc displaces the 3-arc from slot 1 and the
    // recursion fails to re-place it.
    assert_eq!(totals, vec![9]);
}

#[test]
fn test_dynamic_greedy_deletion_promotes_replacement() {
    let mut dynamic = triangle(vec![vec![(ArcId(0), 0)]]);
    let mut algo = DynamicGreedy::new(1, false, false, 2.0, 0);
    let totals = drive(&mut algo, &mut dynamic, 1);
    // With one matching the 5-arc dominates its neighbors; deleting it
    // promotes the heaviest non-overlapping replacement.
    assert_eq!(totals, vec![5, 4]);
}

#[test]
fn test_dynamic_greedy_randomized_replay_is_deterministic() {
    // A fixed seed must reproduce identical per-delta totals across runs.
    let build = || {
        let mut graph = DiGraph::with_vertices(6);
        let mut arcs = Vec::new();
        for (u, v) in [(0, 1), (1, 2), (2, 3), (3, 4), (4, 5), (5, 0), (0, 2), (1, 4)] {
            arcs.push(graph.add_arc(VertexId(u), VertexId(v)));
        }
        let deltas = vec![
            arcs.iter().zip([9u64, 4, 7, 3, 8, 5, 6, 2]).map(|(&a, w)| (a, w)).collect(),
            vec![(arcs[0], 1), (arcs[4], 0)],
            vec![(arcs[7], 12), (arcs[2], 2)],
        ];
        DynamicWeightedDiGraph::new(graph, deltas)
    };

    let mut first = DynamicGreedy::new(1, true, true, 2.0, 3);
    let mut second = DynamicGreedy::new(1, true, true, 2.0, 3);
    let totals_first = drive(&mut first, &mut build(), 2);
    let totals_second = drive(&mut second, &mut build(), 2);
    assert_eq!(totals_first, totals_second);
    assert_eq!(totals_first.len(), 3);
}

#[test]
fn test_iterative_greedy_local_swaps_beat_plain_greedy() {
    // p' - x - y - q' with weights 6, 10, 6: plain greedy keeps only the
    // 10-arc, the swap trades it for the two 6-arcs.
    let mut plain = IterativeGreedy::new(false);
    let totals = drive(&mut plain, &mut path([6, 10, 6], vec![]), 1);
    assert_eq!(totals, vec![10]);

    let mut swapping = IterativeGreedy::new(true);
    let totals = drive(&mut swapping, &mut path([6, 10, 6], vec![]), 1);
    assert_eq!(totals, vec![12]);
}

#[test]
fn test_iterative_greedy_rerun_is_idempotent() {
    let mut dynamic = triangle(vec![]);
    let mut algo = IterativeGreedy::new(false);
    let totals = drive(&mut algo, &mut dynamic, 2);
    assert_eq!(totals, vec![9]);

    algo.run(dynamic.graph(), dynamic.weights());
    algo.post_run(dynamic.graph(), dynamic.weights()).unwrap();
    assert_eq!(algo.deliver(), 9);
}

#[test]
fn test_invariant_greedy_rerun_is_idempotent() {
    let mut dynamic = triangle(vec![]);
    let mut algo = InvariantGreedy::new(QueueKind::Binary);
    let totals = drive(&mut algo, &mut dynamic, 2);
    assert_eq!(totals, vec![9]);

    algo.run(dynamic.graph(), dynamic.weights());
    algo.post_run(dynamic.graph(), dynamic.weights()).unwrap();
    assert_eq!(algo.deliver(), 9);
}

#[test]
fn test_batch_greedy_recolors_touched_neighborhood() {
    let mut dynamic = triangle(vec![vec![(ArcId(0), 0)]]);
    let mut algo = BatchIterativeGreedy::new(false);
    let totals = drive(&mut algo, &mut dynamic, 2);
    assert_eq!(totals, vec![9, 7]);
}

#[test]
fn test_node_centered_colors_heaviest_center() {
    let mut dynamic = path([4, 10, 4], vec![]);
    let mut algo = NodeCentered::new(Aggregate::Sum, 0.0);
    let totals = drive(&mut algo, &mut dynamic, 1);
    assert_eq!(totals, vec![10]);
}

#[test]
fn test_node_centered_second_matching_takes_outer_arcs() {
    let mut dynamic = path([4, 10, 4], vec![]);
    let mut algo = NodeCentered::new(Aggregate::Max, 0.5);
    let totals = drive(&mut algo, &mut dynamic, 2);
    // Slot 0 goes to the 10-arc, slot 1 to both outer arcs.
    assert_eq!(totals, vec![18]);
}

#[test]
fn test_batch_node_centered_reassigns_touched_vertices() {
    let mut dynamic = path([4, 10, 4], vec![vec![(ArcId(0), 5)]]);
    let mut algo = BatchNodeCentered::new(Aggregate::Sum, 0.0);
    let totals = drive(&mut algo, &mut dynamic, 1);
    assert_eq!(totals, vec![10, 10]);
}

#[test]
fn test_k_edge_coloring_static_star() {
    // Star at x with leaves a, b, c: only two arcs fit with two slots.
    let mut graph = DiGraph::with_vertices(4);
    let x = VertexId(0);
    let xa = graph.add_arc(x, VertexId(1));
    let xb = graph.add_arc(x, VertexId(2));
    let xc = graph.add_arc(x, VertexId(3));
    let mut dynamic =
        DynamicWeightedDiGraph::new(graph, vec![vec![(xa, 3), (xb, 2), (xc, 6)]]);

    let mut algo = KEdgeColoring::new(RunMode::Static, true, false, false, false, 1.0, 1.0);
    let totals = drive(&mut algo, &mut dynamic, 2);
    assert_eq!(totals, vec![9]);
}

#[test]
fn test_k_edge_coloring_dynamic_displaces_lightest() {
    let mut graph = DiGraph::with_vertices(4);
    let x = VertexId(0);
    let xa = graph.add_arc(x, VertexId(1));
    let xb = graph.add_arc(x, VertexId(2));
    let xc = graph.add_arc(x, VertexId(3));
    let mut dynamic =
        DynamicWeightedDiGraph::new(graph, vec![vec![(xa, 1), (xb, 2), (xc, 6)]]);

    let mut algo = KEdgeColoring::new(RunMode::Dynamic, true, false, false, false, 1.0, 1.0);
    let totals = drive(&mut algo, &mut dynamic, 2);
    // The 6-arc arrives at a saturated center and trades places with the
    // lightest colored arc there.
    assert_eq!(totals, vec![8]);
}

#[test]
fn test_k_edge_coloring_hybrid_rebuilds_after_large_delta() {
    let mut dynamic = path([4, 10, 4], vec![vec![(ArcId(2), 12)]]);
    let mut algo =
        KEdgeColoring::new(RunMode::Hybrid, true, false, false, false, 0.5, 2.0);
    let totals = drive(&mut algo, &mut dynamic, 1);
    // The first delta runs incrementally; its size trips the rebuild for
    // the second, which recomputes from scratch.
    assert_eq!(totals, vec![10, 16]);
}

#[test]
fn test_k_edge_coloring_dynamic_with_post_processing_is_maximal() {
    let mut dynamic = triangle(vec![vec![(ArcId(0), 0)]]);
    let mut algo = KEdgeColoring::new(RunMode::Dynamic, true, false, true, true, 1.0, 2.0);
    let totals = drive(&mut algo, &mut dynamic, 2);
    // After deleting the 5-arc the post-processor must fill both freed
    // slots back up to the invariant.
    assert_eq!(totals.len(), 2);
    assert_eq!(totals[1], 7);
}

#[test]
fn test_deleted_arcs_are_never_colored() {
    // Every algorithm must leave zero-weight arcs uncolored after run().
    let deltas = vec![vec![(ArcId(0), 0), (ArcId(1), 2)]];
    for algo in [
        Box::new(InvariantGreedy::new(QueueKind::Binary)) as Box<dyn DisjointMatching>,
        Box::new(DynamicGreedy::new(1, true, true, 2.0, 0)),
        Box::new(IterativeGreedy::new(false)),
        Box::new(BatchIterativeGreedy::new(false)),
    ]
    .iter_mut()
    {
        let mut dynamic = triangle(deltas.clone());
        let totals = drive(algo.as_mut(), &mut dynamic, 2);
        // After the second delta the deleted 5-arc contributes nothing:
        // the remaining solution is the 4-arc plus the raised 2-arc...
        assert_eq!(*totals.last().unwrap(), 6, "algorithm left weight on a deleted arc");
    }
}
