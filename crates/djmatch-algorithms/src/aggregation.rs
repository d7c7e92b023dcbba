//! Node weight aggregation for the node-centered algorithms.

use serde::Deserialize;

use djmatch_core::{ArcId, EdgeWeight, WeightMap};

/// How a vertex's incident arc weights fold into one node weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregate {
    Sum,
    Max,
    Avg,
    Median,
    /// Sum of the `b` heaviest incident arcs.
    BSum,
}

impl Aggregate {
    pub fn label(&self) -> &'static str {
        match self {
            Aggregate::Sum => "SUM",
            Aggregate::Max => "MAX",
            Aggregate::Avg => "AVG",
            Aggregate::Median => "MEDIAN",
            Aggregate::BSum => "B_SUM",
        }
    }
}

/// Aggregates the weights of a non-empty incidence list that is sorted by
/// descending weight.
pub fn aggregate_weights(
    edges: &[ArcId],
    weights: &WeightMap,
    kind: Aggregate,
    b: u32,
) -> EdgeWeight {
    debug_assert!(!edges.is_empty());
    let size = edges.len();
    if size == 1 {
        return weights.get(edges[0]);
    }
    match kind {
        Aggregate::Sum => edges.iter().map(|&a| weights.get(a)).sum(),
        Aggregate::Max => weights.get(edges[0]),
        Aggregate::Avg => edges.iter().map(|&a| weights.get(a)).sum::<EdgeWeight>() / size as u64,
        Aggregate::Median => {
            if size % 2 != 0 {
                weights.get(edges[size / 2])
            } else {
                (weights.get(edges[size / 2]) + weights.get(edges[size / 2 - 1])) / 2
            }
        }
        Aggregate::BSum => edges
            .iter()
            .take(size.min(b as usize))
            .map(|&a| weights.get(a))
            .sum(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (Vec<ArcId>, WeightMap) {
        // Sorted descending: 10, 6, 4, 2.
        let edges: Vec<ArcId> = (0..4).map(ArcId).collect();
        let mut weights = WeightMap::with_num_arcs(4);
        for (arc, w) in edges.iter().zip([10u64, 6, 4, 2]) {
            weights.set(*arc, w);
        }
        (edges, weights)
    }

    #[test]
    fn test_aggregates() {
        let (edges, weights) = setup();
        assert_eq!(aggregate_weights(&edges, &weights, Aggregate::Sum, 2), 22);
        assert_eq!(aggregate_weights(&edges, &weights, Aggregate::Max, 2), 10);
        assert_eq!(aggregate_weights(&edges, &weights, Aggregate::Avg, 2), 5);
        assert_eq!(
            aggregate_weights(&edges, &weights, Aggregate::Median, 2),
            5
        );
        assert_eq!(aggregate_weights(&edges, &weights, Aggregate::BSum, 2), 16);
    }

    #[test]
    fn test_odd_median_and_single_edge() {
        let (edges, weights) = setup();
        assert_eq!(
            aggregate_weights(&edges[..3], &weights, Aggregate::Median, 2),
            6
        );
        assert_eq!(
            aggregate_weights(&edges[..1], &weights, Aggregate::BSum, 2),
            10
        );
    }
}
