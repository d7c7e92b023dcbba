//! # djmatch-algorithms
//!
//! The incremental coloring algorithms of the djmatch engine. All
//! algorithms share the k-coloring state from `djmatch-coloring` and a
//! uniform driver surface ([`DisjointMatching`]); only the update and run
//! logic varies:
//!
//! - [`IterativeGreedy`]: static per-color greedy baseline, recomputed from
//!   scratch each delta, optionally with local swaps
//! - [`BatchIterativeGreedy`]: the same greedy restricted to the arcs
//!   touched by the current delta
//! - [`NodeCentered`] / [`BatchNodeCentered`]: two-pass threshold coloring
//!   ordered by aggregated node weight
//! - [`DynamicGreedy`]: replace-and-recurse greedy reacting to every
//!   unfiltered weight change
//! - [`KEdgeColoring`]: Vizing-style coloring via fan rotation and cd-path
//!   inversion, with static, dynamic and hybrid run modes
//! - [`InvariantGreedy`]: the tightest 1/2-approximation maintainer,
//!   driven entirely by the maximality queue

pub mod aggregation;
pub mod base;
pub mod batch_greedy;
pub mod batch_node_centered;
pub mod dynamic_greedy;
pub mod edge_coloring;
pub mod invariant_greedy;
pub mod iterative_greedy;
pub mod node_centered;

pub use aggregation::{aggregate_weights, Aggregate};
pub use base::{AlgorithmCommon, DisjointMatching, MatchingConfig, UpdateFilter};
pub use batch_greedy::BatchIterativeGreedy;
pub use batch_node_centered::BatchNodeCentered;
pub use dynamic_greedy::DynamicGreedy;
pub use edge_coloring::{KEdgeColoring, RunMode};
pub use invariant_greedy::{InvariantGreedy, QueueKind};
pub use iterative_greedy::IterativeGreedy;
pub use node_centered::NodeCentered;
