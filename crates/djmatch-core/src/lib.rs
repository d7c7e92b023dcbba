//! # djmatch-core
//!
//! Core building blocks for the djmatch dynamic b-disjoint matching engine:
//! - **Types**: edge weights, colors, vertex/arc handles
//! - **Errors**: unified error handling with `DjMatchError`
//! - **Graph**: the directed host graph with undirected-edge semantics,
//!   the mutable weight map and the dynamic delta stream
//! - **I/O**: KONECT edge-list reader
//!
//! Everything above this crate (the coloring data structure and the
//! matching algorithms) treats the graph as an oracle: arcs and vertices are
//! dense integer handles, weights live in a separate map, and weight changes
//! are delivered synchronously by the driver that owns the delta stream.

pub mod dynamic;
pub mod errors;
pub mod graph;
pub mod konect;
pub mod propmap;
pub mod types;
pub mod weights;

pub use dynamic::DynamicWeightedDiGraph;
pub use errors::{DjMatchError, Result};
pub use graph::DiGraph;
pub use propmap::FastPropertyMap;
pub use types::{AdjacentArcPair, ArcId, Color, EdgeWeight, GraphId, VertexId, UNCOLORED};
pub use weights::WeightMap;
