//! # djmatch-coloring
//!
//! The central mutable state of the matching engine: a partial proper
//! edge-coloring with `k` colors over a host graph, where each color class
//! is a matching. The crate provides:
//!
//! - [`ColorSet`]: a one-word bitset over colors
//! - [`KColoring`]: arc→color map, per-color mate maps, weight bookkeeping
//! - extensions layered onto the coloring via hooks: free-color bitsets per
//!   vertex, per-color arc-to-mate maps, and operation counters
//! - fan construction and cd-path inversion primitives
//! - the maximality post-processor and its priority queues
//! - round-versioned markers and sets for per-delta deduplication

pub mod bucket_queue;
pub mod color_set;
pub mod coloring;
pub mod extensions;
pub mod marker;
pub mod utilities;

pub use bucket_queue::ApproximateBucketQueue;
pub use color_set::ColorSet;
pub use coloring::KColoring;
pub use extensions::{
    ArcMateExt, ColorOpCounts, ColoringExt, ColoringStatsExt, CoreExts, FreeColorsExt, FreeExts,
    FullExts, HasArcMates, HasFreeColors, HasStats,
};
pub use marker::{ArtifactMarker, TimedArtifactSet};
pub use utilities::{
    compute_fan, find_heaviest_incident_uncolored_arc, invert_cd_path, make_coloring_maximal,
    process_maximal_queue, rotate_fan, ApproxArcQueue, ArcQueue, MaxQueue,
    MaximalityPostProcessor,
};
