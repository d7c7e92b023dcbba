//! Optional per-vertex and per-arc bookkeeping layered onto the coloring.
//!
//! Extensions attach to [`crate::KColoring`] through four hook points:
//! `on_reset`, `on_set_num_colors`, `on_color` and `on_uncolor`. A coloring
//! is instantiated with a fixed bundle of extensions chosen at construction;
//! the bundles below fire their members' hooks in declaration order. The
//! `Has*` traits let generic helpers require exactly the extensions they
//! use.

use djmatch_core::{
    AdjacentArcPair, ArcId, Color, DiGraph, EdgeWeight, FastPropertyMap, VertexId, WeightMap,
    UNCOLORED,
};

use crate::color_set::ColorSet;
use crate::marker::TimedArtifactSet;

/// Hook surface through which the coloring drives its extensions.
pub trait ColoringExt: Default {
    fn on_reset(&mut self);
    fn on_set_num_colors(&mut self, num_colors: u32);
    fn on_color(&mut self, graph: &DiGraph, arc: ArcId, color: Color);
    fn on_uncolor(&mut self, graph: &DiGraph, arc: ArcId, prev_color: Color);
}

/// Access to the operation-counting extension of a bundle.
pub trait HasStats {
    fn stats(&self) -> &ColoringStatsExt;
    fn stats_mut(&mut self) -> &mut ColoringStatsExt;
}

/// Access to the free-color bitsets of a bundle.
pub trait HasFreeColors {
    fn free_colors(&self) -> &FreeColorsExt;
}

/// Access to the per-color arc-to-mate maps of a bundle.
pub trait HasArcMates {
    fn arc_mates(&self) -> &ArcMateExt;
}

// ---------------------------------------------------------------------------
// Free colors
// ---------------------------------------------------------------------------

/// Stores for each vertex the set of colors with no incident colored arc.
#[derive(Debug, Default)]
pub struct FreeColorsExt {
    free: FastPropertyMap<VertexId, ColorSet>,
}

impl FreeColorsExt {
    pub fn get_free_colors(&self, v: VertexId) -> &ColorSet {
        self.free.get(v)
    }

    pub fn any_color_free(&self, v: VertexId) -> bool {
        self.free.get(v).any()
    }

    pub fn all_colors_free(&self, v: VertexId) -> bool {
        self.free.get(v).all()
    }

    pub fn no_color_free(&self, v: VertexId) -> bool {
        self.free.get(v).none()
    }

    pub fn get_any_free_color(&self, v: VertexId) -> Option<Color> {
        self.free.get(v).find_first()
    }

    /// Lowest color free at both `v1` and `v2`, if any.
    pub fn common_free_color(&self, v1: VertexId, v2: VertexId) -> Option<Color> {
        ColorSet::common(self.free.get(v1), self.free.get(v2)).find_first()
    }
}

impl ColoringExt for FreeColorsExt {
    fn on_reset(&mut self) {
        self.free.reset_all();
    }

    fn on_set_num_colors(&mut self, num_colors: u32) {
        self.free.set_default(ColorSet::full(num_colors));
        self.free.reset_all();
    }

    fn on_color(&mut self, graph: &DiGraph, arc: ArcId, color: Color) {
        let (tail, head) = graph.endpoints(arc);
        debug_assert!(self.free.get(tail).contains(color));
        debug_assert!(self.free.get(head).contains(color));
        self.free.get_mut(tail).set_off(color);
        self.free.get_mut(head).set_off(color);
    }

    fn on_uncolor(&mut self, graph: &DiGraph, arc: ArcId, prev_color: Color) {
        let (tail, head) = graph.endpoints(arc);
        debug_assert!(!self.free.get(tail).contains(prev_color));
        debug_assert!(!self.free.get(head).contains(prev_color));
        self.free.get_mut(tail).set_on(prev_color);
        self.free.get_mut(head).set_on(prev_color);
    }
}

// ---------------------------------------------------------------------------
// Arc mates
// ---------------------------------------------------------------------------

/// Stores for each vertex and each color the arc to the mate.
#[derive(Debug, Default)]
pub struct ArcMateExt {
    by_color: Vec<FastPropertyMap<VertexId, Option<ArcId>>>,
}

impl ArcMateExt {
    pub fn get_arc_to_mate(&self, color: Color, v: VertexId) -> Option<ArcId> {
        *self.by_color[color as usize].get(v)
    }

    /// All colored arcs at `v`, in color order.
    pub fn get_colored_arcs(&self, v: VertexId) -> Vec<ArcId> {
        let mut colored = Vec::with_capacity(self.by_color.len());
        for map in &self.by_color {
            if let Some(arc) = *map.get(v) {
                colored.push(arc);
            }
        }
        colored
    }

    /// Minimum-weight colored arc at `v`, if any.
    pub fn get_lightest_colored_edge(&self, weights: &WeightMap, v: VertexId) -> Option<ArcId> {
        let mut lightest = None;
        let mut min_weight = EdgeWeight::MAX;
        for map in &self.by_color {
            if let Some(arc) = *map.get(v) {
                if weights.get(arc) < min_weight {
                    lightest = Some(arc);
                    min_weight = weights.get(arc);
                }
            }
        }
        lightest
    }

    /// For each color, sums the weights of the mate arcs at both endpoints
    /// of `arc` and returns the pair with minimum combined weight, together
    /// with its color.
    pub fn lightest_adjacent_colored_arcs(
        &self,
        graph: &DiGraph,
        weights: &WeightMap,
        arc: ArcId,
    ) -> (AdjacentArcPair, Color) {
        let (tail, head) = graph.endpoints(arc);
        let mut best = AdjacentArcPair {
            tail_arc: None,
            head_arc: None,
            weight: EdgeWeight::MAX,
        };
        let mut min_color = UNCOLORED;
        for (col, map) in self.by_color.iter().enumerate() {
            let tail_arc = *map.get(tail);
            let head_arc = *map.get(head);
            let weight: EdgeWeight = tail_arc
                .into_iter()
                .chain(head_arc)
                .map(|a| weights.get(a))
                .sum();
            if weight < best.weight {
                best = AdjacentArcPair {
                    tail_arc,
                    head_arc,
                    weight,
                };
                min_color = col as Color;
            }
        }
        (best, min_color)
    }
}

impl ColoringExt for ArcMateExt {
    fn on_reset(&mut self) {
        for map in &mut self.by_color {
            map.reset_all();
        }
    }

    fn on_set_num_colors(&mut self, num_colors: u32) {
        self.by_color
            .resize_with(num_colors as usize, FastPropertyMap::default);
    }

    fn on_color(&mut self, graph: &DiGraph, arc: ArcId, color: Color) {
        let (tail, head) = graph.endpoints(arc);
        let map = &mut self.by_color[color as usize];
        debug_assert!(map.get(tail).is_none());
        debug_assert!(map.get(head).is_none());
        map.set(tail, Some(arc));
        map.set(head, Some(arc));
    }

    fn on_uncolor(&mut self, graph: &DiGraph, arc: ArcId, prev_color: Color) {
        let (tail, head) = graph.endpoints(arc);
        let map = &mut self.by_color[prev_color as usize];
        debug_assert!(map.get(tail).is_some());
        debug_assert!(map.get(head).is_some());
        map.set(tail, None);
        map.set(head, None);
    }
}

// ---------------------------------------------------------------------------
// Operation counters
// ---------------------------------------------------------------------------

/// Counts of color, uncolor and recolor operations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ColorOpCounts {
    pub color: u64,
    pub uncolor: u64,
    pub recolor: u64,
}

/// Counts coloring operations, fine and coarse.
///
/// Fine counts tick on every primitive `color`/`uncolor`. Coarse counts are
/// the net change per arc since the last snapshot: an arc that moved from
/// uncolored to colored counts as one color operation no matter how many
/// primitives touched it in between. Only arcs touched since the last
/// snapshot are classified; the baseline map of last-snapshot colors
/// persists across deltas. Tracking is off by default since only the cheap
/// fine counters are needed otherwise.
#[derive(Debug, Default)]
pub struct ColoringStatsExt {
    fine: ColorOpCounts,
    coarse: ColorOpCounts,
    baseline: FastPropertyMap<ArcId, Color>,
    current: FastPropertyMap<ArcId, Color>,
    touched: TimedArtifactSet<ArcId>,
    tracking: bool,
}

impl ColoringStatsExt {
    pub fn set_tracking(&mut self, enabled: bool) {
        self.tracking = enabled;
    }

    pub fn fine_counts(&self) -> ColorOpCounts {
        self.fine
    }

    pub fn coarse_counts(&self) -> ColorOpCounts {
        self.coarse
    }

    pub fn reset_fine_counts(&mut self) {
        self.fine = ColorOpCounts::default();
    }

    /// Clears the diff state so the next snapshot starts from scratch.
    pub fn reset_arc_diffs(&mut self) {
        self.baseline.set_default(UNCOLORED);
        self.baseline.reset_all();
        self.current.set_default(UNCOLORED);
        self.current.reset_all();
        self.touched.reset();
    }

    /// Classifies the net color change of every arc touched since the
    /// previous snapshot and rolls the baseline forward.
    pub fn compute_coarse_counts_and_reset(&mut self) {
        self.coarse = ColorOpCounts::default();
        for i in 0..self.touched.len() {
            let arc = self.touched.as_slice()[i];
            let before = *self.baseline.get(arc);
            let after = *self.current.get(arc);
            if before == UNCOLORED && after != UNCOLORED {
                self.coarse.color += 1;
            } else if before != UNCOLORED && after == UNCOLORED {
                self.coarse.uncolor += 1;
            } else if before != after && before != UNCOLORED {
                self.coarse.recolor += 1;
            }
            self.baseline.set(arc, after);
        }
        self.touched.next_round();
    }

    fn record(&mut self, arc: ArcId, color: Color) {
        self.touched.add(arc);
        self.current.set(arc, color);
    }
}

impl ColoringExt for ColoringStatsExt {
    fn on_reset(&mut self) {
        self.fine = ColorOpCounts::default();
        self.coarse = ColorOpCounts::default();
    }

    fn on_set_num_colors(&mut self, _num_colors: u32) {}

    fn on_color(&mut self, _graph: &DiGraph, arc: ArcId, color: Color) {
        self.fine.color += 1;
        if self.tracking {
            self.record(arc, color);
        }
    }

    fn on_uncolor(&mut self, _graph: &DiGraph, arc: ArcId, _prev_color: Color) {
        self.fine.uncolor += 1;
        if self.tracking {
            self.record(arc, UNCOLORED);
        }
    }
}

// ---------------------------------------------------------------------------
// Bundles
// ---------------------------------------------------------------------------

/// Counters only. Used by the greedy algorithms, which rely solely on the
/// mate maps of the coloring itself.
#[derive(Debug, Default)]
pub struct CoreExts {
    pub stats: ColoringStatsExt,
}

/// Counters plus free-color bitsets. Used by the node-centered algorithms.
#[derive(Debug, Default)]
pub struct FreeExts {
    pub stats: ColoringStatsExt,
    pub free: FreeColorsExt,
}

/// Counters, arc-to-mate maps and free-color bitsets. Used by the dynamic
/// algorithms and everything built on the maximality loop.
#[derive(Debug, Default)]
pub struct FullExts {
    pub stats: ColoringStatsExt,
    pub mates: ArcMateExt,
    pub free: FreeColorsExt,
}

impl ColoringExt for CoreExts {
    fn on_reset(&mut self) {
        self.stats.on_reset();
    }

    fn on_set_num_colors(&mut self, num_colors: u32) {
        self.stats.on_set_num_colors(num_colors);
    }

    fn on_color(&mut self, graph: &DiGraph, arc: ArcId, color: Color) {
        self.stats.on_color(graph, arc, color);
    }

    fn on_uncolor(&mut self, graph: &DiGraph, arc: ArcId, prev_color: Color) {
        self.stats.on_uncolor(graph, arc, prev_color);
    }
}

impl ColoringExt for FreeExts {
    fn on_reset(&mut self) {
        self.stats.on_reset();
        self.free.on_reset();
    }

    fn on_set_num_colors(&mut self, num_colors: u32) {
        self.stats.on_set_num_colors(num_colors);
        self.free.on_set_num_colors(num_colors);
    }

    fn on_color(&mut self, graph: &DiGraph, arc: ArcId, color: Color) {
        self.stats.on_color(graph, arc, color);
        self.free.on_color(graph, arc, color);
    }

    fn on_uncolor(&mut self, graph: &DiGraph, arc: ArcId, prev_color: Color) {
        self.stats.on_uncolor(graph, arc, prev_color);
        self.free.on_uncolor(graph, arc, prev_color);
    }
}

impl ColoringExt for FullExts {
    fn on_reset(&mut self) {
        self.stats.on_reset();
        self.mates.on_reset();
        self.free.on_reset();
    }

    fn on_set_num_colors(&mut self, num_colors: u32) {
        self.stats.on_set_num_colors(num_colors);
        self.mates.on_set_num_colors(num_colors);
        self.free.on_set_num_colors(num_colors);
    }

    fn on_color(&mut self, graph: &DiGraph, arc: ArcId, color: Color) {
        self.stats.on_color(graph, arc, color);
        self.mates.on_color(graph, arc, color);
        self.free.on_color(graph, arc, color);
    }

    fn on_uncolor(&mut self, graph: &DiGraph, arc: ArcId, prev_color: Color) {
        self.stats.on_uncolor(graph, arc, prev_color);
        self.mates.on_uncolor(graph, arc, prev_color);
        self.free.on_uncolor(graph, arc, prev_color);
    }
}

impl HasStats for CoreExts {
    fn stats(&self) -> &ColoringStatsExt {
        &self.stats
    }
    fn stats_mut(&mut self) -> &mut ColoringStatsExt {
        &mut self.stats
    }
}

impl HasStats for FreeExts {
    fn stats(&self) -> &ColoringStatsExt {
        &self.stats
    }
    fn stats_mut(&mut self) -> &mut ColoringStatsExt {
        &mut self.stats
    }
}

impl HasStats for FullExts {
    fn stats(&self) -> &ColoringStatsExt {
        &self.stats
    }
    fn stats_mut(&mut self) -> &mut ColoringStatsExt {
        &mut self.stats
    }
}

impl HasFreeColors for FreeExts {
    fn free_colors(&self) -> &FreeColorsExt {
        &self.free
    }
}

impl HasFreeColors for FullExts {
    fn free_colors(&self) -> &FreeColorsExt {
        &self.free
    }
}

impl HasArcMates for FullExts {
    fn arc_mates(&self) -> &ArcMateExt {
        &self.mates
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_fine_counts() {
        let mut stats = ColoringStatsExt::default();
        let graph = DiGraph::with_vertices(2);
        stats.on_color(&graph, ArcId(0), 1);
        stats.on_color(&graph, ArcId(1), 0);
        stats.on_uncolor(&graph, ArcId(0), 1);
        let fine = stats.fine_counts();
        assert_eq!(fine.color, 2);
        assert_eq!(fine.uncolor, 1);
        assert_eq!(fine.recolor, 0);
    }

    #[test]
    fn test_stats_coarse_counts_classify_net_changes() {
        let mut stats = ColoringStatsExt::default();
        stats.set_tracking(true);
        stats.reset_arc_diffs();
        let graph = DiGraph::with_vertices(2);

        // Arc 0: colored. Arc 1: colored then uncolored (no net change).
        stats.on_color(&graph, ArcId(0), 2);
        stats.on_color(&graph, ArcId(1), 0);
        stats.on_uncolor(&graph, ArcId(1), 0);
        stats.compute_coarse_counts_and_reset();
        let coarse = stats.coarse_counts();
        assert_eq!(coarse.color, 1);
        assert_eq!(coarse.uncolor, 0);
        assert_eq!(coarse.recolor, 0);

        // Next delta: arc 0 moves to another color.
        stats.on_uncolor(&graph, ArcId(0), 2);
        stats.on_color(&graph, ArcId(0), 3);
        stats.compute_coarse_counts_and_reset();
        let coarse = stats.coarse_counts();
        assert_eq!(coarse.recolor, 1);
        assert_eq!(coarse.color, 0);
    }
}
