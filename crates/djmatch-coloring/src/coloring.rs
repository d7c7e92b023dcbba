//! The partial k-edge-coloring.
//!
//! Stores a color per arc (or the uncolored sentinel), a mate map per color
//! and vertex, and the running total weight of all colored arcs. Each color
//! class is a matching: at most one colored arc of a given color touches
//! any vertex. The graph and the weight map are borrowed per operation;
//! the coloring owns only its per-entity maps and its extensions.
//!
//! Invariants after every public operation:
//! - the coloring is proper (one arc per color per vertex),
//! - `mate(c, v) == Some(u)` iff an arc (v, u) is colored `c`,
//! - the total weight equals the sum of weights of all colored arcs.

use djmatch_core::{
    AdjacentArcPair, ArcId, Color, DiGraph, DjMatchError, EdgeWeight, FastPropertyMap, Result,
    VertexId, WeightMap, UNCOLORED,
};

use crate::color_set::ColorSet;
use crate::extensions::{ColoringExt, HasArcMates, HasFreeColors};

/// A partial proper edge-coloring with a fixed number of colors.
#[derive(Debug)]
pub struct KColoring<E: ColoringExt> {
    num_colors: u32,
    arc_colors: FastPropertyMap<ArcId, Color>,
    mates_by_color: Vec<FastPropertyMap<VertexId, Option<VertexId>>>,
    total_weight: EdgeWeight,
    ext: E,
}

impl<E: ColoringExt> KColoring<E> {
    pub fn new(num_colors: u32) -> Self {
        let mut coloring = Self {
            num_colors: 0,
            arc_colors: FastPropertyMap::new(UNCOLORED),
            mates_by_color: Vec::new(),
            total_weight: 0,
            ext: E::default(),
        };
        coloring.set_num_colors(num_colors);
        coloring.reset();
        coloring
    }

    pub fn ext(&self) -> &E {
        &self.ext
    }

    pub fn ext_mut(&mut self) -> &mut E {
        &mut self.ext
    }

    pub fn num_colors(&self) -> u32 {
        self.num_colors
    }

    pub fn color_range(&self) -> std::ops::Range<Color> {
        0..self.num_colors
    }

    /// Sum of the weights of all colored arcs.
    pub fn total_weight(&self) -> EdgeWeight {
        self.total_weight
    }

    /// Changes the number of colors. The coloring must be `reset` before it
    /// is used again.
    pub fn set_num_colors(&mut self, num_colors: u32) {
        assert!(num_colors <= ColorSet::MAX_COLORS);
        self.num_colors = num_colors;
        self.ext.on_set_num_colors(num_colors);
    }

    /// Clears all color assignments and the total weight.
    pub fn reset(&mut self) {
        self.arc_colors.reset_all();
        self.mates_by_color
            .resize_with(self.num_colors as usize, FastPropertyMap::default);
        for map in &mut self.mates_by_color {
            map.reset_all();
        }
        self.total_weight = 0;
        self.ext.on_reset();
    }

    pub fn get_color(&self, arc: ArcId) -> Color {
        *self.arc_colors.get(arc)
    }

    /// Whether `arc` has a valid color assigned.
    pub fn is_colored(&self, arc: ArcId) -> bool {
        *self.arc_colors.get(arc) < self.num_colors
    }

    /// Whether `vertex` has no incident arc colored `color`.
    pub fn is_color_free(&self, vertex: VertexId, color: Color) -> bool {
        color < self.num_colors && self.mates_by_color[color as usize].get(vertex).is_none()
    }

    /// The vertex at the other end of the `color`-colored arc at `vertex`.
    pub fn mate(&self, color: Color, vertex: VertexId) -> Option<VertexId> {
        *self.mates_by_color[color as usize].get(vertex)
    }

    /// Whether `arc` is uncolored and `color` is free at both endpoints.
    pub fn can_color(&self, graph: &DiGraph, arc: ArcId, color: Color) -> bool {
        !self.is_colored(arc)
            && self.is_color_free(graph.tail(arc), color)
            && self.is_color_free(graph.head(arc), color)
    }

    /// Assigns `color` to `arc`.
    ///
    /// Pre-condition: `can_color(graph, arc, color)`.
    pub fn color(&mut self, graph: &DiGraph, weights: &WeightMap, arc: ArcId, color: Color) {
        debug_assert!(graph.contains_arc(arc));
        assert!(!self.is_colored(arc));
        assert!(color < self.num_colors);
        debug_assert!(self.is_color_free(graph.tail(arc), color));
        debug_assert!(self.is_color_free(graph.head(arc), color));

        self.total_weight += weights.get(arc);
        self.arc_colors.set(arc, color);
        let (tail, head) = graph.endpoints(arc);
        self.mates_by_color[color as usize].set(head, Some(tail));
        self.mates_by_color[color as usize].set(tail, Some(head));

        self.ext.on_color(graph, arc, color);
    }

    /// Removes the color assignment from `arc`.
    ///
    /// Pre-condition: `is_colored(arc)`.
    pub fn uncolor(&mut self, graph: &DiGraph, weights: &WeightMap, arc: ArcId) {
        assert!(self.is_colored(arc));
        let color = *self.arc_colors.get(arc);
        self.arc_colors.set(arc, UNCOLORED);
        let (tail, head) = graph.endpoints(arc);
        self.mates_by_color[color as usize].set(head, None);
        self.mates_by_color[color as usize].set(tail, None);
        self.total_weight -= weights.get(arc);

        self.ext.on_uncolor(graph, arc, color);
    }

    /// Attempts to replace the colored `arc` by two adjacent uncolored arcs
    /// that are heavier in combination: the heaviest candidate at the tail
    /// and the heaviest candidate at the head with a distinct far endpoint,
    /// each requiring the arc's color free at its far endpoint. Returns
    /// whether the swap happened.
    pub fn local_swap(&mut self, graph: &DiGraph, weights: &WeightMap, arc: ArcId) -> bool {
        assert!(self.is_colored(arc));

        let (tail, head) = graph.endpoints(arc);
        let arc_color = self.get_color(arc);
        let mut tail_weight: EdgeWeight = 0;
        let mut head_weight: EdgeWeight = 0;
        let mut tail_arc = None;
        let mut head_arc = None;
        let mut tail_arc_target = None;

        for candidate in graph.incident_arcs(tail) {
            if candidate == arc || self.is_colored(candidate) {
                continue;
            }
            let far = graph.other(candidate, tail);
            if self.is_color_free(far, arc_color) && weights.get(candidate) > tail_weight {
                tail_arc = Some(candidate);
                tail_weight = weights.get(candidate);
                tail_arc_target = Some(far);
            }
        }
        for candidate in graph.incident_arcs(head) {
            if candidate == arc || self.is_colored(candidate) {
                continue;
            }
            let far = graph.other(candidate, head);
            if self.is_color_free(far, arc_color)
                && Some(far) != tail_arc_target
                && weights.get(candidate) > head_weight
            {
                head_arc = Some(candidate);
                head_weight = weights.get(candidate);
            }
        }

        if tail_weight + head_weight > weights.get(arc) {
            self.uncolor(graph, weights, arc);
            if let Some(a) = tail_arc {
                self.color(graph, weights, a, arc_color);
            }
            if let Some(a) = head_arc {
                self.color(graph, weights, a, arc_color);
            }
            return true;
        }
        false
    }

    /// Keeps the total weight consistent when the weight of a colored arc
    /// changes. Must run before any algorithmic reaction to the change.
    pub fn on_weight_change(&mut self, arc: ArcId, old: EdgeWeight, new: EdgeWeight) {
        if self.is_colored(arc) {
            self.total_weight = self.total_weight - old + new;
        }
    }

    /// Exhaustively verifies properness, mate consistency and the total
    /// weight. Intended for sanity-check mode after each run.
    pub fn sanity_check(&self, graph: &DiGraph, weights: &WeightMap) -> Result<()> {
        // Properness: each color at most once per vertex.
        for vertex in graph.vertices() {
            let mut unused = ColorSet::full(self.num_colors);
            for arc in graph.incident_arcs(vertex) {
                if self.is_colored(arc) {
                    let color = self.get_color(arc);
                    if !unused.contains(color) {
                        return Err(DjMatchError::validation(format!(
                            "color {color} used at least twice on vertex {vertex}"
                        )));
                    }
                    unused.set_off(color);
                }
            }
        }

        // Mate consistency.
        for arc in graph.arcs() {
            if self.is_colored(arc) {
                let color = self.get_color(arc);
                let (tail, head) = graph.endpoints(arc);
                if self.mate(color, tail) != Some(head) || self.mate(color, head) != Some(tail) {
                    return Err(DjMatchError::validation(format!(
                        "mate entries of arc {arc} are inconsistent"
                    )));
                }
            }
        }

        // Weight consistency.
        let check_weight: EdgeWeight = graph
            .arcs()
            .filter(|&arc| self.is_colored(arc))
            .map(|arc| weights.get(arc))
            .sum();
        if check_weight != self.total_weight {
            return Err(DjMatchError::validation(format!(
                "solution weight is {}, but the true weight is {}",
                self.total_weight, check_weight
            )));
        }

        Ok(())
    }
}

impl<E: ColoringExt + HasFreeColors> KColoring<E> {
    pub fn any_color_free(&self, v: VertexId) -> bool {
        self.ext.free_colors().any_color_free(v)
    }

    pub fn no_color_free(&self, v: VertexId) -> bool {
        self.ext.free_colors().no_color_free(v)
    }

    pub fn get_any_free_color(&self, v: VertexId) -> Option<Color> {
        self.ext.free_colors().get_any_free_color(v)
    }

    pub fn common_free_color(&self, v1: VertexId, v2: VertexId) -> Option<Color> {
        self.ext.free_colors().common_free_color(v1, v2)
    }
}

impl<E: ColoringExt + HasArcMates> KColoring<E> {
    pub fn get_arc_to_mate(&self, color: Color, v: VertexId) -> Option<ArcId> {
        self.ext.arc_mates().get_arc_to_mate(color, v)
    }

    pub fn get_colored_arcs(&self, v: VertexId) -> Vec<ArcId> {
        self.ext.arc_mates().get_colored_arcs(v)
    }

    pub fn get_lightest_colored_edge(&self, weights: &WeightMap, v: VertexId) -> Option<ArcId> {
        self.ext.arc_mates().get_lightest_colored_edge(weights, v)
    }

    pub fn lightest_adjacent_colored_arcs(
        &self,
        graph: &DiGraph,
        weights: &WeightMap,
        arc: ArcId,
    ) -> (AdjacentArcPair, Color) {
        self.ext
            .arc_mates()
            .lightest_adjacent_colored_arcs(graph, weights, arc)
    }
}
