//! Round-versioned markers and sets over graph entities.
//!
//! Between deltas these structures must be cleared in O(1) without touching
//! per-entity memory: a monotonically increasing round counter plays the
//! role of the clear, and an entity is a member iff its recorded round
//! equals the current one.

use djmatch_core::{FastPropertyMap, GraphId};

/// Marks entities per round. `next_round` logically unmarks everything.
#[derive(Debug)]
pub struct ArtifactMarker<K: GraphId> {
    marked_in_round: FastPropertyMap<K, u64>,
    round: u64,
}

impl<K: GraphId> Default for ArtifactMarker<K> {
    fn default() -> Self {
        Self {
            marked_in_round: FastPropertyMap::new(0),
            round: 1,
        }
    }
}

impl<K: GraphId> ArtifactMarker<K> {
    pub fn mark(&mut self, key: K) {
        self.marked_in_round.set(key, self.round);
    }

    pub fn unmark(&mut self, key: K) {
        self.marked_in_round.set(key, 0);
    }

    pub fn is_marked(&self, key: K) -> bool {
        *self.marked_in_round.get(key) == self.round
    }

    pub fn next_round(&mut self) {
        self.round += 1;
    }

    pub fn reset(&mut self) {
        self.marked_in_round.reset_all();
        self.round = 1;
    }
}

/// A deduplicated set of entities, cleared per round.
///
/// Insertion and membership are O(1) via an [`ArtifactMarker`]; iteration
/// runs over a backing vector. Removing individual elements is not
/// supported. The backing vector is exposed mutably for callers that sort
/// or truncate the pending elements in place; membership bookkeeping is
/// unaffected as long as no elements are added through it.
#[derive(Debug)]
pub struct TimedArtifactSet<K: GraphId> {
    marker: ArtifactMarker<K>,
    elements: Vec<K>,
}

impl<K: GraphId> Default for TimedArtifactSet<K> {
    fn default() -> Self {
        Self {
            marker: ArtifactMarker::default(),
            elements: Vec::new(),
        }
    }
}

impl<K: GraphId> TimedArtifactSet<K> {
    /// Adds `key` unless it is already a member this round.
    pub fn add(&mut self, key: K) {
        if !self.marker.is_marked(key) {
            self.marker.mark(key);
            self.elements.push(key);
        }
    }

    pub fn contains(&self, key: K) -> bool {
        self.marker.is_marked(key)
    }

    pub fn as_slice(&self) -> &[K] {
        &self.elements
    }

    pub fn vector_mut(&mut self) -> &mut Vec<K> {
        &mut self.elements
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Clears the set for the next round.
    pub fn next_round(&mut self) {
        self.elements.clear();
        self.marker.next_round();
    }

    /// Clears the set and the underlying markers.
    pub fn reset(&mut self) {
        self.elements.clear();
        self.marker.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use djmatch_core::ArcId;

    #[test]
    fn test_marker_rounds() {
        let mut marker: ArtifactMarker<ArcId> = ArtifactMarker::default();
        marker.mark(ArcId(3));
        assert!(marker.is_marked(ArcId(3)));
        assert!(!marker.is_marked(ArcId(4)));
        marker.next_round();
        assert!(!marker.is_marked(ArcId(3)));
        marker.mark(ArcId(3));
        assert!(marker.is_marked(ArcId(3)));
    }

    #[test]
    fn test_timed_set_deduplicates() {
        let mut set: TimedArtifactSet<ArcId> = TimedArtifactSet::default();
        set.add(ArcId(1));
        set.add(ArcId(2));
        set.add(ArcId(1));
        assert_eq!(set.as_slice(), &[ArcId(1), ArcId(2)]);
        assert!(set.contains(ArcId(1)));
    }

    #[test]
    fn test_timed_set_next_round_clears() {
        let mut set: TimedArtifactSet<ArcId> = TimedArtifactSet::default();
        set.add(ArcId(1));
        set.next_round();
        assert!(set.is_empty());
        assert!(!set.contains(ArcId(1)));
        set.add(ArcId(1));
        assert_eq!(set.len(), 1);
    }
}
