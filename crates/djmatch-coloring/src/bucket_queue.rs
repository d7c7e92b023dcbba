//! A log-bucketed approximate priority queue.
//!
//! Items are routed to the bucket given by the leading-zero count of their
//! priority, so items within a factor of two share a bucket and come out in
//! arbitrary relative order. A word-sized occupancy mask locates the
//! highest-priority nonempty bucket with one count-trailing-zeros. All
//! operations are amortized O(1). Acceptable wherever restoring maximality
//! is the only correctness goal.

use djmatch_core::{EdgeWeight, FastPropertyMap, GraphId};

const NUM_BUCKETS: usize = EdgeWeight::BITS as usize;

/// Priority queue over ids with power-of-two priority resolution.
#[derive(Debug)]
pub struct ApproximateBucketQueue<K: GraphId> {
    buckets: Vec<Vec<K>>,
    indices: FastPropertyMap<K, (u32, u32)>,
    filled_mask: u64,
}

impl<K: GraphId> Default for ApproximateBucketQueue<K> {
    fn default() -> Self {
        Self {
            buckets: vec![Vec::new(); NUM_BUCKETS],
            indices: FastPropertyMap::new((0, 0)),
            filled_mask: 0,
        }
    }
}

impl<K: GraphId> ApproximateBucketQueue<K> {
    fn bucket_from_priority(priority: EdgeWeight) -> u32 {
        debug_assert!(priority != 0);
        priority.leading_zeros()
    }

    pub fn push(&mut self, id: K, priority: EdgeWeight) {
        assert!(priority != 0);
        let bucket = Self::bucket_from_priority(priority);
        let position = self.buckets[bucket as usize].len() as u32;
        self.indices.set(id, (bucket, position));
        self.buckets[bucket as usize].push(id);
        self.filled_mask |= 1u64 << bucket;
    }

    pub fn erase(&mut self, id: K) {
        let (bucket, position) = *self.indices.get(id);
        let bucket_vec = &mut self.buckets[bucket as usize];
        let last = bucket_vec.len() - 1;
        let swapped = bucket_vec[last];
        self.indices.set(swapped, (bucket, position));
        bucket_vec.swap(position as usize, last);
        bucket_vec.pop();
        if bucket_vec.is_empty() {
            self.filled_mask &= !(1u64 << bucket);
        }
    }

    pub fn update(&mut self, id: K, priority: EdgeWeight) {
        self.erase(id);
        self.push(id, priority);
    }

    pub fn is_empty(&self) -> bool {
        self.filled_mask == 0
    }

    /// Removes and returns an element from the highest-priority nonempty
    /// bucket. May be lighter than the true maximum by a factor of two.
    pub fn pop_max(&mut self) -> Option<K> {
        if self.is_empty() {
            return None;
        }
        let bucket = self.filled_mask.trailing_zeros();
        let top = *self.buckets[bucket as usize].last().unwrap();
        self.erase(top);
        Some(top)
    }

    pub fn clear(&mut self) {
        for bucket in &mut self.buckets {
            bucket.clear();
        }
        self.indices.reset_all();
        self.filled_mask = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use djmatch_core::ArcId;

    #[test]
    fn test_distinct_magnitudes_pop_in_order() {
        // 17 lives in a higher bucket than 8 and 9.
        let mut queue: ApproximateBucketQueue<ArcId> = ApproximateBucketQueue::default();
        queue.push(ArcId(0), 17);
        queue.push(ArcId(1), 8);
        queue.push(ArcId(2), 9);

        assert_eq!(queue.pop_max(), Some(ArcId(0)));
        let second = queue.pop_max().unwrap();
        let third = queue.pop_max().unwrap();
        // 8 and 9 share a bucket; either order is fine.
        assert_eq!(
            {
                let mut pair = [second.0, third.0];
                pair.sort_unstable();
                pair
            },
            [1, 2]
        );
        assert!(queue.is_empty());
    }

    #[test]
    fn test_pop_priorities_weakly_decreasing_up_to_factor_two() {
        let priorities: Vec<EdgeWeight> = vec![3, 1000, 7, 64, 65, 2, 900, 33];
        let mut queue: ApproximateBucketQueue<ArcId> = ApproximateBucketQueue::default();
        for (i, &p) in priorities.iter().enumerate() {
            queue.push(ArcId(i as u32), p);
        }
        let mut popped = Vec::new();
        while let Some(id) = queue.pop_max() {
            popped.push(priorities[id.0 as usize]);
        }
        assert_eq!(popped.len(), priorities.len());
        for window in popped.windows(2) {
            assert!(window[0] >= window[1] / 2, "violated by {window:?}");
        }
    }

    #[test]
    fn test_erase_and_update() {
        let mut queue: ApproximateBucketQueue<ArcId> = ApproximateBucketQueue::default();
        queue.push(ArcId(0), 4);
        queue.push(ArcId(1), 5);
        queue.push(ArcId(2), 6);
        queue.erase(ArcId(1));
        queue.update(ArcId(0), 1024);

        assert_eq!(queue.pop_max(), Some(ArcId(0)));
        assert_eq!(queue.pop_max(), Some(ArcId(2)));
        assert_eq!(queue.pop_max(), None);
    }

    #[test]
    fn test_clear() {
        let mut queue: ApproximateBucketQueue<ArcId> = ApproximateBucketQueue::default();
        queue.push(ArcId(0), 3);
        queue.clear();
        assert!(queue.is_empty());
        assert_eq!(queue.pop_max(), None);
        queue.push(ArcId(0), 3);
        assert_eq!(queue.pop_max(), Some(ArcId(0)));
    }
}
