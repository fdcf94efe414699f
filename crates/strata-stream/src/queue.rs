//! Closest-first work queues with retry backoff.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use rustc_hash::{FxHashMap, FxHashSet};
use strata_coords::ChunkCoord;

/// Squared chunk-grid distance, used as queue priority.
pub fn chunk_distance_sq(a: ChunkCoord, b: ChunkCoord) -> u64 {
    let dx = a.x.abs_diff(b.x) as u64;
    let dz = a.z.abs_diff(b.z) as u64;
    (dx * dx).saturating_add(dz * dz)
}

/// Min-heap of chunk coords keyed by priority, with a membership set so a
/// coord is queued at most once.
///
/// Removal is lazy: [`ChunkQueue::remove`] drops the membership entry and
/// [`ChunkQueue::pop`] skips heap entries that are no longer members.
#[derive(Debug, Default)]
pub struct ChunkQueue {
    heap: BinaryHeap<Reverse<(u64, ChunkCoord)>>,
    members: FxHashSet<ChunkCoord>,
}

impl ChunkQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `coord`. Returns `false` if it was already queued.
    pub fn push(&mut self, coord: ChunkCoord, priority: u64) -> bool {
        if !self.members.insert(coord) {
            return false;
        }
        self.heap.push(Reverse((priority, coord)));
        true
    }

    /// Removes and returns the lowest-priority coord.
    pub fn pop(&mut self) -> Option<ChunkCoord> {
        while let Some(Reverse((_, coord))) = self.heap.pop() {
            if self.members.remove(&coord) {
                return Some(coord);
            }
        }
        None
    }

    pub fn remove(&mut self, coord: &ChunkCoord) -> bool {
        let removed = self.members.remove(coord);
        if self.members.is_empty() {
            self.heap.clear();
        }
        removed
    }

    /// Keeps only the coords for which `keep` returns `true`.
    pub fn retain(&mut self, mut keep: impl FnMut(ChunkCoord) -> bool) {
        self.members.retain(|&coord| keep(coord));
        let members = &self.members;
        self.heap.retain(|Reverse((_, coord))| members.contains(coord));
    }

    pub fn contains(&self, coord: &ChunkCoord) -> bool {
        self.members.contains(coord)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn clear(&mut self) {
        self.heap.clear();
        self.members.clear();
    }
}

/// Consecutive upload failures after which a chunk is evicted.
pub const MAX_UPLOAD_FAILURES: u32 = 5;

/// Upper bound on the retry delay.
pub const MAX_BACKOFF_FRAMES: u64 = 64;

/// Frames to wait after the `failures`-th consecutive failure: `2^failures`,
/// capped at [`MAX_BACKOFF_FRAMES`].
pub fn backoff_frames(failures: u32) -> u64 {
    if failures >= MAX_BACKOFF_FRAMES.trailing_zeros() {
        MAX_BACKOFF_FRAMES
    } else {
        1 << failures
    }
}

/// Coords waiting out an upload backoff, keyed by the frame they become
/// eligible again.
#[derive(Debug, Default)]
pub struct RetrySchedule {
    waiting: FxHashMap<ChunkCoord, u64>,
}

impl RetrySchedule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, coord: ChunkCoord, ready_frame: u64) {
        self.waiting.insert(coord, ready_frame);
    }

    /// Removes and returns every coord eligible at `frame`, sorted.
    pub fn take_ready(&mut self, frame: u64) -> Vec<ChunkCoord> {
        let mut ready: Vec<ChunkCoord> = self
            .waiting
            .iter()
            .filter(|&(_, &at)| at <= frame)
            .map(|(&coord, _)| coord)
            .collect();
        ready.sort_unstable();
        for coord in &ready {
            self.waiting.remove(coord);
        }
        ready
    }

    pub fn ready_frame(&self, coord: &ChunkCoord) -> Option<u64> {
        self.waiting.get(coord).copied()
    }

    pub fn remove(&mut self, coord: &ChunkCoord) -> bool {
        self.waiting.remove(coord).is_some()
    }

    pub fn contains(&self, coord: &ChunkCoord) -> bool {
        self.waiting.contains_key(coord)
    }

    pub fn len(&self) -> usize {
        self.waiting.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waiting.is_empty()
    }

    pub fn clear(&mut self) {
        self.waiting.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pops_closest_first() {
        let mut queue = ChunkQueue::new();
        queue.push(ChunkCoord::new(5, 0), 25);
        queue.push(ChunkCoord::new(0, 0), 0);
        queue.push(ChunkCoord::new(1, 1), 2);

        assert_eq!(queue.pop(), Some(ChunkCoord::new(0, 0)));
        assert_eq!(queue.pop(), Some(ChunkCoord::new(1, 1)));
        assert_eq!(queue.pop(), Some(ChunkCoord::new(5, 0)));
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn test_duplicates_are_ignored() {
        let mut queue = ChunkQueue::new();
        assert!(queue.push(ChunkCoord::new(1, 2), 5));
        assert!(!queue.push(ChunkCoord::new(1, 2), 1));
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.pop(), Some(ChunkCoord::new(1, 2)));
        assert!(queue.is_empty());
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn test_lazy_removal() {
        let mut queue = ChunkQueue::new();
        queue.push(ChunkCoord::new(0, 0), 0);
        queue.push(ChunkCoord::new(3, 0), 9);
        assert!(queue.remove(&ChunkCoord::new(0, 0)));
        assert!(!queue.contains(&ChunkCoord::new(0, 0)));
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.pop(), Some(ChunkCoord::new(3, 0)));

        // Re-queued after removal, delivered exactly once.
        queue.push(ChunkCoord::new(1, 0), 1);
        queue.remove(&ChunkCoord::new(1, 0));
        queue.push(ChunkCoord::new(1, 0), 1);
        assert_eq!(queue.pop(), Some(ChunkCoord::new(1, 0)));
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn test_retain_drops_far_coords() {
        let mut queue = ChunkQueue::new();
        for x in 0..6 {
            queue.push(ChunkCoord::new(x, 0), x as u64);
        }
        queue.retain(|coord| coord.x % 2 == 0);
        assert_eq!(queue.len(), 3);
        assert_eq!(queue.pop(), Some(ChunkCoord::new(0, 0)));
        assert_eq!(queue.pop(), Some(ChunkCoord::new(2, 0)));
        assert_eq!(queue.pop(), Some(ChunkCoord::new(4, 0)));
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn test_distance_sq() {
        assert_eq!(chunk_distance_sq(ChunkCoord::new(-1, 2), ChunkCoord::new(2, -2)), 25);
        assert_eq!(chunk_distance_sq(ChunkCoord::new(4, 4), ChunkCoord::new(4, 4)), 0);
        let (lo, hi) = (ChunkCoord::new(i32::MIN, i32::MIN), ChunkCoord::new(i32::MAX, i32::MAX));
        assert_eq!(chunk_distance_sq(lo, hi), u64::MAX);
    }

    #[test]
    fn test_backoff_doubles_then_caps() {
        let delays: Vec<u64> = (1..=8).map(backoff_frames).collect();
        assert_eq!(delays, vec![2, 4, 8, 16, 32, 64, 64, 64]);
        assert_eq!(backoff_frames(u32::MAX), 64);
    }

    #[test]
    fn test_retry_schedule_releases_in_order() {
        let mut retry = RetrySchedule::new();
        retry.schedule(ChunkCoord::new(2, 0), 10);
        retry.schedule(ChunkCoord::new(1, 0), 8);
        retry.schedule(ChunkCoord::new(0, 0), 20);

        assert!(retry.take_ready(7).is_empty());
        assert_eq!(
            retry.take_ready(10),
            vec![ChunkCoord::new(1, 0), ChunkCoord::new(2, 0)]
        );
        assert_eq!(retry.len(), 1);
        assert_eq!(retry.ready_frame(&ChunkCoord::new(0, 0)), Some(20));
        assert!(retry.remove(&ChunkCoord::new(0, 0)));
        assert!(retry.is_empty());
    }
}
