//! Priority queue for BPE merge candidates.
//!
//! Training repeatedly needs the most frequent symbol pair. Counts change
//! after every merge, so instead of re-heapifying, updated counts are pushed
//! as new entries and outdated ones are skipped when popped.

use ahash::AHashMap;
use dary_heap::OctonaryHeap;
use std::cmp::Ordering;

/// A pair of symbol IDs that can be merged.
pub type SymbolPair = (u32, u32);

/// A merge candidate during BPE training.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeCandidate {
    /// The pair of symbol IDs to merge
    pub pair: SymbolPair,
    /// The frequency of this pair
    pub count: u64,
    /// Order in which the pair was first seen; lower wins ties
    pub ordinal: u64,
}

impl MergeCandidate {
    /// Create a new merge candidate.
    pub fn new(pair: SymbolPair, count: u64, ordinal: u64) -> Self {
        Self {
            pair,
            count,
            ordinal,
        }
    }
}

// Higher count first, then the pair seen first.
impl Ord for MergeCandidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.count
            .cmp(&other.count)
            .then_with(|| other.ordinal.cmp(&self.ordinal))
    }
}

impl PartialOrd for MergeCandidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Priority queue for BPE merge candidates.
///
/// Uses an 8-ary heap for better cache locality than a binary heap.
pub struct PairPriorityQueue {
    /// The heap storing merge candidates
    heap: OctonaryHeap<MergeCandidate>,
    /// Live (count, ordinal) of each pair, used to detect stale entries
    current: AHashMap<SymbolPair, (u64, u64)>,
}

impl PairPriorityQueue {
    /// Create a new priority queue with the given capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            heap: OctonaryHeap::with_capacity(capacity),
            current: AHashMap::with_capacity(capacity),
        }
    }

    /// Create a new empty priority queue.
    pub fn new() -> Self {
        Self {
            heap: OctonaryHeap::new(),
            current: AHashMap::new(),
        }
    }

    /// Push a merge candidate onto the queue.
    pub fn push(&mut self, candidate: MergeCandidate) {
        self.current
            .insert(candidate.pair, (candidate.count, candidate.ordinal));
        self.heap.push(candidate);
    }

    /// Pop the highest priority merge candidate.
    ///
    /// Returns None if the queue is empty or only contains stale entries.
    pub fn pop(&mut self) -> Option<MergeCandidate> {
        while let Some(candidate) = self.heap.pop() {
            if let Some(&(count, _)) = self.current.get(&candidate.pair) {
                if count == candidate.count {
                    self.current.remove(&candidate.pair);
                    return Some(candidate);
                }
            }
        }
        None
    }

    /// Set a new count for a pair, keeping its ordinal.
    ///
    /// A count of zero removes the pair. Pairs the queue has never seen are
    /// ignored; use [`PairPriorityQueue::push`] for those.
    pub fn update(&mut self, pair: SymbolPair, new_count: u64) {
        let Some(&(count, ordinal)) = self.current.get(&pair) else {
            return;
        };
        if new_count == 0 {
            self.current.remove(&pair);
        } else if new_count != count {
            self.push(MergeCandidate::new(pair, new_count, ordinal));
        }
    }

    /// Get the current count for a pair.
    pub fn get_count(&self, pair: SymbolPair) -> Option<u64> {
        self.current.get(&pair).map(|&(count, _)| count)
    }
}

impl Default for PairPriorityQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_pop() {
        let mut queue = PairPriorityQueue::new();

        queue.push(MergeCandidate::new((0, 1), 10, 0));
        queue.push(MergeCandidate::new((1, 2), 20, 1));
        queue.push(MergeCandidate::new((2, 3), 15, 2));

        assert_eq!(queue.pop().unwrap().pair, (1, 2));
        assert_eq!(queue.pop().unwrap().pair, (2, 3));
        assert_eq!(queue.pop().unwrap().pair, (0, 1));
        assert!(queue.pop().is_none());
    }

    #[test]
    fn test_ties_prefer_first_seen() {
        let mut queue = PairPriorityQueue::new();

        queue.push(MergeCandidate::new((5, 6), 3, 2));
        queue.push(MergeCandidate::new((0, 1), 3, 7));
        queue.push(MergeCandidate::new((9, 9), 3, 0));

        assert_eq!(queue.pop().unwrap().ordinal, 0);
        assert_eq!(queue.pop().unwrap().ordinal, 2);
        assert_eq!(queue.pop().unwrap().ordinal, 7);
    }

    #[test]
    fn test_stale_entry_detection() {
        let mut queue = PairPriorityQueue::new();

        queue.push(MergeCandidate::new((0, 1), 10, 0));
        queue.push(MergeCandidate::new((1, 2), 20, 1));

        // Lower the count of (1, 2) below (0, 1)
        queue.update((1, 2), 5);

        let first = queue.pop().unwrap();
        assert_eq!(first.pair, (0, 1));

        let second = queue.pop().unwrap();
        assert_eq!(second.pair, (1, 2));
        assert_eq!(second.count, 5);
        assert_eq!(second.ordinal, 1);

        assert!(queue.pop().is_none());
    }

    #[test]
    fn test_update_to_zero_removes() {
        let mut queue = PairPriorityQueue::new();
        queue.push(MergeCandidate::new((0, 1), 4, 0));
        queue.update((0, 1), 0);
        assert_eq!(queue.get_count((0, 1)), None);
        assert!(queue.pop().is_none());
    }

    #[test]
    fn test_update_unknown_pair_is_ignored() {
        let mut queue = PairPriorityQueue::new();
        queue.update((3, 4), 9);
        assert_eq!(queue.get_count((3, 4)), None);
        assert!(queue.pop().is_none());
    }
}
