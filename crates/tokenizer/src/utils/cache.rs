//! Segmentation cache for repeated words.
//!
//! Subword models segment the same frequent words over and over; caching
//! their pieces avoids redoing the merge loop. The cache is shared between
//! threads and evicts the least recently used word first.

use lru::LruCache;
use parking_lot::Mutex;
use std::fmt;
use std::num::NonZeroUsize;

/// Default number of cached words.
pub const DEFAULT_CAPACITY: usize = 10_000;

/// Bounded word → pieces cache.
pub struct SegmentCache {
    entries: Option<Mutex<LruCache<String, Vec<String>>>>,
}

impl SegmentCache {
    /// Create a cache holding at most `capacity` words. A zero capacity
    /// disables caching.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: NonZeroUsize::new(capacity).map(|cap| Mutex::new(LruCache::new(cap))),
        }
    }

    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Get the cached pieces of `word` or compute them.
    pub fn get_or_insert_with<F>(&self, word: &str, segment: F) -> Vec<String>
    where
        F: FnOnce(&str) -> Vec<String>,
    {
        let Some(entries) = &self.entries else {
            return segment(word);
        };
        if let Some(pieces) = entries.lock().get(word) {
            return pieces.clone();
        }

        // Segment outside the lock.
        let pieces = segment(word);
        entries.lock().put(word.to_string(), pieces.clone());
        pieces
    }

    /// Drop every entry.
    pub fn clear(&self) {
        if let Some(entries) = &self.entries {
            entries.lock().clear();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.as_ref().map_or(0, |entries| entries.lock().len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.entries
            .as_ref()
            .map_or(0, |entries| entries.lock().cap().get())
    }
}

impl Default for SegmentCache {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for SegmentCache {
    /// Clones start empty.
    fn clone(&self) -> Self {
        Self::with_capacity(self.capacity())
    }
}

impl fmt::Debug for SegmentCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SegmentCache")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pieces(word: &str) -> Vec<String> {
        word.chars().map(String::from).collect()
    }

    #[test]
    fn test_hit_and_miss() {
        let cache = SegmentCache::with_capacity(3);
        assert_eq!(cache.get_or_insert_with("ab", pieces), vec!["a", "b"]);
        let hit = cache.get_or_insert_with("ab", |_| panic!("should be cached"));
        assert_eq!(hit, vec!["a", "b"]);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_evicts_least_recently_used() {
        let cache = SegmentCache::with_capacity(2);
        cache.get_or_insert_with("a", pieces);
        cache.get_or_insert_with("b", pieces);
        // touch "a" so that "b" is the oldest
        cache.get_or_insert_with("a", |_| panic!("should be cached"));
        cache.get_or_insert_with("c", pieces);
        assert_eq!(cache.len(), 2);

        cache.get_or_insert_with("a", |_| panic!("should be cached"));
        let mut recomputed = false;
        cache.get_or_insert_with("b", |w| {
            recomputed = true;
            pieces(w)
        });
        assert!(recomputed);
    }

    #[test]
    fn test_zero_capacity_disables() {
        let cache = SegmentCache::with_capacity(0);
        cache.get_or_insert_with("a", pieces);
        assert!(cache.is_empty());
        assert_eq!(cache.capacity(), 0);
    }

    #[test]
    fn test_clear() {
        let cache = SegmentCache::with_capacity(4);
        cache.get_or_insert_with("a", pieces);
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_clone_starts_empty() {
        let cache = SegmentCache::with_capacity(4);
        cache.get_or_insert_with("a", pieces);
        let copy = cache.clone();
        assert!(copy.is_empty());
        assert_eq!(copy.capacity(), 4);
    }

    #[test]
    fn test_shared_between_threads() {
        let cache = std::sync::Arc::new(SegmentCache::with_capacity(16));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let cache = cache.clone();
                std::thread::spawn(move || cache.get_or_insert_with("abc", pieces))
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), vec!["a", "b", "c"]);
        }
        assert_eq!(cache.len(), 1);
    }
}
