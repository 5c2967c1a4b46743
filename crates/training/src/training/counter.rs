//! Pair counting for BPE training.
//!
//! The counter keeps pair frequencies up to date incrementally: an index from
//! each pair to the words containing it means a merge only revisits the
//! words it touches, not the whole corpus.

use ahash::{AHashMap, AHashSet};
use joinery_core::{MergeCandidate, SymbolPair};

/// Counter for BPE pair frequencies.
pub struct PairCounter {
    /// Word -> current symbol sequence
    words: Vec<Vec<u32>>,
    /// Word -> frequency count
    word_counts: Vec<u64>,
    /// Pair -> frequency count
    pair_counts: AHashMap<SymbolPair, u64>,
    /// Pair -> (word index -> occurrences in that word)
    index: AHashMap<SymbolPair, AHashMap<usize, u32>>,
    /// Pair -> first-seen ordinal, kept even when the count drops to zero
    ordinals: AHashMap<SymbolPair, u64>,
    next_ordinal: u64,
}

impl PairCounter {
    /// Count all pairs of the given words.
    ///
    /// Ordinals follow the word order, then the position inside each word.
    pub fn new(words: Vec<Vec<u32>>, word_counts: Vec<u64>) -> Self {
        use rayon::prelude::*;

        debug_assert_eq!(words.len(), word_counts.len());

        // Collecting an indexed parallel iterator keeps word order.
        let per_word: Vec<Vec<(SymbolPair, u32)>> =
            words.par_iter().map(|word| word_pairs(word)).collect();

        let mut counter = Self {
            words,
            word_counts,
            pair_counts: AHashMap::new(),
            index: AHashMap::new(),
            ordinals: AHashMap::new(),
            next_ordinal: 0,
        };
        for (word_idx, pairs) in per_word.into_iter().enumerate() {
            let freq = counter.word_counts[word_idx];
            for (pair, occurrences) in pairs {
                counter.add_occurrences(pair, word_idx, occurrences, freq);
            }
        }
        counter
    }

    /// Current frequency of a pair.
    #[inline]
    pub fn pair_count(&self, pair: SymbolPair) -> u64 {
        self.pair_counts.get(&pair).copied().unwrap_or(0)
    }

    /// First-seen ordinal of a pair.
    #[inline]
    pub fn ordinal(&self, pair: SymbolPair) -> Option<u64> {
        self.ordinals.get(&pair).copied()
    }

    /// Number of distinct pairs with a non-zero count.
    pub fn distinct_pairs(&self) -> usize {
        self.pair_counts.len()
    }

    /// Merge candidates for every live pair.
    pub fn candidates(&self) -> impl Iterator<Item = MergeCandidate> + '_ {
        self.pair_counts.iter().map(|(&pair, &count)| {
            let ordinal = self.ordinals.get(&pair).copied().unwrap_or(u64::MAX);
            MergeCandidate::new(pair, count, ordinal)
        })
    }

    /// Replace every occurrence of `pair` by `new_id`, left to right.
    ///
    /// Returns the pairs whose count may have changed, in the order they were
    /// touched.
    pub fn merge_pair(&mut self, pair: SymbolPair, new_id: u32) -> Vec<SymbolPair> {
        let Some(containing) = self.index.get(&pair) else {
            return Vec::new();
        };
        let mut affected: Vec<usize> = containing.keys().copied().collect();
        affected.sort_unstable();

        let mut changed = Vec::new();
        let mut seen = AHashSet::new();
        for word_idx in affected {
            let freq = self.word_counts[word_idx];
            let old = std::mem::take(&mut self.words[word_idx]);
            let new = merge_word(&old, pair, new_id);

            for (p, occurrences) in word_pairs(&old) {
                self.remove_occurrences(p, word_idx, occurrences, freq);
                if seen.insert(p) {
                    changed.push(p);
                }
            }
            for (p, occurrences) in word_pairs(&new) {
                self.add_occurrences(p, word_idx, occurrences, freq);
                if seen.insert(p) {
                    changed.push(p);
                }
            }
            self.words[word_idx] = new;
        }
        changed
    }

    fn add_occurrences(&mut self, pair: SymbolPair, word_idx: usize, occurrences: u32, freq: u64) {
        *self.pair_counts.entry(pair).or_insert(0) += occurrences as u64 * freq;
        *self
            .index
            .entry(pair)
            .or_default()
            .entry(word_idx)
            .or_insert(0) += occurrences;
        if !self.ordinals.contains_key(&pair) {
            self.ordinals.insert(pair, self.next_ordinal);
            self.next_ordinal += 1;
        }
    }

    fn remove_occurrences(&mut self, pair: SymbolPair, word_idx: usize, occurrences: u32, freq: u64) {
        if let Some(count) = self.pair_counts.get_mut(&pair) {
            *count = count.saturating_sub(occurrences as u64 * freq);
            if *count == 0 {
                self.pair_counts.remove(&pair);
            }
        }
        if let Some(containing) = self.index.get_mut(&pair) {
            if let Some(n) = containing.get_mut(&word_idx) {
                *n = n.saturating_sub(occurrences);
                if *n == 0 {
                    containing.remove(&word_idx);
                }
            }
            if containing.is_empty() {
                self.index.remove(&pair);
            }
        }
    }
}

/// Distinct adjacent pairs of a word with their occurrence counts, in order
/// of first position.
fn word_pairs(word: &[u32]) -> Vec<(SymbolPair, u32)> {
    let mut pairs: Vec<(SymbolPair, u32)> = Vec::with_capacity(word.len().saturating_sub(1));
    let mut slots: AHashMap<SymbolPair, usize> = AHashMap::new();
    for window in word.windows(2) {
        let pair = (window[0], window[1]);
        match slots.get(&pair) {
            Some(&slot) => pairs[slot].1 += 1,
            None => {
                slots.insert(pair, pairs.len());
                pairs.push((pair, 1));
            }
        }
    }
    pairs
}

fn merge_word(word: &[u32], pair: SymbolPair, new_id: u32) -> Vec<u32> {
    let mut merged = Vec::with_capacity(word.len());
    let mut i = 0;
    while i < word.len() {
        if i + 1 < word.len() && word[i] == pair.0 && word[i + 1] == pair.1 {
            merged.push(new_id);
            i += 2;
        } else {
            merged.push(word[i]);
            i += 1;
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_counts_weight_by_frequency() {
        // ab x3, bc x1
        let counter = PairCounter::new(vec![vec![0, 1], vec![1, 2]], vec![3, 1]);
        assert_eq!(counter.pair_count((0, 1)), 3);
        assert_eq!(counter.pair_count((1, 2)), 1);
        assert_eq!(counter.pair_count((2, 3)), 0);
        assert_eq!(counter.distinct_pairs(), 2);
    }

    #[test]
    fn test_ordinals_follow_first_occurrence() {
        let counter = PairCounter::new(vec![vec![5, 6, 7], vec![1, 2, 5, 6]], vec![1, 1]);
        assert_eq!(counter.ordinal((5, 6)), Some(0));
        assert_eq!(counter.ordinal((6, 7)), Some(1));
        assert_eq!(counter.ordinal((1, 2)), Some(2));
        assert_eq!(counter.ordinal((2, 5)), Some(3));
    }

    #[test]
    fn test_repeated_pair_in_word() {
        // a a a a
        let counter = PairCounter::new(vec![vec![0, 0, 0, 0]], vec![2]);
        assert_eq!(counter.pair_count((0, 0)), 6);
    }

    #[test]
    fn test_merge_pair_updates_counts() {
        // "abc" x2, "abd" x1
        let mut counter = PairCounter::new(vec![vec![0, 1, 2], vec![0, 1, 3]], vec![2, 1]);
        let changed = counter.merge_pair((0, 1), 9);

        assert_eq!(counter.words[0], vec![9, 2]);
        assert_eq!(counter.words[1], vec![9, 3]);
        assert_eq!(counter.pair_count((0, 1)), 0);
        assert_eq!(counter.pair_count((1, 2)), 0);
        assert_eq!(counter.pair_count((9, 2)), 2);
        assert_eq!(counter.pair_count((9, 3)), 1);
        assert!(changed.contains(&(9, 2)));
        assert!(changed.contains(&(1, 3)));
    }

    #[test]
    fn test_new_pairs_get_ordinals_in_creation_order() {
        let mut counter = PairCounter::new(vec![vec![0, 1, 2], vec![0, 1, 3]], vec![1, 1]);
        // Existing ordinals: (0,1)=0, (1,2)=1, (1,3)=2
        counter.merge_pair((0, 1), 9);
        assert_eq!(counter.ordinal((9, 2)), Some(3));
        assert_eq!(counter.ordinal((9, 3)), Some(4));
        // Vanished pairs keep their ordinal
        assert_eq!(counter.ordinal((0, 1)), Some(0));
    }

    #[test]
    fn test_merge_overlapping_pair() {
        // a a a -> aa a
        let mut counter = PairCounter::new(vec![vec![0, 0, 0]], vec![1]);
        counter.merge_pair((0, 0), 4);
        assert_eq!(counter.words[0], vec![4, 0]);
        assert_eq!(counter.pair_count((0, 0)), 0);
        assert_eq!(counter.pair_count((4, 0)), 1);
    }

    #[test]
    fn test_merge_unknown_pair_is_noop() {
        let mut counter = PairCounter::new(vec![vec![0, 1]], vec![1]);
        assert!(counter.merge_pair((7, 8), 9).is_empty());
        assert_eq!(counter.words[0], vec![0, 1]);
    }

    #[test]
    fn test_candidates_cover_live_pairs() {
        let counter = PairCounter::new(vec![vec![0, 1, 2]], vec![4]);
        let mut candidates: Vec<_> = counter.candidates().collect();
        candidates.sort_by_key(|c| c.ordinal);
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].pair, (0, 1));
        assert_eq!(candidates[0].count, 4);
    }
}
