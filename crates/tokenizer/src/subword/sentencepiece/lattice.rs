//! k-best segmentation of a unigram model.
//!
//! `best[e]` keeps the k highest-scoring segmentations of the first `e`
//! characters as back-pointers into `best[s]`, which is enough to recover
//! the k best complete paths exactly.

/// One scored segmentation, as character spans.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Path {
    pub spans: Vec<(usize, usize)>,
    pub score: f32,
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    score: f32,
    start: usize,
    rank: usize,
}

/// Up to `k` best segmentations of `chars` characters, best first.
///
/// `score(start, end)` scores the piece covering characters
/// `start..end`, or returns `None` when no such piece exists. Single
/// characters must always score.
pub(crate) fn nbest<F>(chars: usize, max_piece: usize, k: usize, score: F) -> Vec<Path>
where
    F: Fn(usize, usize) -> Option<f32>,
{
    if chars == 0 || k == 0 {
        return Vec::new();
    }
    let mut best: Vec<Vec<Entry>> = Vec::with_capacity(chars + 1);
    best.push(vec![Entry {
        score: 0.0,
        start: 0,
        rank: 0,
    }]);

    for end in 1..=chars {
        let mut candidates = Vec::new();
        for start in end.saturating_sub(max_piece.max(1))..end {
            let Some(piece_score) = score(start, end) else {
                continue;
            };
            for (rank, prev) in best[start].iter().enumerate() {
                candidates.push(Entry {
                    score: prev.score + piece_score,
                    start,
                    rank,
                });
            }
        }
        // Stable: on ties the longer piece (smaller start) wins
        candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
        candidates.truncate(k);
        best.push(candidates);
    }

    (0..best[chars].len())
        .map(|first_rank| {
            let score = best[chars][first_rank].score;
            let mut spans = Vec::new();
            let (mut end, mut rank) = (chars, first_rank);
            while end > 0 {
                let entry = best[end][rank];
                spans.push((entry.start, end));
                end = entry.start;
                rank = entry.rank;
            }
            spans.reverse();
            Path { spans, score }
        })
        .collect()
}
