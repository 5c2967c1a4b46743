//! BPE encoding with a learned merge table.
//!
//! A word starts as its characters, the last one carrying `</w>`. The
//! adjacent pair with the lowest merge rank is merged until no ranked pair
//! remains; equal ranks resolve left to right. Candidate pairs live in a
//! heap keyed by `(rank, position)` over a linked list of symbols, and
//! entries made stale by an earlier merge are skipped when popped.

use super::{split_token, SubwordEncoder};
use crate::io::read_model_text;
use crate::utils::SegmentCache;
use dary_heap::OctonaryHeap;
use joinery_core::markers::END_OF_WORD;
use joinery_core::{MergeTable, Result, Token, VocabularyFilter};
use std::cmp::Reverse;
use std::path::Path;

#[derive(Debug, Clone)]
struct Symbol {
    text: String,
    prev: Option<usize>,
    next: Option<usize>,
    alive: bool,
}

/// BPE subword encoder.
#[derive(Debug, Clone)]
pub struct Bpe {
    merges: MergeTable,
    joiner: String,
    vocabulary: Option<VocabularyFilter>,
    cache: SegmentCache,
}

impl Bpe {
    /// Create an encoder. `joiner` is used to look up non-final symbols in a
    /// vocabulary.
    pub fn new(merges: MergeTable, joiner: impl Into<String>) -> Self {
        Self {
            merges,
            joiner: joiner.into(),
            vocabulary: None,
            cache: SegmentCache::new(),
        }
    }

    /// Load a merge table file.
    pub fn load(path: &Path, joiner: impl Into<String>) -> Result<Self> {
        let text = read_model_text(path)?;
        let merges = MergeTable::parse(&text, path)?;
        let stats = merges.stats();
        tracing::info!(
            "Loaded {} BPE merges ({} word-final, longest symbol {} chars) from {}",
            stats.count,
            stats.final_merges,
            stats.longest,
            path.display()
        );
        Ok(Self::new(merges, joiner))
    }

    pub fn merges(&self) -> &MergeTable {
        &self.merges
    }

    /// Segment a word into subword strings, without `</w>`.
    pub fn segment(&self, word: &str) -> Vec<String> {
        let mut chars = word.chars();
        match (chars.next(), chars.next()) {
            (None, _) => return Vec::new(),
            (Some(_), None) => return vec![word.to_string()],
            _ => {}
        }
        self.cache.get_or_insert_with(word, |w| self.merge_word(w))
    }

    fn allows(&self, symbol: &str) -> bool {
        self.vocabulary
            .as_ref()
            .map_or(true, |vocab| vocab.allows_bpe_symbol(symbol, &self.joiner))
    }

    fn push_pair(&self, heap: &mut OctonaryHeap<Reverse<(u32, usize)>>, symbols: &[Symbol], left: usize) {
        let Some(right) = symbols[left].next else {
            return;
        };
        let (l, r) = (&symbols[left].text, &symbols[right].text);
        if let Some(rank) = self.merges.rank(l, r) {
            if self.vocabulary.is_none() || self.allows(&format!("{l}{r}")) {
                heap.push(Reverse((rank, left)));
            }
        }
    }

    fn merge_word(&self, word: &str) -> Vec<String> {
        let initial = self.merges.initial_symbols(word);
        let count = initial.len();
        let mut symbols: Vec<Symbol> = initial
            .into_iter()
            .enumerate()
            .map(|(idx, text)| Symbol {
                text,
                prev: idx.checked_sub(1),
                next: (idx + 1 < count).then_some(idx + 1),
                alive: true,
            })
            .collect();

        let mut heap = OctonaryHeap::with_capacity(count);
        for idx in 0..count {
            self.push_pair(&mut heap, &symbols, idx);
        }

        while let Some(Reverse((rank, left))) = heap.pop() {
            if !symbols[left].alive {
                continue;
            }
            let Some(right) = symbols[left].next else {
                continue;
            };
            // Stale entry: the pair changed since it was pushed
            if self.merges.rank(&symbols[left].text, &symbols[right].text) != Some(rank) {
                continue;
            }

            let right_text = std::mem::take(&mut symbols[right].text);
            symbols[left].text.push_str(&right_text);
            symbols[right].alive = false;
            let after = symbols[right].next;
            symbols[left].next = after;
            if let Some(after) = after {
                symbols[after].prev = Some(left);
            }

            if let Some(before) = symbols[left].prev {
                self.push_pair(&mut heap, &symbols, before);
            }
            self.push_pair(&mut heap, &symbols, left);
        }

        let mut pieces: Vec<String> = symbols
            .into_iter()
            .filter(|s| s.alive)
            .map(|s| s.text)
            .collect();
        if let Some(last) = pieces.last_mut() {
            if last == END_OF_WORD {
                pieces.pop();
            } else if let Some(stripped) = last.strip_suffix(END_OF_WORD) {
                *last = stripped.to_string();
            }
        }
        pieces
    }
}

impl SubwordEncoder for Bpe {
    fn name(&self) -> &'static str {
        "bpe"
    }

    fn encode(&self, token: &Token) -> Vec<Token> {
        let pieces = self.segment(&token.surface);
        if pieces.len() <= 1 {
            return vec![token.clone()];
        }
        split_token(token, pieces)
    }

    fn decode(&self, pieces: &[&str]) -> Option<String> {
        Some(pieces.concat())
    }

    fn set_vocabulary(&mut self, vocabulary: VocabularyFilter) {
        self.vocabulary = Some(vocabulary);
        self.cache.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use joinery_core::BpeVersion;

    fn table(text: &str) -> MergeTable {
        MergeTable::parse(text, Path::new("<test>")).unwrap()
    }

    #[test]
    fn test_lowest_rank_first() {
        let bpe = Bpe::new(
            table("#version: 0.2\nl o\nlo w\ne s\nes t</w>\n"),
            "￭",
        );
        assert_eq!(bpe.segment("lowest"), vec!["low", "est"]);
        assert_eq!(bpe.segment("low"), vec!["lo", "w"]);
    }

    #[test]
    fn test_end_of_word_only_at_end() {
        let bpe = Bpe::new(table("#version: 0.2\nh e\nl l\n"), "￭");
        assert_eq!(bpe.segment("hello"), vec!["he", "ll", "o"]);
        // "t</w>" never matches inside a word
        let bpe = Bpe::new(table("#version: 0.2\ns t</w>\n"), "￭");
        assert_eq!(bpe.segment("stop"), vec!["s", "t", "o", "p"]);
        assert_eq!(bpe.segment("best"), vec!["b", "e", "st"]);
    }

    #[test]
    fn test_v01_end_of_word_symbol() {
        let merges = table("t </w>\ns t</w>\n");
        assert_eq!(merges.version(), BpeVersion::V01);
        let bpe = Bpe::new(merges, "￭");
        assert_eq!(bpe.segment("best"), vec!["b", "e", "st"]);
        assert_eq!(bpe.segment("bes"), vec!["b", "e", "s"]);
    }

    #[test]
    fn test_equal_candidates_merge_left_first() {
        let bpe = Bpe::new(table("#version: 0.2\na a\n"), "￭");
        assert_eq!(bpe.segment("aaa"), vec!["aa", "a"]);
    }

    #[test]
    fn test_single_character_untouched() {
        let bpe = Bpe::new(table("#version: 0.2\na b\n"), "￭");
        let token = Token::new("a").with_space(true);
        assert_eq!(bpe.encode(&token), vec![token]);
        assert!(bpe.segment("").is_empty());
    }

    #[test]
    fn test_encode_marks_subwords() {
        let bpe = Bpe::new(table("#version: 0.2\nl o\nlo w\ne s\nes t</w>\n"), "￭");
        let tokens = bpe.encode(&Token::new("lowest").with_space(true));
        assert_eq!(tokens.len(), 2);
        assert!(tokens[0].preceded_by_space);
        assert!(tokens[0].subword_right);
        assert!(!tokens[1].subword_right);
    }

    #[test]
    fn test_vocabulary_blocks_merges() {
        let mut bpe = Bpe::new(table("#version: 0.2\nl o\nlo w\ne s\nes t</w>\n"), "￭");
        assert_eq!(bpe.segment("lowest"), vec!["low", "est"]);
        bpe.set_vocabulary(VocabularyFilter::from_entries([("lo￭", 5), ("es￭", 5), ("est", 5)], 0));
        assert_eq!(bpe.segment("lowest"), vec!["lo", "w", "est"]);
    }

    #[test]
    fn test_load_missing_file() {
        let err = Bpe::load(Path::new("/nonexistent/codes.bpe"), "￭").unwrap_err();
        assert!(matches!(err, joinery_core::TokenizerError::ModelLoad { .. }));
    }

    #[test]
    fn test_decode_concatenates() {
        let bpe = Bpe::new(table("#version: 0.2\n"), "￭");
        assert_eq!(bpe.decode(&["low", "est"]).as_deref(), Some("lowest"));
    }
}
