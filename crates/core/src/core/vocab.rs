//! Symbol interning and vocabulary filtering.
//!
//! [`SymbolTable`] maps symbol strings to dense IDs for training.
//! [`VocabularyFilter`] restricts which subword units an encoder may emit.

use crate::error::{Result, TokenizerError};
use crate::markers::END_OF_WORD;
use ahash::AHashMap;
use compact_str::CompactString;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Forward mapping: symbol string -> ID
pub(crate) type Vocab = AHashMap<CompactString, u32>;

/// Bidirectional symbol <-> ID mapping with dense IDs.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    /// Forward mapping: symbol string -> ID
    vocab: Vocab,
    /// Reverse mapping, indexed by ID
    symbols: Vec<CompactString>,
}

impl SymbolTable {
    /// Create a new empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new table with capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            vocab: Vocab::with_capacity(capacity),
            symbols: Vec::with_capacity(capacity),
        }
    }

    /// Intern a symbol and return its ID.
    pub fn intern(&mut self, symbol: &str) -> u32 {
        if let Some(&id) = self.vocab.get(symbol) {
            return id;
        }
        let id = self.symbols.len() as u32;
        let symbol = CompactString::new(symbol);
        self.symbols.push(symbol.clone());
        self.vocab.insert(symbol, id);
        id
    }

    /// Get the ID for a symbol string.
    #[inline]
    pub fn get_id(&self, symbol: &str) -> Option<u32> {
        self.vocab.get(symbol).copied()
    }

    /// Get the symbol string for an ID.
    #[inline]
    pub fn get_symbol(&self, id: u32) -> Option<&str> {
        self.symbols.get(id as usize).map(|s| s.as_str())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

/// Set of subword units an encoder is allowed to produce.
///
/// Loaded from a file of `unit frequency` lines; units below the threshold
/// are discarded.
#[derive(Debug, Clone, Default)]
pub struct VocabularyFilter {
    units: AHashMap<CompactString, u64>,
    threshold: u64,
}

impl VocabularyFilter {
    /// Build a filter from `(unit, frequency)` entries.
    pub fn from_entries<'a>(entries: impl IntoIterator<Item = (&'a str, u64)>, threshold: u64) -> Self {
        let units = entries
            .into_iter()
            .filter(|&(_, freq)| freq >= threshold)
            .map(|(unit, freq)| (CompactString::new(unit), freq))
            .collect();
        Self { units, threshold }
    }

    /// Load a vocabulary file.
    ///
    /// Each non-empty line is `unit frequency`; a line holding only a unit
    /// counts as frequency 1. A non-numeric frequency is a load error.
    pub fn load(path: &Path, threshold: u64) -> Result<Self> {
        let file = std::fs::File::open(path).map_err(|err| {
            TokenizerError::model_load(path, format!("cannot open vocabulary: {}", err))
        })?;
        let reader = BufReader::new(file);

        let mut units = AHashMap::new();
        let mut skipped = 0usize;
        for (idx, line) in reader.lines().enumerate() {
            let line = line.map_err(|err| TokenizerError::io(path, err))?;
            let mut parts = line.split_whitespace();
            let Some(unit) = parts.next() else {
                continue;
            };
            let freq = match parts.next() {
                Some(raw) => raw.parse::<u64>().map_err(|_| {
                    TokenizerError::model_load(
                        path,
                        format!("line {}: invalid frequency '{}'", idx + 1, raw),
                    )
                })?,
                None => 1,
            };
            if freq >= threshold {
                units.insert(CompactString::new(unit), freq);
            } else {
                skipped += 1;
            }
        }

        tracing::debug!(
            "Loaded {} vocabulary units from {} ({} below threshold {})",
            units.len(),
            path.display(),
            skipped,
            threshold
        );
        Ok(Self { units, threshold })
    }

    /// Whether the unit is in the vocabulary.
    #[inline]
    pub fn contains(&self, unit: &str) -> bool {
        self.units.contains_key(unit)
    }

    /// Whether a BPE symbol may be produced.
    ///
    /// Symbols that end a word are looked up without `</w>`; other symbols are
    /// looked up with the joiner appended, matching how they are annotated.
    /// Single characters are always allowed so that encoding cannot get stuck.
    pub fn allows_bpe_symbol(&self, symbol: &str, joiner: &str) -> bool {
        match symbol.strip_suffix(END_OF_WORD) {
            Some(unit) => unit.chars().count() <= 1 || self.contains(unit),
            None => {
                if symbol.chars().count() <= 1 {
                    return true;
                }
                let mut key = CompactString::with_capacity(symbol.len() + joiner.len());
                key.push_str(symbol);
                key.push_str(joiner);
                self.contains(&key)
            }
        }
    }

    #[inline]
    pub fn threshold(&self) -> u64 {
        self.threshold
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.units.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_intern() {
        let mut table = SymbolTable::new();
        let id1 = table.intern("h");
        let id2 = table.intern("e</w>");

        assert_eq!(id1, 0);
        assert_eq!(id2, 1);
        assert_eq!(table.intern("h"), 0);
        assert_eq!(table.get_id("e</w>"), Some(1));
        assert_eq!(table.get_symbol(1), Some("e</w>"));
        assert_eq!(table.get_symbol(7), None);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_filter_threshold() {
        let filter = VocabularyFilter::from_entries([("he￭", 10), ("llo", 2)], 5);
        assert!(filter.contains("he￭"));
        assert!(!filter.contains("llo"));
        assert_eq!(filter.len(), 1);
    }

    #[test]
    fn test_allows_bpe_symbol() {
        let filter = VocabularyFilter::from_entries([("he￭", 3), ("llo", 3)], 0);
        assert!(filter.allows_bpe_symbol("he", "￭"));
        assert!(!filter.allows_bpe_symbol("ll", "￭"));
        assert!(filter.allows_bpe_symbol("llo</w>", "￭"));
        assert!(!filter.allows_bpe_symbol("lo</w>", "￭"));
        // Single characters always pass
        assert!(filter.allows_bpe_symbol("x", "￭"));
        assert!(filter.allows_bpe_symbol("o</w>", "￭"));
    }

    #[test]
    fn test_load_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "hello 12").unwrap();
        writeln!(file, "wor￭ 3").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "ld").unwrap();
        let filter = VocabularyFilter::load(file.path(), 2).unwrap();
        assert!(filter.contains("hello"));
        assert!(filter.contains("wor￭"));
        assert!(!filter.contains("ld"));
        assert_eq!(filter.threshold(), 2);
    }

    #[test]
    fn test_load_rejects_bad_frequency() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "hello many").unwrap();
        let err = VocabularyFilter::load(file.path(), 0).unwrap_err();
        assert!(matches!(err, TokenizerError::ModelLoad { .. }));
    }

    #[test]
    fn test_load_missing_file() {
        let err = VocabularyFilter::load(Path::new("/nonexistent/vocab.txt"), 0).unwrap_err();
        assert!(matches!(err, TokenizerError::ModelLoad { .. }));
    }
}
