//! Merge table management for BPE.
//!
//! A merge table is the ordered list of symbol pairs learned by BPE training.
//! The rank of a pair is its line position in the model file (lower rank =
//! higher priority). Symbols are stored as `CompactString`, so most lookups
//! build their keys inline without allocating.

use crate::error::{Result, TokenizerError};
use crate::markers::END_OF_WORD;
use ahash::AHashMap;
use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;

/// A pair of symbols that can be merged.
pub(crate) type Pair = (CompactString, CompactString);

/// Merge rule mapping: pair -> rank.
pub(crate) type MergeMap = AHashMap<Pair, u32>;

/// Header line identifying the 0.2 model format.
pub const VERSION_HEADER: &str = "#version: 0.2";

/// Where the end-of-word marker lives in the merge table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BpeVersion {
    /// `</w>` is a symbol of its own.
    V01,
    /// `</w>` is glued to the last character of each word.
    #[default]
    V02,
}

/// Ordered collection of BPE merge rules with efficient lookup.
#[derive(Debug, Clone, Default)]
pub struct MergeTable {
    /// Merge rules: pair -> rank
    ranks: MergeMap,
    /// Pairs in rank order
    order: Vec<Pair>,
    version: BpeVersion,
}

impl MergeTable {
    /// Create a new empty table for the given format version.
    pub fn new(version: BpeVersion) -> Self {
        Self {
            ranks: MergeMap::new(),
            order: Vec::new(),
            version,
        }
    }

    /// Create a new table with capacity.
    pub fn with_capacity(version: BpeVersion, capacity: usize) -> Self {
        Self {
            ranks: MergeMap::with_capacity(capacity),
            order: Vec::with_capacity(capacity),
            version,
        }
    }

    /// Append a merge rule and return its rank.
    ///
    /// A pair that is already present keeps its first rank.
    pub fn push(&mut self, left: &str, right: &str) -> u32 {
        let pair = (CompactString::new(left), CompactString::new(right));
        if let Some(&rank) = self.ranks.get(&pair) {
            return rank;
        }
        let rank = self.order.len() as u32;
        self.ranks.insert(pair.clone(), rank);
        self.order.push(pair);
        rank
    }

    /// Get the rank of a pair, if it is a known merge.
    #[inline]
    pub fn rank(&self, left: &str, right: &str) -> Option<u32> {
        self.ranks
            .get(&(CompactString::new(left), CompactString::new(right)))
            .copied()
    }

    /// Pairs in rank order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.order.iter().map(|(l, r)| (l.as_str(), r.as_str()))
    }

    #[inline]
    pub fn version(&self) -> BpeVersion {
        self.version
    }

    /// Get the number of merge rules.
    #[inline]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Check if there are no merge rules.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Parse the text of a BPE model.
    ///
    /// The first line may be a `#version: 0.2` header; without it the table
    /// is read in the 0.1 layout. Every other non-empty line must hold exactly
    /// two whitespace-separated symbols. `origin` is only used for errors.
    pub fn parse(text: &str, origin: &Path) -> Result<Self> {
        let mut lines = text.lines().enumerate().peekable();
        let mut version = BpeVersion::V01;

        if let Some((_, first)) = lines.peek() {
            let first = first.trim();
            if first.starts_with("#version") {
                if first != VERSION_HEADER {
                    return Err(TokenizerError::model_load(
                        origin,
                        format!("line 1: unsupported model version '{}'", first),
                    ));
                }
                version = BpeVersion::V02;
                lines.next();
            }
        }

        let mut table = Self::new(version);
        for (idx, line) in lines {
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() {
                continue;
            }
            let mut parts = line.split_whitespace();
            match (parts.next(), parts.next(), parts.next()) {
                (Some(left), Some(right), None) => {
                    table.push(left, right);
                }
                _ => {
                    return Err(TokenizerError::model_load(
                        origin,
                        format!("line {}: expected two symbols, got '{}'", idx + 1, line),
                    ))
                }
            }
        }

        tracing::debug!(
            "Parsed {} merges ({:?}) from {}",
            table.len(),
            table.version,
            origin.display()
        );
        Ok(table)
    }

    /// Write the table in the model file layout.
    pub fn write_to(&self, out: &mut dyn Write) -> std::io::Result<()> {
        if self.version == BpeVersion::V02 {
            writeln!(out, "{}", VERSION_HEADER)?;
        }
        for (left, right) in self.iter() {
            writeln!(out, "{} {}", left, right)?;
        }
        Ok(())
    }

    /// Split a word into its initial symbols for this table's version.
    pub fn initial_symbols(&self, word: &str) -> Vec<String> {
        let mut symbols: Vec<String> = word.chars().map(String::from).collect();
        match self.version {
            BpeVersion::V02 => {
                if let Some(last) = symbols.last_mut() {
                    last.push_str(END_OF_WORD);
                }
            }
            BpeVersion::V01 => {
                if !symbols.is_empty() {
                    symbols.push(END_OF_WORD.to_string());
                }
            }
        }
        symbols
    }
}

/// Statistics about a merge table.
#[derive(Debug, Clone, Default)]
pub struct MergeStats {
    /// Number of merge rules
    pub count: usize,
    /// Number of rules producing an end-of-word symbol
    pub final_merges: usize,
    /// Longest merged symbol, in characters, without `</w>`
    pub longest: usize,
}

impl MergeTable {
    /// Get statistics about the merge table.
    pub fn stats(&self) -> MergeStats {
        let mut stats = MergeStats {
            count: self.len(),
            ..Default::default()
        };
        for (left, right) in self.iter() {
            let merged = format!("{}{}", left, right);
            let unit = merged.strip_suffix(END_OF_WORD);
            if unit.is_some() {
                stats.final_merges += 1;
            }
            stats.longest = stats
                .longest
                .max(unit.unwrap_or(&merged).chars().count());
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> &'static Path {
        Path::new("test.bpe")
    }

    #[test]
    fn test_push_and_rank() {
        let mut table = MergeTable::new(BpeVersion::V02);
        assert_eq!(table.push("e", "l"), 0);
        assert_eq!(table.push("el", "l"), 1);
        // Duplicates keep their first rank
        assert_eq!(table.push("e", "l"), 0);

        assert_eq!(table.rank("e", "l"), Some(0));
        assert_eq!(table.rank("el", "l"), Some(1));
        assert_eq!(table.rank("l", "e"), None);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_parse_v02() {
        let table = MergeTable::parse("#version: 0.2\ne l\nel l\n", origin()).unwrap();
        assert_eq!(table.version(), BpeVersion::V02);
        assert_eq!(table.iter().collect::<Vec<_>>(), vec![("e", "l"), ("el", "l")]);
    }

    #[test]
    fn test_parse_without_header_is_v01() {
        let table = MergeTable::parse("h e\r\n\nhe l\n", origin()).unwrap();
        assert_eq!(table.version(), BpeVersion::V01);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_parse_reports_line_number() {
        let err = MergeTable::parse("#version: 0.2\ne l\nbroken\n", origin()).unwrap_err();
        match err {
            TokenizerError::ModelLoad { reason, .. } => assert!(reason.starts_with("line 3")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_parse_rejects_unknown_version() {
        assert!(MergeTable::parse("#version: 0.3\na b\n", origin()).is_err());
    }

    #[test]
    fn test_write_round_trip() {
        let mut table = MergeTable::new(BpeVersion::V02);
        table.push("l", "o</w>");
        table.push("h", "e");
        let mut out = Vec::new();
        table.write_to(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "#version: 0.2\nl o</w>\nh e\n");
        let parsed = MergeTable::parse(&text, origin()).unwrap();
        assert_eq!(parsed.rank("h", "e"), Some(1));
    }

    #[test]
    fn test_initial_symbols() {
        let v2 = MergeTable::new(BpeVersion::V02);
        assert_eq!(v2.initial_symbols("low"), vec!["l", "o", "w</w>"]);
        let v1 = MergeTable::new(BpeVersion::V01);
        assert_eq!(v1.initial_symbols("low"), vec!["l", "o", "w", "</w>"]);
        assert!(v1.initial_symbols("").is_empty());
    }

    #[test]
    fn test_stats() {
        let mut table = MergeTable::new(BpeVersion::V02);
        table.push("l", "o");
        table.push("lo", "w</w>");
        let stats = table.stats();
        assert_eq!(stats.count, 2);
        assert_eq!(stats.final_merges, 1);
        assert_eq!(stats.longest, 3);
    }
}
