//! BPE learner.
//!
//! Collects word frequencies, then repeatedly merges the most frequent
//! adjacent symbol pair. Words are split into characters with `</w>` glued to
//! the last one, and the learned table is written in the `#version: 0.2`
//! layout.

use super::counter::PairCounter;
use super::learner::{ensure_ingesting, IngestStats, LearnerState, ModelKind, SubwordLearner};
use ahash::{AHashMap, AHashSet};
use compact_str::CompactString;
use joinery_core::markers::END_OF_WORD;
use joinery_core::{
    BpeVersion, MergeCandidate, MergeTable, PairPriorityQueue, Result, SymbolTable,
    TokenizerError,
};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// Configuration for BPE learning.
#[derive(Debug, Clone)]
pub struct BpeLearnerConfig {
    /// Maximum number of merges to learn
    pub symbols: usize,
    /// Minimum frequency for a pair to be merged
    pub min_frequency: u64,
    /// Count the initial characters against the `symbols` budget
    pub total_symbols: bool,
    /// Optional seed dictionary of `word count` lines
    pub dict_path: Option<PathBuf>,
}

impl Default for BpeLearnerConfig {
    fn default() -> Self {
        Self {
            symbols: 10_000,
            min_frequency: 2,
            total_symbols: false,
            dict_path: None,
        }
    }
}

impl BpeLearnerConfig {
    /// Create a config with the given merge budget.
    pub fn with_symbols(symbols: usize) -> Self {
        Self {
            symbols,
            ..Default::default()
        }
    }
}

/// BPE learner.
///
/// Trains merge rules from ingested tokens by iteratively merging the most
/// frequent symbol pairs. Ties go to the pair seen first.
pub struct BpeLearner {
    config: BpeLearnerConfig,
    /// Word -> position in `words`
    word_index: AHashMap<CompactString, usize>,
    /// Distinct words in first-seen order
    words: Vec<CompactString>,
    counts: Vec<u64>,
    state: LearnerState,
}

impl BpeLearner {
    /// Create a learner, reading the seed dictionary if one is configured.
    pub fn new(config: BpeLearnerConfig) -> Result<Self> {
        let dict_path = config.dict_path.clone();
        let mut learner = Self {
            config,
            word_index: AHashMap::new(),
            words: Vec::new(),
            counts: Vec::new(),
            state: LearnerState::Ingesting,
        };
        if let Some(path) = dict_path {
            learner.load_dictionary(&path)?;
        }
        Ok(learner)
    }

    /// Create a learner with default configuration and the given budget.
    pub fn with_symbols(symbols: usize) -> Self {
        Self {
            config: BpeLearnerConfig::with_symbols(symbols),
            word_index: AHashMap::new(),
            words: Vec::new(),
            counts: Vec::new(),
            state: LearnerState::Ingesting,
        }
    }

    pub fn config(&self) -> &BpeLearnerConfig {
        &self.config
    }

    /// Add `count` occurrences of a word.
    pub fn add_word(&mut self, word: &str, count: u64) -> Result<()> {
        ensure_ingesting(self.state)?;
        if word.is_empty() || count == 0 {
            return Ok(());
        }
        match self.word_index.get(word) {
            Some(&idx) => self.counts[idx] += count,
            None => {
                let word = CompactString::new(word);
                self.word_index.insert(word.clone(), self.words.len());
                self.words.push(word);
                self.counts.push(count);
            }
        }
        Ok(())
    }

    /// Read a seed dictionary file.
    pub fn load_dictionary(&mut self, path: &Path) -> Result<IngestStats> {
        let file = std::fs::File::open(path).map_err(|err| {
            TokenizerError::model_load(path, format!("cannot open dictionary: {}", err))
        })?;
        self.ingest_dictionary(BufReader::new(file), path)
    }

    /// Read `word count` lines. `origin` is only used for errors.
    pub fn ingest_dictionary<R: BufRead>(&mut self, reader: R, origin: &Path) -> Result<IngestStats> {
        ensure_ingesting(self.state)?;
        let mut stats = IngestStats::default();
        for (idx, line) in reader.lines().enumerate() {
            let line = line.map_err(|err| TokenizerError::io(origin, err))?;
            stats.lines += 1;
            if line.trim().is_empty() {
                continue;
            }
            let mut parts = line.split_whitespace();
            let parsed = match (parts.next(), parts.next(), parts.next()) {
                (Some(word), Some(count), None) => count.parse::<u64>().ok().map(|c| (word, c)),
                _ => None,
            };
            let Some((word, count)) = parsed else {
                return Err(TokenizerError::model_load(
                    origin,
                    format!("line {}: expected 'word count', got '{}'", idx + 1, line),
                ));
            };
            self.add_word(word, count)?;
            stats.tokens += 1;
        }
        tracing::debug!("Loaded {} dictionary entries from {}", stats.tokens, origin.display());
        Ok(stats)
    }

    /// Number of distinct words ingested so far.
    pub fn word_count(&self) -> usize {
        self.words.len()
    }

    /// Learn the merge table without changing the learner state.
    ///
    /// Each step merges the most frequent pair. Pairs with equal counts are
    /// ranked by first occurrence in the ingested words, so "hello" yields
    /// `h e` before `e l`. The result is deterministic and a run with more
    /// symbols extends the table of a run with fewer.
    pub fn learn_merges(&self, verbose: bool) -> Result<MergeTable> {
        let mut symbols = SymbolTable::with_capacity(self.words.len());
        let mut words = Vec::with_capacity(self.words.len());
        let mut internal = AHashSet::new();
        let mut finals = AHashSet::new();

        for word in &self.words {
            let mut chars = word.chars().peekable();
            let mut ids = Vec::with_capacity(word.len());
            let mut buf = String::new();
            while let Some(c) = chars.next() {
                buf.clear();
                buf.push(c);
                if chars.peek().is_none() {
                    buf.push_str(END_OF_WORD);
                    let id = symbols.intern(&buf);
                    finals.insert(id);
                    ids.push(id);
                } else {
                    let id = symbols.intern(&buf);
                    internal.insert(id);
                    ids.push(id);
                }
            }
            words.push(ids);
        }

        let mut budget = self.config.symbols;
        if self.config.total_symbols {
            let alphabet = internal.len() + finals.len();
            budget = budget.saturating_sub(alphabet);
            if verbose {
                tracing::info!(
                    "{} initial symbols count against the budget, {} merges left",
                    alphabet,
                    budget
                );
            }
        }

        let mut counter = PairCounter::new(words, self.counts.clone());
        let mut queue = PairPriorityQueue::with_capacity(counter.distinct_pairs());
        for candidate in counter.candidates() {
            queue.push(candidate);
        }

        let mut table = MergeTable::with_capacity(BpeVersion::V02, budget.min(1 << 16));
        while table.len() < budget {
            let Some(best) = queue.pop() else {
                if verbose {
                    tracing::info!("No pair left to merge after {} merges", table.len());
                }
                break;
            };
            if best.count < self.config.min_frequency {
                if verbose {
                    tracing::info!(
                        "No pair has frequency >= {}, stopping after {} merges",
                        self.config.min_frequency,
                        table.len()
                    );
                }
                break;
            }

            let (Some(left), Some(right)) = (
                symbols.get_symbol(best.pair.0).map(CompactString::new),
                symbols.get_symbol(best.pair.1).map(CompactString::new),
            ) else {
                return Err(TokenizerError::Training(format!(
                    "unknown symbol in pair {:?}",
                    best.pair
                )));
            };
            let mut merged = left.clone();
            merged.push_str(&right);
            let new_id = symbols.intern(&merged);

            if verbose {
                tracing::info!(
                    "pair {}: {} {} -> {} (frequency {})",
                    table.len(),
                    left,
                    right,
                    merged,
                    best.count
                );
            }
            table.push(&left, &right);

            for pair in counter.merge_pair(best.pair, new_id) {
                let count = counter.pair_count(pair);
                if queue.get_count(pair).is_some() {
                    queue.update(pair, count);
                } else if count > 0 {
                    let ordinal = counter.ordinal(pair).unwrap_or(u64::MAX);
                    queue.push(MergeCandidate::new(pair, count, ordinal));
                }
            }
        }

        Ok(table)
    }
}

impl SubwordLearner for BpeLearner {
    fn kind(&self) -> ModelKind {
        ModelKind::Bpe
    }

    fn state(&self) -> LearnerState {
        self.state
    }

    fn ingest_token(&mut self, token: &str) -> Result<()> {
        self.add_word(token, 1)
    }

    fn learn(&mut self, out: &mut dyn Write, verbose: bool) -> Result<()> {
        ensure_ingesting(self.state)?;
        self.state = LearnerState::Learned;

        if verbose {
            tracing::info!("Learning BPE merges from {} distinct words", self.words.len());
        }
        let table = self.learn_merges(verbose)?;
        table
            .write_to(out)
            .map_err(|err| TokenizerError::io(PathBuf::from("<model>"), err))?;

        // The corpus is no longer needed.
        self.word_index = AHashMap::new();
        self.words = Vec::new();
        self.counts = Vec::new();
        Ok(())
    }
}
