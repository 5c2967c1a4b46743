//! Common interface of subword learners.
//!
//! A learner goes through two states: it accepts training text until
//! [`SubwordLearner::learn`] is called once, after which it only reports
//! [`TokenizerError::InvalidState`].

use joinery_core::{PreTokenize, Result, TokenizerError};
use std::io::{BufRead, Write};
use std::ops::AddAssign;
use std::path::PathBuf;

/// Lifecycle of a learner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LearnerState {
    Ingesting,
    Learned,
}

/// Family of model a learner produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    Bpe,
    SentencePiece,
}

/// Counters reported by ingestion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    /// Lines read, including ignored ones
    pub lines: usize,
    /// Lines skipped because they were not valid UTF-8
    pub ignored: usize,
    /// Tokens handed to the learner
    pub tokens: usize,
}

impl AddAssign for IngestStats {
    fn add_assign(&mut self, other: Self) {
        self.lines += other.lines;
        self.ignored += other.ignored;
        self.tokens += other.tokens;
    }
}

/// A subword model learner.
pub trait SubwordLearner: Send {
    fn kind(&self) -> ModelKind;

    fn state(&self) -> LearnerState;

    /// Add a single token of training data.
    fn ingest_token(&mut self, token: &str) -> Result<()>;

    /// Add one line of training data and return the number of tokens ingested.
    ///
    /// With a pre-tokenizer, each non-placeholder token surface is ingested;
    /// otherwise the line is split on whitespace.
    fn ingest_line(&mut self, line: &str, pre_tokenizer: Option<&dyn PreTokenize>) -> Result<usize> {
        let mut ingested = 0;
        match pre_tokenizer {
            Some(pre_tokenizer) => {
                for token in pre_tokenizer.pre_tokenize(line) {
                    if token.is_placeholder || token.is_empty() {
                        continue;
                    }
                    self.ingest_token(&token.surface)?;
                    ingested += 1;
                }
            }
            None => {
                for word in line.split_whitespace() {
                    self.ingest_token(word)?;
                    ingested += 1;
                }
            }
        }
        Ok(ingested)
    }

    /// Read a stream line by line.
    ///
    /// Lines that are not valid UTF-8 are skipped and counted in
    /// [`IngestStats::ignored`].
    fn ingest(
        &mut self,
        reader: &mut dyn BufRead,
        pre_tokenizer: Option<&dyn PreTokenize>,
    ) -> Result<IngestStats> {
        ensure_ingesting(self.state())?;

        let mut stats = IngestStats::default();
        let mut buf = Vec::new();
        loop {
            buf.clear();
            let read = reader
                .read_until(b'\n', &mut buf)
                .map_err(|err| TokenizerError::io(PathBuf::from("<input>"), err))?;
            if read == 0 {
                break;
            }
            stats.lines += 1;

            let Ok(line) = std::str::from_utf8(&buf) else {
                stats.ignored += 1;
                tracing::warn!("Skipping line {}: invalid UTF-8", stats.lines);
                continue;
            };
            let line = line.trim_end_matches(['\n', '\r']);
            stats.tokens += self.ingest_line(line, pre_tokenizer)?;
        }
        Ok(stats)
    }

    /// Learn the model and write it to `out`. Can only succeed once.
    fn learn(&mut self, out: &mut dyn Write, verbose: bool) -> Result<()>;
}

/// Fail with [`TokenizerError::InvalidState`] once a learner has learned.
pub(crate) fn ensure_ingesting(state: LearnerState) -> Result<()> {
    match state {
        LearnerState::Ingesting => Ok(()),
        LearnerState::Learned => Err(TokenizerError::InvalidState(
            "the learner has already learned its model".into(),
        )),
    }
}
