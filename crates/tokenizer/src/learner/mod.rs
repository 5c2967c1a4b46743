//! Learning subword models from text.
//!
//! A [`Learner`] pairs a subword learner with an optional base tokenizer
//! whose pre-tokenization is applied to ingested text. Learning writes the
//! model file and returns a tokenizer that uses it.

use crate::tokenizer::{Mode, Tokenizer, TokenizerBuilder};
use joinery_core::{PreTokenize, Result, TokenizerError};
use joinery_training::{
    BpeLearner, BpeLearnerConfig, IngestStats, LearnerState, ModelKind, SpmLearner, SubwordLearner,
};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Subword learner bound to a base tokenizer.
pub struct Learner {
    tokenizer: Option<Tokenizer>,
    learner: Box<dyn SubwordLearner>,
}

impl Learner {
    /// Learner for a BPE merge table.
    pub fn bpe(tokenizer: Option<&Tokenizer>, config: BpeLearnerConfig) -> Result<Self> {
        Ok(Self::from_learner(
            tokenizer.cloned(),
            Box::new(BpeLearner::new(config)?),
        ))
    }

    /// Learner delegating to the SentencePiece trainer with `options`.
    pub fn sentencepiece(
        tokenizer: Option<&Tokenizer>,
        options: BTreeMap<String, String>,
    ) -> Result<Self> {
        Ok(Self::from_learner(
            tokenizer.cloned(),
            Box::new(SpmLearner::new(options)?),
        ))
    }

    /// Wrap any subword learner.
    pub fn from_learner(tokenizer: Option<Tokenizer>, learner: Box<dyn SubwordLearner>) -> Self {
        Self { tokenizer, learner }
    }

    pub fn kind(&self) -> ModelKind {
        self.learner.kind()
    }

    /// Base tokenizer used for pre-tokenization.
    pub fn tokenizer(&self) -> Option<&Tokenizer> {
        self.tokenizer.as_ref()
    }

    /// Ingest text; every line is one training sentence.
    pub fn ingest(&mut self, text: &str) -> Result<IngestStats> {
        self.ingest_reader(text.as_bytes())
    }

    /// Ingest a stream line by line.
    pub fn ingest_reader<R: BufRead>(&mut self, mut reader: R) -> Result<IngestStats> {
        let Self { tokenizer, learner } = self;
        let pre_tokenizer = tokenizer.as_ref().map(|t| t as &dyn PreTokenize);
        learner.ingest(&mut reader, pre_tokenizer)
    }

    /// Ingest a text file.
    pub fn ingest_file(&mut self, path: &Path) -> Result<IngestStats> {
        let file = File::open(path).map_err(|e| TokenizerError::io(path, e))?;
        let stats = self.ingest_reader(BufReader::new(file))?;
        tracing::debug!(
            "Ingested {} lines ({} tokens, {} ignored) from {}",
            stats.lines,
            stats.tokens,
            stats.ignored,
            path.display()
        );
        Ok(stats)
    }

    /// Learn the model, write it to `model_path` and return a tokenizer
    /// using it.
    ///
    /// The returned tokenizer keeps the base tokenizer's options. Without a
    /// base tokenizer, BPE models get a space tokenizer with joiners and
    /// SentencePiece models a `none` tokenizer with spacers.
    pub fn learn(&mut self, model_path: &Path, verbose: bool) -> Result<Tokenizer> {
        if self.learner.state() == LearnerState::Learned {
            return Err(TokenizerError::InvalidState(
                "the model has already been learned".into(),
            ));
        }

        // Write next to the target and move into place only once learning
        // succeeded, so a failure never clobbers an existing model.
        let dir = match model_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut staged = NamedTempFile::new_in(dir).map_err(|e| TokenizerError::io(dir, e))?;
        {
            let mut writer = BufWriter::new(staged.as_file_mut());
            self.learner.learn(&mut writer, verbose)?;
            writer
                .flush()
                .map_err(|e| TokenizerError::io(model_path, e))?;
        }
        staged
            .persist(model_path)
            .map_err(|e| TokenizerError::io(model_path, e.error))?;

        if verbose {
            tracing::info!("Wrote {:?} model to {}", self.kind(), model_path.display());
        }

        match (&self.tokenizer, self.learner.kind()) {
            (Some(base), ModelKind::Bpe) => base.with_bpe_model(model_path),
            (Some(base), ModelKind::SentencePiece) => base.with_sp_model(model_path),
            (None, ModelKind::Bpe) => TokenizerBuilder::new()
                .mode(Mode::Space)
                .joiner_annotate(true)
                .bpe_model(model_path)
                .build(),
            (None, ModelKind::SentencePiece) => TokenizerBuilder::new()
                .mode(Mode::None)
                .spacer_annotate(true)
                .sp_model(model_path)
                .build(),
        }
    }
}
