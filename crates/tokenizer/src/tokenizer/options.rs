//! Tokenizer construction options.

use super::flags::Flags;
use super::mode::Mode;
use super::Tokenizer;
use joinery_core::markers::JOINER_MARKER;
use joinery_core::{Result, TokenizerError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Every parameter recognized by [`Tokenizer::new`].
///
/// Empty model paths are treated as absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenizerOptions {
    pub mode: Mode,
    #[serde(flatten)]
    pub flags: Flags,
    /// Joiner marker string
    pub joiner: String,
    /// BPE merge table
    pub bpe_model_path: Option<PathBuf>,
    /// SentencePiece model
    pub sp_model_path: Option<PathBuf>,
    /// Number of best segmentations to sample from (0 = always the best)
    pub sp_nbest_size: usize,
    /// Smoothing parameter of the sampling distribution
    pub sp_alpha: f32,
    /// Vocabulary restricting the subword units
    pub vocabulary_path: Option<PathBuf>,
    pub vocabulary_threshold: u64,
    /// Alphabet names whose letters are segmented one by one
    pub segment_alphabet: Vec<String>,
}

impl Default for TokenizerOptions {
    fn default() -> Self {
        Self {
            mode: Mode::Conservative,
            flags: Flags::default(),
            joiner: JOINER_MARKER.to_string(),
            bpe_model_path: None,
            sp_model_path: None,
            sp_nbest_size: 0,
            sp_alpha: 0.1,
            vocabulary_path: None,
            vocabulary_threshold: 0,
            segment_alphabet: Vec::new(),
        }
    }
}

impl TokenizerOptions {
    /// Options with the given mode and defaults for everything else.
    pub fn with_mode(mode: Mode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    /// Parse options from JSON. Invalid values (an unknown mode, a wrongly
    /// typed flag) are reported as [`TokenizerError::InvalidConfig`].
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|err| {
            if err.is_data() {
                TokenizerError::InvalidConfig(err.to_string())
            } else {
                TokenizerError::Json(err)
            }
        })
    }

    /// Read options from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        crate::io::load_options(path)
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write options as JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        crate::io::save_options(self, path)
    }

    pub(crate) fn bpe_model(&self) -> Option<&Path> {
        non_empty(&self.bpe_model_path)
    }

    pub(crate) fn sp_model(&self) -> Option<&Path> {
        non_empty(&self.sp_model_path)
    }

    pub(crate) fn vocabulary(&self) -> Option<&Path> {
        non_empty(&self.vocabulary_path)
    }
}

fn non_empty(path: &Option<PathBuf>) -> Option<&Path> {
    path.as_deref().filter(|p| !p.as_os_str().is_empty())
}

/// Builder for creating a tokenizer.
#[derive(Debug, Clone, Default)]
pub struct TokenizerBuilder {
    options: TokenizerOptions,
}

impl TokenizerBuilder {
    /// Create a new builder with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from existing options.
    pub fn from_options(options: TokenizerOptions) -> Self {
        Self { options }
    }

    pub fn mode(mut self, mode: Mode) -> Self {
        self.options.mode = mode;
        self
    }

    /// Replace all flags at once.
    pub fn flags(mut self, flags: Flags) -> Self {
        self.options.flags = flags;
        self
    }

    pub fn joiner_annotate(mut self, enabled: bool) -> Self {
        self.options.flags.joiner_annotate = enabled;
        self
    }

    pub fn joiner_new(mut self, enabled: bool) -> Self {
        self.options.flags.joiner_new = enabled;
        self
    }

    pub fn spacer_annotate(mut self, enabled: bool) -> Self {
        self.options.flags.spacer_annotate = enabled;
        self
    }

    pub fn spacer_new(mut self, enabled: bool) -> Self {
        self.options.flags.spacer_new = enabled;
        self
    }

    pub fn case_markup(mut self, enabled: bool) -> Self {
        self.options.flags.case_markup = enabled;
        self
    }

    pub fn no_substitution(mut self, enabled: bool) -> Self {
        self.options.flags.no_substitution = enabled;
        self
    }

    pub fn preserve_placeholders(mut self, enabled: bool) -> Self {
        self.options.flags.preserve_placeholders = enabled;
        self
    }

    pub fn preserve_segmented_tokens(mut self, enabled: bool) -> Self {
        self.options.flags.preserve_segmented_tokens = enabled;
        self
    }

    pub fn segment_case(mut self, enabled: bool) -> Self {
        self.options.flags.segment_case = enabled;
        self
    }

    pub fn segment_numbers(mut self, enabled: bool) -> Self {
        self.options.flags.segment_numbers = enabled;
        self
    }

    pub fn segment_alphabet_change(mut self, enabled: bool) -> Self {
        self.options.flags.segment_alphabet_change = enabled;
        self
    }

    /// Alphabets whose letters are segmented one by one.
    pub fn segment_alphabet<I, S>(mut self, alphabets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options.segment_alphabet = alphabets.into_iter().map(Into::into).collect();
        self
    }

    /// Set the joiner marker string.
    pub fn joiner(mut self, joiner: impl Into<String>) -> Self {
        self.options.joiner = joiner.into();
        self
    }

    /// Use a BPE merge table.
    pub fn bpe_model(mut self, path: impl Into<PathBuf>) -> Self {
        self.options.bpe_model_path = Some(path.into());
        self
    }

    /// Use a SentencePiece model.
    pub fn sp_model(mut self, path: impl Into<PathBuf>) -> Self {
        self.options.sp_model_path = Some(path.into());
        self
    }

    /// Enable subword sampling.
    pub fn sp_sampling(mut self, nbest_size: usize, alpha: f32) -> Self {
        self.options.sp_nbest_size = nbest_size;
        self.options.sp_alpha = alpha;
        self
    }

    /// Restrict subword output to a vocabulary.
    pub fn vocabulary(mut self, path: impl Into<PathBuf>, threshold: u64) -> Self {
        self.options.vocabulary_path = Some(path.into());
        self.options.vocabulary_threshold = threshold;
        self
    }

    /// Options built so far.
    pub fn options(&self) -> &TokenizerOptions {
        &self.options
    }

    /// Build the tokenizer.
    pub fn build(self) -> Result<Tokenizer> {
        Tokenizer::new(self.options)
    }
}
