//! Main tokenizer implementation.
//!
//! A [`Tokenizer`] is immutable once built: it splits text according to its
//! [`Mode`], applies segmentation and case rules, runs the optional subword
//! model over each token and finally renders joiners, spacers and case
//! markers. Building another configuration means building another value.

mod annotate;
mod detokenize;
pub mod flags;
pub mod mode;
pub mod options;

pub use detokenize::TextRange;
pub use flags::{BoundaryMarking, Flags, Marker};
pub use mode::Mode;
pub use options::{TokenizerBuilder, TokenizerOptions};

use crate::pre_tokenizer::{apply_case_markup, Segmenter, Splitter};
use crate::subword::{Bpe, SentencePiece, SubwordEncoder};
use annotate::Annotator;
use detokenize::{merge_ranges, Detokenizer};
use joinery_core::markers::contains_reserved_marker;
use joinery_core::{Alphabet, PreTokenize, Result, Token, TokenizerError};
use rayon::prelude::*;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

/// Reversible tokenizer.
///
/// Cloning is cheap: the subword model is shared.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    options: TokenizerOptions,
    segment_alphabets: BTreeSet<Alphabet>,
    encoder: Option<Arc<dyn SubwordEncoder>>,
}

impl Tokenizer {
    /// Validate options and load the models they name.
    pub fn new(options: TokenizerOptions) -> Result<Self> {
        if options.joiner.is_empty() {
            return Err(TokenizerError::InvalidConfig(
                "joiner must not be empty".into(),
            ));
        }
        if options.joiner.chars().any(char::is_whitespace) {
            return Err(TokenizerError::InvalidConfig(format!(
                "joiner must not contain whitespace: {:?}",
                options.joiner
            )));
        }
        let segment_alphabets = options
            .segment_alphabet
            .iter()
            .map(|name| name.parse::<Alphabet>())
            .collect::<Result<BTreeSet<_>>>()?;

        let mut encoder: Option<Box<dyn SubwordEncoder>> =
            match (options.bpe_model(), options.sp_model()) {
                (Some(_), Some(_)) => {
                    return Err(TokenizerError::InvalidConfig(
                        "bpe_model_path and sp_model_path are mutually exclusive".into(),
                    ))
                }
                (Some(path), None) => {
                    let bpe = Bpe::load(path, options.joiner.as_str())?;
                    Some(Box::new(bpe) as Box<dyn SubwordEncoder>)
                }
                (None, Some(path)) => {
                    let sp = SentencePiece::load(path)?
                        .with_sampling(options.sp_nbest_size, options.sp_alpha);
                    Some(Box::new(sp) as Box<dyn SubwordEncoder>)
                }
                (None, None) => None,
            };

        if let Some(path) = options.vocabulary() {
            let Some(encoder) = encoder.as_mut() else {
                return Err(TokenizerError::InvalidConfig(
                    "vocabulary_path requires a BPE or SentencePiece model".into(),
                ));
            };
            encoder.load_vocabulary(path, options.vocabulary_threshold)?;
        }

        tracing::debug!(
            "Built {} tokenizer (subword model: {})",
            options.mode,
            encoder.as_ref().map_or("none", |e| e.name())
        );
        Ok(Self {
            options,
            segment_alphabets,
            encoder: encoder.map(Arc::from),
        })
    }

    /// Create a new tokenizer builder.
    pub fn builder() -> TokenizerBuilder {
        TokenizerBuilder::new()
    }

    pub fn options(&self) -> &TokenizerOptions {
        &self.options
    }

    pub fn mode(&self) -> Mode {
        self.options.mode
    }

    pub fn flags(&self) -> &Flags {
        &self.options.flags
    }

    pub fn joiner(&self) -> &str {
        &self.options.joiner
    }

    /// The subword model, if any.
    pub fn encoder(&self) -> Option<&dyn SubwordEncoder> {
        self.encoder.as_deref()
    }

    /// Segment letters of `alphabet` one by one from now on.
    pub fn add_alphabet_to_segment(&mut self, alphabet: &str) -> Result<()> {
        let parsed: Alphabet = alphabet.parse()?;
        if self.segment_alphabets.insert(parsed) {
            self.options.segment_alphabet.push(parsed.name().to_string());
        }
        Ok(())
    }

    /// Same configuration with a BPE model instead of the current one.
    pub fn with_bpe_model(&self, path: &Path) -> Result<Tokenizer> {
        let mut options = self.options.clone();
        options.bpe_model_path = Some(path.to_path_buf());
        options.sp_model_path = None;
        options.vocabulary_path = None;
        Tokenizer::new(options)
    }

    /// Same configuration with a SentencePiece model instead of the current one.
    pub fn with_sp_model(&self, path: &Path) -> Result<Tokenizer> {
        let mut options = self.options.clone();
        options.sp_model_path = Some(path.to_path_buf());
        options.bpe_model_path = None;
        options.vocabulary_path = None;
        Tokenizer::new(options)
    }

    /// Tokenize text into annotated tokens.
    pub fn tokenize_into_tokens(&self, text: &str) -> Vec<Token> {
        let tokens = self.pre_tokenize(text);
        let Some(encoder) = &self.encoder else {
            return tokens;
        };

        let mut out = Vec::with_capacity(tokens.len() * 2);
        for token in tokens {
            if token.is_placeholder
                || token.is_empty()
                || (self.options.flags.no_substitution && contains_reserved_marker(&token.surface))
            {
                out.push(token);
                continue;
            }
            let mut pieces = encoder.encode(&token);
            if self.options.mode != Mode::None {
                if let Some(first) = pieces.first_mut() {
                    first.preceded_by_space = token.preceded_by_space;
                }
            }
            out.append(&mut pieces);
        }
        out
    }

    /// Render annotated tokens to strings.
    pub fn annotate(&self, tokens: &[Token]) -> Vec<String> {
        Annotator::new(&self.options.flags, &self.options.joiner).render(tokens)
    }

    /// Tokenize text into token strings.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        self.annotate(&self.tokenize_into_tokens(text))
    }

    /// Tokenize multiple texts in parallel.
    pub fn tokenize_batch<S: AsRef<str> + Sync>(&self, texts: &[S]) -> Vec<Vec<String>> {
        texts
            .par_iter()
            .map(|text| self.tokenize(text.as_ref()))
            .collect()
    }

    /// Rebuild text from tokens.
    pub fn detokenize<S: AsRef<str>>(&self, tokens: &[S]) -> String {
        self.detokenizer().run(tokens).0
    }

    /// Rebuild text and report which character ranges each token produced.
    ///
    /// With `merge_ranges`, tokens glued together without a separator are
    /// reported as one range attributed to the first of them.
    pub fn detokenize_with_ranges<S: AsRef<str>>(
        &self,
        tokens: &[S],
        merge_ranges: bool,
    ) -> (String, Vec<TextRange>) {
        let (text, ranges) = self.detokenizer().run(tokens);
        if merge_ranges {
            (text, self::merge_ranges(ranges))
        } else {
            (text, ranges)
        }
    }

    fn detokenizer(&self) -> Detokenizer<'_> {
        Detokenizer {
            joiner: &self.options.joiner,
            spacer_convention: self.options.flags.boundary_marking().uses_spacers(),
            case_markup: self.options.flags.case_markup,
        }
    }
}

impl PreTokenize for Tokenizer {
    /// Split, segment and case-mark text without subword encoding.
    fn pre_tokenize(&self, text: &str) -> Vec<Token> {
        let flags = &self.options.flags;
        let splitter = Splitter::new(self.options.mode, !flags.no_substitution);
        let segmenter = Segmenter::new(flags, self.options.mode, &self.segment_alphabets);

        let mut tokens = segmenter.segment(splitter.split(text));
        if flags.case_markup {
            apply_case_markup(&mut tokens);
        }
        if flags.preserve_placeholders {
            for token in tokens.iter_mut().filter(|t| t.is_placeholder) {
                token.preserve = true;
            }
        }
        tokens
    }
}
