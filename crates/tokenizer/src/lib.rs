//! Joinery-tokenizer - Reversible tokenization with subword models
//!
//! This crate splits text into tokens that can be turned back into the
//! original text, marking the places where tokens were glued together with
//! joiners or spacers.
//!
//! # Features
//!
//! - Five tokenization modes (`conservative`, `aggressive`, `space`, `char`, `none`)
//! - Joiner or spacer annotation, inline or as standalone tokens
//! - Segmentation on case, digit and alphabet transitions
//! - Case markup with restorable marker tokens
//! - Placeholders (`｟...｠`) kept as atomic tokens
//! - BPE and SentencePiece subword models, with vocabulary restriction
//! - Detokenization with character ranges
//! - Learning BPE or SentencePiece models from a corpus
//!
//! # Example
//!
//! ```rust
//! use joinery_tokenizer::{Mode, Tokenizer};
//!
//! let tokenizer = Tokenizer::builder()
//!     .mode(Mode::Aggressive)
//!     .joiner_annotate(true)
//!     .build()?;
//!
//! let tokens = tokenizer.tokenize("Hello World!");
//! assert_eq!(tokens, vec!["Hello", "World", "￭!"]);
//! assert_eq!(tokenizer.detokenize(&tokens), "Hello World!");
//! # Ok::<(), joinery_tokenizer::TokenizerError>(())
//! ```

// Re-export core types
pub use joinery_core::{Alphabet, Casing, PreTokenize, Result, Token, TokenizerError};
pub use joinery_training::BpeLearnerConfig;

// Tokenizer API
pub mod tokenizer;
pub use tokenizer::{
    Flags, Mode, TextRange, Tokenizer, TokenizerBuilder, TokenizerOptions,
};

// Model and options files
pub mod io;

// Pre-tokenization
pub mod pre_tokenizer;
pub use pre_tokenizer::{CaseMarker, Normalizer, Segmenter, Splitter};

// Subword models
pub mod subword;
pub use subword::{Bpe, SentencePiece, SubwordEncoder};

// Learning
pub mod learner;
pub use learner::Learner;

// Utilities
pub mod utils;
pub use utils::SegmentCache;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
