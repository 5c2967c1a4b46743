//! Joinery-training - Subword learners for the joinery tokenizer
//!
//! This crate learns subword models from ingested text.
//!
//! # Features
//!
//! - BPE learning with incremental pair statistics and parallel initial counting
//! - Deterministic tie-breaking by first-seen order
//! - Optional seed dictionaries and a `total_symbols` budget mode
//! - SentencePiece training through the external `spm_train` program
//!
//! # Example
//!
//! ```rust
//! use joinery_training::{BpeLearner, BpeLearnerConfig, SubwordLearner};
//!
//! let mut learner = BpeLearner::new(BpeLearnerConfig {
//!     symbols: 2,
//!     min_frequency: 1,
//!     ..Default::default()
//! })?;
//! let mut corpus: &[u8] = b"hello world\n";
//! learner.ingest(&mut corpus, None)?;
//!
//! let mut model = Vec::new();
//! learner.learn(&mut model, false)?;
//! assert!(model.starts_with(b"#version: 0.2\n"));
//! # Ok::<(), joinery_training::TokenizerError>(())
//! ```

pub use joinery_core::{Result, TokenizerError};

pub mod training;
pub use training::{
    BpeLearner, BpeLearnerConfig, IngestStats, LearnerState, ModelKind, PairCounter, SpmLearner,
    SubwordLearner,
};
