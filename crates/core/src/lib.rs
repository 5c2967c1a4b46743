//! Joinery-core - Shared building blocks of the joinery tokenizer
//!
//! This crate provides the data structures used by both the tokenizer and
//! the subword learners, independent of any tokenization mode.
//!
//! # Features
//!
//! - Annotated [`Token`]s and letter [`Casing`]
//! - Script classification of characters ([`Alphabet`], [`CharClass`])
//! - BPE merge tables in the `#version: 0.2` text format
//! - Training priority queue with first-seen tie-breaking
//! - Vocabulary filters restricting subword output
//!
//! # Example
//!
//! ```rust
//! use joinery_core::{Alphabet, Casing, MergeTable, BpeVersion};
//!
//! assert_eq!(Alphabet::of('λ'), Alphabet::Greek);
//! assert_eq!(Casing::of("Hello"), Casing::Capitalized);
//!
//! let mut merges = MergeTable::new(BpeVersion::V02);
//! merges.push("h", "e");
//! assert_eq!(merges.rank("h", "e"), Some(0));
//! ```

pub mod error;
pub use error::{Result, TokenizerError};

pub mod alphabet;
pub use alphabet::{Alphabet, CharClass};

pub mod markers;

pub mod token;
pub use token::{Casing, PreTokenize, Token};

// BPE data structures
pub mod core;
pub use core::{
    BpeVersion, MergeCandidate, MergeStats, MergeTable, PairPriorityQueue, SymbolPair,
    SymbolTable, VocabularyFilter, VERSION_HEADER,
};
