//! Core BPE data structures.
//!
//! Merge tables, the training priority queue, symbol interning and
//! vocabulary filtering, independent of any tokenization mode.

pub mod merges;
pub mod priority;
pub mod vocab;

pub use merges::{BpeVersion, MergeStats, MergeTable, VERSION_HEADER};
pub use priority::{MergeCandidate, PairPriorityQueue, SymbolPair};
pub use vocab::{SymbolTable, VocabularyFilter};
