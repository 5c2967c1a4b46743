//! Subword learners.
//!
//! [`BpeLearner`] learns merge tables in-process; [`SpmLearner`] stages
//! text and delegates to the SentencePiece trainer program.

pub mod counter;
pub mod learner;
pub mod spm;
pub mod trainer;

pub use counter::PairCounter;
pub use learner::{IngestStats, LearnerState, ModelKind, SubwordLearner};
pub use spm::SpmLearner;
pub use trainer::{BpeLearner, BpeLearnerConfig};
