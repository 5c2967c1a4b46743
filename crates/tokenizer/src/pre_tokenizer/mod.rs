//! Pre-tokenization pipeline.
//!
//! Raw text goes through [`Splitter`] (mode-driven split), [`Segmenter`]
//! (case, digit and alphabet transitions) and optionally case markup before
//! any subword model sees it.

pub mod case;
pub mod normalize;
pub mod placeholder;
pub mod segment;
pub mod split;

pub use case::{apply_case_markup, CaseMarker};
pub use normalize::{NormalizationForm, Normalizer};
pub use segment::Segmenter;
pub use split::Splitter;
