//! Shared helpers for the subword encoders.

pub mod cache;

pub use cache::SegmentCache;
