//! Core scheduling library shared by the review engine and its hosts.
//!
//! Provides:
//! - The four-step recall rating scale and its SM-2 quality mapping
//! - Spaced repetition interval calculation (SM-2)
//! - Shared types (Card, ReviewState, Maturity, IntervalPreview)

pub mod algorithm;
pub mod types;

pub use algorithm::{sm2::Sm2, SchedulingAlgorithm};
pub use types::{Card, IntervalPreview, Maturity, Rating, ReviewState};
