//! Spaced repetition scheduling engine.
//!
//! Provides:
//! - A card store keyed by (owner, subject) with an atomic review write path
//! - Due-queue selection with new-card padding
//! - Review session handling (single, batched, interval preview)
//! - Study statistics and per-day review-load forecasting
//!
//! The engine is a library, not a service: owners and subjects are opaque
//! strings supplied by the surrounding catalog layer, and every
//! time-dependent call takes an explicit `now`.

pub mod error;
pub mod queue;
pub mod session;
pub mod stats;
pub mod store;

pub use error::{EngineError, Result};
pub use queue::{BatchOptions, ReviewBatch};
pub use session::{BatchOutcome, ItemOutcome, ReviewItem, Scheduler};
pub use stats::{ForecastDay, StudyStats};
pub use store::{CardFilter, CardStore, SqliteCardStore, StoreError};

pub use srs_core::{Card, IntervalPreview, Maturity, Rating, ReviewState, SchedulingAlgorithm, Sm2};
