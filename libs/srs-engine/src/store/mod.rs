//! Persistence for per-(owner, subject) scheduling state.

pub mod error;
pub mod schema;
pub mod sqlite;

pub use error::StoreError;
pub use sqlite::SqliteCardStore;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use srs_core::types::{Card, ReviewState};

type Result<T> = std::result::Result<T, StoreError>;

/// Filter applied identically to due and new queries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl CardFilter {
    pub fn category(category: impl Into<String>) -> Self {
        Self {
            category: Some(category.into()),
        }
    }
}

/// Aggregate counters for one owner, computed store-side in a single query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreTotals {
    pub total: u32,
    pub new: u32,
    pub due: u32,
    pub learning: u32,
    pub review: u32,
    pub mature: u32,
    pub attempts: u64,
    pub correct: u64,
    pub reviewed_today: u32,
}

/// Storage contract for scheduling records.
///
/// `apply_review` is the one write path reviews go through and must be a
/// single atomic upsert keyed by (owner, subject_id): counter increments are
/// computed against the stored row, not the caller's snapshot, so concurrent
/// first reviews of an unseen subject converge on one record.
pub trait CardStore: Send + Sync {
    fn get(&self, owner: &str, subject_id: &str) -> Result<Option<Card>>;

    /// Pre-seed a card so it is immediately due and shows up in the new
    /// queue. Idempotent: an existing record is left untouched.
    fn register(
        &self,
        owner: &str,
        subject_id: &str,
        category: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Card>;

    /// Cards with `next_review_at <= now`, excluding never-attempted cards.
    /// Ordered by due date, then by repetitions so struggling cards surface
    /// first.
    fn find_due(
        &self,
        owner: &str,
        filter: &CardFilter,
        limit: usize,
        now: DateTime<Utc>,
    ) -> Result<Vec<Card>>;

    /// Never-attempted cards, oldest registration first.
    fn find_new(&self, owner: &str, filter: &CardFilter, limit: usize) -> Result<Vec<Card>>;

    /// Atomic upsert of the computed scheduling state plus counter bumps.
    fn apply_review(
        &self,
        owner: &str,
        subject_id: &str,
        next: &ReviewState,
        rating_correct: bool,
        now: DateTime<Utc>,
    ) -> Result<Card>;

    /// Restore default scheduling state for one card.
    fn reset(&self, owner: &str, subject_id: &str, now: DateTime<Utc>) -> Result<Card>;

    /// Restore default scheduling state for every card the owner has.
    /// Returns the number of cards reset.
    fn reset_all(&self, owner: &str, now: DateTime<Utc>) -> Result<usize>;

    /// Aggregate counters for stats. `day_start` bounds `reviewed_today`.
    fn totals(&self, owner: &str, now: DateTime<Utc>, day_start: DateTime<Utc>) -> Result<StoreTotals>;

    /// Due-card counts grouped per calendar day over `[from, to)`. Days with
    /// no due cards are omitted.
    fn due_counts_by_day(
        &self,
        owner: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<(NaiveDate, u32)>>;
}
