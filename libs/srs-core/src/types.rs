//! Core types for the review scheduler.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Recall rating submitted after a review attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rating {
    Again,
    Hard,
    Good,
    Easy,
}

impl Rating {
    /// Recall quality on the SM-2 scale.
    pub fn quality(self) -> u8 {
        match self {
            Self::Again => 0,
            Self::Hard => 3,
            Self::Good => 4,
            Self::Easy => 5,
        }
    }

    /// Create from a quality value. Accepts exactly {0, 3, 4, 5}.
    pub fn from_value(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Again),
            3 => Some(Self::Hard),
            4 => Some(Self::Good),
            5 => Some(Self::Easy),
            _ => None,
        }
    }

    /// Whether the answer counted as recalled. False only for `Again`.
    pub fn is_correct(self) -> bool {
        !matches!(self, Self::Again)
    }
}

/// Scheduling fields consumed and produced by the interval calculator.
///
/// This is the calculator's whole input: no clock, no identifiers. Due-date
/// derivation from `interval_days` happens at the storage layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReviewState {
    pub ease_factor: f64,
    pub interval_days: u32,
    pub repetitions: u32,
}

impl Default for ReviewState {
    fn default() -> Self {
        Self {
            ease_factor: 2.5,
            interval_days: 0,
            repetitions: 0,
        }
    }
}

/// Maturity bucket derived from the current interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Maturity {
    New,
    Learning,
    Review,
    Mature,
}

/// One scheduling record per (owner, subject) pair.
///
/// The engine never interprets `owner` or `subject_id`; both are opaque to
/// it. `category` is an optional catalog tag used only for query filtering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub owner: String,
    pub subject_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub ease_factor: f64,
    pub interval_days: u32,
    pub repetitions: u32,
    pub next_review_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_review_at: Option<DateTime<Utc>>,
    pub total_reviews: u32,
    pub correct_count: u32,
    pub created_at: DateTime<Utc>,
}

impl Card {
    /// Fresh card with default scheduling state, due immediately.
    pub fn new(owner: impl Into<String>, subject_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        let state = ReviewState::default();
        Self {
            owner: owner.into(),
            subject_id: subject_id.into(),
            category: None,
            ease_factor: state.ease_factor,
            interval_days: state.interval_days,
            repetitions: state.repetitions,
            next_review_at: now,
            last_review_at: None,
            total_reviews: 0,
            correct_count: 0,
            created_at: now,
        }
    }

    /// A card is new iff it has never been attempted. There is no separate
    /// flag; this predicate is the single source of truth.
    pub fn is_new(&self) -> bool {
        self.repetitions == 0 && self.total_reviews == 0
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.next_review_at <= now
    }

    pub fn maturity(&self) -> Maturity {
        if self.is_new() {
            Maturity::New
        } else if self.interval_days < 7 {
            Maturity::Learning
        } else if self.interval_days < 21 {
            Maturity::Review
        } else {
            Maturity::Mature
        }
    }

    /// Scheduling fields to feed the interval calculator.
    pub fn state(&self) -> ReviewState {
        ReviewState {
            ease_factor: self.ease_factor,
            interval_days: self.interval_days,
            repetitions: self.repetitions,
        }
    }
}

/// Projected interval in days for each rating choice, for display before the
/// learner picks one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntervalPreview {
    pub again: u32,
    pub hard: u32,
    pub good: u32,
    pub easy: u32,
}
