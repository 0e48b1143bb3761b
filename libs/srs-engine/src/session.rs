//! Review session orchestration.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use srs_core::algorithm::{sm2::Sm2, SchedulingAlgorithm};
use srs_core::types::{Card, IntervalPreview, Rating};

use crate::error::{EngineError, Result};
use crate::queue::{self, BatchOptions, ReviewBatch};
use crate::stats::{self, ForecastDay, StudyStats};
use crate::store::CardStore;

/// One entry of a batched review submission. The rating arrives as its raw
/// wire value and is validated per item.
#[derive(Debug, Clone, Deserialize)]
pub struct ReviewItem {
    pub subject_id: String,
    pub rating: u8,
}

/// Result of one batch entry. Exactly one of `card` / `error` is set.
#[derive(Debug, Clone, Serialize)]
pub struct ItemOutcome {
    pub subject_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card: Option<Card>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Per-item outcomes of a batch submission; item failures never abort the
/// rest of the batch.
#[derive(Debug, Clone, Serialize)]
pub struct BatchOutcome {
    pub reviewed: usize,
    pub failed: usize,
    pub items: Vec<ItemOutcome>,
}

/// The scheduling engine's entry point: owns a card store and an interval
/// calculator, and exposes the whole review surface.
///
/// Every time-dependent operation takes an explicit `now` so behavior stays
/// deterministic under test; hosts pass `Utc::now()`.
pub struct Scheduler<S> {
    store: S,
    algorithm: Box<dyn SchedulingAlgorithm>,
}

impl<S: CardStore> Scheduler<S> {
    /// Scheduler with the default SM-2 calculator.
    pub fn new(store: S) -> Self {
        Self::with_algorithm(store, Box::new(Sm2::default()))
    }

    pub fn with_algorithm(store: S, algorithm: Box<dyn SchedulingAlgorithm>) -> Self {
        Self { store, algorithm }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Pre-seed a card so it enters the new queue; idempotent.
    pub fn register(
        &self,
        owner: &str,
        subject_id: &str,
        category: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Card> {
        let card = self.store.register(owner, subject_id, category, now)?;
        tracing::debug!(owner, subject_id, "registered card");
        Ok(card)
    }

    /// Prioritized review batch: due cards first, padded with new material.
    pub fn select_batch(
        &self,
        owner: &str,
        options: &BatchOptions,
        now: DateTime<Utc>,
    ) -> Result<ReviewBatch> {
        Ok(queue::select_batch(&self.store, owner, options, now)?)
    }

    /// Grade one recall attempt and persist the recomputed schedule.
    ///
    /// A never-seen subject goes through the same path with default state;
    /// the store's atomic upsert creates the record. Safe to retry on a
    /// storage conflict, since the state is recomputed from a fresh read.
    pub fn review(
        &self,
        owner: &str,
        subject_id: &str,
        rating: Rating,
        now: DateTime<Utc>,
    ) -> Result<Card> {
        let current = match self.store.get(owner, subject_id)? {
            Some(card) => card.state(),
            None => self.algorithm.initial_state(),
        };

        let next = self.algorithm.next_state(&current, rating);
        let card = self
            .store
            .apply_review(owner, subject_id, &next, rating.is_correct(), now)?;

        tracing::debug!(
            owner,
            subject_id,
            rating = ?rating,
            interval_days = card.interval_days,
            ease_factor = card.ease_factor,
            "applied review"
        );
        Ok(card)
    }

    /// Review many subjects in one call with per-item isolation: an invalid
    /// rating or storage failure marks that item failed and moves on.
    pub fn batch_review(
        &self,
        owner: &str,
        items: &[ReviewItem],
        now: DateTime<Utc>,
    ) -> BatchOutcome {
        let mut outcome = BatchOutcome {
            reviewed: 0,
            failed: 0,
            items: Vec::with_capacity(items.len()),
        };

        for item in items {
            let result = Rating::from_value(item.rating)
                .ok_or(EngineError::InvalidRating(item.rating))
                .and_then(|rating| self.review(owner, &item.subject_id, rating, now));

            match result {
                Ok(card) => {
                    outcome.reviewed += 1;
                    outcome.items.push(ItemOutcome {
                        subject_id: item.subject_id.clone(),
                        card: Some(card),
                        error: None,
                    });
                }
                Err(err) => {
                    tracing::warn!(
                        owner,
                        subject_id = %item.subject_id,
                        error = %err,
                        "batch item failed"
                    );
                    outcome.failed += 1;
                    outcome.items.push(ItemOutcome {
                        subject_id: item.subject_id.clone(),
                        card: None,
                        error: Some(err.to_string()),
                    });
                }
            }
        }

        outcome
    }

    /// What each rating choice would do to this card's interval. Read-only.
    pub fn preview_intervals(&self, owner: &str, subject_id: &str) -> Result<IntervalPreview> {
        let state = match self.store.get(owner, subject_id)? {
            Some(card) => card.state(),
            None => self.algorithm.initial_state(),
        };
        Ok(self.algorithm.preview(&state))
    }

    pub fn stats(&self, owner: &str, now: DateTime<Utc>) -> Result<StudyStats> {
        Ok(stats::study_stats(&self.store, owner, now)?)
    }

    pub fn forecast(&self, owner: &str, days: usize, now: DateTime<Utc>) -> Result<Vec<ForecastDay>> {
        Ok(stats::forecast(&self.store, owner, days, now)?)
    }

    /// Restore one card to default scheduling state.
    pub fn reset(&self, owner: &str, subject_id: &str, now: DateTime<Utc>) -> Result<Card> {
        let card = self.store.reset(owner, subject_id, now)?;
        tracing::info!(owner, subject_id, "reset card");
        Ok(card)
    }

    /// Restore every card the owner has; returns how many were reset.
    pub fn reset_all(&self, owner: &str, now: DateTime<Utc>) -> Result<usize> {
        let count = self.store.reset_all(owner, now)?;
        tracing::info!(owner, count, "reset all cards");
        Ok(count)
    }
}
