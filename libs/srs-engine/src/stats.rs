//! Statistics and review-load forecasting.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::Serialize;

use crate::store::{CardStore, StoreError};

/// Aggregate study statistics for one owner.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudyStats {
    pub total: u32,
    pub due: u32,
    pub new: u32,
    pub learning: u32,
    pub review: u32,
    pub mature: u32,
    /// Lifetime correct reviews over all reviews, in percent with one
    /// decimal. 0.0 when nothing has been reviewed yet.
    pub retention_rate: f64,
    pub reviewed_today: u32,
}

/// Review load expected on one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForecastDay {
    pub date: NaiveDate,
    pub count: u32,
}

pub(crate) fn study_stats<S: CardStore + ?Sized>(
    store: &S,
    owner: &str,
    now: DateTime<Utc>,
) -> Result<StudyStats, StoreError> {
    let day_start = now.date_naive().and_time(NaiveTime::MIN).and_utc();
    let totals = store.totals(owner, now, day_start)?;

    let retention_rate = if totals.attempts == 0 {
        0.0
    } else {
        round_percent(totals.correct as f64 / totals.attempts as f64 * 100.0)
    };

    Ok(StudyStats {
        total: totals.total,
        due: totals.due,
        new: totals.new,
        learning: totals.learning,
        review: totals.review,
        mature: totals.mature,
        retention_rate,
        reviewed_today: totals.reviewed_today,
    })
}

/// Per-day due counts over the next `days` calendar days, starting today.
/// One grouped store query, zero-filled here; cost scales with `days`.
pub(crate) fn forecast<S: CardStore + ?Sized>(
    store: &S,
    owner: &str,
    days: usize,
    now: DateTime<Utc>,
) -> Result<Vec<ForecastDay>, StoreError> {
    if days == 0 {
        return Ok(Vec::new());
    }

    let start = now.date_naive();
    let from = start.and_time(NaiveTime::MIN).and_utc();
    let to = (start + Duration::days(days as i64))
        .and_time(NaiveTime::MIN)
        .and_utc();

    let counts: BTreeMap<NaiveDate, u32> =
        store.due_counts_by_day(owner, from, to)?.into_iter().collect();

    Ok((0..days)
        .map(|offset| {
            let date = start + Duration::days(offset as i64);
            ForecastDay {
                date,
                count: counts.get(&date).copied().unwrap_or(0),
            }
        })
        .collect())
}

/// Round to one decimal place.
fn round_percent(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
