//! End-to-end review flow tests against an in-memory store.

use std::sync::Arc;
use std::thread;

use chrono::{DateTime, Duration, TimeZone, Utc};
use pretty_assertions::assert_eq;
use srs_engine::{
    BatchOptions, CardStore, Maturity, Rating, ReviewItem, Scheduler, SqliteCardStore,
};

fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
}

fn scheduler() -> Scheduler<SqliteCardStore> {
    Scheduler::new(SqliteCardStore::open_in_memory().unwrap())
}

/// Three good reviews walk the SM-2 bootstrap: 1 day, 6 days, then the ease
/// multiple (6 × 2.5 = 15).
#[test]
fn bootstrap_interval_walk() {
    let scheduler = scheduler();
    let mut now = at(2026, 3, 1, 9);

    let card = scheduler.review("ana", "w:haus", Rating::Good, now).unwrap();
    assert_eq!(card.interval_days, 1);

    now = now + Duration::days(1);
    let card = scheduler.review("ana", "w:haus", Rating::Good, now).unwrap();
    assert_eq!(card.interval_days, 6);

    now = now + Duration::days(6);
    let card = scheduler.review("ana", "w:haus", Rating::Good, now).unwrap();
    assert_eq!(card.interval_days, 15);
    assert_eq!(card.ease_factor, 2.5);
    assert_eq!(card.repetitions, 3);
    assert_eq!(card.next_review_at, now + Duration::days(15));
}

/// A lapse collapses streak and interval but keeps history counters.
#[test]
fn fail_then_recover_walk() {
    let scheduler = scheduler();
    let now = at(2026, 3, 1, 9);

    let card = scheduler.review("ana", "w:haus", Rating::Good, now).unwrap();
    assert_eq!((card.repetitions, card.interval_days), (1, 1));

    let card = scheduler
        .review("ana", "w:haus", Rating::Again, now + Duration::days(1))
        .unwrap();
    assert_eq!((card.repetitions, card.interval_days), (0, 1));

    let card = scheduler
        .review("ana", "w:haus", Rating::Good, now + Duration::days(2))
        .unwrap();
    assert_eq!((card.repetitions, card.interval_days), (1, 1));
    assert_eq!(card.total_reviews, 3);
    assert_eq!(card.correct_count, 2);
}

/// Interval classification drives the maturity buckets learners see.
#[test]
fn maturity_progression() {
    let scheduler = scheduler();
    let mut now = at(2026, 3, 1, 9);

    let card = scheduler.review("ana", "w:haus", Rating::Good, now).unwrap();
    assert_eq!(card.maturity(), Maturity::Learning);

    now = now + Duration::days(1);
    let card = scheduler.review("ana", "w:haus", Rating::Good, now).unwrap();
    assert_eq!(card.maturity(), Maturity::Learning);

    now = now + Duration::days(6);
    let card = scheduler.review("ana", "w:haus", Rating::Good, now).unwrap();
    assert_eq!(card.maturity(), Maturity::Review);

    now = now + Duration::days(15);
    let card = scheduler.review("ana", "w:haus", Rating::Good, now).unwrap();
    assert!(card.interval_days >= 21);
    assert_eq!(card.maturity(), Maturity::Mature);
}

/// Preview never mutates: stats taken before and after are identical.
#[test]
fn preview_is_read_only() {
    let scheduler = scheduler();
    let now = at(2026, 3, 1, 9);
    scheduler.review("ana", "w:haus", Rating::Good, now).unwrap();
    scheduler.register("ana", "w:baum", None, now).unwrap();

    let before = scheduler.stats("ana", now).unwrap();
    let preview = scheduler.preview_intervals("ana", "w:haus").unwrap();
    let after = scheduler.stats("ana", now).unwrap();

    assert_eq!(preview.again, 1);
    assert_eq!(before, after);
}

/// Two threads race the very first review of one subject: the atomic upsert
/// must leave exactly one record carrying both attempts.
#[test]
fn concurrent_first_review_converges_on_one_record() {
    let scheduler = Arc::new(scheduler());
    let now = at(2026, 3, 1, 9);

    let handles: Vec<_> = (0..2)
        .map(|_| {
            let scheduler = Arc::clone(&scheduler);
            thread::spawn(move || scheduler.review("ana", "w:haus", Rating::Good, now).unwrap())
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let card = scheduler.store().get("ana", "w:haus").unwrap().unwrap();
    assert_eq!(card.total_reviews, 2);
    assert_eq!(card.correct_count, 2);

    let stats = scheduler.stats("ana", now).unwrap();
    assert_eq!(stats.total, 1);
}

/// Batch submissions report per-item outcomes and never abort midway.
#[test]
fn batch_review_with_partial_failure() {
    let scheduler = scheduler();
    let now = at(2026, 3, 1, 9);

    let items = vec![
        ReviewItem {
            subject_id: "w:haus".into(),
            rating: 4,
        },
        ReviewItem {
            subject_id: "w:baum".into(),
            rating: 9,
        },
        ReviewItem {
            subject_id: "w:hund".into(),
            rating: 5,
        },
    ];
    let outcome = scheduler.batch_review("ana", &items, now);

    assert_eq!(outcome.reviewed, 2);
    assert_eq!(outcome.failed, 1);
    assert_eq!(outcome.items.len(), 3);
    assert!(outcome.items[1].error.is_some());

    let stats = scheduler.stats("ana", now).unwrap();
    assert_eq!(stats.total, 2);
}

/// Registered material flows new → due across the selector as it gets
/// reviewed and comes back around.
#[test]
fn batch_selection_lifecycle() {
    let scheduler = scheduler();
    let now = at(2026, 3, 1, 9);
    for subject in ["w:eins", "w:zwei", "w:drei"] {
        scheduler.register("ana", subject, Some("numbers"), now).unwrap();
    }

    let options = BatchOptions {
        limit: 10,
        include_new: true,
        new_limit: 10,
        ..BatchOptions::default()
    };

    let batch = scheduler.select_batch("ana", &options, now).unwrap();
    assert!(batch.due.is_empty());
    assert_eq!(batch.new.len(), 3);

    // Review everything; the next day it all comes due.
    for subject in ["w:eins", "w:zwei", "w:drei"] {
        scheduler.review("ana", subject, Rating::Good, now).unwrap();
    }
    let tomorrow = now + Duration::days(1);
    let batch = scheduler.select_batch("ana", &options, tomorrow).unwrap();
    assert_eq!(batch.due.len(), 3);
    assert!(batch.new.is_empty());
}

/// Forecast buckets upcoming load per calendar day.
#[test]
fn forecast_matches_scheduled_intervals() {
    let scheduler = scheduler();
    let now = at(2026, 3, 1, 9);

    scheduler.review("ana", "w:haus", Rating::Good, now).unwrap(); // due in 1 day
    scheduler.review("ana", "w:baum", Rating::Good, now).unwrap(); // due in 1 day
    scheduler.review("ana", "w:hund", Rating::Good, now).unwrap();
    let card = scheduler
        .review("ana", "w:hund", Rating::Good, now + Duration::hours(1))
        .unwrap(); // second success: due in 6 days
    assert_eq!(card.interval_days, 6);

    let days = scheduler.forecast("ana", 8, now).unwrap();
    let counts: Vec<u32> = days.iter().map(|d| d.count).collect();
    assert_eq!(counts, vec![0, 2, 0, 0, 0, 0, 1, 0]);
}

/// Reset drops a card back to new and clears its history.
#[test]
fn reset_returns_card_to_new() {
    let scheduler = scheduler();
    let now = at(2026, 3, 1, 9);
    scheduler.review("ana", "w:haus", Rating::Good, now).unwrap();
    scheduler.review("ana", "w:baum", Rating::Good, now).unwrap();

    let card = scheduler.reset("ana", "w:haus", now).unwrap();
    assert!(card.is_new());

    let stats = scheduler.stats("ana", now).unwrap();
    assert_eq!(stats.new, 1);
    assert_eq!(stats.total, 2);

    assert_eq!(scheduler.reset_all("ana", now).unwrap(), 2);
    let stats = scheduler.stats("ana", now).unwrap();
    assert_eq!(stats.new, 2);
    assert_eq!(stats.retention_rate, 0.0);
}

/// Cards serialize with snake_case fields and RFC 3339 timestamps.
#[test]
fn card_wire_shape() {
    let scheduler = scheduler();
    let now = at(2026, 3, 1, 9);
    let card = scheduler.review("ana", "w:haus", Rating::Good, now).unwrap();

    let json = serde_json::to_value(&card).unwrap();
    assert_eq!(json["owner"], "ana");
    assert_eq!(json["subject_id"], "w:haus");
    assert_eq!(json["interval_days"], 1);
    assert_eq!(json["total_reviews"], 1);
    assert!(json.get("category").is_none());
    assert!(json["next_review_at"].as_str().unwrap().starts_with("2026-03-02T"));
}
