//! SQLite implementation of the card store.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use srs_core::types::{Card, ReviewState};

use super::{CardFilter, CardStore, StoreError, StoreTotals};

type Result<T> = std::result::Result<T, StoreError>;

/// Card store backed by an embedded SQLite database.
///
/// The connection sits behind a mutex so one store can be shared across
/// threads; every trait method runs its statements under a single
/// acquisition.
#[derive(Clone)]
pub struct SqliteCardStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteCardStore {
    /// Open a database at `path`, creating the schema if necessary.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path.as_ref())?;
        let store = Self::from_connection(conn)?;
        tracing::debug!(path = %path.as_ref().display(), "opened card store");
        Ok(store)
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(super::schema::SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn acquire(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("store lock")
    }

    fn get_with(conn: &Connection, owner: &str, subject_id: &str) -> Result<Option<Card>> {
        let row = conn
            .query_row(
                "SELECT owner, subject_id, category, ease_factor, interval_days, repetitions,
                        next_review_at, last_review_at, total_reviews, correct_count, created_at
                 FROM cards
                 WHERE owner = ?1 AND subject_id = ?2",
                params![owner, subject_id],
                Self::row_to_card,
            )
            .optional()?;

        row.map(CardRow::into_card).transpose()
    }

    fn row_to_card(row: &rusqlite::Row) -> rusqlite::Result<CardRow> {
        Ok(CardRow {
            owner: row.get(0)?,
            subject_id: row.get(1)?,
            category: row.get(2)?,
            ease_factor: row.get(3)?,
            interval_days: row.get(4)?,
            repetitions: row.get(5)?,
            next_review_at: row.get(6)?,
            last_review_at: row.get(7)?,
            total_reviews: row.get(8)?,
            correct_count: row.get(9)?,
            created_at: row.get(10)?,
        })
    }
}

/// Row image with timestamps still in their stored text form.
struct CardRow {
    owner: String,
    subject_id: String,
    category: Option<String>,
    ease_factor: f64,
    interval_days: u32,
    repetitions: u32,
    next_review_at: String,
    last_review_at: Option<String>,
    total_reviews: u32,
    correct_count: u32,
    created_at: String,
}

impl CardRow {
    fn into_card(self) -> Result<Card> {
        Ok(Card {
            owner: self.owner,
            subject_id: self.subject_id,
            category: self.category,
            ease_factor: self.ease_factor,
            interval_days: self.interval_days,
            repetitions: self.repetitions,
            next_review_at: parse_timestamp(&self.next_review_at)?,
            last_review_at: self.last_review_at.as_deref().map(parse_timestamp).transpose()?,
            total_reviews: self.total_reviews,
            correct_count: self.correct_count,
            created_at: parse_timestamp(&self.created_at)?,
        })
    }
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|err| StoreError::InvalidData(format!("bad timestamp {value:?}: {err}")))
}

impl CardStore for SqliteCardStore {
    fn get(&self, owner: &str, subject_id: &str) -> Result<Option<Card>> {
        let conn = self.acquire();
        Self::get_with(&conn, owner, subject_id)
    }

    fn register(
        &self,
        owner: &str,
        subject_id: &str,
        category: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Card> {
        let now_str = now.to_rfc3339();
        let conn = self.acquire();
        conn.execute(
            "INSERT OR IGNORE INTO cards (owner, subject_id, category, next_review_at, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![owner, subject_id, category, now_str, now_str],
        )?;

        Self::get_with(&conn, owner, subject_id)?
            .ok_or_else(|| StoreError::NotFound(subject_id.to_string()))
    }

    fn find_due(
        &self,
        owner: &str,
        filter: &CardFilter,
        limit: usize,
        now: DateTime<Utc>,
    ) -> Result<Vec<Card>> {
        let now_str = now.to_rfc3339();
        let conn = self.acquire();

        let rows = match filter.category.as_deref() {
            Some(category) => {
                let mut stmt = conn.prepare(
                    "SELECT owner, subject_id, category, ease_factor, interval_days, repetitions,
                            next_review_at, last_review_at, total_reviews, correct_count, created_at
                     FROM cards
                     WHERE owner = ?1 AND category = ?2 AND next_review_at <= ?3
                       AND NOT (repetitions = 0 AND total_reviews = 0)
                     ORDER BY next_review_at, repetitions
                     LIMIT ?4",
                )?;
                let rows = stmt.query_map(
                    params![owner, category, now_str, limit as i64],
                    Self::row_to_card,
                )?;
                rows.collect::<rusqlite::Result<Vec<_>>>()?
            }
            None => {
                let mut stmt = conn.prepare(
                    "SELECT owner, subject_id, category, ease_factor, interval_days, repetitions,
                            next_review_at, last_review_at, total_reviews, correct_count, created_at
                     FROM cards
                     WHERE owner = ?1 AND next_review_at <= ?2
                       AND NOT (repetitions = 0 AND total_reviews = 0)
                     ORDER BY next_review_at, repetitions
                     LIMIT ?3",
                )?;
                let rows =
                    stmt.query_map(params![owner, now_str, limit as i64], Self::row_to_card)?;
                rows.collect::<rusqlite::Result<Vec<_>>>()?
            }
        };

        rows.into_iter().map(CardRow::into_card).collect()
    }

    fn find_new(&self, owner: &str, filter: &CardFilter, limit: usize) -> Result<Vec<Card>> {
        let conn = self.acquire();

        let rows = match filter.category.as_deref() {
            Some(category) => {
                let mut stmt = conn.prepare(
                    "SELECT owner, subject_id, category, ease_factor, interval_days, repetitions,
                            next_review_at, last_review_at, total_reviews, correct_count, created_at
                     FROM cards
                     WHERE owner = ?1 AND category = ?2
                       AND repetitions = 0 AND total_reviews = 0
                     ORDER BY created_at
                     LIMIT ?3",
                )?;
                let rows =
                    stmt.query_map(params![owner, category, limit as i64], Self::row_to_card)?;
                rows.collect::<rusqlite::Result<Vec<_>>>()?
            }
            None => {
                let mut stmt = conn.prepare(
                    "SELECT owner, subject_id, category, ease_factor, interval_days, repetitions,
                            next_review_at, last_review_at, total_reviews, correct_count, created_at
                     FROM cards
                     WHERE owner = ?1 AND repetitions = 0 AND total_reviews = 0
                     ORDER BY created_at
                     LIMIT ?2",
                )?;
                let rows = stmt.query_map(params![owner, limit as i64], Self::row_to_card)?;
                rows.collect::<rusqlite::Result<Vec<_>>>()?
            }
        };

        rows.into_iter().map(CardRow::into_card).collect()
    }

    fn apply_review(
        &self,
        owner: &str,
        subject_id: &str,
        next: &ReviewState,
        rating_correct: bool,
        now: DateTime<Utc>,
    ) -> Result<Card> {
        let now_str = now.to_rfc3339();
        let next_review_at = (now + Duration::days(i64::from(next.interval_days))).to_rfc3339();
        let correct_delta = i64::from(rating_correct);

        let conn = self.acquire();
        conn.execute(
            "INSERT INTO cards (owner, subject_id, ease_factor, interval_days, repetitions,
                                next_review_at, last_review_at, total_reviews, correct_count, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 1, ?8, ?9)
             ON CONFLICT(owner, subject_id) DO UPDATE SET
                 ease_factor = excluded.ease_factor,
                 interval_days = excluded.interval_days,
                 repetitions = excluded.repetitions,
                 next_review_at = excluded.next_review_at,
                 last_review_at = excluded.last_review_at,
                 total_reviews = cards.total_reviews + 1,
                 correct_count = cards.correct_count + ?8",
            params![
                owner,
                subject_id,
                next.ease_factor,
                next.interval_days,
                next.repetitions,
                next_review_at,
                now_str,
                correct_delta,
                now_str,
            ],
        )?;

        Self::get_with(&conn, owner, subject_id)?
            .ok_or_else(|| StoreError::NotFound(subject_id.to_string()))
    }

    fn reset(&self, owner: &str, subject_id: &str, now: DateTime<Utc>) -> Result<Card> {
        let defaults = ReviewState::default();
        let conn = self.acquire();
        let changed = conn.execute(
            "UPDATE cards
             SET ease_factor = ?3, interval_days = ?4, repetitions = ?5,
                 next_review_at = ?6, last_review_at = NULL,
                 total_reviews = 0, correct_count = 0
             WHERE owner = ?1 AND subject_id = ?2",
            params![
                owner,
                subject_id,
                defaults.ease_factor,
                defaults.interval_days,
                defaults.repetitions,
                now.to_rfc3339(),
            ],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(subject_id.to_string()));
        }

        Self::get_with(&conn, owner, subject_id)?
            .ok_or_else(|| StoreError::NotFound(subject_id.to_string()))
    }

    fn reset_all(&self, owner: &str, now: DateTime<Utc>) -> Result<usize> {
        let defaults = ReviewState::default();
        let conn = self.acquire();
        let changed = conn.execute(
            "UPDATE cards
             SET ease_factor = ?2, interval_days = ?3, repetitions = ?4,
                 next_review_at = ?5, last_review_at = NULL,
                 total_reviews = 0, correct_count = 0
             WHERE owner = ?1",
            params![
                owner,
                defaults.ease_factor,
                defaults.interval_days,
                defaults.repetitions,
                now.to_rfc3339(),
            ],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(owner.to_string()));
        }
        Ok(changed)
    }

    fn totals(&self, owner: &str, now: DateTime<Utc>, day_start: DateTime<Utc>) -> Result<StoreTotals> {
        let conn = self.acquire();
        let totals = conn.query_row(
            "SELECT
                COUNT(*),
                COALESCE(SUM(CASE WHEN repetitions = 0 AND total_reviews = 0 THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN next_review_at <= ?2
                                   AND NOT (repetitions = 0 AND total_reviews = 0)
                              THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN total_reviews > 0 AND interval_days < 7 THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN interval_days >= 7 AND interval_days < 21 THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN interval_days >= 21 THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(total_reviews), 0),
                COALESCE(SUM(correct_count), 0),
                COALESCE(SUM(CASE WHEN last_review_at >= ?3 THEN 1 ELSE 0 END), 0)
             FROM cards
             WHERE owner = ?1",
            params![owner, now.to_rfc3339(), day_start.to_rfc3339()],
            |row| {
                Ok(StoreTotals {
                    total: row.get(0)?,
                    new: row.get(1)?,
                    due: row.get(2)?,
                    learning: row.get(3)?,
                    review: row.get(4)?,
                    mature: row.get(5)?,
                    attempts: row.get(6)?,
                    correct: row.get(7)?,
                    reviewed_today: row.get(8)?,
                })
            },
        )?;
        Ok(totals)
    }

    fn due_counts_by_day(
        &self,
        owner: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<(NaiveDate, u32)>> {
        let conn = self.acquire();
        let mut stmt = conn.prepare(
            "SELECT date(next_review_at), COUNT(*)
             FROM cards
             WHERE owner = ?1 AND next_review_at >= ?2 AND next_review_at < ?3
             GROUP BY date(next_review_at)
             ORDER BY date(next_review_at)",
        )?;
        let rows = stmt.query_map(
            params![owner, from.to_rfc3339(), to.to_rfc3339()],
            |row| Ok((row.get::<_, String>(0)?, row.get::<_, u32>(1)?)),
        )?;

        let mut counts = Vec::new();
        for row in rows {
            let (day, count) = row?;
            let date = NaiveDate::parse_from_str(&day, "%Y-%m-%d")
                .map_err(|err| StoreError::InvalidData(format!("bad day bucket {day:?}: {err}")))?;
            counts.push((date, count));
        }
        Ok(counts)
    }
}
