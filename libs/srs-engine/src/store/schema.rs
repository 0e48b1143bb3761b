//! SQLite schema definitions.

/// Complete schema for the scheduling store.
pub const SCHEMA: &str = r#"
-- One scheduling record per (owner, subject) pair
CREATE TABLE IF NOT EXISTS cards (
    owner TEXT NOT NULL,
    subject_id TEXT NOT NULL,
    category TEXT,
    ease_factor REAL NOT NULL DEFAULT 2.5,
    interval_days INTEGER NOT NULL DEFAULT 0,
    repetitions INTEGER NOT NULL DEFAULT 0,
    next_review_at TEXT NOT NULL,
    last_review_at TEXT,
    total_reviews INTEGER NOT NULL DEFAULT 0,
    correct_count INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    PRIMARY KEY (owner, subject_id)
);

-- Indexes
CREATE INDEX IF NOT EXISTS idx_cards_owner_due ON cards(owner, next_review_at);
CREATE INDEX IF NOT EXISTS idx_cards_owner_category ON cards(owner, category);
"#;
