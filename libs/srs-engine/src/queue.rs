//! Due-queue selection: compose store queries into a review batch.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use srs_core::types::Card;

use crate::store::{CardFilter, CardStore, StoreError};

/// Options controlling batch selection.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BatchOptions {
    /// Overall batch size cap.
    pub limit: usize,
    /// Whether to pad the batch with never-attempted cards.
    pub include_new: bool,
    /// Cap on new cards, applied on top of the remaining room.
    pub new_limit: usize,
    #[serde(default)]
    pub filter: CardFilter,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            limit: 200,
            include_new: true,
            new_limit: 20,
            filter: CardFilter::default(),
        }
    }
}

/// A prioritized review batch: due cards first, then new material.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewBatch {
    pub due: Vec<Card>,
    pub new: Vec<Card>,
}

impl ReviewBatch {
    pub fn len(&self) -> usize {
        self.due.len() + self.new.len()
    }

    pub fn is_empty(&self) -> bool {
        self.due.is_empty() && self.new.is_empty()
    }
}

/// Due material has priority: new cards only fill whatever room the due
/// query left, capped by `new_limit`.
pub(crate) fn select_batch<S: CardStore + ?Sized>(
    store: &S,
    owner: &str,
    options: &BatchOptions,
    now: DateTime<Utc>,
) -> Result<ReviewBatch, StoreError> {
    let due = store.find_due(owner, &options.filter, options.limit, now)?;
    let mut batch = ReviewBatch {
        due,
        new: Vec::new(),
    };

    if options.include_new && batch.due.len() < options.limit {
        let room = (options.limit - batch.due.len()).min(options.new_limit);
        if room > 0 {
            batch.new = store.find_new(owner, &options.filter, room)?;
        }
    }

    Ok(batch)
}
