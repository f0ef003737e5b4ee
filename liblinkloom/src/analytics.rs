//! Activity analytics
//!
//! Read-only counts derived from the ledger and the generation counters.
//! The derivation is a pure function recomputed on every read; nothing is
//! cached and nothing is mutated.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::Serialize;
use std::sync::Arc;

use crate::error::Result;
use crate::ledger::{Ledger, PostRecord, PostStatus};
use crate::store::{keys, KvStore};

/// Counts shown on the activity dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivitySnapshot {
    pub total_posts: usize,
    /// Posts created, or scheduled to go out, in the current calendar month.
    pub posts_this_month: usize,
    pub scheduled: usize,
    pub published: usize,
    pub content_generated: u64,
    pub ideas_generated: u64,
}

/// Pure derivation over a ledger snapshot and the two counters.
pub fn summarize(
    records: &[PostRecord],
    now: DateTime<Utc>,
    content_generated: u64,
    ideas_generated: u64,
) -> ActivitySnapshot {
    let in_current_month = |record: &PostRecord| {
        if let Some(created) = DateTime::from_timestamp(record.created_at, 0) {
            if created.year() == now.year() && created.month() == now.month() {
                return true;
            }
        }
        if let Some(date) = &record.scheduled_date {
            if let Ok(parsed) = NaiveDate::parse_from_str(date, "%Y-%m-%d") {
                return parsed.year() == now.year() && parsed.month() == now.month();
            }
        }
        false
    };

    ActivitySnapshot {
        total_posts: records.len(),
        posts_this_month: records.iter().filter(|r| in_current_month(r)).count(),
        scheduled: records
            .iter()
            .filter(|r| r.status == PostStatus::Scheduled)
            .count(),
        published: records
            .iter()
            .filter(|r| r.status == PostStatus::Published)
            .count(),
        content_generated,
        ideas_generated,
    }
}

/// Dashboard reader over the ledger and the persisted counters.
pub struct Analytics {
    ledger: Ledger,
    store: Arc<dyn KvStore>,
}

impl Analytics {
    pub fn new(ledger: Ledger, store: Arc<dyn KvStore>) -> Self {
        Self { ledger, store }
    }

    pub async fn snapshot(&self) -> Result<ActivitySnapshot> {
        let records = self.ledger.all().await?;
        let content_generated = self.counter(keys::CONTENT_GENERATED).await?;
        let ideas_generated = self.counter(keys::IDEAS_GENERATED).await?;

        Ok(summarize(
            &records,
            Utc::now(),
            content_generated,
            ideas_generated,
        ))
    }

    async fn counter(&self, key: &str) -> Result<u64> {
        Ok(self
            .store
            .get(key)
            .await?
            .and_then(|v| v.parse().ok())
            .unwrap_or(0))
    }
}
