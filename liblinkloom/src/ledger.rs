//! Durable post ledger
//!
//! The ledger is the single source of truth for posts. It is stored as one
//! JSON array under a store key, ordered by insertion, and scoped to the
//! local profile (never synced). Field names are camelCase on disk so a
//! ledger written by earlier builds of the product remains readable.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{LinkloomError, Result};
use crate::store::{keys, KvStore};

pub const PLATFORM: &str = "linkedin";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Scheduled,
    Published,
}

impl std::fmt::Display for PostStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Scheduled => write!(f, "scheduled"),
            Self::Published => write!(f, "published"),
        }
    }
}

/// One entry in the ledger.
///
/// A scheduled record carries `scheduled_date`/`scheduled_time` and neither
/// publish marker; a published record carries exactly one of
/// `linkedin_post_id` (live publish) or `is_local = true` (degraded publish).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostRecord {
    pub id: i64,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_time: Option<String>,
    pub status: PostStatus,
    pub created_at: i64,
    pub platform: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linked_in_post_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_local: Option<bool>,
    pub user_id: String,
}

impl PostRecord {
    /// Allocate a time-derived id that is unique within `existing`.
    ///
    /// Millisecond timestamps are already monotonic across user actions; the
    /// bump loop covers two records created within the same millisecond.
    pub fn next_id(existing: &[PostRecord]) -> i64 {
        let mut id = chrono::Utc::now().timestamp_millis();
        while existing.iter().any(|r| r.id == id) {
            id += 1;
        }
        id
    }
}

/// Ordered, durable collection of [`PostRecord`]s.
///
/// The ledger itself enforces only id uniqueness and insertion order.
/// Removal policy (only scheduled records may be removed through the UI) is
/// a caller obligation, not checked here.
#[derive(Clone)]
pub struct Ledger {
    store: Arc<dyn KvStore>,
}

impl Ledger {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    /// Full ordered snapshot.
    pub async fn all(&self) -> Result<Vec<PostRecord>> {
        match self.store.get(keys::POSTS).await? {
            None => Ok(Vec::new()),
            Some(json) => {
                serde_json::from_str(&json).map_err(|e| {
                    crate::error::StoreError::Corrupt {
                        key: keys::POSTS.to_string(),
                        reason: e.to_string(),
                    }
                    .into()
                })
            }
        }
    }

    /// Append a record, preserving insertion order.
    pub async fn append(&self, record: PostRecord) -> Result<()> {
        let mut records = self.all().await?;
        if records.iter().any(|r| r.id == record.id) {
            return Err(LinkloomError::InvalidInput(format!(
                "Duplicate post id: {}",
                record.id
            )));
        }
        records.push(record);
        self.persist(&records).await
    }

    /// Remove the record with the given id; silent no-op when absent.
    pub async fn remove(&self, id: i64) -> Result<()> {
        let mut records = self.all().await?;
        let before = records.len();
        records.retain(|r| r.id != id);
        if records.len() != before {
            self.persist(&records).await?;
        }
        Ok(())
    }

    /// Look up a single record by id.
    pub async fn get(&self, id: i64) -> Result<Option<PostRecord>> {
        Ok(self.all().await?.into_iter().find(|r| r.id == id))
    }

    async fn persist(&self, records: &[PostRecord]) -> Result<()> {
        let json = serde_json::to_string(records).map_err(|e| {
            crate::error::StoreError::Corrupt {
                key: keys::POSTS.to_string(),
                reason: e.to_string(),
            }
        })?;
        self.store.put(keys::POSTS, &json).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn scheduled_record(id: i64, content: &str) -> PostRecord {
        PostRecord {
            id,
            content: content.to_string(),
            scheduled_date: Some("2026-09-01".to_string()),
            scheduled_time: Some("09:00".to_string()),
            status: PostStatus::Scheduled,
            created_at: chrono::Utc::now().timestamp(),
            platform: PLATFORM.to_string(),
            linked_in_post_id: None,
            is_local: None,
            user_id: "user-1".to_string(),
        }
    }

    fn ledger() -> Ledger {
        Ledger::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn test_all_on_empty_store() {
        assert!(ledger().all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_append_preserves_insertion_order() {
        let ledger = ledger();
        for id in [30, 10, 20] {
            ledger
                .append(scheduled_record(id, &format!("post {}", id)))
                .await
                .unwrap();
        }

        let ids: Vec<i64> = ledger.all().await.unwrap().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![30, 10, 20]);
    }

    #[tokio::test]
    async fn test_append_rejects_duplicate_id() {
        let ledger = ledger();
        ledger.append(scheduled_record(1, "first")).await.unwrap();

        let result = ledger.append(scheduled_record(1, "second")).await;
        assert!(matches!(result, Err(LinkloomError::InvalidInput(_))));
        assert_eq!(ledger.all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_remove_deletes_exactly_one() {
        let ledger = ledger();
        ledger.append(scheduled_record(1, "a")).await.unwrap();
        ledger.append(scheduled_record(2, "b")).await.unwrap();
        ledger.append(scheduled_record(3, "c")).await.unwrap();

        ledger.remove(2).await.unwrap();

        let ids: Vec<i64> = ledger.all().await.unwrap().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[tokio::test]
    async fn test_remove_absent_id_is_noop() {
        let ledger = ledger();
        ledger.append(scheduled_record(1, "a")).await.unwrap();

        ledger.remove(99).await.unwrap();
        assert_eq!(ledger.all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_get_by_id() {
        let ledger = ledger();
        ledger.append(scheduled_record(7, "hello")).await.unwrap();

        let found = ledger.get(7).await.unwrap().unwrap();
        assert_eq!(found.content, "hello");
        assert!(ledger.get(8).await.unwrap().is_none());
    }

    #[test]
    fn test_next_id_avoids_collisions() {
        let existing = vec![scheduled_record(chrono::Utc::now().timestamp_millis(), "x")];
        let id = PostRecord::next_id(&existing);
        assert!(existing.iter().all(|r| r.id != id));
    }

    #[test]
    fn test_record_serializes_camel_case() {
        let record = scheduled_record(1, "hello");
        let json = serde_json::to_string(&record).unwrap();

        assert!(json.contains("\"scheduledDate\""));
        assert!(json.contains("\"createdAt\""));
        assert!(json.contains("\"userId\""));
        assert!(json.contains("\"status\":\"scheduled\""));
        // Absent optional markers stay off disk entirely.
        assert!(!json.contains("isLocal"));
        assert!(!json.contains("linkedInPostId"));
    }

    #[test]
    fn test_published_record_roundtrip() {
        let record = PostRecord {
            id: 5,
            content: "shipped".to_string(),
            scheduled_date: None,
            scheduled_time: None,
            status: PostStatus::Published,
            created_at: 1_750_000_000,
            platform: PLATFORM.to_string(),
            linked_in_post_id: Some("urn:li:share:123".to_string()),
            is_local: None,
            user_id: "user-1".to_string(),
        };

        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"linkedInPostId\""));

        let back: PostRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }
}
