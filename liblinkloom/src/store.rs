//! Persistent key-value store
//!
//! All durable state lives in a flat key-value namespace: the connection
//! record, the post ledger (a JSON array under one key), and the generation
//! counters. The store is injected everywhere it is used, so tests can swap
//! the SQLite-backed implementation for an in-memory fake.

use async_trait::async_trait;
use sqlx::sqlite::SqlitePool;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use crate::error::Result;

/// Well-known keys in the store namespace.
pub mod keys {
    pub const CONNECTED: &str = "linkedin_connected";
    pub const ACCESS_TOKEN: &str = "linkedin_access_token";
    pub const PROFILE: &str = "linkedin_profile";
    pub const USER_ID: &str = "linkedin_user_id";
    pub const OAUTH_STATE: &str = "linkedin_oauth_state";
    pub const OAUTH_REDIRECT_URI: &str = "linkedin_oauth_redirect_uri";
    pub const POSTS: &str = "linkedin_posts";
    pub const CONTENT_GENERATED: &str = "generated_content_count";
    pub const IDEAS_GENERATED: &str = "generated_ideas_count";
}

/// Key-value storage seam, scoped to one local profile.
///
/// Values are JSON- or string-encoded by the callers; the store itself is
/// untyped. There is exactly one writer (the sequential UI-driven flows), so
/// implementations do not need optimistic concurrency control.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn put(&self, key: &str, value: &str) -> Result<()>;

    /// No-op when the key is absent.
    async fn delete(&self, key: &str) -> Result<()>;
}

/// SQLite-backed store, the durable implementation used by the CLI tools.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if necessary) the store at the given path.
    ///
    /// Expands `~`, creates parent directories, and runs migrations.
    pub async fn open(db_path: &str) -> Result<Self> {
        let expanded_path = shellexpand::tilde(db_path).to_string();
        let path = Path::new(&expanded_path);

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(crate::error::StoreError::IoError)?;
        }

        // Forward slashes work on both Windows and Unix; mode=rwc creates
        // the database file if it doesn't exist.
        let db_url = format!("sqlite://{}?mode=rwc", expanded_path.replace('\\', "/"));

        let pool = SqlitePool::connect(&db_url)
            .await
            .map_err(crate::error::StoreError::SqlxError)?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(crate::error::StoreError::MigrationError)?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl KvStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        use sqlx::Row;

        let row = sqlx::query("SELECT value FROM kv WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(crate::error::StoreError::SqlxError)?;

        Ok(row.map(|r| r.get("value")))
    }

    async fn put(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO kv (key, value) VALUES (?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await
        .map_err(crate::error::StoreError::SqlxError)?;

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM kv WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(crate::error::StoreError::SqlxError)?;

        Ok(())
    }
}

/// In-memory store for tests.
#[derive(Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.lock().unwrap().get(key).cloned())
    }

    async fn put(&self, key: &str, value: &str) -> Result<()> {
        self.values
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.values.lock().unwrap().remove(key);
        Ok(())
    }
}
