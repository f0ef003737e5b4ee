//! End-to-end workflow tests
//!
//! These exercise the complete flows over a real on-disk store:
//! - connect, publish, and the ledger record that results
//! - the degraded local-only publish path
//! - scheduling and explicitly publishing a queued post
//! - analytics derived from the ledger after the above
//! - durability of the ledger across a store reopen

use anyhow::Result;
use std::sync::Arc;
use tempfile::TempDir;

use liblinkloom::analytics::Analytics;
use liblinkloom::generator::{CompletionRequest, GenerationKind, Generator};
use liblinkloom::ledger::{Ledger, PostStatus};
use liblinkloom::mock::{MockAuthApi, MockCompletionApi, MockPublishApi};
use liblinkloom::{
    ConnectionState, Connector, PublishOutcome, Publisher, SqliteStore,
};

async fn open_store(temp_dir: &TempDir) -> Result<Arc<SqliteStore>> {
    let db_path = temp_dir.path().join("store.db");
    Ok(Arc::new(
        SqliteStore::open(db_path.to_str().unwrap()).await?,
    ))
}

async fn connect(store: Arc<SqliteStore>) -> Result<ConnectionState> {
    let auth = Arc::new(MockAuthApi::succeeding());
    let connector = Connector::new(
        store.clone(),
        auth,
        "client-1".to_string(),
        "https://www.linkedin.com/oauth/v2/authorization".to_string(),
    );

    connector
        .request_authorization("https://app.example/callback")
        .await?;
    let state = match connector.state().await? {
        ConnectionState::Pending { state, .. } => state,
        other => panic!("expected pending, got {:?}", other),
    };
    connector.handle_callback("auth-code", &state).await?;

    Ok(connector.state().await?)
}

#[tokio::test]
async fn test_connect_then_publish_records_remote_post() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let store = open_store(&temp_dir).await?;

    let connection = connect(store.clone()).await?;
    assert!(connection.is_connected());

    let api = Arc::new(MockPublishApi::succeeding("urn:li:share:100"));
    let publisher = Publisher::new(Ledger::new(store.clone()), api.clone());

    let (record, outcome) = publisher
        .publish_now("First post from the new tool", &connection)
        .await?;

    assert_eq!(outcome, PublishOutcome::Remote("urn:li:share:100".to_string()));
    assert_eq!(record.status, PostStatus::Published);
    assert_eq!(record.user_id, "mock-sub");
    assert_eq!(api.posted_content(), vec!["First post from the new tool"]);

    Ok(())
}

#[tokio::test]
async fn test_degraded_publish_keeps_content() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let store = open_store(&temp_dir).await?;
    let connection = connect(store.clone()).await?;

    let ledger = Ledger::new(store.clone());
    let api = Arc::new(MockPublishApi::failing(500, "internal error"));
    let publisher = Publisher::new(ledger.clone(), api);

    let before = ledger.all().await?.len();
    let (record, outcome) = publisher
        .publish_now("Must not be lost", &connection)
        .await?;

    assert_eq!(outcome, PublishOutcome::LocalOnly);
    assert_eq!(record.is_local, Some(true));
    assert_eq!(record.linked_in_post_id, None);
    assert_eq!(ledger.all().await?.len(), before + 1);

    Ok(())
}

#[tokio::test]
async fn test_schedule_then_publish_now_transition() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let store = open_store(&temp_dir).await?;
    let connection = connect(store.clone()).await?;

    let ledger = Ledger::new(store.clone());
    let api = Arc::new(MockPublishApi::succeeding("urn:li:share:200"));
    let publisher = Publisher::new(ledger.clone(), api.clone());

    let scheduled = publisher
        .schedule("Hello World", "2025-06-01", "09:00", &connection)
        .await?;
    assert_eq!(scheduled.status, PostStatus::Scheduled);
    assert_eq!(scheduled.scheduled_date.as_deref(), Some("2025-06-01"));
    assert_eq!(scheduled.scheduled_time.as_deref(), Some("09:00"));

    // Nothing publishes on its own; the queue is inert until acted on.
    assert_eq!(api.post_calls(), 0);

    let (published, outcome) = publisher
        .publish_scheduled(scheduled.id, &connection)
        .await?;
    assert_eq!(outcome, PublishOutcome::Remote("urn:li:share:200".to_string()));
    assert_eq!(published.id, scheduled.id);
    assert_eq!(published.scheduled_date, None);

    let all = ledger.all().await?;
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].status, PostStatus::Published);

    Ok(())
}

#[tokio::test]
async fn test_schedule_requires_connection() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let store = open_store(&temp_dir).await?;

    let ledger = Ledger::new(store.clone());
    let api = Arc::new(MockPublishApi::succeeding("unused"));
    let publisher = Publisher::new(ledger.clone(), api);

    let result = publisher
        .schedule(
            "Queued without an account",
            "2025-06-01",
            "09:00",
            &ConnectionState::Disconnected,
        )
        .await;

    assert!(result.is_err());
    assert_eq!(ledger.all().await?.len(), 0);

    Ok(())
}

#[tokio::test]
async fn test_analytics_after_mixed_activity() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let store = open_store(&temp_dir).await?;
    let connection = connect(store.clone()).await?;

    let ledger = Ledger::new(store.clone());
    let publisher = Publisher::new(
        ledger.clone(),
        Arc::new(MockPublishApi::succeeding("urn:li:share:1")),
    );
    let generator = Generator::new(
        Arc::new(MockCompletionApi::returning("A generated draft")),
        store.clone(),
    );

    publisher.publish_now("published now", &connection).await?;
    publisher
        .schedule("queued", "2030-01-15", "08:30", &connection)
        .await?;
    generator
        .generate(&CompletionRequest::new(
            "growth".to_string(),
            GenerationKind::Content,
        ))
        .await?;
    generator
        .generate(&CompletionRequest::new(
            "growth".to_string(),
            GenerationKind::Ideas,
        ))
        .await?;

    let analytics = Analytics::new(ledger, store);
    let snapshot = analytics.snapshot().await?;

    assert_eq!(snapshot.total_posts, 2);
    assert_eq!(snapshot.scheduled, 1);
    assert_eq!(snapshot.published, 1);
    assert_eq!(snapshot.content_generated, 1);
    assert_eq!(snapshot.ideas_generated, 1);
    // The record published just now falls in the current month.
    assert!(snapshot.posts_this_month >= 1);

    Ok(())
}

#[tokio::test]
async fn test_ledger_survives_store_reopen() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("store.db");
    let path_str = db_path.to_str().unwrap().to_string();

    let record_id;
    {
        let store = Arc::new(SqliteStore::open(&path_str).await?);
        let connection = connect(store.clone()).await?;
        let publisher = Publisher::new(
            Ledger::new(store.clone()),
            Arc::new(MockPublishApi::succeeding("urn:li:share:9")),
        );
        let (record, _) = publisher.publish_now("durable", &connection).await?;
        record_id = record.id;
    }

    let reopened = Arc::new(SqliteStore::open(&path_str).await?);
    let ledger = Ledger::new(reopened.clone());

    let all = ledger.all().await?;
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].id, record_id);
    assert_eq!(all[0].content, "durable");

    // The connection record survives too.
    assert!(ConnectionState::load(reopened.as_ref()).await?.is_connected());

    Ok(())
}

#[tokio::test]
async fn test_disconnect_after_connect_is_clean_and_idempotent() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let store = open_store(&temp_dir).await?;

    connect(store.clone()).await?;

    let connector = Connector::new(
        store.clone(),
        Arc::new(MockAuthApi::succeeding()),
        "client-1".to_string(),
        "https://www.linkedin.com/oauth/v2/authorization".to_string(),
    );

    connector.disconnect().await;
    assert_eq!(
        ConnectionState::load(store.as_ref()).await?,
        ConnectionState::Disconnected
    );

    connector.disconnect().await;
    assert_eq!(
        ConnectionState::load(store.as_ref()).await?,
        ConnectionState::Disconnected
    );

    Ok(())
}
