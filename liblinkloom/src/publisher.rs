//! Publishing and scheduling
//!
//! `publish_now` submits content to LinkedIn's post-creation endpoint and
//! reconciles the result into the ledger. Provider failure is deliberately
//! not an error here: the content is still recorded as published-locally so
//! nothing the user wrote is ever lost. The two cases stay visible to
//! callers through [`PublishOutcome`] so remote delivery can be retried
//! later. `schedule` is purely local and never touches the network.

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::LinkedInConfig;
use crate::connection::ConnectionState;
use crate::error::{ApiError, LinkloomError, Result};
use crate::ledger::{Ledger, PostRecord, PostStatus, PLATFORM};

/// Character ceiling enforced at the tool edge before a record is built.
/// LinkedIn's own limit; the ledger itself does not re-check it.
pub const MAX_POST_CHARS: usize = 3000;

/// How a publish concluded.
///
/// `Remote` carries the provider's post id. `LocalOnly` means the provider
/// call failed and the record was kept as a local published entry pending a
/// later retry; callers should tell the user the post is published locally
/// only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    Remote(String),
    LocalOnly,
}

/// Network seam for post creation.
#[async_trait]
pub trait PublishApi: Send + Sync {
    /// Create a post on behalf of the member `sub`; returns the provider's
    /// post id.
    async fn create_post(
        &self,
        access_token: &str,
        sub: &str,
        content: &str,
    ) -> std::result::Result<String, ApiError>;
}

#[derive(Debug, Deserialize)]
struct UgcPostResponse {
    id: String,
}

/// Live client for LinkedIn's UGC post endpoint.
pub struct LinkedInApi {
    post_url: String,
    http: reqwest::Client,
}

impl LinkedInApi {
    pub fn new(post_url: String) -> Self {
        Self {
            post_url,
            http: reqwest::Client::new(),
        }
    }

    pub fn from_config(config: &LinkedInConfig) -> Self {
        Self::new(config.post_url.clone())
    }
}

#[async_trait]
impl PublishApi for LinkedInApi {
    async fn create_post(
        &self,
        access_token: &str,
        sub: &str,
        content: &str,
    ) -> std::result::Result<String, ApiError> {
        let body = serde_json::json!({
            "author": format!("urn:li:person:{}", sub),
            "lifecycleState": "PUBLISHED",
            "specificContent": {
                "com.linkedin.ugc.ShareContent": {
                    "shareCommentary": { "text": content },
                    "shareMediaCategory": "NONE"
                }
            },
            "visibility": {
                "com.linkedin.ugc.MemberNetworkVisibility": "PUBLIC"
            }
        });

        let resp = self
            .http
            .post(&self.post_url)
            .bearer_auth(access_token)
            .header("X-Restli-Protocol-Version", "2.0.0")
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(ApiError::Provider { status, body });
        }

        let created: UgcPostResponse = resp.json().await?;
        Ok(created.id)
    }
}

/// Submits ledger content to LinkedIn and records the outcome.
#[derive(Clone)]
pub struct Publisher {
    ledger: Ledger,
    api: Arc<dyn PublishApi>,
}

impl Publisher {
    pub fn new(ledger: Ledger, api: Arc<dyn PublishApi>) -> Self {
        Self { ledger, api }
    }

    /// Publish content immediately.
    ///
    /// Requires a connected account; fails with `NotConnected` before any
    /// network attempt otherwise. Exactly one published record is appended
    /// whichever way the provider call goes.
    pub async fn publish_now(
        &self,
        content: &str,
        connection: &ConnectionState,
    ) -> Result<(PostRecord, PublishOutcome)> {
        let (access_token, sub) = match connection {
            ConnectionState::Connected {
                access_token,
                profile,
            } => (access_token.as_str(), profile.sub.as_str()),
            _ => return Err(LinkloomError::NotConnected),
        };

        let outcome = match self.api.create_post(access_token, sub, content).await {
            Ok(post_id) => {
                info!(post_id = %post_id, "Published to LinkedIn");
                PublishOutcome::Remote(post_id)
            }
            Err(e) => {
                // Degraded success: keep the content as a local published
                // record instead of surfacing the failure.
                warn!("LinkedIn publish failed, saving locally: {}", e);
                PublishOutcome::LocalOnly
            }
        };

        let existing = self.ledger.all().await?;
        let record = PostRecord {
            id: PostRecord::next_id(&existing),
            content: content.to_string(),
            scheduled_date: None,
            scheduled_time: None,
            status: PostStatus::Published,
            created_at: chrono::Utc::now().timestamp(),
            platform: PLATFORM.to_string(),
            linked_in_post_id: match &outcome {
                PublishOutcome::Remote(id) => Some(id.clone()),
                PublishOutcome::LocalOnly => None,
            },
            is_local: match &outcome {
                PublishOutcome::Remote(_) => None,
                PublishOutcome::LocalOnly => Some(true),
            },
            user_id: sub.to_string(),
        };

        self.ledger.append(record.clone()).await?;
        Ok((record, outcome))
    }

    /// Queue content for a future date and time.
    ///
    /// Purely local; still requires a connected account, so only users who
    /// can eventually publish may queue work. Nothing transitions the record
    /// later on its own: publishing a scheduled record is always an explicit
    /// action ([`Publisher::publish_scheduled`]).
    pub async fn schedule(
        &self,
        content: &str,
        date: &str,
        time: &str,
        connection: &ConnectionState,
    ) -> Result<PostRecord> {
        if content.trim().is_empty() {
            return Err(LinkloomError::InvalidInput(
                "Content cannot be empty".to_string(),
            ));
        }
        if date.is_empty() || time.is_empty() {
            return Err(LinkloomError::InvalidInput(
                "Scheduled posts need both a date and a time".to_string(),
            ));
        }

        let sub = match connection {
            ConnectionState::Connected { profile, .. } => profile.sub.clone(),
            _ => return Err(LinkloomError::NotConnected),
        };

        let existing = self.ledger.all().await?;
        let record = PostRecord {
            id: PostRecord::next_id(&existing),
            content: content.to_string(),
            scheduled_date: Some(date.to_string()),
            scheduled_time: Some(time.to_string()),
            status: PostStatus::Scheduled,
            created_at: chrono::Utc::now().timestamp(),
            platform: PLATFORM.to_string(),
            linked_in_post_id: None,
            is_local: None,
            user_id: sub,
        };

        self.ledger.append(record.clone()).await?;
        info!(id = record.id, date = %date, time = %time, "Post scheduled");
        Ok(record)
    }

    /// Publish a scheduled record now, replacing it with its published form.
    ///
    /// The scheduled fields are dropped on transition; a published record
    /// never carries them. Published records are never moved back.
    pub async fn publish_scheduled(
        &self,
        id: i64,
        connection: &ConnectionState,
    ) -> Result<(PostRecord, PublishOutcome)> {
        let record = self.ledger.get(id).await?.ok_or_else(|| {
            LinkloomError::InvalidInput(format!("No scheduled post with id {}", id))
        })?;

        if record.status != PostStatus::Scheduled {
            return Err(LinkloomError::InvalidInput(format!(
                "Post {} is already published",
                id
            )));
        }

        let (access_token, sub) = match connection {
            ConnectionState::Connected {
                access_token,
                profile,
            } => (access_token.as_str(), profile.sub.as_str()),
            _ => return Err(LinkloomError::NotConnected),
        };

        let outcome = match self
            .api
            .create_post(access_token, sub, &record.content)
            .await
        {
            Ok(post_id) => {
                info!(id = record.id, post_id = %post_id, "Published scheduled post");
                PublishOutcome::Remote(post_id)
            }
            Err(e) => {
                warn!("LinkedIn publish failed, saving locally: {}", e);
                PublishOutcome::LocalOnly
            }
        };

        let published = PostRecord {
            scheduled_date: None,
            scheduled_time: None,
            status: PostStatus::Published,
            linked_in_post_id: match &outcome {
                PublishOutcome::Remote(id) => Some(id.clone()),
                PublishOutcome::LocalOnly => None,
            },
            is_local: match &outcome {
                PublishOutcome::Remote(_) => None,
                PublishOutcome::LocalOnly => Some(true),
            },
            ..record
        };

        self.ledger.remove(id).await?;
        self.ledger.append(published.clone()).await?;
        Ok((published, outcome))
    }
}
