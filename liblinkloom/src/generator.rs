//! AI draft and idea generation
//!
//! Client for the external completion endpoint. Generation is never allowed
//! to fail the user flow: a transport error, a quota response, or a body
//! without `content` all degrade to locally-synthesized fallback text marked
//! `source: "fallback"`. Every generation bumps the matching persisted
//! counter, which the analytics read.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

use crate::config::GeneratorConfig;
use crate::error::{ApiError, Result};
use crate::store::{keys, KvStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationKind {
    Content,
    Ideas,
}

/// Request body for the completion endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct CompletionRequest {
    pub prompt: String,
    #[serde(rename = "type")]
    pub kind: GenerationKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub focus: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audience: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interests: Option<Vec<String>>,
}

impl CompletionRequest {
    pub fn new(prompt: String, kind: GenerationKind) -> Self {
        Self {
            prompt,
            kind,
            tone: None,
            length: None,
            focus: None,
            industry: None,
            audience: None,
            interests: None,
        }
    }
}

/// Completion endpoint response. A missing `content` is a hard generation
/// failure whatever else the body says; `fallback` is best-effort degraded
/// text the provider may attach to an error.
#[derive(Debug, Clone, Deserialize)]
pub struct CompletionResponse {
    pub content: Option<String>,
    #[serde(default)]
    pub quality: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub fallback: Option<String>,
}

/// Generated text handed back to the caller, with provenance.
#[derive(Debug, Clone, PartialEq)]
pub struct Generated {
    pub content: String,
    pub quality: Option<String>,
    /// "fallback" when the endpoint could not produce content.
    pub source: String,
}

impl Generated {
    pub fn is_fallback(&self) -> bool {
        self.source == "fallback"
    }
}

/// Network seam for the completion endpoint.
#[async_trait]
pub trait CompletionApi: Send + Sync {
    async fn complete(
        &self,
        request: &CompletionRequest,
    ) -> std::result::Result<CompletionResponse, ApiError>;
}

/// Live JSON client.
pub struct HttpCompletionApi {
    endpoint: String,
    http: reqwest::Client,
}

impl HttpCompletionApi {
    pub fn new(endpoint: String) -> Self {
        Self {
            endpoint,
            http: reqwest::Client::new(),
        }
    }

    pub fn from_config(config: &GeneratorConfig) -> Self {
        Self::new(config.endpoint.clone())
    }
}

#[async_trait]
impl CompletionApi for HttpCompletionApi {
    async fn complete(
        &self,
        request: &CompletionRequest,
    ) -> std::result::Result<CompletionResponse, ApiError> {
        let resp = self.http.post(&self.endpoint).json(request).send().await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(ApiError::Provider { status, body });
        }

        Ok(resp.json().await?)
    }
}

/// Generation flow: call the endpoint, degrade locally when it cannot
/// deliver, count what was generated.
pub struct Generator {
    api: Arc<dyn CompletionApi>,
    store: Arc<dyn KvStore>,
}

impl Generator {
    pub fn new(api: Arc<dyn CompletionApi>, store: Arc<dyn KvStore>) -> Self {
        Self { api, store }
    }

    /// Generate a draft or a batch of ideas.
    ///
    /// Never fails on endpoint trouble; the result's `source` says whether
    /// the text came from the API, a provider fallback, or local synthesis.
    /// Counter updates are best-effort.
    pub async fn generate(&self, request: &CompletionRequest) -> Result<Generated> {
        let generated = match self.api.complete(request).await {
            Ok(response) => match response.content {
                Some(content) => Generated {
                    content,
                    quality: response.quality,
                    source: response.source.unwrap_or_else(|| "api".to_string()),
                },
                None => {
                    warn!(
                        error = response.error.as_deref().unwrap_or("no content"),
                        "Completion endpoint returned no content, degrading"
                    );
                    Generated {
                        content: response
                            .fallback
                            .unwrap_or_else(|| fallback_text(request)),
                        quality: None,
                        source: "fallback".to_string(),
                    }
                }
            },
            Err(e) => {
                warn!("Completion call failed, degrading: {}", e);
                Generated {
                    content: fallback_text(request),
                    quality: None,
                    source: "fallback".to_string(),
                }
            }
        };

        let counter_key = match request.kind {
            GenerationKind::Content => keys::CONTENT_GENERATED,
            GenerationKind::Ideas => keys::IDEAS_GENERATED,
        };
        if let Err(e) = self.increment(counter_key).await {
            warn!("Failed to bump generation counter: {}", e);
        }

        Ok(generated)
    }

    async fn increment(&self, key: &str) -> Result<()> {
        let current: u64 = self
            .store
            .get(key)
            .await?
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);
        self.store.put(key, &(current + 1).to_string()).await
    }
}

/// Locally-synthesized stand-in used when the endpoint cannot deliver.
fn fallback_text(request: &CompletionRequest) -> String {
    let topic = request
        .focus
        .as_deref()
        .filter(|f| !f.is_empty())
        .unwrap_or(request.prompt.as_str());

    match request.kind {
        GenerationKind::Content => format!(
            "Sharing a few thoughts on {}.\n\n\
             The longer I work in this space, the more I believe the \
             fundamentals matter most: listen to the people you build for, \
             keep the feedback loop short, and write down what you learn.\n\n\
             What has your experience been?",
            topic
        ),
        GenerationKind::Ideas => format!(
            "1. A lesson you learned the hard way about {topic}\n\
             2. A common misconception about {topic} and what's actually true\n\
             3. Three tools or habits that changed how you approach {topic}\n\
             4. A behind-the-scenes look at your process around {topic}\n\
             5. A question to your network about where {topic} is heading",
            topic = topic
        ),
    }
}
