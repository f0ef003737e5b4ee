//! Mock API implementations for testing
//!
//! Configurable stand-ins for the three network seams (auth, publish,
//! completion) that record call counts and submitted content. Available in
//! all builds, not just under `cfg(test)`, so the workspace integration
//! tests can use them too.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use crate::connection::Profile;
use crate::connector::{AuthApi, TokenResponse};
use crate::error::ApiError;
use crate::generator::{CompletionApi, CompletionRequest, CompletionResponse};
use crate::publisher::PublishApi;

fn provider_error(status: u16, body: &str) -> ApiError {
    ApiError::Provider {
        status,
        body: body.to_string(),
    }
}

/// Mock auth seam with independent failure switches for the exchange and
/// the profile fetch.
pub struct MockAuthApi {
    exchange_error: Option<(u16, String)>,
    profile_error: Option<(u16, String)>,
    exchange_calls: Arc<Mutex<usize>>,
    profile_calls: Arc<Mutex<usize>>,
}

impl MockAuthApi {
    pub fn succeeding() -> Self {
        Self {
            exchange_error: None,
            profile_error: None,
            exchange_calls: Arc::new(Mutex::new(0)),
            profile_calls: Arc::new(Mutex::new(0)),
        }
    }

    pub fn exchange_failure(status: u16, body: &str) -> Self {
        Self {
            exchange_error: Some((status, body.to_string())),
            ..Self::succeeding()
        }
    }

    pub fn profile_failure(status: u16, body: &str) -> Self {
        Self {
            profile_error: Some((status, body.to_string())),
            ..Self::succeeding()
        }
    }

    pub fn exchange_calls(&self) -> usize {
        *self.exchange_calls.lock().unwrap()
    }

    pub fn profile_calls(&self) -> usize {
        *self.profile_calls.lock().unwrap()
    }
}

#[async_trait]
impl AuthApi for MockAuthApi {
    async fn exchange_code(
        &self,
        _code: &str,
        _redirect_uri: &str,
    ) -> Result<TokenResponse, ApiError> {
        *self.exchange_calls.lock().unwrap() += 1;

        if let Some((status, body)) = &self.exchange_error {
            return Err(provider_error(*status, body));
        }

        Ok(TokenResponse {
            access_token: "mock-access-token".to_string(),
            expires_in: Some(5184000),
            scope: None,
        })
    }

    async fn fetch_profile(&self, _access_token: &str) -> Result<Profile, ApiError> {
        *self.profile_calls.lock().unwrap() += 1;

        if let Some((status, body)) = &self.profile_error {
            return Err(provider_error(*status, body));
        }

        Ok(Profile {
            name: "Mock Member".to_string(),
            sub: "mock-sub".to_string(),
            picture: None,
        })
    }
}

/// Mock publish seam; records every submitted post body.
pub struct MockPublishApi {
    post_id: String,
    error: Option<(u16, String)>,
    post_calls: Arc<Mutex<usize>>,
    posted_content: Arc<Mutex<Vec<String>>>,
}

impl MockPublishApi {
    pub fn succeeding(post_id: &str) -> Self {
        Self {
            post_id: post_id.to_string(),
            error: None,
            post_calls: Arc::new(Mutex::new(0)),
            posted_content: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn failing(status: u16, body: &str) -> Self {
        Self {
            error: Some((status, body.to_string())),
            ..Self::succeeding("unused")
        }
    }

    pub fn post_calls(&self) -> usize {
        *self.post_calls.lock().unwrap()
    }

    pub fn posted_content(&self) -> Vec<String> {
        self.posted_content.lock().unwrap().clone()
    }
}

#[async_trait]
impl PublishApi for MockPublishApi {
    async fn create_post(
        &self,
        _access_token: &str,
        _sub: &str,
        content: &str,
    ) -> Result<String, ApiError> {
        *self.post_calls.lock().unwrap() += 1;

        if let Some((status, body)) = &self.error {
            return Err(provider_error(*status, body));
        }

        self.posted_content.lock().unwrap().push(content.to_string());
        Ok(self.post_id.clone())
    }
}

/// Mock completion seam for the generation flow.
pub struct MockCompletionApi {
    response: Result<CompletionResponse, (u16, String)>,
    complete_calls: Arc<Mutex<usize>>,
}

impl MockCompletionApi {
    pub fn returning(content: &str) -> Self {
        Self {
            response: Ok(CompletionResponse {
                content: Some(content.to_string()),
                quality: Some("high".to_string()),
                source: Some("api".to_string()),
                error: None,
                fallback: None,
            }),
            complete_calls: Arc::new(Mutex::new(0)),
        }
    }

    /// A quota-style response: no content, provider-supplied fallback text.
    pub fn quota_fallback(fallback: &str) -> Self {
        Self {
            response: Ok(CompletionResponse {
                content: None,
                quality: None,
                source: None,
                error: Some("quota exceeded".to_string()),
                fallback: Some(fallback.to_string()),
            }),
            complete_calls: Arc::new(Mutex::new(0)),
        }
    }

    pub fn failing(status: u16, body: &str) -> Self {
        Self {
            response: Err((status, body.to_string())),
            complete_calls: Arc::new(Mutex::new(0)),
        }
    }

    pub fn complete_calls(&self) -> usize {
        *self.complete_calls.lock().unwrap()
    }
}

#[async_trait]
impl CompletionApi for MockCompletionApi {
    async fn complete(
        &self,
        _request: &CompletionRequest,
    ) -> Result<CompletionResponse, ApiError> {
        *self.complete_calls.lock().unwrap() += 1;

        match &self.response {
            Ok(response) => Ok(response.clone()),
            Err((status, body)) => Err(provider_error(*status, body)),
        }
    }
}
