//! LinkedIn OAuth connector
//!
//! Implements the authorization-code flow as an explicit state machine over
//! [`ConnectionState`]: `request_authorization` persists a Pending record
//! with a random nonce, `handle_callback` verifies the echoed nonce before
//! anything touches the network, and `exchange_code` trades the code for a
//! bearer token and the member profile. The nonce check is the CSRF defense;
//! a mismatched callback is rejected without attempting the exchange, on
//! every code path.

use async_trait::async_trait;
use base64::Engine;
use rand::Rng;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::LinkedInConfig;
use crate::connection::{self, ConnectionState, Profile};
use crate::error::{ApiError, ConnectError, Result};
use crate::store::KvStore;

/// Scopes requested from the provider; `w_member_social` is what allows
/// posting on the member's behalf.
pub const OAUTH_SCOPES: &str = "openid profile email w_member_social";

/// Token endpoint response. Only the access token is consumed; LinkedIn's
/// expiry and scope fields ride along for diagnostics.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub scope: Option<String>,
}

/// Network seam for the connect flow.
///
/// Split from the [`Connector`] so tests can count calls and prove the
/// exchange is never reached on a state mismatch.
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// Form-encoded `grant_type=authorization_code` exchange.
    async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> std::result::Result<TokenResponse, ApiError>;

    /// Bearer-authenticated profile lookup.
    async fn fetch_profile(&self, access_token: &str) -> std::result::Result<Profile, ApiError>;
}

/// Live implementation against LinkedIn's token and userinfo endpoints.
pub struct LinkedInAuth {
    client_id: String,
    client_secret: String,
    token_url: String,
    profile_url: String,
    http: reqwest::Client,
}

impl LinkedInAuth {
    pub fn new(
        client_id: String,
        client_secret: String,
        token_url: String,
        profile_url: String,
    ) -> Self {
        Self {
            client_id,
            client_secret,
            token_url,
            profile_url,
            http: reqwest::Client::new(),
        }
    }

    /// Build from configuration, reading the client secret from its file.
    ///
    /// The secret never lands in the key-value store and is only held by
    /// this struct for the duration of the exchange call.
    pub fn from_config(config: &LinkedInConfig) -> Result<Self> {
        let secret = config.read_client_secret()?;
        Ok(Self::new(
            config.client_id.clone(),
            secret,
            config.token_url.clone(),
            config.profile_url.clone(),
        ))
    }
}

#[async_trait]
impl AuthApi for LinkedInAuth {
    async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> std::result::Result<TokenResponse, ApiError> {
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", redirect_uri),
            ("client_id", &self.client_id),
            ("client_secret", &self.client_secret),
        ];

        let resp = self.http.post(&self.token_url).form(&params).send().await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(ApiError::Provider { status, body });
        }

        Ok(resp.json().await?)
    }

    async fn fetch_profile(&self, access_token: &str) -> std::result::Result<Profile, ApiError> {
        let resp = self
            .http
            .get(&self.profile_url)
            .bearer_auth(access_token)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(ApiError::Provider { status, body });
        }

        Ok(resp.json().await?)
    }
}

/// Orchestrates the connect lifecycle against an injected store and network
/// seam.
pub struct Connector {
    store: Arc<dyn KvStore>,
    api: Arc<dyn AuthApi>,
    client_id: String,
    authorize_url: String,
}

impl Connector {
    pub fn new(
        store: Arc<dyn KvStore>,
        api: Arc<dyn AuthApi>,
        client_id: String,
        authorize_url: String,
    ) -> Self {
        Self {
            store,
            api,
            client_id,
            authorize_url,
        }
    }

    /// Start an authorization request.
    ///
    /// Generates the nonce, persists the Pending record, and returns the URL
    /// the caller should navigate to. Purely local; no network call happens
    /// here.
    pub async fn request_authorization(&self, redirect_uri: &str) -> Result<String> {
        let state = generate_state();

        let url = format!(
            "{}?response_type=code&client_id={}&redirect_uri={}&state={}&scope={}",
            self.authorize_url,
            percent_encode(&self.client_id),
            percent_encode(redirect_uri),
            percent_encode(&state),
            percent_encode(OAUTH_SCOPES),
        );

        ConnectionState::Pending {
            state,
            redirect_uri: redirect_uri.to_string(),
        }
        .save(self.store.as_ref())
        .await?;

        Ok(url)
    }

    /// Complete the flow from the provider's callback.
    ///
    /// The received state must exactly equal the persisted nonce. On a
    /// mismatch the pending record is cleared and the exchange is not
    /// attempted; the caller must restart the flow.
    pub async fn handle_callback(&self, code: &str, received_state: &str) -> Result<Profile> {
        let current = ConnectionState::load(self.store.as_ref()).await?;

        let (expected_state, redirect_uri) = match current {
            ConnectionState::Pending {
                state,
                redirect_uri,
            } => (state, redirect_uri),
            _ => {
                warn!("OAuth callback received with no pending authorization request");
                return Err(ConnectError::StateMismatch.into());
            }
        };

        if received_state != expected_state {
            warn!("OAuth callback state does not match the pending request");
            connection::clear(self.store.as_ref()).await?;
            return Err(ConnectError::StateMismatch.into());
        }

        self.exchange_code(code, &redirect_uri).await
    }

    /// Exchange an authorization code and fetch the member profile.
    ///
    /// Both failures roll the persisted state back to Disconnected, but stay
    /// distinguishable: `TokenExchangeFailed` means the provider rejected the
    /// code, `ProfileFetchFailed` means credentials were obtained and only
    /// the identity lookup failed.
    pub async fn exchange_code(&self, code: &str, redirect_uri: &str) -> Result<Profile> {
        let token = match self.api.exchange_code(code, redirect_uri).await {
            Ok(token) => token,
            Err(e) => {
                connection::clear(self.store.as_ref()).await?;
                return Err(ConnectError::TokenExchangeFailed(e).into());
            }
        };

        let profile = match self.api.fetch_profile(&token.access_token).await {
            Ok(profile) => profile,
            Err(e) => {
                connection::clear(self.store.as_ref()).await?;
                return Err(ConnectError::ProfileFetchFailed(e).into());
            }
        };

        ConnectionState::Connected {
            access_token: token.access_token,
            profile: profile.clone(),
        }
        .save(self.store.as_ref())
        .await?;

        info!(member = %profile.sub, "LinkedIn account connected");
        Ok(profile)
    }

    /// Clear the connection. Idempotent; store hiccups are logged rather
    /// than surfaced, so a disconnect can always be retried from a clean
    /// prompt.
    pub async fn disconnect(&self) {
        if let Err(e) = connection::clear(self.store.as_ref()).await {
            warn!("Failed to clear connection state: {}", e);
        }
    }

    /// Current persisted state.
    pub async fn state(&self) -> Result<ConnectionState> {
        ConnectionState::load(self.store.as_ref()).await
    }
}

/// Random URL-safe nonce binding an authorization request to its callback.
fn generate_state() -> String {
    let bytes: [u8; 16] = rand::thread_rng().gen();
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

fn percent_encode(s: &str) -> String {
    percent_encoding::utf8_percent_encode(s, percent_encoding::NON_ALPHANUMERIC).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LinkloomError;
    use crate::mock::MockAuthApi;
    use crate::store::MemoryStore;

    fn connector(api: Arc<MockAuthApi>) -> (Connector, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let connector = Connector::new(
            store.clone(),
            api,
            "client-123".to_string(),
            "https://www.linkedin.com/oauth/v2/authorization".to_string(),
        );
        (connector, store)
    }

    #[tokio::test]
    async fn test_request_authorization_builds_url_and_persists_pending() {
        let api = Arc::new(MockAuthApi::succeeding());
        let (connector, store) = connector(api);

        let url = connector
            .request_authorization("https://app.example/callback")
            .await
            .unwrap();

        assert!(url.starts_with("https://www.linkedin.com/oauth/v2/authorization?"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("client_id=client%2D123"));
        assert!(url.contains("w%5Fmember%5Fsocial"));

        match ConnectionState::load(store.as_ref()).await.unwrap() {
            ConnectionState::Pending {
                state,
                redirect_uri,
            } => {
                assert!(!state.is_empty());
                assert!(url.contains(&percent_encode(&state)));
                assert_eq!(redirect_uri, "https://app.example/callback");
            }
            other => panic!("expected pending state, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_state_mismatch_never_reaches_exchange() {
        let api = Arc::new(MockAuthApi::succeeding());
        let (connector, store) = connector(api.clone());

        connector
            .request_authorization("https://app.example/callback")
            .await
            .unwrap();

        let result = connector.handle_callback("code-1", "forged-state").await;
        assert!(matches!(
            result,
            Err(LinkloomError::Connect(ConnectError::StateMismatch))
        ));
        assert_eq!(api.exchange_calls(), 0);
        assert_eq!(api.profile_calls(), 0);

        // Transient fields are cleared; the flow must be restarted.
        assert_eq!(
            ConnectionState::load(store.as_ref()).await.unwrap(),
            ConnectionState::Disconnected
        );
    }

    #[tokio::test]
    async fn test_callback_without_pending_request_is_rejected() {
        let api = Arc::new(MockAuthApi::succeeding());
        let (connector, _store) = connector(api.clone());

        let result = connector.handle_callback("code-1", "anything").await;
        assert!(matches!(
            result,
            Err(LinkloomError::Connect(ConnectError::StateMismatch))
        ));
        assert_eq!(api.exchange_calls(), 0);
    }

    #[tokio::test]
    async fn test_successful_flow_ends_connected() {
        let api = Arc::new(MockAuthApi::succeeding());
        let (connector, store) = connector(api.clone());

        let url = connector
            .request_authorization("https://app.example/callback")
            .await
            .unwrap();
        let state = match ConnectionState::load(store.as_ref()).await.unwrap() {
            ConnectionState::Pending { state, .. } => state,
            other => panic!("expected pending, got {:?}", other),
        };
        assert!(url.contains(&percent_encode(&state)));

        let profile = connector.handle_callback("code-1", &state).await.unwrap();
        assert_eq!(profile.sub, "mock-sub");
        assert_eq!(api.exchange_calls(), 1);
        assert_eq!(api.profile_calls(), 1);

        match ConnectionState::load(store.as_ref()).await.unwrap() {
            ConnectionState::Connected {
                access_token,
                profile,
            } => {
                assert!(!access_token.is_empty());
                assert_eq!(profile.sub, "mock-sub");
            }
            other => panic!("expected connected, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_exchange_failure_rolls_back_to_disconnected() {
        let api = Arc::new(MockAuthApi::exchange_failure(401, "invalid code"));
        let (connector, store) = connector(api.clone());

        connector
            .request_authorization("https://app.example/callback")
            .await
            .unwrap();
        let state = match ConnectionState::load(store.as_ref()).await.unwrap() {
            ConnectionState::Pending { state, .. } => state,
            other => panic!("expected pending, got {:?}", other),
        };

        let result = connector.handle_callback("bad-code", &state).await;
        assert!(matches!(
            result,
            Err(LinkloomError::Connect(ConnectError::TokenExchangeFailed(_)))
        ));
        assert_eq!(api.exchange_calls(), 1);
        assert_eq!(api.profile_calls(), 0);
        assert_eq!(
            ConnectionState::load(store.as_ref()).await.unwrap(),
            ConnectionState::Disconnected
        );
    }

    #[tokio::test]
    async fn test_profile_failure_is_distinguishable() {
        let api = Arc::new(MockAuthApi::profile_failure(500, "upstream error"));
        let (connector, store) = connector(api.clone());

        connector
            .request_authorization("https://app.example/callback")
            .await
            .unwrap();
        let state = match ConnectionState::load(store.as_ref()).await.unwrap() {
            ConnectionState::Pending { state, .. } => state,
            other => panic!("expected pending, got {:?}", other),
        };

        let result = connector.handle_callback("code-1", &state).await;
        assert!(matches!(
            result,
            Err(LinkloomError::Connect(ConnectError::ProfileFetchFailed(_)))
        ));
        assert_eq!(api.exchange_calls(), 1);
        assert_eq!(api.profile_calls(), 1);
        assert_eq!(
            ConnectionState::load(store.as_ref()).await.unwrap(),
            ConnectionState::Disconnected
        );
    }

    #[tokio::test]
    async fn test_disconnect_is_idempotent() {
        let api = Arc::new(MockAuthApi::succeeding());
        let (connector, store) = connector(api);

        ConnectionState::Connected {
            access_token: "tok".to_string(),
            profile: Profile {
                name: "Ada".to_string(),
                sub: "s1".to_string(),
                picture: None,
            },
        }
        .save(store.as_ref())
        .await
        .unwrap();

        connector.disconnect().await;
        assert_eq!(
            ConnectionState::load(store.as_ref()).await.unwrap(),
            ConnectionState::Disconnected
        );

        connector.disconnect().await;
        assert_eq!(
            ConnectionState::load(store.as_ref()).await.unwrap(),
            ConnectionState::Disconnected
        );
    }

    #[test]
    fn test_generated_states_are_unique() {
        let a = generate_state();
        let b = generate_state();
        assert_ne!(a, b);
        assert!(a.len() >= 16);
    }
}
