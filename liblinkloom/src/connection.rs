//! LinkedIn connection state
//!
//! The connection is an explicit three-state machine rather than a bag of
//! boolean/string flags, so combinations like "token present but not
//! connected" cannot be represented. The state is persisted across the
//! well-known store keys and reconstructed on load; anything inconsistent on
//! disk collapses to `Disconnected`.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::store::{keys, KvStore};

/// LinkedIn member profile as returned by the userinfo endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    /// Platform member id; also the subject of the author URN when posting.
    pub sub: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
}

/// Connection lifecycle: `Disconnected -> Pending -> Connected`, with error
/// transitions back to `Disconnected` from any non-terminal state.
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionState {
    Disconnected,
    /// An authorization request is in flight; `state` is the CSRF nonce the
    /// callback must echo back, paired with the redirect URI it was issued
    /// for.
    Pending {
        state: String,
        redirect_uri: String,
    },
    Connected {
        access_token: String,
        profile: Profile,
    },
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected { .. })
    }

    /// Reconstruct the state from the store.
    ///
    /// A connected record needs the flag, token, and profile all present; a
    /// pending record needs both transient fields. Partial leftovers (for
    /// example from an interrupted flow) read as `Disconnected`.
    pub async fn load(store: &dyn KvStore) -> Result<Self> {
        let connected = store.get(keys::CONNECTED).await?.as_deref() == Some("true");
        if connected {
            let token = store.get(keys::ACCESS_TOKEN).await?;
            let profile_json = store.get(keys::PROFILE).await?;
            if let (Some(access_token), Some(json)) = (token, profile_json) {
                let profile: Profile = serde_json::from_str(&json).map_err(|e| {
                    crate::error::StoreError::Corrupt {
                        key: keys::PROFILE.to_string(),
                        reason: e.to_string(),
                    }
                })?;
                return Ok(ConnectionState::Connected {
                    access_token,
                    profile,
                });
            }
            return Ok(ConnectionState::Disconnected);
        }

        let nonce = store.get(keys::OAUTH_STATE).await?;
        let redirect = store.get(keys::OAUTH_REDIRECT_URI).await?;
        if let (Some(state), Some(redirect_uri)) = (nonce, redirect) {
            return Ok(ConnectionState::Pending {
                state,
                redirect_uri,
            });
        }

        Ok(ConnectionState::Disconnected)
    }

    /// Persist this state, clearing the keys the state does not own.
    ///
    /// `Connected` clears the transient nonce fields; `Pending` clears any
    /// stale credential fields; `Disconnected` clears everything.
    pub async fn save(&self, store: &dyn KvStore) -> Result<()> {
        match self {
            ConnectionState::Disconnected => {
                clear(store).await?;
            }
            ConnectionState::Pending {
                state,
                redirect_uri,
            } => {
                store.delete(keys::CONNECTED).await?;
                store.delete(keys::ACCESS_TOKEN).await?;
                store.delete(keys::PROFILE).await?;
                store.delete(keys::USER_ID).await?;
                store.put(keys::OAUTH_STATE, state).await?;
                store.put(keys::OAUTH_REDIRECT_URI, redirect_uri).await?;
            }
            ConnectionState::Connected {
                access_token,
                profile,
            } => {
                let profile_json = serde_json::to_string(profile).map_err(|e| {
                    crate::error::StoreError::Corrupt {
                        key: keys::PROFILE.to_string(),
                        reason: e.to_string(),
                    }
                })?;
                store.put(keys::CONNECTED, "true").await?;
                store.put(keys::ACCESS_TOKEN, access_token).await?;
                store.put(keys::PROFILE, &profile_json).await?;
                store.put(keys::USER_ID, &profile.sub).await?;
                store.delete(keys::OAUTH_STATE).await?;
                store.delete(keys::OAUTH_REDIRECT_URI).await?;
            }
        }
        Ok(())
    }
}

/// Remove every connection key. Idempotent.
pub async fn clear(store: &dyn KvStore) -> Result<()> {
    store.delete(keys::CONNECTED).await?;
    store.delete(keys::ACCESS_TOKEN).await?;
    store.delete(keys::PROFILE).await?;
    store.delete(keys::USER_ID).await?;
    store.delete(keys::OAUTH_STATE).await?;
    store.delete(keys::OAUTH_REDIRECT_URI).await?;
    Ok(())
}
