//! Hosted identity/session backend seam
//!
//! The product signs users in through a hosted auth service. That service is
//! an external collaborator: this module only defines the interface the rest
//! of the code programs against, plus the one rule the core owns, which is
//! that a session counts as signed in only once the email address is
//! confirmed.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::error::ApiError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: String,
    pub email: Option<String>,
    /// Set by the backend once the address is verified. Its presence is the
    /// sole gate for treating the session as valid.
    pub email_confirmed_at: Option<String>,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub user: SessionUser,
}

impl Session {
    pub fn is_valid(&self) -> bool {
        self.user.email_confirmed_at.is_some()
    }
}

/// Auth lifecycle notifications, in the shape the hosted backend emits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn,
    SignedOut,
    TokenRefreshed,
}

/// One auth-state-change notification: the event plus the session as it
/// stands after the change (absent after a sign-out).
#[derive(Debug, Clone, PartialEq)]
pub struct AuthChange {
    pub event: AuthEvent,
    pub session: Option<Session>,
}

/// Interface of the hosted auth/database backend. Not reimplemented here;
/// production code talks to the hosted service, tests use a double.
#[async_trait]
pub trait IdentityBackend: Send + Sync {
    async fn sign_in_with_oauth(
        &self,
        provider: &str,
        redirect_to: &str,
    ) -> std::result::Result<(), ApiError>;

    async fn get_session(&self) -> std::result::Result<Option<Session>, ApiError>;

    async fn sign_out(&self) -> std::result::Result<(), ApiError>;

    async fn update_user(
        &self,
        metadata: serde_json::Value,
    ) -> std::result::Result<(), ApiError>;

    /// Auth state change notifications.
    fn subscribe(&self) -> broadcast::Receiver<AuthChange>;
}
