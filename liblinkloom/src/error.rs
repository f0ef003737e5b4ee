//! Error types for LinkLoom

use thiserror::Error;

pub type Result<T> = std::result::Result<T, LinkloomError>;

#[derive(Error, Debug)]
pub enum LinkloomError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Connection error: {0}")]
    Connect(#[from] ConnectError),

    #[error("Not connected to LinkedIn")]
    NotConnected,

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl LinkloomError {
    /// Returns the appropriate exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            LinkloomError::InvalidInput(_) => 3,
            LinkloomError::Connect(_) => 2,
            LinkloomError::NotConnected => 2,
            LinkloomError::Config(_) => 1,
            LinkloomError::Store(_) => 1,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Store operation failed: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration failed: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Corrupt value under key '{key}': {reason}")]
    Corrupt { key: String, reason: String },
}

/// Failures of the OAuth connect flow.
///
/// `StateMismatch` means the callback carried a nonce that does not match the
/// pending authorization request; the exchange is never attempted in that
/// case. `TokenExchangeFailed` and `ProfileFetchFailed` are kept distinct:
/// the latter means credentials were obtained but the identity lookup failed.
#[derive(Error, Debug)]
pub enum ConnectError {
    #[error("Authorization state mismatch")]
    StateMismatch,

    #[error("Token exchange failed: {0}")]
    TokenExchangeFailed(ApiError),

    #[error("Profile fetch failed: {0}")]
    ProfileFetchFailed(ApiError),
}

/// Transport-level failure talking to an external endpoint.
///
/// These never escape the publish or generation flows directly; both degrade
/// to a local outcome. The connect flow wraps them in [`ConnectError`].
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Provider returned {status}: {body}")]
    Provider { status: u16, body: String },
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        ApiError::Network(e.to_string())
    }
}
