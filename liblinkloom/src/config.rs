//! Configuration management for LinkLoom

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{ConfigError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub store: StoreConfig,
    pub linkedin: LinkedInConfig,
    pub generator: GeneratorConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkedInConfig {
    pub client_id: String,
    /// Path to a file holding the OAuth client secret. Kept out of the
    /// config file itself so the config can be committed or shared.
    pub client_secret_file: String,
    pub redirect_uri: String,
    #[serde(default = "default_authorize_url")]
    pub authorize_url: String,
    #[serde(default = "default_token_url")]
    pub token_url: String,
    #[serde(default = "default_profile_url")]
    pub profile_url: String,
    #[serde(default = "default_post_url")]
    pub post_url: String,
}

impl LinkedInConfig {
    /// Read the client secret from its file.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or is empty.
    pub fn read_client_secret(&self) -> Result<String> {
        let path = shellexpand::tilde(&self.client_secret_file).to_string();
        let secret = std::fs::read_to_string(&path)
            .map_err(ConfigError::ReadError)?
            .trim()
            .to_string();

        if secret.is_empty() {
            return Err(ConfigError::MissingField(format!(
                "client secret file is empty: {}",
                self.client_secret_file
            ))
            .into());
        }

        Ok(secret)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    pub endpoint: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_tone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_industry: Option<String>,
}

fn default_authorize_url() -> String {
    "https://www.linkedin.com/oauth/v2/authorization".to_string()
}

fn default_token_url() -> String {
    "https://www.linkedin.com/oauth/v2/accessToken".to_string()
}

fn default_profile_url() -> String {
    "https://api.linkedin.com/v2/userinfo".to_string()
}

fn default_post_url() -> String {
    "https://api.linkedin.com/v2/ugcPosts".to_string()
}

impl Config {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        let config_path = resolve_config_path()?;
        Self::load_from_path(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        let config: Config = toml::from_str(&content).map_err(ConfigError::ParseError)?;
        Ok(config)
    }

    /// Create a default configuration
    pub fn default_config() -> Self {
        Self {
            store: StoreConfig {
                path: "~/.local/share/linkloom/store.db".to_string(),
            },
            linkedin: LinkedInConfig {
                client_id: String::new(),
                client_secret_file: "~/.config/linkloom/linkedin.secret".to_string(),
                redirect_uri: "http://localhost:8080/callback".to_string(),
                authorize_url: default_authorize_url(),
                token_url: default_token_url(),
                profile_url: default_profile_url(),
                post_url: default_post_url(),
            },
            generator: GeneratorConfig {
                endpoint: "http://localhost:3000/api/generate".to_string(),
                default_tone: None,
                default_industry: None,
            },
        }
    }
}

/// Resolve the configuration file path following XDG Base Directory spec
pub fn resolve_config_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("LINKLOOM_CONFIG") {
        return Ok(PathBuf::from(shellexpand::tilde(&path).to_string()));
    }

    let config_dir = dirs::config_dir()
        .ok_or_else(|| ConfigError::MissingField("config directory".to_string()))?;

    Ok(config_dir.join("linkloom").join("config.toml"))
}
