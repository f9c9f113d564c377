//! Configuration types for the handoff SSO bridge.
//!
//! # Configuration File
//!
//! ```yaml
//! token:
//!   secret_env: HANDOFF_SSO_SECRET
//!   freshness_minutes: 15
//! session:
//!   ttl_days: 7
//!   cookie:
//!     name: handoff_session
//! store:
//!   backend: sqlite
//!   sqlite_path: data/handoff.sqlite
//! server:
//!   bind: 0.0.0.0:8080
//! ```

pub mod server;
pub mod session;
pub mod store;
pub mod token;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub use server::ServerConfig;
pub use session::{CookieConfig, SameSite, SessionConfig};
pub use store::{StoreBackend, StoreConfig};
pub use token::{ClockMode, TokenConfig};

/// Environment variable naming an alternate config file.
pub const CONFIG_PATH_ENV: &str = "HANDOFF_CONFIG";

/// Config file used when neither a flag nor the environment names one.
pub const DEFAULT_CONFIG_PATH: &str = "handoff.yaml";

/// Complete handoff configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HandoffConfig {
    /// Handoff token codec settings.
    #[serde(default)]
    pub token: TokenConfig,

    /// Session lifetime and cookie transport.
    #[serde(default)]
    pub session: SessionConfig,

    /// Session and identity persistence.
    #[serde(default)]
    pub store: StoreConfig,

    /// HTTP wiring.
    #[serde(default)]
    pub server: ServerConfig,
}

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The shared secret could not be found or is empty.
    #[error("shared secret is not configured (set ${env} or token.secret_file)")]
    MissingSecret { env: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl HandoffConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML content.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path`, or from `$HANDOFF_CONFIG`, or from `handoff.yaml`.
    ///
    /// A missing file yields the defaults; a file that exists but does not
    /// parse is an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => std::env::var(CONFIG_PATH_ENV)
                .map(Into::into)
                .unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into()),
        };

        if path.exists() {
            Self::from_file(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Reject values no deployment can run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.token.freshness_minutes == 0 {
            return Err(ConfigError::Config(
                "token.freshness_minutes must be greater than zero".to_string(),
            ));
        }
        if self.session.ttl_days == 0 {
            return Err(ConfigError::Config(
                "session.ttl_days must be greater than zero".to_string(),
            ));
        }
        if self.session.ttl_days > session::MAX_TTL_DAYS {
            return Err(ConfigError::Config(format!(
                "session.ttl_days must be at most {}",
                session::MAX_TTL_DAYS
            )));
        }
        if let Some(template) = &self.server.outbound_redirect {
            if !template.contains("{token}") {
                return Err(ConfigError::Config(
                    "server.outbound_redirect must contain a {token} placeholder".to_string(),
                ));
            }
        }
        Ok(())
    }
}

// Default value functions
fn default_true() -> bool {
    true
}
