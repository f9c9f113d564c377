//! Handoff token configuration.

use super::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Which "now" the freshness check compares a creation timestamp against.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ClockMode {
    /// True UTC now.
    #[default]
    Utc,
    /// UTC wall-clock time re-labelled with the assertion's own offset.
    ///
    /// Lets an issuer stretch validity by choosing the offset. Only for peers
    /// that depend on the legacy comparison.
    AssertionOffset,
}

/// Configuration for the handoff token codec.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenConfig {
    /// Environment variable holding the shared secret.
    #[serde(default = "default_secret_env")]
    pub secret_env: String,

    /// File holding the shared secret (used when the env var is unset).
    #[serde(default)]
    pub secret_file: Option<PathBuf>,

    /// Maximum accepted assertion age, in minutes.
    #[serde(default = "default_freshness_minutes")]
    pub freshness_minutes: u32,

    /// Clock used for the freshness check.
    #[serde(default)]
    pub clock: ClockMode,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            secret_env: default_secret_env(),
            secret_file: None,
            freshness_minutes: default_freshness_minutes(),
            clock: ClockMode::default(),
        }
    }
}

impl TokenConfig {
    /// Resolve the shared secret from the environment or file.
    ///
    /// An absent or blank secret is a fatal configuration error.
    pub fn resolve_secret(&self) -> Result<String, ConfigError> {
        // Try environment variable first
        if let Ok(secret) = std::env::var(&self.secret_env) {
            if !secret.is_empty() {
                return Ok(secret);
            }
        }

        // Try file path
        if let Some(path) = &self.secret_file {
            if path.exists() {
                let secret = std::fs::read_to_string(path)?;
                let secret = secret.trim_end_matches(['\r', '\n']);
                if !secret.is_empty() {
                    return Ok(secret.to_string());
                }
            }
        }

        Err(ConfigError::MissingSecret {
            env: self.secret_env.clone(),
        })
    }

    /// The freshness window in seconds.
    pub fn freshness_seconds(&self) -> i64 {
        i64::from(self.freshness_minutes) * 60
    }
}

fn default_secret_env() -> String {
    "HANDOFF_SSO_SECRET".to_string()
}

fn default_freshness_minutes() -> u32 {
    15
}
