//! Session lifetime and cookie configuration.

use super::default_true;
use serde::{Deserialize, Serialize};

/// Longest session lifetime a configuration may ask for.
pub const MAX_TTL_DAYS: u32 = 3650;

/// Configuration for issued sessions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Session lifetime in days.
    #[serde(default = "default_ttl_days")]
    pub ttl_days: u32,

    /// Cookie attributes used when the handle travels in a cookie.
    #[serde(default)]
    pub cookie: CookieConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_days: default_ttl_days(),
            cookie: CookieConfig::default(),
        }
    }
}

impl SessionConfig {
    /// Session lifetime in seconds.
    pub fn ttl_seconds(&self) -> i64 {
        i64::from(self.ttl_days) * 24 * 60 * 60
    }
}

/// Cookie attributes for the session handle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CookieConfig {
    /// Cookie name.
    #[serde(default = "default_cookie_name")]
    pub name: String,

    /// Whether to add the `Secure` attribute.
    #[serde(default = "default_true")]
    pub secure: bool,

    /// Whether to add the `HttpOnly` attribute.
    #[serde(default = "default_true")]
    pub http_only: bool,

    /// `SameSite` attribute.
    #[serde(default)]
    pub same_site: SameSite,

    /// Cookie path.
    #[serde(default = "default_cookie_path")]
    pub path: String,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            name: default_cookie_name(),
            secure: true,
            http_only: true,
            same_site: SameSite::default(),
            path: default_cookie_path(),
        }
    }
}

/// `SameSite` cookie attribute.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SameSite {
    Strict,
    #[default]
    Lax,
    None,
}

impl SameSite {
    /// Attribute value as written in a `Set-Cookie` header.
    pub fn as_str(&self) -> &'static str {
        match self {
            SameSite::Strict => "Strict",
            SameSite::Lax => "Lax",
            SameSite::None => "None",
        }
    }
}

fn default_ttl_days() -> u32 {
    7
}

fn default_cookie_name() -> String {
    "handoff_session".to_string()
}

fn default_cookie_path() -> String {
    "/".to_string()
}
