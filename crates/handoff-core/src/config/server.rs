//! HTTP server configuration.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address, e.g. "0.0.0.0:8080"
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Where failed handoffs are redirected (with `?error=<reason>`).
    #[serde(default = "default_login_path")]
    pub login_path: String,

    /// Redirect target when the callback carries no usable `return_to`.
    #[serde(default = "default_return_to")]
    pub default_return_to: String,

    /// Counter-party URL for the reverse direction, with a `{token}` placeholder,
    /// e.g. `https://shop.example.com/account/login/multipass/{token}`.
    #[serde(default)]
    pub outbound_redirect: Option<String>,
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_login_path() -> String {
    "/login".to_string()
}

fn default_return_to() -> String {
    "/".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            login_path: default_login_path(),
            default_return_to: default_return_to(),
            outbound_redirect: None,
        }
    }
}
