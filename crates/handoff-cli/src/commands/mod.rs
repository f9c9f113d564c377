//! CLI command implementations for the handoff bridge.

pub mod secret;
pub mod sessions;
pub mod token;

use anyhow::Context;
use handoff_core::HandoffConfig;
use handoff_token::{SharedSecret, TokenCodec};

/// Build the codec from the configured shared secret.
pub fn load_codec(config: &HandoffConfig) -> anyhow::Result<TokenCodec> {
    let secret = config.token.resolve_secret().context(
        "Shared secret not found. Set the configured secret env var or token.secret_file",
    )?;
    let secret = SharedSecret::new(secret.into_bytes())?;
    Ok(TokenCodec::from_config(&secret, &config.token))
}
