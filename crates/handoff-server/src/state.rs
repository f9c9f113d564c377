use anyhow::Context;
use handoff_core::HandoffConfig;
use handoff_session::{IdentityStore, SessionCookie, SessionManager, Stores, open_stores};
use handoff_token::{SharedSecret, TokenCodec};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: HandoffConfig,
    pub codec: TokenCodec,
    pub sessions: SessionManager,
    pub identities: Arc<dyn IdentityStore>,
    pub cookie: SessionCookie,
}

impl AppState {
    /// Resolve the shared secret and open the configured stores.
    ///
    /// A missing secret fails here, before anything is served.
    pub async fn init(config: HandoffConfig) -> anyhow::Result<Self> {
        let secret = config
            .token
            .resolve_secret()
            .context("cannot start without the shared SSO secret")?;
        let secret = SharedSecret::new(secret.into_bytes())?;

        let stores = open_stores(&config.store)
            .await
            .with_context(|| format!("cannot open {:?} session store", config.store.backend))?;

        tracing::info!(
            backend = ?config.store.backend,
            freshness_minutes = config.token.freshness_minutes,
            ttl_days = config.session.ttl_days,
            "Handoff state initialized"
        );

        Ok(Self::new(config, &secret, stores))
    }

    pub fn new(config: HandoffConfig, secret: &SharedSecret, stores: Stores) -> Self {
        Self {
            codec: TokenCodec::from_config(secret, &config.token),
            sessions: SessionManager::from_config(&stores, &config.session),
            identities: stores.identities,
            cookie: SessionCookie::from_config(&config.session),
            config,
        }
    }
}
