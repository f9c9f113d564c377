//! Session lifecycle: issue, authenticate, revoke.

use crate::error::{AuthError, StoreError};
use crate::identity::{Identity, IdentityStore};
use crate::record::{SessionHandle, SessionRecord, fingerprint};
use crate::store::{SessionStore, Stores};
use chrono::{DateTime, Duration, Utc};
use handoff_core::SessionConfig;
use std::sync::Arc;
use uuid::Uuid;

/// Default session lifetime.
pub const DEFAULT_SESSION_TTL_DAYS: i64 = 7;

/// Issues and checks opaque session handles.
///
/// Stateless apart from the stores, so it is safe to share behind an `Arc`.
#[derive(Clone)]
pub struct SessionManager {
    sessions: Arc<dyn SessionStore>,
    identities: Arc<dyn IdentityStore>,
    ttl: Duration,
}

impl SessionManager {
    pub fn new(sessions: Arc<dyn SessionStore>, identities: Arc<dyn IdentityStore>) -> Self {
        Self {
            sessions,
            identities,
            ttl: Duration::days(DEFAULT_SESSION_TTL_DAYS),
        }
    }

    /// Build from opened stores and session configuration.
    pub fn from_config(stores: &Stores, config: &SessionConfig) -> Self {
        Self::new(stores.sessions.clone(), stores.identities.clone())
            .with_ttl(Duration::seconds(config.ttl_seconds()))
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a new session for an identity.
    pub async fn issue(&self, identity_id: Uuid) -> Result<SessionHandle, StoreError> {
        self.issue_at(identity_id, Utc::now()).await
    }

    /// Issue a session as if the current time were `now`.
    ///
    /// Timestamps are kept to whole milliseconds, the precision every store
    /// persists, so the returned expiry is exactly the stored one.
    pub async fn issue_at(
        &self,
        identity_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<SessionHandle, StoreError> {
        let now = whole_millis(now);
        let expires_at = now.checked_add_signed(self.ttl).ok_or_else(|| {
            StoreError::Rejected(format!("session ttl {} overflows the expiry", self.ttl))
        })?;

        let handle = SessionHandle::generate(expires_at);
        let record = SessionRecord {
            token: handle.token().to_string(),
            identity_id,
            created_at: now,
            expires_at: handle.expires_at(),
        };

        self.sessions.insert(record).await?;
        tracing::info!(
            session = %fingerprint(handle.token()),
            identity_id = %identity_id,
            expires_at = %handle.expires_at(),
            "Session issued"
        );
        Ok(handle)
    }

    /// Resolve a presented handle to its identity.
    pub async fn authenticate(&self, token: &str) -> Result<Identity, AuthError> {
        self.authenticate_at(token, Utc::now()).await
    }

    /// Resolve a handle as if the current time were `now`.
    ///
    /// A store failure is reported as [`AuthError::StoreUnavailable`], never as
    /// an invalid session.
    pub async fn authenticate_at(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Identity, AuthError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(AuthError::Missing);
        }
        let session = fingerprint(token);

        let record = match self.sessions.find_active(token, now).await {
            Ok(Some(record)) => record,
            Ok(None) => {
                tracing::debug!(session = %session, "Session not found or expired");
                return Err(AuthError::InvalidOrExpired);
            }
            Err(e) => {
                tracing::error!(session = %session, error = %e, "Session store lookup failed");
                return Err(AuthError::StoreUnavailable(e));
            }
        };

        match self.identities.find_by_id(record.identity_id).await {
            Ok(Some(identity)) => Ok(identity),
            Ok(None) => {
                tracing::debug!(
                    session = %session,
                    identity_id = %record.identity_id,
                    "Session refers to a missing identity"
                );
                Err(AuthError::InvalidOrExpired)
            }
            Err(e) => {
                tracing::error!(session = %session, error = %e, "Identity store lookup failed");
                Err(AuthError::StoreUnavailable(e))
            }
        }
    }

    /// Revoke a session. Returns whether a live record was removed; revoking
    /// an unknown or already revoked handle is not an error.
    pub async fn revoke(&self, token: &str) -> Result<bool, StoreError> {
        let token = token.trim();
        if token.is_empty() {
            return Ok(false);
        }

        let removed = self.sessions.delete(token).await?;
        tracing::info!(session = %fingerprint(token), removed, "Session revoked");
        Ok(removed)
    }

    /// Delete sessions expired at `now`.
    pub async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let purged = self.sessions.purge_expired(now).await?;
        tracing::info!(purged, "Expired sessions purged");
        Ok(purged)
    }
}

fn whole_millis(t: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(t.timestamp_millis()).unwrap_or(t)
}
