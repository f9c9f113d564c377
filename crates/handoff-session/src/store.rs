//! Session storage backends.

use crate::error::StoreError;
use crate::identity::{Identity, IdentityProfile, IdentityStore};
use crate::record::SessionRecord;
use crate::sqlite::SqliteStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use handoff_core::{StoreBackend, StoreConfig};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Trait for session storage backends.
///
/// Implementations must make a single write immediately visible to every
/// subsequent lookup.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Persist a new session.
    ///
    /// Tokens are unique: inserting a token that is already stored fails with
    /// [`StoreError::Rejected`] and leaves the existing record untouched.
    async fn insert(&self, record: SessionRecord) -> Result<(), StoreError>;

    /// Find the session for `token` if it is still active at `now`.
    async fn find_active(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<SessionRecord>, StoreError>;

    /// Delete the session for `token`. Returns whether a record was removed.
    async fn delete(&self, token: &str) -> Result<bool, StoreError>;

    /// Delete every session expired at `now`. Returns the number removed.
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError>;
}

/// Both halves of a backend, sharing one connection or map set.
#[derive(Clone)]
pub struct Stores {
    pub sessions: Arc<dyn SessionStore>,
    pub identities: Arc<dyn IdentityStore>,
}

impl Stores {
    pub fn memory() -> Self {
        Self::from_backend(Arc::new(MemoryStore::new()))
    }

    pub fn from_backend<S>(store: Arc<S>) -> Self
    where
        S: SessionStore + IdentityStore + 'static,
    {
        Self {
            sessions: store.clone(),
            identities: store,
        }
    }
}

/// Open the backend named by configuration.
pub async fn open_stores(config: &StoreConfig) -> Result<Stores, StoreError> {
    match config.backend {
        StoreBackend::Memory => Ok(Stores::memory()),
        StoreBackend::Sqlite => {
            let store = SqliteStore::connect(&config.sqlite_path).await?;
            Ok(Stores::from_backend(Arc::new(store)))
        }
    }
}

/// Process-local store. Everything is lost on restart.
#[derive(Default)]
pub struct MemoryStore {
    sessions: RwLock<HashMap<String, SessionRecord>>,
    identities: RwLock<HashMap<Uuid, Identity>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of session records held, expired ones included.
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn insert(&self, record: SessionRecord) -> Result<(), StoreError> {
        match self.sessions.write().await.entry(record.token.clone()) {
            Entry::Occupied(_) => Err(StoreError::Rejected("duplicate session token".to_string())),
            Entry::Vacant(slot) => {
                slot.insert(record);
                Ok(())
            }
        }
    }

    async fn find_active(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<SessionRecord>, StoreError> {
        let sessions = self.sessions.read().await;
        Ok(sessions
            .get(token)
            .filter(|record| record.is_active_at(now))
            .cloned())
    }

    async fn delete(&self, token: &str) -> Result<bool, StoreError> {
        Ok(self.sessions.write().await.remove(token).is_some())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, record| record.is_active_at(now));
        Ok((before - sessions.len()) as u64)
    }
}

#[async_trait]
impl IdentityStore for MemoryStore {
    async fn upsert(&self, profile: &IdentityProfile) -> Result<Identity, StoreError> {
        let now = Utc::now();
        let mut identities = self.identities.write().await;

        if let Some(existing) = identities
            .values_mut()
            .find(|identity| identity.email == profile.email)
        {
            existing.apply(profile, now);
            return Ok(existing.clone());
        }

        let identity = Identity::create(profile, now);
        identities.insert(identity.id, identity.clone());
        Ok(identity)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Identity>, StoreError> {
        Ok(self.identities.read().await.get(&id).cloned())
    }
}
