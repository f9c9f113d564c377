//! Local identities keyed by email.

use crate::error::StoreError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Profile fields taken from a verified assertion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityProfile {
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub customer_id: Option<String>,
}

impl IdentityProfile {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            ..Default::default()
        }
    }
}

/// A local identity record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: Uuid,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub customer_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Identity {
    pub(crate) fn create(profile: &IdentityProfile, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: profile.email.clone(),
            first_name: profile.first_name.clone(),
            last_name: profile.last_name.clone(),
            customer_id: profile.customer_id.clone(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrite profile fields, keeping `id`, `email` and `created_at`.
    pub(crate) fn apply(&mut self, profile: &IdentityProfile, now: DateTime<Utc>) {
        self.first_name = profile.first_name.clone();
        self.last_name = profile.last_name.clone();
        self.customer_id = profile.customer_id.clone();
        self.updated_at = now;
    }
}

/// Storage for identities.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Create the identity for `profile.email`, or overwrite its profile
    /// fields if it exists. The id of an existing identity never changes.
    async fn upsert(&self, profile: &IdentityProfile) -> Result<Identity, StoreError>;

    /// Look an identity up by id.
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Identity>, StoreError>;
}
