//! Session records and handles.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};
use std::fmt;
use uuid::Uuid;

/// Random bytes behind each session handle.
pub const HANDLE_BYTES: usize = 32;

/// A persisted session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    pub token: String,
    pub identity_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl SessionRecord {
    /// Whether the session is usable at `now`. The expiry instant itself is
    /// already expired.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// An opaque session handle handed to the client.
///
/// `Debug` and `Display` only show the fingerprint.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionHandle {
    token: String,
    expires_at: DateTime<Utc>,
}

impl SessionHandle {
    pub(crate) fn generate(expires_at: DateTime<Utc>) -> Self {
        let mut bytes = [0u8; HANDLE_BYTES];
        rand::rng().fill_bytes(&mut bytes);
        Self {
            token: URL_SAFE_NO_PAD.encode(bytes),
            expires_at,
        }
    }

    /// The raw handle. Never log this.
    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn into_token(self) -> String {
        self.token
    }
}

impl fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionHandle")
            .field("fingerprint", &fingerprint(&self.token))
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

impl fmt::Display for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session:{}", fingerprint(&self.token))
    }
}

/// Short, non-reversible label for a session handle, safe for logs.
pub fn fingerprint(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    hex::encode(&digest[..4])
}
