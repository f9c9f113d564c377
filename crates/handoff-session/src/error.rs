//! Error types for the session crate.

use thiserror::Error;

/// Faults in the backing store. Never a statement about credentials.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error (includes pool timeouts).
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Schema migration failed.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// The store could not be reached or timed out.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Filesystem error preparing the database location.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The store refused a record (duplicate token, unrepresentable expiry).
    #[error("record rejected: {0}")]
    Rejected(String),

    /// A stored row could not be decoded.
    #[error("corrupt record: {0}")]
    Corrupt(String),
}

/// Why a presented session handle did not authenticate.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No handle was presented.
    #[error("no session token presented")]
    Missing,

    /// Unknown, expired, or revoked handle.
    #[error("session is invalid or expired")]
    InvalidOrExpired,

    /// The store failed; the handle may well be valid.
    #[error("session store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),
}

impl AuthError {
    /// Stable label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            AuthError::Missing => "missing",
            AuthError::InvalidOrExpired => "invalid_or_expired",
            AuthError::StoreUnavailable(_) => "store_unavailable",
        }
    }
}
