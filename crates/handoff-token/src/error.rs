//! Error types for the token crate.

use thiserror::Error;

/// Errors raised while building key material.
///
/// These are configuration errors and are fatal at startup.
#[derive(Debug, Error)]
pub enum KeyError {
    /// The shared secret is empty.
    #[error("shared secret must not be empty")]
    EmptySecret,
}

/// Reasons a handoff token is rejected.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TokenError {
    /// Bad encoding, bad length, or bad padding.
    #[error("malformed token: {0}")]
    Malformed(String),

    /// MAC verification failed.
    #[error("token signature does not match")]
    BadSignature,

    /// Decrypted content is not a valid identity assertion.
    #[error("invalid assertion payload: {0}")]
    InvalidPayload(String),

    /// Authentic assertion outside the freshness window.
    #[error("assertion expired ({age_seconds}s old)")]
    Expired { age_seconds: i64 },
}

impl TokenError {
    /// Stable label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            TokenError::Malformed(_) => "malformed",
            TokenError::BadSignature => "bad_signature",
            TokenError::InvalidPayload(_) => "invalid_payload",
            TokenError::Expired { .. } => "expired",
        }
    }

    /// What end users are told. Identical for every kind.
    pub fn public_reason(&self) -> &'static str {
        "invalid_token"
    }
}
