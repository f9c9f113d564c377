//! # handoff-token
//!
//! Handoff tokens for bridging two independently authenticated platforms.
//!
//! One side encodes an [`IdentityAssertion`] into an opaque, URL-safe token and
//! hands it to the other side in a redirect; the receiver decodes it,
//! authenticates it, checks it is fresh, and establishes its own session.
//!
//! ## Token Layout
//!
//! ```text
//! base64url( IV (16 bytes) || AES-128-CBC ciphertext || HMAC-SHA256 (32 bytes) )
//! ```
//!
//! | Part | Key | Notes |
//! |------|-----|-------|
//! | IV | - | Fresh random bytes per token |
//! | Ciphertext | encryption key | JSON payload, PKCS#7 padded |
//! | Signature | signing key | Covers `IV || ciphertext`, checked before decryption |
//!
//! Both keys come from a single shared secret: `SHA-256(secret)` is split into
//! the encryption key (bytes 0..16) and the signing key (bytes 16..32).
//!
//! ## Failure Reporting
//!
//! Every rejection carries a distinct [`TokenError`] kind for logs, but callers
//! show end users the same [`TokenError::public_reason`] for all of them.

pub mod assertion;
pub mod codec;
pub mod error;
pub mod keys;

pub use assertion::{CUSTOMER_ID_WIRE_KEY, IdentityAssertion, parse_timestamp};
pub use codec::TokenCodec;
pub use error::{KeyError, TokenError};
pub use keys::{DerivedKeys, SharedSecret, derive_keys};
