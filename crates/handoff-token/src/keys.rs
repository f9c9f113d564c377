//! Shared secret handling and key derivation.

use crate::error::KeyError;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;
use sha2::{Digest, Sha256};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// AES-128 key length.
pub const ENCRYPTION_KEY_LEN: usize = 16;

/// Length of the HMAC-SHA256 key taken from the digest tail.
pub const SIGNING_KEY_LEN: usize = 16;

/// The secret both platforms share. Loaded once at startup.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SharedSecret(Vec<u8>);

impl SharedSecret {
    /// Wrap secret bytes. An empty secret is a configuration error.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Result<Self, KeyError> {
        let bytes = bytes.into();
        if bytes.is_empty() {
            return Err(KeyError::EmptySecret);
        }
        Ok(Self(bytes))
    }

    /// Generate a fresh random secret, base64url-encoded for use in env vars.
    pub fn generate_encoded() -> String {
        let mut rng = rand::rng();
        let mut bytes = [0u8; 32];
        rng.fill_bytes(&mut bytes);
        let encoded = URL_SAFE_NO_PAD.encode(bytes);
        bytes.zeroize();
        encoded
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SharedSecret(..)")
    }
}

/// Encryption and signing subkeys derived from one [`SharedSecret`].
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct DerivedKeys {
    encryption: [u8; ENCRYPTION_KEY_LEN],
    signing: [u8; SIGNING_KEY_LEN],
}

impl DerivedKeys {
    /// Split `SHA-256(secret)`: bytes 0..16 encrypt, bytes 16..32 sign.
    pub fn derive(secret: &SharedSecret) -> Self {
        let mut digest = Sha256::digest(secret.as_bytes());

        let mut encryption = [0u8; ENCRYPTION_KEY_LEN];
        let mut signing = [0u8; SIGNING_KEY_LEN];
        encryption.copy_from_slice(&digest[..ENCRYPTION_KEY_LEN]);
        signing.copy_from_slice(&digest[ENCRYPTION_KEY_LEN..]);
        digest.zeroize();

        Self {
            encryption,
            signing,
        }
    }

    pub fn encryption_key(&self) -> &[u8; ENCRYPTION_KEY_LEN] {
        &self.encryption
    }

    pub fn signing_key(&self) -> &[u8; SIGNING_KEY_LEN] {
        &self.signing
    }
}

impl fmt::Debug for DerivedKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DerivedKeys(..)")
    }
}

/// Derive the subkey pair straight from secret bytes.
pub fn derive_keys(secret: &[u8]) -> Result<DerivedKeys, KeyError> {
    let secret = SharedSecret::new(secret)?;
    Ok(DerivedKeys::derive(&secret))
}
