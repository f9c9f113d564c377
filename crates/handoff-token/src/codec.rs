//! Handoff token encoding and verification.

use crate::assertion::IdentityAssertion;
use crate::error::TokenError;
use crate::keys::{DerivedKeys, SharedSecret};
use aes::cipher::block_padding::Pkcs7;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::{Engine, alphabet};
use chrono::{DateTime, Duration, FixedOffset, Utc};
use handoff_core::{ClockMode, TokenConfig};
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;

type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;
type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;
type HmacSha256 = Hmac<Sha256>;

/// IV length (one AES block).
pub const IV_LEN: usize = 16;

/// HMAC-SHA256 output length.
pub const MAC_LEN: usize = 32;

const BLOCK_LEN: usize = 16;

/// Default freshness window.
pub const DEFAULT_FRESHNESS_MINUTES: i64 = 15;

/// base64url; never pads on encode, accepts either form on decode.
const TRANSPORT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Encodes and verifies handoff tokens.
///
/// Holds only immutable key material, so one codec can be shared across all
/// request handlers.
#[derive(Debug, Clone)]
pub struct TokenCodec {
    keys: DerivedKeys,
    freshness: Duration,
    clock: ClockMode,
}

impl TokenCodec {
    /// Create a codec with the default 15 minute window and UTC clock.
    pub fn new(secret: &SharedSecret) -> Self {
        Self {
            keys: DerivedKeys::derive(secret),
            freshness: Duration::minutes(DEFAULT_FRESHNESS_MINUTES),
            clock: ClockMode::Utc,
        }
    }

    /// Create a codec using the window and clock from configuration.
    pub fn from_config(secret: &SharedSecret, config: &TokenConfig) -> Self {
        Self::new(secret)
            .with_freshness(Duration::seconds(config.freshness_seconds()))
            .with_clock(config.clock)
    }

    pub fn with_freshness(mut self, freshness: Duration) -> Self {
        self.freshness = freshness;
        self
    }

    pub fn with_clock(mut self, clock: ClockMode) -> Self {
        self.clock = clock;
        self
    }

    pub fn freshness(&self) -> Duration {
        self.freshness
    }

    /// Encode an assertion into a transport token under a fresh random IV.
    pub fn encode(&self, assertion: &IdentityAssertion) -> Result<String, TokenError> {
        let plaintext = assertion.to_payload()?;

        let mut rng = rand::rng();
        let mut iv = [0u8; IV_LEN];
        rng.fill_bytes(&mut iv);

        self.seal(&plaintext, iv)
    }

    /// Decode and verify a token against the system clock.
    pub fn decode(&self, token: &str) -> Result<IdentityAssertion, TokenError> {
        self.decode_at(token, Utc::now())
    }

    /// Decode and verify a token as of `now`.
    pub fn decode_at(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<IdentityAssertion, TokenError> {
        let result = self
            .open(token)
            .and_then(|assertion| self.check_freshness(assertion, now));

        match &result {
            Ok(assertion) => {
                tracing::debug!(created_at = %assertion.created_at, "handoff token accepted");
            }
            Err(e @ TokenError::Expired { age_seconds }) => {
                tracing::info!(kind = e.kind(), age_seconds, "handoff token rejected");
            }
            Err(e) => {
                tracing::debug!(kind = e.kind(), error = %e, "handoff token rejected");
            }
        }

        result
    }

    /// Verify and decrypt a token without enforcing freshness.
    ///
    /// For operator diagnostics only; never use this to establish a session.
    pub fn inspect(&self, token: &str) -> Result<IdentityAssertion, TokenError> {
        self.open(token)
    }

    /// Age of an assertion as of `now` under the configured clock.
    pub fn age_at(&self, created_at: &DateTime<FixedOffset>, now: DateTime<Utc>) -> Duration {
        match self.clock {
            ClockMode::Utc => now - created_at.with_timezone(&Utc),
            ClockMode::AssertionOffset => {
                let offset = *created_at.offset();
                let relabelled = now
                    .naive_utc()
                    .and_local_timezone(offset)
                    .single()
                    .unwrap_or_else(|| now.with_timezone(&offset));
                relabelled - *created_at
            }
        }
    }

    /// PKCS#7 pad, AES-128-CBC encrypt, MAC `IV || ciphertext`, base64url.
    fn seal(&self, plaintext: &[u8], iv: [u8; IV_LEN]) -> Result<String, TokenError> {
        let ciphertext = Aes128CbcEnc::new(&(*self.keys.encryption_key()).into(), &iv.into())
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext);

        let mut token = Vec::with_capacity(IV_LEN + ciphertext.len() + MAC_LEN);
        token.extend_from_slice(&iv);
        token.extend_from_slice(&ciphertext);

        let signature = self.mac(&token)?.finalize().into_bytes();
        token.extend_from_slice(&signature);

        Ok(TRANSPORT.encode(token))
    }

    /// Decode, authenticate, decrypt and parse. The MAC is checked before any
    /// decryption is attempted.
    fn open(&self, token: &str) -> Result<IdentityAssertion, TokenError> {
        let raw = TRANSPORT
            .decode(token.trim())
            .map_err(|e| TokenError::Malformed(format!("invalid base64url: {e}")))?;

        if raw.len() < IV_LEN + 1 + MAC_LEN {
            return Err(TokenError::Malformed(format!(
                "token is {} bytes, need at least {}",
                raw.len(),
                IV_LEN + 1 + MAC_LEN
            )));
        }

        let (signed, signature) = raw.split_at(raw.len() - MAC_LEN);
        self.mac(signed)?
            .verify_slice(signature)
            .map_err(|_| TokenError::BadSignature)?;

        let (iv, ciphertext) = signed.split_at(IV_LEN);
        if ciphertext.len() % BLOCK_LEN != 0 {
            return Err(TokenError::Malformed(
                "ciphertext is not a whole number of blocks".to_string(),
            ));
        }
        let iv: [u8; IV_LEN] = iv
            .try_into()
            .map_err(|_| TokenError::Malformed("bad IV length".to_string()))?;

        let plaintext = Aes128CbcDec::new(&(*self.keys.encryption_key()).into(), &iv.into())
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
            .map_err(|_| TokenError::Malformed("invalid padding".to_string()))?;

        IdentityAssertion::from_payload(&plaintext)
    }

    fn check_freshness(
        &self,
        assertion: IdentityAssertion,
        now: DateTime<Utc>,
    ) -> Result<IdentityAssertion, TokenError> {
        // An age of exactly the window is still fresh.
        let age = self.age_at(&assertion.created_at, now);
        if age > self.freshness {
            return Err(TokenError::Expired {
                age_seconds: age.num_seconds(),
            });
        }
        Ok(assertion)
    }

    fn mac(&self, data: &[u8]) -> Result<HmacSha256, TokenError> {
        let mut mac = <HmacSha256 as Mac>::new_from_slice(self.keys.signing_key())
            .map_err(|e| TokenError::Malformed(format!("signing key rejected: {e}")))?;
        mac.update(data);
        Ok(mac)
    }
}
