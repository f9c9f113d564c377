//! Behavioural properties of the handoff token codec.
//!
//! Run with: cargo test --package handoff-token --test codec_properties

use aes::cipher::block_padding::{NoPadding, Pkcs7};
use aes::cipher::{BlockEncryptMut, KeyIvInit};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{Duration, TimeZone, Utc};
use handoff_token::{IdentityAssertion, SharedSecret, TokenCodec, TokenError, derive_keys};
use hmac::{Hmac, Mac};
use sha2::Sha256;

const SECRET: &str = "test-secret";

fn codec() -> TokenCodec {
    TokenCodec::new(&SharedSecret::new(SECRET).unwrap())
}

/// Build a correctly signed token around arbitrary ciphertext bytes.
fn signed_token(iv: [u8; 16], ciphertext: &[u8]) -> String {
    let keys = derive_keys(SECRET.as_bytes()).unwrap();
    let mut body = iv.to_vec();
    body.extend_from_slice(ciphertext);

    let mut mac = <Hmac<Sha256> as Mac>::new_from_slice(keys.signing_key()).unwrap();
    mac.update(&body);
    body.extend_from_slice(&mac.finalize().into_bytes());

    URL_SAFE_NO_PAD.encode(body)
}

fn encrypt(plaintext: &[u8], iv: [u8; 16]) -> Vec<u8> {
    let keys = derive_keys(SECRET.as_bytes()).unwrap();
    cbc::Encryptor::<aes::Aes128>::new(&(*keys.encryption_key()).into(), &iv.into())
        .encrypt_padded_vec_mut::<Pkcs7>(plaintext)
}

#[test]
fn test_roundtrip_preserves_populated_fields() {
    let created = Utc.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).unwrap();
    let assertion = IdentityAssertion::new("ada@example.com", created)
        .with_first_name("Ada")
        .with_last_name("Lovelace")
        .with_customer_id("8812");

    let codec = codec();
    let token = codec.encode(&assertion).unwrap();
    let decoded = codec
        .decode_at(&token, created + Duration::minutes(3))
        .unwrap();

    assert_eq!(decoded, assertion);
}

#[test]
fn test_end_to_end_example() {
    let codec = codec();
    let now = Utc::now();
    let token = codec
        .encode(&IdentityAssertion::new("a@b.com", now))
        .unwrap();

    let decoded = codec.decode(&token).unwrap();
    assert_eq!(decoded.email, "a@b.com");

    let later = now + Duration::minutes(20);
    assert!(matches!(
        codec.decode_at(&token, later),
        Err(TokenError::Expired { .. })
    ));
}

#[test]
fn test_expiry_boundary() {
    let codec = codec();
    let now = Utc.with_ymd_and_hms(2026, 6, 1, 8, 0, 0).unwrap();

    let fresh = IdentityAssertion::new(
        "a@b.com",
        now - Duration::minutes(14) - Duration::seconds(59),
    );
    let stale = IdentityAssertion::new(
        "a@b.com",
        now - Duration::minutes(15) - Duration::seconds(1),
    );

    let fresh = codec.encode(&fresh).unwrap();
    let stale = codec.encode(&stale).unwrap();

    assert!(codec.decode_at(&fresh, now).is_ok());
    assert_eq!(
        codec.decode_at(&stale, now),
        Err(TokenError::Expired { age_seconds: 901 })
    );
}

#[test]
fn test_single_bit_flips_never_verify() {
    let codec = codec();
    let now = Utc::now();
    let token = codec
        .encode(&IdentityAssertion::new("a@b.com", now).with_first_name("Ada"))
        .unwrap();
    let raw = URL_SAFE_NO_PAD.decode(&token).unwrap();

    for index in 0..raw.len() {
        for bit in [0u8, 3, 7] {
            let mut tampered = raw.clone();
            tampered[index] ^= 1 << bit;
            let result = codec.decode_at(&URL_SAFE_NO_PAD.encode(&tampered), now);
            assert_eq!(
                result,
                Err(TokenError::BadSignature),
                "flip of bit {bit} at byte {index} was not rejected"
            );
        }
    }
}

#[test]
fn test_truncated_and_garbage_tokens_are_malformed() {
    let codec = codec();
    let token = codec
        .encode(&IdentityAssertion::new("a@b.com", Utc::now()))
        .unwrap();

    // 16 + 32 bytes: no room for ciphertext.
    let too_short = URL_SAFE_NO_PAD.encode([0u8; 48]);

    for bad in ["", "not base64 at all!", "%%%", too_short.as_str(), &token[..20]] {
        assert!(
            matches!(codec.decode(bad), Err(TokenError::Malformed(_))),
            "{bad:?} should be malformed"
        );
    }
}

#[test]
fn test_signature_checked_before_decryption() {
    let codec = codec();

    // Unaligned ciphertext with a valid MAC is a decryption problem...
    let unaligned = signed_token([7u8; 16], &[1u8; 15]);
    assert!(matches!(
        codec.decode(&unaligned),
        Err(TokenError::Malformed(_))
    ));

    // ...but with a broken MAC it never reaches decryption.
    let mut raw = URL_SAFE_NO_PAD.decode(&unaligned).unwrap();
    let last = raw.len() - 1;
    raw[last] ^= 0xff;
    assert_eq!(
        codec.decode(&URL_SAFE_NO_PAD.encode(raw)),
        Err(TokenError::BadSignature)
    );
}

#[test]
fn test_invalid_padding_is_malformed() {
    let keys = derive_keys(SECRET.as_bytes()).unwrap();
    let iv = [3u8; 16];
    // A zero final byte is never valid PKCS#7.
    let encryptor =
        cbc::Encryptor::<aes::Aes128>::new(&(*keys.encryption_key()).into(), &iv.into());
    let ciphertext = encryptor.encrypt_padded_vec_mut::<NoPadding>(&[0u8; 16]);

    assert!(matches!(
        codec().decode(&signed_token(iv, &ciphertext)),
        Err(TokenError::Malformed(_))
    ));
}

#[test]
fn test_authentic_but_invalid_payloads() {
    let codec = codec();
    let iv = [9u8; 16];

    let payloads: [&[u8]; 4] = [
        b"not json",
        br#"{"created_at":"2026-01-01T00:00:00Z"}"#,
        br#"{"email":"a@b.com"}"#,
        br#"{"email":"a@b.com","created_at":"last tuesday"}"#,
    ];

    for payload in payloads {
        let token = signed_token(iv, &encrypt(payload, iv));
        assert!(
            matches!(codec.decode(&token), Err(TokenError::InvalidPayload(_))),
            "{} should be an invalid payload",
            String::from_utf8_lossy(payload)
        );
    }
}

#[test]
fn test_field_spellings_decode_identically() {
    let codec = codec();
    let now = Utc::now();
    let created = now.to_rfc3339();

    let camel = format!(
        r#"{{"email":"a@b.com","firstName":"Ada","lastName":"Lovelace","shopifyCustomerId":"5","createdAt":"{created}"}}"#
    );
    let snake = format!(
        r#"{{"email":"a@b.com","first_name":"Ada","last_name":"Lovelace","shopify_customer_id":"5","created_at":"{created}"}}"#
    );

    let iv = [1u8; 16];
    let camel = codec
        .decode_at(&signed_token(iv, &encrypt(camel.as_bytes(), iv)), now)
        .unwrap();
    let snake = codec
        .decode_at(&signed_token(iv, &encrypt(snake.as_bytes(), iv)), now)
        .unwrap();

    assert_eq!(camel, snake);
    assert_eq!(camel.last_name.as_deref(), Some("Lovelace"));
}

#[test]
fn test_codec_is_shareable_across_threads() {
    let codec = std::sync::Arc::new(codec());
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let codec = codec.clone();
            std::thread::spawn(move || {
                let email = format!("user{i}@example.com");
                let token = codec
                    .encode(&IdentityAssertion::new(email.clone(), Utc::now()))
                    .unwrap();
                assert_eq!(codec.decode(&token).unwrap().email, email);
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
}
