//! Token commands.
//!
//! `handoff token encode` - Encode an assertion created now.
//! `handoff token decode` - Verify a token, freshness included.
//! `handoff token inspect` - Verify a token, ignoring its age.

use chrono::Utc;
use handoff_token::{IdentityAssertion, TokenCodec, TokenError};
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Encode a fresh assertion and print the token.
pub fn encode(
    codec: &TokenCodec,
    email: String,
    first_name: Option<String>,
    last_name: Option<String>,
    customer_id: Option<String>,
) -> anyhow::Result<()> {
    let assertion = IdentityAssertion {
        first_name,
        last_name,
        customer_id,
        ..IdentityAssertion::new(email, Utc::now())
    };
    println!("{}", codec.encode(&assertion)?);
    Ok(())
}

/// Fully verify a token and print its assertion.
pub fn decode(codec: &TokenCodec, token: String) -> anyhow::Result<()> {
    let token = read_token(token)?;
    match codec.decode(&token) {
        Ok(assertion) => {
            println!("{}", serde_json::to_string_pretty(&report(codec, &assertion)?)?);
            Ok(())
        }
        Err(e) => fail(&e),
    }
}

/// Verify signature and payload without the freshness check.
pub fn inspect(codec: &TokenCodec, token: String) -> anyhow::Result<()> {
    let token = read_token(token)?;
    match codec.inspect(&token) {
        Ok(assertion) => {
            let report = report(codec, &assertion)?;
            let fresh = codec.age_at(&assertion.created_at, Utc::now()) <= codec.freshness();
            println!("{}", serde_json::to_string_pretty(&report)?);
            println!();
            if fresh {
                println!("✔ Within the freshness window");
            } else {
                println!("✖ Older than the freshness window; decode would reject it");
            }
            Ok(())
        }
        Err(e) => fail(&e),
    }
}

/// The assertion as canonical JSON plus its current age.
fn report(codec: &TokenCodec, assertion: &IdentityAssertion) -> anyhow::Result<Value> {
    let mut value: Value = serde_json::from_slice(&assertion.to_payload()?)?;
    if let Value::Object(map) = &mut value {
        let age = codec.age_at(&assertion.created_at, Utc::now());
        map.insert("age_seconds".to_string(), Value::from(age.num_seconds()));
    }
    Ok(value)
}

fn fail(e: &TokenError) -> ! {
    eprintln!("✖ Token rejected: {}", e.kind());
    std::process::exit(1);
}

/// Load the token from a file if the argument names one.
fn read_token(token: String) -> anyhow::Result<String> {
    if Path::new(&token).exists() {
        Ok(fs::read_to_string(&token)?.trim().to_string())
    } else {
        Ok(token.trim().to_string())
    }
}
