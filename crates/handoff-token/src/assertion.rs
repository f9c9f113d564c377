//! Identity assertions carried inside handoff tokens.

use crate::error::TokenError;
use chrono::{DateTime, FixedOffset, NaiveDateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};

/// Accepted alternate spellings and the canonical field each one maps to.
///
/// Both peers have historically used camelCase and snake_case. When a payload
/// carries both spellings, a non-empty alternate wins.
///
/// The legacy peer only reads the customer id as `shopify_customer_id` or
/// `shopifyCustomerId`, so encoding writes [`CUSTOMER_ID_WIRE_KEY`] rather than
/// the canonical name.
const FIELD_ALIASES: &[(&str, &str)] = &[
    ("createdAt", "created_at"),
    ("firstName", "first_name"),
    ("lastName", "last_name"),
    ("customerId", "customer_id"),
    ("shopify_customer_id", "customer_id"),
    ("shopifyCustomerId", "customer_id"),
];

/// Key the customer id is written under when encoding.
pub const CUSTOMER_ID_WIRE_KEY: &str = "shopify_customer_id";

/// An authenticated identity as asserted by the issuing platform.
#[derive(Debug, Clone, PartialEq)]
pub struct IdentityAssertion {
    /// Email address (required).
    pub email: String,

    pub first_name: Option<String>,

    pub last_name: Option<String>,

    /// Customer id on the issuing platform.
    pub customer_id: Option<String>,

    /// When the issuer created the assertion.
    pub created_at: DateTime<FixedOffset>,

    /// Fields this bridge does not interpret, carried through unchanged.
    pub extra: Map<String, Value>,
}

impl IdentityAssertion {
    /// Create an assertion for `email` created at `created_at`.
    pub fn new(email: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            email: email.into(),
            first_name: None,
            last_name: None,
            customer_id: None,
            created_at: created_at.fixed_offset(),
            extra: Map::new(),
        }
    }

    pub fn with_first_name(mut self, first_name: impl Into<String>) -> Self {
        self.first_name = Some(first_name.into());
        self
    }

    pub fn with_last_name(mut self, last_name: impl Into<String>) -> Self {
        self.last_name = Some(last_name.into());
        self
    }

    pub fn with_customer_id(mut self, customer_id: impl Into<String>) -> Self {
        self.customer_id = Some(customer_id.into());
        self
    }

    /// Serialize to the JSON payload that gets encrypted.
    ///
    /// snake_case names are always emitted; the customer id goes out under
    /// [`CUSTOMER_ID_WIRE_KEY`].
    pub fn to_payload(&self) -> Result<Vec<u8>, TokenError> {
        let mut map = self.extra.clone();
        map.insert("email".to_string(), Value::String(self.email.clone()));
        insert_optional(&mut map, "first_name", &self.first_name);
        insert_optional(&mut map, "last_name", &self.last_name);
        insert_optional(&mut map, CUSTOMER_ID_WIRE_KEY, &self.customer_id);
        map.insert(
            "created_at".to_string(),
            Value::String(self.created_at.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
        );

        serde_json::to_vec(&Value::Object(map))
            .map_err(|e| TokenError::InvalidPayload(format!("cannot serialize assertion: {e}")))
    }

    /// Parse a decrypted JSON payload, normalizing alternate field names.
    pub fn from_payload(bytes: &[u8]) -> Result<Self, TokenError> {
        let value: Value = serde_json::from_slice(bytes)
            .map_err(|e| TokenError::InvalidPayload(format!("payload is not JSON: {e}")))?;

        let Value::Object(mut map) = value else {
            return Err(TokenError::InvalidPayload(
                "payload is not a JSON object".to_string(),
            ));
        };

        normalize_field_names(&mut map);

        let email = take_string(&mut map, "email")?
            .ok_or_else(|| TokenError::InvalidPayload("missing email".to_string()))?;
        let first_name = take_string(&mut map, "first_name")?;
        let last_name = take_string(&mut map, "last_name")?;
        let customer_id = take_string(&mut map, "customer_id")?;
        let created_at = take_string(&mut map, "created_at")?
            .ok_or_else(|| TokenError::InvalidPayload("missing created_at".to_string()))?;
        let created_at = parse_timestamp(&created_at)?;

        Ok(Self {
            email,
            first_name,
            last_name,
            customer_id,
            created_at,
            extra: map,
        })
    }
}

/// Parse an ISO-8601 creation timestamp.
///
/// A trailing `Z` is rewritten to `+00:00` first. Timestamps without an offset
/// are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<FixedOffset>, TokenError> {
    let raw = raw.trim();
    let normalized = match raw.strip_suffix(['Z', 'z']) {
        Some(stem) => format!("{stem}+00:00"),
        None => raw.to_string(),
    };

    if let Ok(ts) = DateTime::parse_from_rfc3339(&normalized) {
        return Ok(ts);
    }
    if let Ok(ts) = DateTime::parse_from_str(&normalized, "%Y-%m-%dT%H:%M:%S%.f%:z") {
        return Ok(ts);
    }

    NaiveDateTime::parse_from_str(&normalized, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc().fixed_offset())
        .map_err(|_| TokenError::InvalidPayload(format!("unparseable created_at: {raw:?}")))
}

fn normalize_field_names(map: &mut Map<String, Value>) {
    for (alias, canonical) in FIELD_ALIASES {
        let Some(value) = map.remove(*alias) else {
            continue;
        };
        if !is_blank(&value) || !map.contains_key(*canonical) {
            map.insert((*canonical).to_string(), value);
        }
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// Remove `key`; blank values read as absent, numbers as their decimal text.
fn take_string(map: &mut Map<String, Value>, key: &str) -> Result<Option<String>, TokenError> {
    match map.remove(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(TokenError::InvalidPayload(format!(
            "field {key} must be a string, got {other}"
        ))),
    }
}

fn insert_optional(map: &mut Map<String, Value>, key: &str, value: &Option<String>) {
    if let Some(v) = value {
        map.insert(key.to_string(), Value::String(v.clone()));
    }
}
