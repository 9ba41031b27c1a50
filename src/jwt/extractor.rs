//! Claim extraction from compact JWS tokens.
//!
//! Signatures are never verified: the token is only decoded so its claims can be
//! published. Optional claims degrade to defaults, required ones fail the token.

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::jwt::claims::{ClaimRecord, UNKNOWN_ISSUER};
use crate::jwt::error::{ExtractionError, TimestampClaim};

/// base64url, padded or not
const SEGMENT_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

type JsonObject = Map<String, Value>;

/// Decode a token and normalize its claims.
pub fn extract<T: AsRef<[u8]>>(token: T) -> Result<ClaimRecord, ExtractionError> {
    let (header, claims) = decode_unverified(token.as_ref())?;

    let issuer = match claims.get("iss").and_then(Value::as_str) {
        Some(iss) => iss.to_owned(),
        None => {
            warn!("token has no readable issuer, using '{}'", UNKNOWN_ISSUER);
            UNKNOWN_ISSUER.to_owned()
        }
    };

    let algorithm = header
        .get("alg")
        .and_then(Value::as_str)
        .ok_or(ExtractionError::MissingAlgorithm)?
        .to_owned();

    let expires_at = numeric_date(&claims, TimestampClaim::ExpiresAt)?;
    let issued_at = numeric_date(&claims, TimestampClaim::IssuedAt)?;

    let subject = required_string(&claims, "sub")?;
    let audience = required_string(&claims, "aud")?;
    let id = required_string(&claims, "jti")?;

    let record = ClaimRecord {
        issuer,
        algorithm,
        subject,
        audience,
        id,
        expires_at,
        issued_at,
        scopes: scopes(claims.get("scope")),
        roles: roles(claims.get("roles")),
        name: optional_string(&claims, "name"),
        email: optional_string(&claims, "email"),
    };
    debug!(
        subject = %record.subject,
        expires_at = %record.expires_at,
        "jwt parsed successfully"
    );
    Ok(record)
}

/// Split `header.payload.signature` and decode the two JSON segments.
fn decode_unverified(token: &[u8]) -> Result<(JsonObject, JsonObject), ExtractionError> {
    let raw = std::str::from_utf8(token)
        .map_err(|e| ExtractionError::MalformedToken(format!("token is not valid UTF-8: {}", e)))?
        .trim();
    if raw.is_empty() {
        return Err(ExtractionError::MalformedToken("token is empty".to_owned()));
    }

    let segments: Vec<&str> = raw.split('.').collect();
    if segments.len() != 3 {
        return Err(ExtractionError::MalformedToken(format!(
            "expected 3 segments, found {}",
            segments.len()
        )));
    }

    let header = decode_segment("header", segments[0])?;
    let claims = decode_segment("payload", segments[1])?;
    Ok((header, claims))
}

fn decode_segment(part: &str, segment: &str) -> Result<JsonObject, ExtractionError> {
    let bytes = SEGMENT_ENGINE
        .decode(segment)
        .map_err(|e| ExtractionError::MalformedToken(format!("{} base64 decode error: {}", part, e)))?;
    serde_json::from_slice::<JsonObject>(&bytes)
        .map_err(|e| ExtractionError::MalformedToken(format!("{} is not a JSON object: {}", part, e)))
}

/// NumericDate: seconds since the epoch, integer or fractional.
fn numeric_date(claims: &JsonObject, which: TimestampClaim) -> Result<DateTime<Utc>, ExtractionError> {
    let missing = || ExtractionError::MissingTimestamp(which);
    let value = claims.get(which.claim_name()).ok_or_else(missing)?;

    if let Some(secs) = value.as_i64() {
        return DateTime::from_timestamp(secs, 0).ok_or_else(missing);
    }
    let secs = value.as_f64().filter(|s| s.is_finite()).ok_or_else(missing)?;
    let whole = secs.floor();
    let nanos = ((secs - whole) * 1e9).round().min(999_999_999.0) as u32;
    if whole < i64::MIN as f64 || whole > i64::MAX as f64 {
        return Err(missing());
    }
    DateTime::from_timestamp(whole as i64, nanos).ok_or_else(missing)
}

fn required_string(claims: &JsonObject, name: &'static str) -> Result<String, ExtractionError> {
    claims
        .get(name)
        .and_then(Value::as_str)
        .map(str::to_owned)
        .ok_or(ExtractionError::MissingClaim(name))
}

fn optional_string(claims: &JsonObject, name: &str) -> String {
    claims
        .get(name)
        .and_then(Value::as_str)
        .map(str::to_owned)
        .unwrap_or_default()
}

/// `scope` is either one verbatim string or an array of strings.
fn scopes(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::String(scope)) => vec![scope.to_owned()],
        Some(Value::Array(items)) => strings_of(items),
        _ => Vec::new(),
    }
}

fn roles(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => strings_of(items),
        _ => Vec::new(),
    }
}

fn strings_of(items: &[Value]) -> Vec<String> {
    items
        .iter()
        .filter_map(Value::as_str)
        .map(str::to_owned)
        .collect()
}
