//! Access token expiry inspection
//!
//! The signature is deliberately not verified here. The decoded expiry only
//! decides *when* to refresh; the server remains the sole authority on whether
//! a token is valid.

use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::Deserialize;

use crate::AuthError;

#[derive(Debug, Deserialize)]
struct ExpiryClaims {
    exp: i64,
}

/// Read the `exp` claim (seconds since the epoch) of a JWT without verifying it.
pub fn decode_expiry(token: &str) -> Result<DateTime<Utc>, AuthError> {
    let mut validation = Validation::default();
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    let data = decode::<ExpiryClaims>(token, &DecodingKey::from_secret(&[]), &validation)
        .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

    Utc.timestamp_opt(data.claims.exp, 0)
        .single()
        .ok_or_else(|| AuthError::InvalidToken(format!("exp out of range: {}", data.claims.exp)))
}

/// Lifetime left on `token` as seen from `now`; negative once expired.
pub fn time_until_expiry(token: &str, now: DateTime<Utc>) -> Result<Duration, AuthError> {
    Ok(decode_expiry(token)? - now)
}
