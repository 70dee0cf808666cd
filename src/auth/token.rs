//! Bearer token inspection
//!
//! The client never verifies token signatures; the backend owns that. It only
//! peeks at the `exp` claim so that a session persisted with an already
//! expired token is not restored.

use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Claims the backend puts into its tokens
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Backend user ID
    #[serde(default)]
    pub user_id: Option<i64>,
    /// Role at the time the token was issued
    #[serde(default)]
    pub role: Option<String>,
    /// Expiration time (seconds since epoch)
    #[serde(default)]
    pub exp: Option<i64>,
}

impl Claims {
    /// Expiry as a timestamp, if the token carries one
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.exp.and_then(|exp| Utc.timestamp_opt(exp, 0).single())
    }

    /// Check if token is expired at the given instant
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.exp {
            Some(exp) => now.timestamp() >= exp,
            None => false,
        }
    }
}

/// Read claims from a token without checking its signature
///
/// Returns `None` for tokens that are not JWTs; those are treated as opaque.
pub fn inspect_token(token: &str) -> Option<Claims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims = HashSet::new();

    decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation)
        .map(|data| data.claims)
        .ok()
}

/// Check whether a token is a JWT whose `exp` has passed
pub fn is_token_expired(token: &str) -> bool {
    inspect_token(token)
        .map(|claims| claims.is_expired_at(Utc::now()))
        .unwrap_or(false)
}
