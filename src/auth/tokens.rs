//! Access token issuance and validation
//!
//! Bearer tokens are stateless HS256 JWTs carrying a subject and an absolute
//! expiry. Validity is purely a function of signature and expiry; there is no
//! server-side token store and no revocation list, which trades revocability
//! for horizontal scalability.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use tracing::warn;

use super::models::Claims;

/// Creates a signed access token for the given subject.
pub fn issue_access_token(
    subject: &str,
    secret: &str,
    ttl: Duration,
) -> Result<String, jsonwebtoken::errors::Error> {
    let exp = (Utc::now() + ttl).timestamp() as usize;
    let claims = Claims {
        sub: subject.to_string(),
        exp,
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// Validates a token and returns its claims, or None on any failure.
///
/// Bad signature, malformed structure, and expiry all collapse into the same
/// None so callers cannot build an oracle out of the failure reason.
pub fn validate_access_token(token: &str, secret: &str) -> Option<Claims> {
    let mut validation = Validation::new(Algorithm::HS256);
    // No clock leeway: a token expired by one second is expired.
    validation.leeway = 0;

    match decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    ) {
        Ok(data) => Some(data.claims),
        Err(e) => {
            warn!(error = %e, "JWT token validation failed");
            None
        }
    }
}
