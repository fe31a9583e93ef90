/// Session token issuing and verification
///
/// Sessions are HS256-signed JWTs carrying the user's id and email with a
/// fixed 15-minute validity window. There is no refresh mechanism; clients
/// re-authenticate through the identity provider after expiry.
///
/// # Example
///
/// ```
/// use taskhive_shared::auth::session::{issue, verify};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let secret = "session-secret-at-least-32-bytes-long!";
/// let user_id = Uuid::new_v4();
///
/// let token = issue(user_id, "alice@example.com", secret)?;
/// let claims = verify(&token, secret)?;
/// assert_eq!(claims.sub, user_id);
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Token issuer string embedded and validated in every session
const ISSUER: &str = "taskhive";

/// Fixed session lifetime; callers cannot extend it
const SESSION_TTL_MINUTES: i64 = 15;

/// Error type for session operations
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Failed to sign a new token
    #[error("Failed to issue session token: {0}")]
    Issue(String),

    /// Token validity window has elapsed
    #[error("Session token has expired")]
    Expired,

    /// Signature mismatch, malformed structure, or wrong issuer
    #[error("Invalid session token: {0}")]
    Invalid(String),
}

/// Session claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject - user ID
    pub sub: Uuid,

    /// User email at issue time
    pub email: String,

    /// Issuer - always "taskhive"
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl SessionClaims {
    fn new(user_id: Uuid, email: &str) -> Self {
        let now = Utc::now();
        let expiration = now + Duration::minutes(SESSION_TTL_MINUTES);

        Self {
            sub: user_id,
            email: email.to_string(),
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            exp: expiration.timestamp(),
        }
    }
}

/// Issues a session token for a user
///
/// The validity window is always 15 minutes from now, independent of any
/// caller-supplied value.
///
/// # Errors
///
/// Returns `SessionError::Issue` if signing fails.
pub fn issue(user_id: Uuid, email: &str, secret: &str) -> Result<String, SessionError> {
    let claims = SessionClaims::new(user_id, email);
    let header = Header::new(Algorithm::HS256);
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&header, &claims, &key).map_err(|e| SessionError::Issue(e.to_string()))
}

/// Verifies a session token and extracts its claims
///
/// Checks the signature, the issuer, and the expiry.
///
/// # Errors
///
/// - `SessionError::Expired` when the validity window has elapsed
/// - `SessionError::Invalid` on signature mismatch or malformed structure
pub fn verify(token: &str, secret: &str) -> Result<SessionClaims, SessionError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.validate_exp = true;

    let token_data = decode::<SessionClaims>(token, &key, &validation).map_err(|e| {
        match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => SessionError::Expired,
            _ => SessionError::Invalid(e.to_string()),
        }
    })?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-session-secret-at-least-32-bytes";

    #[test]
    fn test_issue_and_verify_roundtrip() {
        let user_id = Uuid::new_v4();
        let token = issue(user_id, "alice@example.com", SECRET).expect("should issue");

        let claims = verify(&token, SECRET).expect("should verify");
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.email, "alice@example.com");
        assert_eq!(claims.iss, ISSUER);
    }

    #[test]
    fn test_validity_window_is_fixed() {
        let token = issue(Uuid::new_v4(), "alice@example.com", SECRET).unwrap();
        let claims = verify(&token, SECRET).unwrap();

        let lifetime = claims.exp - claims.iat;
        assert_eq!(lifetime, SESSION_TTL_MINUTES * 60);
    }

    #[test]
    fn test_verify_with_wrong_secret() {
        let token = issue(Uuid::new_v4(), "alice@example.com", SECRET).unwrap();

        let result = verify(&token, "a-completely-different-secret-value!!");
        assert!(matches!(result, Err(SessionError::Invalid(_))));
    }

    #[test]
    fn test_verify_garbage_token() {
        let result = verify("not-a-jwt", SECRET);
        assert!(matches!(result, Err(SessionError::Invalid(_))));
    }

    #[test]
    fn test_verify_expired_token() {
        // Hand-roll claims with an exp in the past; issue() cannot produce one.
        let claims = SessionClaims {
            sub: Uuid::new_v4(),
            email: "alice@example.com".to_string(),
            iss: ISSUER.to_string(),
            iat: Utc::now().timestamp() - 3600,
            exp: Utc::now().timestamp() - 1800,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        let result = verify(&token, SECRET);
        assert!(matches!(result, Err(SessionError::Expired)));
    }

    #[test]
    fn test_verify_wrong_issuer() {
        let claims = SessionClaims {
            sub: Uuid::new_v4(),
            email: "alice@example.com".to_string(),
            iss: "someone-else".to_string(),
            iat: Utc::now().timestamp(),
            exp: Utc::now().timestamp() + 600,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        let result = verify(&token, SECRET);
        assert!(matches!(result, Err(SessionError::Invalid(_))));
    }
}
