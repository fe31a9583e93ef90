/// External identity-provider assertion verification
///
/// Sign-in is delegated to an external identity provider: the client obtains
/// an ID token there and posts it to `/auth/verify-token`. This module
/// verifies that assertion and extracts the claims the identity resolver
/// needs.
///
/// The provider is modeled as an explicitly constructed [`IdentityProvider`]
/// handle injected into the application state at startup, not a hidden
/// singleton. The production implementation verifies RS256 signatures
/// against the provider's JWKS, fetched over HTTPS and cached in memory;
/// unknown key ids trigger one refetch (key rotation).

use async_trait::async_trait;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Error type for identity verification
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    /// Signature mismatch, wrong audience/issuer, or elapsed validity
    #[error("Identity assertion could not be verified: {0}")]
    InvalidAssertion(String),

    /// Required claims (subject id, email) are missing
    #[error("Identity assertion is missing required claim: {0}")]
    MalformedAssertion(&'static str),

    /// The provider's signing keys could not be fetched
    #[error("Failed to fetch identity provider keys: {0}")]
    KeyFetch(String),
}

/// A verified identity assertion
///
/// Carries the provider's stable subject id plus the profile claims used to
/// create or refresh the local user record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityAssertion {
    /// Provider-scoped stable subject id
    pub subject: String,

    /// Email address (required)
    pub email: String,

    /// Display name, when the provider has one
    pub name: Option<String>,

    /// Avatar URL, when the provider has one
    pub avatar: Option<String>,
}

/// Verifies identity-provider tokens
///
/// Implementations must be cheap to share behind an `Arc`; verification is
/// called once per sign-in.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Verifies an assertion token and extracts its claims
    ///
    /// # Errors
    ///
    /// - [`IdentityError::InvalidAssertion`] when the token cannot be
    ///   cryptographically verified or has expired
    /// - [`IdentityError::MalformedAssertion`] when subject id or email are
    ///   missing
    async fn verify(&self, token: &str) -> Result<IdentityAssertion, IdentityError>;
}

/// Raw claims carried by provider ID tokens
#[derive(Debug, Deserialize)]
struct ProviderClaims {
    sub: Option<String>,
    email: Option<String>,
    name: Option<String>,
    picture: Option<String>,
    #[allow(dead_code)]
    exp: i64,
}

fn assertion_from_claims(claims: ProviderClaims) -> Result<IdentityAssertion, IdentityError> {
    let subject = claims
        .sub
        .filter(|s| !s.is_empty())
        .ok_or(IdentityError::MalformedAssertion("sub"))?;
    let email = claims
        .email
        .filter(|s| !s.is_empty())
        .ok_or(IdentityError::MalformedAssertion("email"))?;

    Ok(IdentityAssertion {
        subject,
        email,
        name: claims.name,
        avatar: claims.picture,
    })
}

/// A single JSON Web Key as served by the provider
#[derive(Debug, Clone, Deserialize)]
struct Jwk {
    kid: String,
    n: String,
    e: String,
}

#[derive(Debug, Deserialize)]
struct JwkSet {
    keys: Vec<Jwk>,
}

/// Google Identity Platform token verifier
///
/// Verifies RS256 ID tokens minted for a given project: audience must equal
/// the project id and the issuer must be
/// `https://securetoken.google.com/<project-id>`.
pub struct GoogleIdentityProvider {
    http: reqwest::Client,
    jwks_url: String,
    project_id: String,
    issuer: String,
    keys: RwLock<HashMap<String, Jwk>>,
}

impl GoogleIdentityProvider {
    /// Default JWKS endpoint for Google Identity Platform tokens
    pub const DEFAULT_JWKS_URL: &'static str =
        "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";

    /// Creates a verifier for the given project
    pub fn new(project_id: impl Into<String>, jwks_url: impl Into<String>) -> Self {
        let project_id = project_id.into();
        Self {
            http: reqwest::Client::new(),
            jwks_url: jwks_url.into(),
            issuer: format!("https://securetoken.google.com/{}", project_id),
            project_id,
            keys: RwLock::new(HashMap::new()),
        }
    }

    /// Refetches the provider's JWKS and replaces the cache
    async fn refresh_keys(&self) -> Result<(), IdentityError> {
        debug!(url = %self.jwks_url, "Refreshing identity provider JWKS");

        let jwks: JwkSet = self
            .http
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(|e| IdentityError::KeyFetch(e.to_string()))?
            .error_for_status()
            .map_err(|e| IdentityError::KeyFetch(e.to_string()))?
            .json()
            .await
            .map_err(|e| IdentityError::KeyFetch(e.to_string()))?;

        let mut cache = self.keys.write().await;
        cache.clear();
        for key in jwks.keys {
            cache.insert(key.kid.clone(), key);
        }

        Ok(())
    }

    /// Returns the key for `kid`, refetching once when it is unknown
    async fn key_for(&self, kid: &str) -> Result<Jwk, IdentityError> {
        if let Some(key) = self.keys.read().await.get(kid) {
            return Ok(key.clone());
        }

        self.refresh_keys().await?;

        self.keys
            .read()
            .await
            .get(kid)
            .cloned()
            .ok_or_else(|| IdentityError::InvalidAssertion(format!("unknown key id: {}", kid)))
    }
}

#[async_trait]
impl IdentityProvider for GoogleIdentityProvider {
    async fn verify(&self, token: &str) -> Result<IdentityAssertion, IdentityError> {
        let header =
            decode_header(token).map_err(|e| IdentityError::InvalidAssertion(e.to_string()))?;
        let kid = header
            .kid
            .ok_or_else(|| IdentityError::InvalidAssertion("missing key id".to_string()))?;

        let jwk = self.key_for(&kid).await?;
        let key = DecodingKey::from_rsa_components(&jwk.n, &jwk.e)
            .map_err(|e| IdentityError::InvalidAssertion(e.to_string()))?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[&self.project_id]);
        validation.set_issuer(&[&self.issuer]);

        let data = decode::<ProviderClaims>(token, &key, &validation).map_err(|e| {
            warn!(error = %e, "Identity assertion rejected");
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    IdentityError::InvalidAssertion("assertion has expired".to_string())
                }
                _ => IdentityError::InvalidAssertion(e.to_string()),
            }
        })?;

        assertion_from_claims(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(sub: Option<&str>, email: Option<&str>) -> ProviderClaims {
        ProviderClaims {
            sub: sub.map(str::to_string),
            email: email.map(str::to_string),
            name: Some("Alice".to_string()),
            picture: None,
            exp: 0,
        }
    }

    #[test]
    fn test_assertion_from_complete_claims() {
        let assertion = assertion_from_claims(claims(Some("ext-1"), Some("a@b.com"))).unwrap();
        assert_eq!(assertion.subject, "ext-1");
        assert_eq!(assertion.email, "a@b.com");
        assert_eq!(assertion.name.as_deref(), Some("Alice"));
        assert!(assertion.avatar.is_none());
    }

    #[test]
    fn test_assertion_requires_subject() {
        let result = assertion_from_claims(claims(None, Some("a@b.com")));
        assert!(matches!(
            result,
            Err(IdentityError::MalformedAssertion("sub"))
        ));

        let result = assertion_from_claims(claims(Some(""), Some("a@b.com")));
        assert!(matches!(
            result,
            Err(IdentityError::MalformedAssertion("sub"))
        ));
    }

    #[test]
    fn test_assertion_requires_email() {
        let result = assertion_from_claims(claims(Some("ext-1"), None));
        assert!(matches!(
            result,
            Err(IdentityError::MalformedAssertion("email"))
        ));
    }

    #[test]
    fn test_provider_issuer_shape() {
        let provider =
            GoogleIdentityProvider::new("demo-project", GoogleIdentityProvider::DEFAULT_JWKS_URL);
        assert_eq!(provider.issuer, "https://securetoken.google.com/demo-project");
    }
}
