//! HS256 access tokens.

use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use trattoria_core::Email;

/// Clock skew tolerated on `iat`.
const MAX_IAT_SKEW_SECS: i64 = 300;

/// Access token claims. `sub` is the account email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token signing failed: {0}")]
    Encode(#[source] jsonwebtoken::errors::Error),

    #[error("invalid token")]
    Invalid,
}

/// Issues and verifies access tokens.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("keys", &"[REDACTED]")
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl TokenService {
    #[must_use]
    pub fn new(secret: &SecretString, ttl: Duration) -> Self {
        let secret = secret.expose_secret().as_bytes();
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
        }
    }

    /// Mint a token for `email`, valid for the configured lifetime.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Encode` if signing fails.
    pub fn issue(&self, email: &Email) -> Result<String, TokenError> {
        let now = Utc::now().timestamp();
        let ttl = i64::try_from(self.ttl.as_secs()).unwrap_or(i64::MAX);
        let claims = Claims {
            sub: email.as_str().to_owned(),
            exp: now.saturating_add(ttl),
            iat: now,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(TokenError::Encode)
    }

    /// Verify signature and expiry, and return the subject email.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Invalid` for a bad signature, an expired token, a
    /// far-future `iat` or a subject that is not an email.
    pub fn verify(&self, token: &str) -> Result<Email, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let data = decode::<Claims>(token, &self.decoding, &validation)
            .map_err(|_| TokenError::Invalid)?;

        if data.claims.iat > Utc::now().timestamp() + MAX_IAT_SKEW_SECS {
            return Err(TokenError::Invalid);
        }

        Email::parse(&data.claims.sub).map_err(|_| TokenError::Invalid)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn service(secret: &str) -> TokenService {
        TokenService::new(&SecretString::from(secret), Duration::from_secs(3600))
    }

    fn sign(secret: &str, claims: &Claims) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_issue_then_verify() {
        let tokens = service("k3y-for-tests-only");
        let email = Email::parse("ivan@example.com").unwrap();
        let token = tokens.issue(&email).unwrap();
        assert_eq!(tokens.verify(&token).unwrap(), email);
    }

    #[test]
    fn test_rejects_other_secret() {
        let email = Email::parse("ivan@example.com").unwrap();
        let token = service("first-secret").issue(&email).unwrap();
        assert!(matches!(
            service("second-secret").verify(&token),
            Err(TokenError::Invalid)
        ));
    }

    #[test]
    fn test_rejects_expired() {
        let now = Utc::now().timestamp();
        let token = sign(
            "k3y",
            &Claims {
                sub: "ivan@example.com".to_owned(),
                exp: now - 3600,
                iat: now - 7200,
            },
        );
        assert!(service("k3y").verify(&token).is_err());
    }

    #[test]
    fn test_rejects_future_iat() {
        let now = Utc::now().timestamp();
        let token = sign(
            "k3y",
            &Claims {
                sub: "ivan@example.com".to_owned(),
                exp: now + 7200,
                iat: now + 3600,
            },
        );
        assert!(service("k3y").verify(&token).is_err());
    }

    #[test]
    fn test_rejects_non_email_subject() {
        let now = Utc::now().timestamp();
        let token = sign(
            "k3y",
            &Claims {
                sub: "42".to_owned(),
                exp: now + 3600,
                iat: now,
            },
        );
        assert!(service("k3y").verify(&token).is_err());
    }

    #[test]
    fn test_debug_redacts_keys() {
        let debug = format!("{:?}", service("k3y"));
        assert!(debug.contains("[REDACTED]"));
    }
}
