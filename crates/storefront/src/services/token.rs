//! Stateless bearer tokens.
//!
//! Tokens are HS256 JWTs carrying the subject email and issuance/expiry
//! timestamps. Validity is computable entirely from the token's signed
//! contents plus the current time; there is no server-side session table
//! and no revocation list.

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use gildedcart_core::Email;

/// How long an issued token stays valid.
const TOKEN_TTL_HOURS: i64 = 24;

/// Errors from token issuance and validation.
#[derive(Debug, Error)]
pub enum TokenError {
    /// Signature mismatch, malformed structure, or expired.
    #[error("invalid token")]
    Invalid,

    /// Token could not be signed.
    #[error("failed to sign token: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
}

/// JWT claims carried by a session token.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    /// Subject: the account email.
    sub: String,
    /// Issued-at (unix seconds).
    iat: i64,
    /// Expiry (unix seconds).
    exp: i64,
}

/// Mints and verifies stateless bearer tokens under a server-held secret.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenIssuer {
    /// Create an issuer from the configured signing secret.
    #[must_use]
    pub fn new(secret: &SecretString) -> Self {
        Self::with_ttl(secret, Duration::hours(TOKEN_TTL_HOURS))
    }

    /// Create an issuer with a custom token lifetime.
    #[must_use]
    pub fn with_ttl(secret: &SecretString, ttl: Duration) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
            ttl,
        }
    }

    /// Mint a token binding the subject email to the current time.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Signing` if encoding fails.
    pub fn issue(&self, subject: &Email) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = Claims {
            sub: subject.as_str().to_owned(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        Ok(jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &self.encoding,
        )?)
    }

    /// Verify a token and extract its subject email.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Invalid` on signature mismatch, malformed
    /// structure, or a past expiry claim.
    pub fn validate(&self, token: &str) -> Result<Email, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding, &validation)
            .map_err(|_| TokenError::Invalid)?;

        Email::parse(&data.claims.sub).map_err(|_| TokenError::Invalid)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(&SecretString::from("kR9$vLm2#qXw8!zPn4@jTb6&hYc0*dFe"))
    }

    fn email() -> Email {
        Email::parse("user@example.com").unwrap()
    }

    #[test]
    fn test_issue_then_validate_returns_subject() {
        let issuer = issuer();
        let token = issuer.issue(&email()).unwrap();
        let subject = issuer.validate(&token).unwrap();
        assert_eq!(subject, email());
    }

    #[test]
    fn test_malformed_token_rejected() {
        assert!(matches!(
            issuer().validate("not.a.token"),
            Err(TokenError::Invalid)
        ));
    }

    #[test]
    fn test_tampered_token_rejected() {
        let issuer = issuer();
        let mut token = issuer.issue(&email()).unwrap();
        // Flip a character in the payload segment
        let dot = token.find('.').unwrap();
        let target = dot + 1;
        let original = token.as_bytes().get(target).copied().unwrap();
        let replacement = if original == b'A' { 'B' } else { 'A' };
        token.replace_range(target..=target, &replacement.to_string());

        assert!(issuer.validate(&token).is_err());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = issuer().issue(&email()).unwrap();
        let other = TokenIssuer::new(&SecretString::from("zW3&nQv7!mBx1@kLp9#rTd5$gHj2*fCa"));
        assert!(matches!(other.validate(&token), Err(TokenError::Invalid)));
    }

    #[test]
    fn test_expired_token_rejected() {
        let secret = SecretString::from("kR9$vLm2#qXw8!zPn4@jTb6&hYc0*dFe");
        let stale = TokenIssuer::with_ttl(&secret, Duration::seconds(-60));
        let token = stale.issue(&email()).unwrap();

        let fresh = TokenIssuer::new(&secret);
        assert!(matches!(fresh.validate(&token), Err(TokenError::Invalid)));
    }
}
