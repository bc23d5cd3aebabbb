//! Short-lived access tokens (JWT, HS256).
//!
//! The rotation engine treats this as a trusted black box: refresh sessions
//! gate *whether* an access token is minted, this module only signs and
//! verifies them.

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{
    DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the username.
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

/// Verification outcome for a presented access token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum VerifyError {
    #[error("token expired")]
    Expired,
    #[error("invalid token")]
    Invalid,
}

/// Signs and verifies bearer access tokens with a shared HS256 secret.
pub struct AccessTokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl AccessTokenIssuer {
    #[must_use]
    pub fn new(secret: &SecretString, ttl_seconds: i64) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        let mut validation = Validation::default();
        validation.leeway = 0;
        Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
            validation,
            ttl: Duration::seconds(ttl_seconds),
        }
    }

    /// Mint a signed access token for `subject`.
    ///
    /// # Errors
    /// Returns an error if signing fails.
    pub fn issue(&self, subject: &str) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: subject.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding).context("failed to sign access token")
    }

    /// Verify a presented token and return its claims.
    ///
    /// # Errors
    /// [`VerifyError::Expired`] when the signature is good but `exp` has
    /// passed; [`VerifyError::Invalid`] for everything else.
    pub fn verify(&self, token: &str) -> Result<Claims, VerifyError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|err| match err.kind() {
                ErrorKind::ExpiredSignature => VerifyError::Expired,
                _ => VerifyError::Invalid,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issuer(ttl_seconds: i64) -> AccessTokenIssuer {
        AccessTokenIssuer::new(&SecretString::from("test-secret"), ttl_seconds)
    }

    #[test]
    fn issue_then_verify_round_trip() {
        let issuer = issuer(60);
        let token = issuer.issue("alice").expect("issue");
        let claims = issuer.verify(&token).expect("verify");
        assert_eq!(claims.sub, "alice");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn expired_token_is_reported_as_expired() {
        let issuer = issuer(-10);
        let token = issuer.issue("alice").expect("issue");
        assert_eq!(issuer.verify(&token), Err(VerifyError::Expired));
    }

    #[test]
    fn wrong_secret_is_invalid() {
        let token = issuer(60).issue("alice").expect("issue");
        let other = AccessTokenIssuer::new(&SecretString::from("other-secret"), 60);
        assert_eq!(other.verify(&token), Err(VerifyError::Invalid));
    }

    #[test]
    fn garbage_is_invalid() {
        assert_eq!(
            issuer(60).verify("not-a-jwt"),
            Err(VerifyError::Invalid)
        );
    }
}
