//! Bearer-token verification against an identity provider's published key set.
//!
//! Every call to [`IdentityVerifier::verify`] fetches the key set afresh; there is
//! no key or token cache.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

pub mod error;
pub mod keys;
pub mod verifier;

pub use error::VerifyError;
pub use keys::{HttpKeySet, KeySetSource, StaticKeySet};
pub use verifier::IdentityVerifier;

/// `aud` may be a single string or a list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    One(String),
    Many(Vec<String>),
}

/// Claims read from a provider-issued token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub aud: Audience,
    pub iss: String,
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// The outcome of a successful verification
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerifiedIdentity {
    /// Provider subject id; the durable key for a user
    pub subject: String,
    /// The configured audience the token was accepted for
    pub audience: String,
    pub issuer: String,
    pub expires_at: DateTime<Utc>,
    pub name: Option<String>,
    pub email: Option<String>,
}

impl VerifiedIdentity {
    fn from_claims(claims: Claims, audience: &str) -> Result<Self, VerifyError> {
        if claims.sub.trim().is_empty() {
            return Err(VerifyError::MissingSubject);
        }

        let expires_at = Utc
            .timestamp_opt(claims.exp, 0)
            .single()
            .ok_or_else(|| VerifyError::Malformed(format!("exp out of range: {}", claims.exp)))?;

        Ok(Self {
            subject: claims.sub,
            audience: audience.to_string(),
            issuer: claims.iss,
            expires_at,
            name: claims.name.filter(|n| !n.is_empty()),
            email: claims.email.filter(|e| !e.is_empty()),
        })
    }
}
