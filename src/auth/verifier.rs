use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::{Claims, HttpKeySet, KeySetSource, VerifiedIdentity, VerifyError};
use crate::config::AuthConfig;

/// Validates bearer tokens issued by one provider for one audience
#[derive(Clone)]
pub struct IdentityVerifier {
    keys: Arc<dyn KeySetSource>,
    issuer: String,
    audience: String,
    algorithms: Vec<Algorithm>,
}

impl IdentityVerifier {
    pub fn new(
        keys: Arc<dyn KeySetSource>,
        issuer: impl Into<String>,
        audience: impl Into<String>,
        algorithms: Vec<Algorithm>,
    ) -> Self {
        Self {
            keys,
            issuer: issuer.into(),
            audience: audience.into(),
            algorithms,
        }
    }

    /// Verifier backed by the provider's HTTPS key set
    pub fn from_config(config: &AuthConfig) -> Result<Self, VerifyError> {
        let algorithms = config
            .algorithms
            .iter()
            .map(|name| {
                Algorithm::from_str(name).map_err(|_| VerifyError::UnsupportedAlgorithm(name.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let keys = HttpKeySet::new(
            config.jwks_url.clone(),
            Duration::from_secs(config.jwks_timeout_secs),
        )?;

        Ok(Self::new(
            Arc::new(keys),
            config.issuer.clone(),
            config.audience.clone(),
            algorithms,
        ))
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn audience(&self) -> &str {
        &self.audience
    }

    #[tracing::instrument(skip_all, err(level = "debug"))]
    pub async fn verify(&self, token: &str) -> Result<VerifiedIdentity, VerifyError> {
        let header = decode_header(token).map_err(|e| VerifyError::Malformed(e.to_string()))?;

        if !self.algorithms.contains(&header.alg) {
            return Err(VerifyError::UnsupportedAlgorithm(format!("{:?}", header.alg)));
        }

        let kid = header.kid.ok_or(VerifyError::KeyNotFound(None))?;

        let key_set = self.keys.fetch().await?;
        let jwk = key_set.find(&kid).ok_or_else(|| {
            warn!(kid = %kid, keys = key_set.keys.len(), "no key in set matches token kid");
            VerifyError::KeyNotFound(Some(kid.clone()))
        })?;

        let decoding_key = DecodingKey::from_jwk(jwk)
            .map_err(|e| VerifyError::KeySetUnavailable(format!("unusable key {}: {}", kid, e)))?;

        let mut validation = Validation::new(header.alg);
        validation.set_audience(&[&self.audience]);
        validation.set_issuer(&[&self.issuer]);
        validation.set_required_spec_claims(&["exp", "sub", "iss", "aud"]);

        let data = decode::<Claims>(token, &decoding_key, &validation)?;
        let identity = VerifiedIdentity::from_claims(data.claims, &self.audience)?;

        debug!(subject = %identity.subject, kid = %kid, "token verified");
        Ok(identity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::StaticKeySet;
    use chrono::Utc;
    use jsonwebtoken::jwk::JwkSet;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;

    // base64 of SECRET; identical under the standard and URL-safe alphabets
    const SECRET: &[u8] = b"secretsecretsecret";
    const SECRET_B64: &str = "c2VjcmV0c2VjcmV0c2VjcmV0";
    const ISSUER: &str = "https://icco.auth0.com/";
    const AUDIENCE: &str = "https://natwelch.com";

    fn verifier() -> IdentityVerifier {
        let set: JwkSet = serde_json::from_value(json!({
            "keys": [{ "kty": "oct", "kid": "k1", "alg": "HS256", "k": SECRET_B64 }]
        }))
        .unwrap();

        IdentityVerifier::new(Arc::new(StaticKeySet(set)), ISSUER, AUDIENCE, vec![Algorithm::HS256])
    }

    fn token(kid: Option<&str>, claims: serde_json::Value) -> String {
        let mut header = Header::new(Algorithm::HS256);
        header.kid = kid.map(str::to_string);
        encode(&header, &claims, &EncodingKey::from_secret(SECRET)).unwrap()
    }

    fn claims(aud: &str, iss: &str, exp_offset: i64) -> serde_json::Value {
        json!({
            "sub": "42",
            "aud": aud,
            "iss": iss,
            "exp": Utc::now().timestamp() + exp_offset,
            "name": "Nat",
        })
    }

    #[tokio::test]
    async fn accepts_valid_token() {
        let identity = verifier()
            .verify(&token(Some("k1"), claims(AUDIENCE, ISSUER, 3600)))
            .await
            .unwrap();
        assert_eq!(identity.subject, "42");
        assert_eq!(identity.issuer, ISSUER);
        assert_eq!(identity.audience, AUDIENCE);
        assert_eq!(identity.name.as_deref(), Some("Nat"));
    }

    #[tokio::test]
    async fn rejects_wrong_audience() {
        let err = verifier()
            .verify(&token(Some("k1"), claims("https://elsewhere", ISSUER, 3600)))
            .await
            .unwrap_err();
        assert!(matches!(err, VerifyError::InvalidAudience), "{:?}", err);
    }

    #[tokio::test]
    async fn rejects_wrong_issuer() {
        let err = verifier()
            .verify(&token(Some("k1"), claims(AUDIENCE, "https://evil.auth0.com/", 3600)))
            .await
            .unwrap_err();
        assert!(matches!(err, VerifyError::InvalidIssuer), "{:?}", err);
    }

    #[tokio::test]
    async fn rejects_expired_token() {
        let err = verifier()
            .verify(&token(Some("k1"), claims(AUDIENCE, ISSUER, -3600)))
            .await
            .unwrap_err();
        assert!(matches!(err, VerifyError::TokenExpired), "{:?}", err);
    }

    #[tokio::test]
    async fn rejects_unknown_kid() {
        let err = verifier()
            .verify(&token(Some("rotated"), claims(AUDIENCE, ISSUER, 3600)))
            .await
            .unwrap_err();
        assert!(matches!(err, VerifyError::KeyNotFound(Some(ref kid)) if kid == "rotated"), "{:?}", err);
    }

    #[tokio::test]
    async fn rejects_missing_kid() {
        let err = verifier()
            .verify(&token(None, claims(AUDIENCE, ISSUER, 3600)))
            .await
            .unwrap_err();
        assert!(matches!(err, VerifyError::KeyNotFound(None)), "{:?}", err);
    }

    #[tokio::test]
    async fn rejects_bad_signature() {
        let mut header = Header::new(Algorithm::HS256);
        header.kid = Some("k1".to_string());
        let forged = encode(
            &header,
            &claims(AUDIENCE, ISSUER, 3600),
            &EncodingKey::from_secret(b"not-the-secret"),
        )
        .unwrap();

        let err = verifier().verify(&forged).await.unwrap_err();
        assert!(matches!(err, VerifyError::InvalidSignature), "{:?}", err);
    }

    #[tokio::test]
    async fn rejects_disallowed_algorithm() {
        let mut header = Header::new(Algorithm::HS512);
        header.kid = Some("k1".to_string());
        let token = encode(&header, &claims(AUDIENCE, ISSUER, 3600), &EncodingKey::from_secret(SECRET)).unwrap();

        let err = verifier().verify(&token).await.unwrap_err();
        assert!(matches!(err, VerifyError::UnsupportedAlgorithm(_)), "{:?}", err);
    }

    #[tokio::test]
    async fn rejects_garbage() {
        let err = verifier().verify("not.a.jwt").await.unwrap_err();
        assert!(matches!(err, VerifyError::Malformed(_)), "{:?}", err);
    }
}
