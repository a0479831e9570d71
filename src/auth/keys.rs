use async_trait::async_trait;
use jsonwebtoken::jwk::JwkSet;
use std::time::Duration;
use tracing::debug;

use super::VerifyError;

/// Where the verifier gets signing keys from
#[async_trait]
pub trait KeySetSource: Send + Sync {
    async fn fetch(&self) -> Result<JwkSet, VerifyError>;
}

/// Fetches `{"keys": [...]}` over HTTPS on every call
#[derive(Debug, Clone)]
pub struct HttpKeySet {
    client: reqwest::Client,
    url: String,
}

impl HttpKeySet {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, VerifyError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| VerifyError::KeySetUnavailable(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl KeySetSource for HttpKeySet {
    async fn fetch(&self) -> Result<JwkSet, VerifyError> {
        debug!(url = %self.url, "fetching key set");

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| VerifyError::KeySetUnavailable(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(VerifyError::KeySetUnavailable(format!(
                "{} answered {}",
                self.url, status
            )));
        }

        response
            .json::<JwkSet>()
            .await
            .map_err(|e| VerifyError::KeySetUnavailable(format!("undecodable key set: {}", e)))
    }
}

/// A fixed key set, for pinned keys
#[derive(Debug, Clone)]
pub struct StaticKeySet(pub JwkSet);

#[async_trait]
impl KeySetSource for StaticKeySet {
    async fn fetch(&self) -> Result<JwkSet, VerifyError> {
        Ok(self.0.clone())
    }
}
