use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// An archived browser tab, as submitted to `/hook` and returned from `/archive`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Tab {
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub favicon: String,
    pub seen: DateTime<Utc>,
}

impl Tab {
    /// Decode a request body. Missing `title`/`favicon` default to empty.
    pub fn from_json(body: &[u8]) -> Result<Self, String> {
        let tab: Tab = serde_json::from_slice(body).map_err(|e| format!("could not parse: {}", e))?;
        if tab.url.trim().is_empty() {
            return Err("url must not be empty".to_string());
        }
        Ok(tab)
    }
}
