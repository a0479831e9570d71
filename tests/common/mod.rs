#![allow(dead_code)]

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use async_trait::async_trait;
use axum::{body::Body, http::Request, response::Response, routing::get, Json, Router};
use chrono::Utc;
use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::{json, Value};
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;

use tab_archive::auth::{IdentityVerifier, KeySetSource, StaticKeySet, VerifyError};
use tab_archive::config::AppConfig;
use tab_archive::database::DatabaseManager;
use tab_archive::{app, AppState};

pub const ISSUER: &str = "https://icco.auth0.com/";
pub const AUDIENCE: &str = "https://natwelch.com";
pub const KID: &str = "test-key";

// HMAC keys keep the tests free of RSA key generation. The base64 form is the
// same under the standard and URL-safe alphabets.
const SECRET: &[u8] = b"secretsecretsecret";
const SECRET_B64: &str = "c2VjcmV0c2VjcmV0c2VjcmV0";

pub fn key_set() -> JwkSet {
    serde_json::from_value(json!({
        "keys": [{ "kty": "oct", "kid": KID, "alg": "HS256", "use": "sig", "k": SECRET_B64 }]
    }))
    .expect("static key set")
}

pub fn verifier_with(keys: Arc<dyn KeySetSource>) -> IdentityVerifier {
    IdentityVerifier::new(keys, ISSUER, AUDIENCE, vec![Algorithm::HS256])
}

pub fn verifier() -> IdentityVerifier {
    verifier_with(Arc::new(StaticKeySet(key_set())))
}

/// A key-set source whose provider is always down
pub struct UnreachableKeySet;

#[async_trait]
impl KeySetSource for UnreachableKeySet {
    async fn fetch(&self) -> Result<JwkSet, VerifyError> {
        Err(VerifyError::KeySetUnavailable("connection refused".to_string()))
    }
}

pub fn sign(claims: Value) -> String {
    let mut header = Header::new(Algorithm::HS256);
    header.kid = Some(KID.to_string());
    encode(&header, &claims, &EncodingKey::from_secret(SECRET)).expect("sign token")
}

pub fn token_for(subject: &str, name: &str) -> String {
    sign(json!({
        "sub": subject,
        "aud": AUDIENCE,
        "iss": ISSUER,
        "exp": Utc::now().timestamp() + 3600,
        "iat": Utc::now().timestamp(),
        "name": name,
        "email": format!("{}@example.com", name.to_lowercase()),
    }))
}

/// A subject no earlier test run has used
pub fn unique_subject(prefix: &str) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    format!("{}|{}", prefix, nanos)
}

fn config(database_url: &str) -> AppConfig {
    let database_url = database_url.to_string();
    AppConfig::from_lookup(move |name| match name {
        "DATABASE_URL" => Some(database_url.clone()),
        _ => None,
    })
    .expect("test config")
}

/// App state whose pool never connects; enough for requests rejected before the store
pub fn offline_state(verifier: IdentityVerifier) -> AppState {
    let url = "postgres://tab_archive@127.0.0.1:1/unreachable";
    let pool = PgPoolOptions::new()
        .acquire_timeout(Duration::from_secs(1))
        .connect_lazy(url)
        .expect("lazy pool");
    AppState::new(config(url), DatabaseManager::from_pool(pool), verifier)
}

/// App state on a real, migrated database, or `None` when DATABASE_URL is unset
pub async fn database_state() -> Result<Option<AppState>> {
    database_state_with(verifier()).await
}

/// Like [`database_state`], with a caller-chosen verifier
pub async fn database_state_with(verifier: IdentityVerifier) -> Result<Option<AppState>> {
    let _ = dotenvy::dotenv();
    let Ok(url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set; skipping database test");
        return Ok(None);
    };

    let config = config(&url);
    let database = DatabaseManager::connect(&config.database)
        .await
        .context("failed to connect to DATABASE_URL")?;
    database.migrate().await.context("failed to migrate")?;

    Ok(Some(AppState::new(config, database, verifier)))
}

pub async fn send(state: &AppState, request: Request<Body>) -> Result<Response> {
    let response = app(state.clone()).oneshot(request).await?;
    Ok(response)
}

pub async fn body_json(response: Response) -> Result<Value> {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    serde_json::from_slice(&bytes).with_context(|| format!("not JSON: {}", String::from_utf8_lossy(&bytes)))
}

pub async fn body_text(response: Response) -> Result<String> {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Serve `body` at `/.well-known/jwks.json` on a free local port
pub async fn spawn_key_server(status: axum::http::StatusCode, body: Value) -> Result<String> {
    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;

    let router = Router::new().route(
        "/.well-known/jwks.json",
        get(move || {
            let body = body.clone();
            async move { (status, Json(body)) }
        }),
    );
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });

    Ok(format!("http://127.0.0.1:{}/.well-known/jwks.json", port))
}
