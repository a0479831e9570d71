use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;

/// Errors raised while assembling configuration at startup
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing configuration: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub auth: AuthConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub max_request_size_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Expected `iss` claim. Also the base for the default key-set location.
    pub issuer: String,
    /// Expected `aud` claim
    pub audience: String,
    pub jwks_url: String,
    pub jwks_timeout_secs: u64,
    /// Accepted JOSE `alg` names, e.g. "RS256"
    pub algorithms: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// `tracing_subscriber::EnvFilter` directive used when RUST_LOG is unset
    pub filter: String,
}

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_ISSUER: &str = "https://icco.auth0.com/";
pub const DEFAULT_AUDIENCE: &str = "https://natwelch.com";

impl AppConfig {
    /// Build configuration from the process environment.
    ///
    /// `DATABASE_URL` is the only required variable.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = match lookup("APP_ENV").as_deref() {
            Some("production") | Some("prod") => Environment::Production,
            _ => Environment::Development,
        };

        let config = match environment {
            Environment::Production => Self::production(),
            Environment::Development => Self::development(),
        };

        config.with_overrides(&lookup)
    }

    fn with_overrides<F>(mut self, lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Server
        if let Some(v) = lookup("PORT").filter(|v| !v.is_empty()) {
            self.server.port = parse("PORT", &v)?;
        }

        // Database
        self.database.url = lookup("DATABASE_URL")
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::Missing("DATABASE_URL"))?;
        if let Some(v) = lookup("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = parse("DATABASE_MAX_CONNECTIONS", &v)?;
        }
        if let Some(v) = lookup("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = parse("DATABASE_CONNECTION_TIMEOUT", &v)?;
        }

        // API
        if let Some(v) = lookup("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = parse("API_MAX_REQUEST_SIZE_BYTES", &v)?;
        }

        // Auth
        if let Some(v) = lookup("AUTH_ISSUER").filter(|v| !v.is_empty()) {
            self.auth.issuer = v;
        }
        if let Some(v) = lookup("AUTH_AUDIENCE").filter(|v| !v.is_empty()) {
            self.auth.audience = v;
        }
        self.auth.jwks_url = match lookup("AUTH_JWKS_URL").filter(|v| !v.is_empty()) {
            Some(v) => v,
            None => jwks_url_for_issuer(&self.auth.issuer)?,
        };
        if let Some(v) = lookup("AUTH_JWKS_TIMEOUT_SECS") {
            self.auth.jwks_timeout_secs = parse("AUTH_JWKS_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = lookup("AUTH_ALGORITHMS").filter(|v| !v.is_empty()) {
            self.auth.algorithms = v.split(',').map(|s| s.trim().to_string()).collect();
        }

        // Logging
        if let Some(v) = lookup("RUST_LOG").filter(|v| !v.is_empty()) {
            self.log.filter = v;
        }

        Ok(self)
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig { port: DEFAULT_PORT },
            database: DatabaseConfig {
                url: String::new(),
                max_connections: 5,
                connection_timeout: 30,
            },
            api: ApiConfig {
                max_request_size_bytes: 1024 * 1024, // 1MB
            },
            auth: AuthConfig::defaults(),
            log: LogConfig {
                filter: "tab_archive=debug,tower_http=debug,info".to_string(),
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig { port: DEFAULT_PORT },
            database: DatabaseConfig {
                url: String::new(),
                max_connections: 20,
                connection_timeout: 5,
            },
            api: ApiConfig {
                max_request_size_bytes: 64 * 1024, // 64KB
            },
            auth: AuthConfig::defaults(),
            log: LogConfig {
                filter: "info".to_string(),
            },
        }
    }
}

impl AuthConfig {
    fn defaults() -> Self {
        Self {
            issuer: DEFAULT_ISSUER.to_string(),
            audience: DEFAULT_AUDIENCE.to_string(),
            jwks_url: String::new(),
            jwks_timeout_secs: 10,
            algorithms: vec!["RS256".to_string()],
        }
    }
}

/// `<issuer>/.well-known/jwks.json`, tolerating issuers with or without a trailing slash
pub fn jwks_url_for_issuer(issuer: &str) -> Result<String, ConfigError> {
    let mut base = url::Url::parse(issuer).map_err(|_| ConfigError::Invalid {
        name: "AUTH_ISSUER",
        value: issuer.to_string(),
    })?;
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    let jwks = base.join(".well-known/jwks.json").map_err(|_| ConfigError::Invalid {
        name: "AUTH_ISSUER",
        value: issuer.to_string(),
    })?;
    Ok(jwks.into())
}

fn parse<T: std::str::FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        name,
        value: value.to_string(),
    })
}
