use anyhow::Context;
use tracing::info;

use tab_archive::auth::IdentityVerifier;
use tab_archive::config::AppConfig;
use tab_archive::database::DatabaseManager;
use tab_archive::{app, logging, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL
    let _ = dotenvy::dotenv();

    let config = AppConfig::from_env().context("invalid configuration")?;
    logging::init(&config.log)?;
    info!("Starting Tab Archive in {:?} mode", config.environment);

    let verifier = IdentityVerifier::from_config(&config.auth).context("cannot build identity verifier")?;
    info!(
        issuer = verifier.issuer(),
        audience = verifier.audience(),
        jwks_url = %config.auth.jwks_url,
        "identity verifier ready"
    );

    let database = DatabaseManager::connect(&config.database)
        .await
        .context("cannot connect to database server")?;
    database.migrate().await.context("cannot migrate database")?;

    let bind_addr = format!("0.0.0.0:{}", config.server.port);
    let state = AppState::new(config, database.clone(), verifier);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    info!("Starting up on http://{}", bind_addr);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    database.close().await;
    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c().await.ok();
    info!("Shutdown signal received");
}
