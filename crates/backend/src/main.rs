use std::sync::Arc;

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use panel_backend::config::AppConfig;
use panel_backend::db;
use panel_backend::repository::PgAccountStore;
use panel_backend::{build_router, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env before reading RUST_LOG or any config
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;

    tracing::info!("Starting Spotify panel backend");

    let pool = db::establish_connection_pool(&config.database_url, config.database_tls)?;
    let store = Arc::new(PgAccountStore::new(pool));

    let bind_addr = config.bind_addr;
    let state = AppState::new(config, store)?;
    let app = build_router(state);

    tracing::info!("Server listening on {}", bind_addr);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
