use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

use deck_api::{app, AppConfig, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("deck_api=info".parse()?)
                .add_directive("tower_http=debug".parse()?),
        )
        .init();

    info!("Initializing Deck API...");
    let config = AppConfig::from_env()?;
    let port = config.port;
    let state = Arc::new(AppState::new(config)?);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Starting Deck API on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app(state)).await?;

    Ok(())
}
