use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;

use insightgenie::{app, config, logging, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    logging::init_logging()?;

    // Load configuration and make sure the working directories exist
    let config = config::Config::new()?;
    config.ensure_directories().await?;

    // Build our application state
    let state = Arc::new(AppState::new(config));

    let app = app(state);

    // Run it
    let addr = SocketAddr::from(([127, 0, 0, 1], 3000));
    tracing::info!("listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
