use std::sync::Arc;

use axum::Router;
use queue_board::{board_api, BoardConfig};
use tracing_subscriber::EnvFilter;

/// Serves the board API for the queues named in the environment.
///
/// ```text
/// QUEUE_BOARD_QUEUES=emails,reports REDIS_URL=redis://127.0.0.1:6379 \
///     cargo run --example board_server
/// curl 'http://localhost:8081/api/queues?activeQueue=emails&status=failed'
/// ```
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = BoardConfig::from_env()?;
    let registry = config.connect().await?;
    tracing::info!(queues = registry.len(), "board ready");

    let app = Router::new().nest("/api", board_api(Arc::new(registry)));

    let addr = std::env::var("BOARD_ADDR").unwrap_or_else(|_| "0.0.0.0:8081".to_string());
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}
