//! e-Sevai API server binary

use anyhow::Result;
use esevai_api::{build_router, config::Config, seed::seed_catalog, state::AppState};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("esevai_api=info".parse()?)
                .add_directive("tower_http=debug".parse()?),
        )
        .init();

    info!("Initializing e-Sevai API...");
    let config = Config::from_env();
    let port = config.port;
    let state = AppState::new(config).await?;

    if state.config.seed_on_start {
        seed_catalog(&state.db).await?;
    }

    let app = build_router(Arc::new(state));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Starting e-Sevai API on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
