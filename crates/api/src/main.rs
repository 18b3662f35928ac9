//! SeedScan API server binary entrypoint.

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use seedscan_common::config::AppConfig;

use seedscan_api::routes::create_router;
use seedscan_api::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(
                "seedscan_api=debug,seedscan_engine=info,seedscan_balance=info,tower_http=debug",
            )
        }))
        .init();

    tracing::info!("Starting SeedScan API server...");

    // Load configuration
    let config = AppConfig::from_env()?;
    let addr = config.bind_addr;

    // Build application state
    let state = AppState::new(config);
    state.storage.ensure_root().await?;
    tracing::info!(media_root = %state.storage.root().display(), "Media root ready");

    let jobs = state.jobs.clone();

    // Build router
    let app = create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    // Start server
    tracing::info!("API server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
                return;
            }
            let cancelled = jobs.cancel_all().await;
            tracing::info!(cancelled, "Received shutdown signal, cancelled running jobs");
        })
        .await?;

    tracing::info!("SeedScan API server stopped.");
    Ok(())
}
