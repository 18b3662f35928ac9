pub mod download;
pub mod health;
pub mod jobs;
pub mod upload;

use axum::Router;

use crate::state::AppState;

/// Build the complete router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(upload::router(state.config.max_upload_bytes))
        .merge(jobs::router())
        .merge(download::router())
        .with_state(state)
}
