//! Shared application state for the Axum API server.

use std::sync::Arc;

use seedscan_common::config::AppConfig;

use crate::jobs::JobRegistry;
use crate::storage::MediaStorage;

/// Application state shared across all route handlers via Axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub storage: MediaStorage,
    pub jobs: JobRegistry,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let storage = MediaStorage::new(config.media_root.clone());
        Self {
            config: Arc::new(config),
            storage,
            jobs: JobRegistry::new(),
        }
    }
}
