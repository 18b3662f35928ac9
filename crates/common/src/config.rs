use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::types::BatchConfig;

/// Default Blockberry endpoint for Sui account lookups.
pub const DEFAULT_BALANCE_API_URL: &str = "https://api.blockberry.one/sui/v1";

/// Global application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Base URL of the balance API (`{base}/accounts/{address}/balance`)
    pub balance_api_url: String,

    /// Blockberry API key sent as `x-api-key`
    pub balance_api_key: String,

    /// Directory holding uploaded phrase files and job outputs
    pub media_root: PathBuf,

    /// Output file name used by the CLI runner (default: balances.txt)
    pub output_file_name: String,

    /// Maximum attempts per address on connection failures (default: 5)
    pub balance_retry_limit: u32,

    /// Sleep between connection retries in milliseconds (default: 2000)
    pub balance_retry_delay_ms: u64,

    /// Per-request timeout for balance lookups in seconds (default: 30)
    pub balance_request_timeout_secs: u64,

    /// Address the API server binds to
    pub bind_addr: SocketAddr,

    /// Upper bound on multipart upload size in bytes (default: 10 MiB)
    pub max_upload_bytes: usize,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            balance_api_url: std::env::var("BALANCE_API_URL")
                .unwrap_or_else(|_| DEFAULT_BALANCE_API_URL.to_string()),
            balance_api_key: std::env::var("BLOCKBERRY_API_KEY").map_err(|_| {
                anyhow::anyhow!("BLOCKBERRY_API_KEY environment variable is required")
            })?,
            media_root: std::env::var("MEDIA_ROOT")
                .unwrap_or_else(|_| "media".to_string())
                .into(),
            output_file_name: std::env::var("OUTPUT_FILE_NAME")
                .unwrap_or_else(|_| "balances.txt".to_string()),
            balance_retry_limit: std::env::var("BALANCE_RETRY_LIMIT")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("BALANCE_RETRY_LIMIT must be a valid u32"))?,
            balance_retry_delay_ms: std::env::var("BALANCE_RETRY_DELAY_MS")
                .unwrap_or_else(|_| "2000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("BALANCE_RETRY_DELAY_MS must be a valid u64"))?,
            balance_request_timeout_secs: std::env::var("BALANCE_REQUEST_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .map_err(|_| {
                    anyhow::anyhow!("BALANCE_REQUEST_TIMEOUT_SECS must be a valid u64")
                })?,
            bind_addr: std::env::var("BIND_ADDR")
                .unwrap_or_else(|_| "0.0.0.0:3000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("BIND_ADDR must be a socket address"))?,
            max_upload_bytes: std::env::var("MAX_UPLOAD_BYTES")
                .unwrap_or_else(|_| "10485760".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("MAX_UPLOAD_BYTES must be a valid usize"))?,
        })
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.balance_retry_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.balance_request_timeout_secs)
    }

    /// Default output location for runs that don't pick their own path.
    pub fn default_output_path(&self) -> PathBuf {
        self.media_root.join(&self.output_file_name)
    }

    /// Build the per-run configuration handed to the batch orchestrator.
    pub fn batch_config(
        &self,
        input_path: impl AsRef<Path>,
        output_path: impl AsRef<Path>,
    ) -> BatchConfig {
        BatchConfig {
            api_key: self.balance_api_key.clone(),
            input_path: input_path.as_ref().to_path_buf(),
            output_path: output_path.as_ref().to_path_buf(),
            retry_limit: self.balance_retry_limit,
            retry_delay: self.retry_delay(),
        }
    }
}
