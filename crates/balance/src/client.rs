use std::time::Duration;

use seedscan_common::types::{BalanceRecord, DerivedAddress};

use crate::BalanceFetcher;
use crate::error::BalanceError;
use crate::retry::RetryPolicy;
use crate::transport::{BalanceTransport, ReqwestTransport, TransportError, validate_api_key};

/// Settings for a [`BlockberryClient`].
#[derive(Debug, Clone)]
pub struct BalanceApiConfig {
    /// Base URL, e.g. `https://api.blockberry.one/sui/v1`
    pub base_url: String,
    /// Sent as `x-api-key`
    pub api_key: String,
    pub retry: RetryPolicy,
    /// Per-request timeout; `None` waits indefinitely
    pub request_timeout: Option<Duration>,
}

/// Client for `GET {base}/accounts/{address}/balance`.
#[derive(Debug, Clone)]
pub struct BlockberryClient<T = ReqwestTransport> {
    base_url: String,
    api_key: String,
    retry: RetryPolicy,
    transport: T,
}

impl BlockberryClient<ReqwestTransport> {
    pub fn new(config: BalanceApiConfig) -> Result<Self, BalanceError> {
        validate_api_key(&config.api_key)?;
        let transport = ReqwestTransport::new(config.request_timeout)?;
        Ok(Self::with_transport(config, transport))
    }
}

impl<T: BalanceTransport> BlockberryClient<T> {
    pub fn with_transport(config: BalanceApiConfig, transport: T) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key,
            retry: config.retry,
            transport,
        }
    }

    pub fn balance_url(&self, address: &DerivedAddress) -> String {
        format!("{}/accounts/{}/balance", self.base_url, address)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Fetch one balance, retrying only when the connection fails.
    pub async fn fetch_balance(
        &self,
        address: &DerivedAddress,
    ) -> Result<BalanceRecord, BalanceError> {
        let url = self.balance_url(address);
        let max_attempts = self.retry.attempts();
        let mut last_error = String::new();

        for attempt in 1..=max_attempts {
            match self.transport.get(&url, &self.api_key).await {
                Ok(reply) if reply.status == 200 => {
                    let value: serde_json::Value = serde_json::from_slice(&reply.body)
                        .map_err(|e| BalanceError::Decode(e.to_string()))?;
                    return Ok(BalanceRecord::new(value));
                }
                Ok(reply) => {
                    tracing::warn!(
                        address = %address,
                        status = reply.status,
                        "Balance API returned non-success status"
                    );
                    return Err(BalanceError::Http {
                        status: reply.status,
                    });
                }
                Err(TransportError::Connect(message)) => {
                    tracing::warn!(
                        address = %address,
                        attempt,
                        max_attempts,
                        error = %message,
                        "Connection error fetching balance"
                    );
                    last_error = message;
                    if attempt < max_attempts {
                        tokio::time::sleep(self.retry.delay).await;
                    }
                }
                Err(TransportError::Other(message)) => {
                    return Err(BalanceError::Request(message));
                }
            }
        }

        tracing::error!(
            address = %address,
            attempts = max_attempts,
            "Giving up on balance lookup after repeated connection errors"
        );
        Err(BalanceError::Transport {
            attempts: max_attempts,
            message: last_error,
        })
    }
}

impl<T: BalanceTransport> BalanceFetcher for BlockberryClient<T> {
    async fn fetch(&self, address: &DerivedAddress) -> Result<BalanceRecord, BalanceError> {
        self.fetch_balance(address).await
    }
}
