//! Balance lookups against the Blockberry Sui API.
//!
//! Only connection-level failures are retried. Any HTTP status other than
//! 200 is terminal for that address.

pub mod client;
pub mod error;
pub mod retry;
pub mod transport;

use std::future::Future;

use seedscan_common::types::{BalanceRecord, DerivedAddress};

pub use client::{BalanceApiConfig, BlockberryClient};
pub use error::BalanceError;
pub use retry::RetryPolicy;
pub use transport::{BalanceTransport, HttpReply, ReqwestTransport, TransportError};

/// Anything that can resolve an address to its balance record.
pub trait BalanceFetcher: Send + Sync {
    fn fetch(
        &self,
        address: &DerivedAddress,
    ) -> impl Future<Output = Result<BalanceRecord, BalanceError>> + Send;
}
