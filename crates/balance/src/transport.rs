//! HTTP layer underneath the balance client.

use std::error::Error as StdError;
use std::future::Future;
use std::io;
use std::time::Duration;

use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};

use crate::error::BalanceError;

pub const API_KEY_HEADER: &str = "x-api-key";

/// Status and raw body of one HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: Vec<u8>,
}

/// Transport failures, split by whether they are worth retrying.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// Could not establish a connection, or the server dropped it before
    /// answering.
    #[error("connection error: {0}")]
    Connect(String),

    /// Anything else (timeouts, body read errors).
    #[error("transport error: {0}")]
    Other(String),
}

/// Issues one authenticated GET.
pub trait BalanceTransport: Send + Sync {
    fn get(
        &self,
        url: &str,
        api_key: &str,
    ) -> impl Future<Output = Result<HttpReply, TransportError>> + Send;
}

/// `reqwest`-backed transport used in production.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(request_timeout: Option<Duration>) -> Result<Self, BalanceError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| BalanceError::Client(e.to_string()))?;
        Ok(Self { client })
    }

    fn build_headers(api_key: &str) -> Result<HeaderMap, TransportError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
        let key = HeaderValue::from_str(api_key)
            .map_err(|_| TransportError::Other("API key is not a valid header value".into()))?;
        headers.insert(API_KEY_HEADER, key);
        Ok(headers)
    }
}

/// Reject keys that cannot be sent as an `x-api-key` header.
pub fn validate_api_key(api_key: &str) -> Result<(), BalanceError> {
    HeaderValue::from_str(api_key)
        .map(|_| ())
        .map_err(|_| BalanceError::Client("API key is not a valid header value".into()))
}

impl BalanceTransport for ReqwestTransport {
    async fn get(&self, url: &str, api_key: &str) -> Result<HttpReply, TransportError> {
        let resp = self
            .client
            .get(url)
            .headers(Self::build_headers(api_key)?)
            .send()
            .await
            .map_err(classify)?;

        let status = resp.status().as_u16();
        let body = resp.bytes().await.map_err(classify)?;

        Ok(HttpReply {
            status,
            body: body.to_vec(),
        })
    }
}

fn classify(err: reqwest::Error) -> TransportError {
    if err.is_connect() || is_dropped_connection(&err) {
        TransportError::Connect(err.to_string())
    } else {
        TransportError::Other(err.to_string())
    }
}

/// Connection accepted, then closed or reset before a full response arrived.
fn is_dropped_connection(err: &reqwest::Error) -> bool {
    if err.is_timeout() {
        return false;
    }
    let mut source = err.source();
    while let Some(cause) = source {
        if let Some(io_err) = cause.downcast_ref::<io::Error>() {
            if matches!(
                io_err.kind(),
                io::ErrorKind::ConnectionReset
                    | io::ErrorKind::ConnectionAborted
                    | io::ErrorKind::BrokenPipe
                    | io::ErrorKind::UnexpectedEof
            ) {
                return true;
            }
        }
        if let Some(hyper_err) = cause.downcast_ref::<hyper::Error>() {
            if hyper_err.is_incomplete_message() {
                return true;
            }
        }
        source = cause.source();
    }
    false
}
