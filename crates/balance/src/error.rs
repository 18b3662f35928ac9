//! Error types for balance lookups.

/// Errors that can occur when fetching a balance.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BalanceError {
    /// The API answered with a status other than 200.
    #[error("balance API returned HTTP {status}")]
    Http {
        /// The response status code.
        status: u16,
    },

    /// Every attempt failed to connect.
    #[error("connection failed after {attempts} attempts: {message}")]
    Transport {
        /// How many attempts were made.
        attempts: u32,
        /// Error from the last attempt.
        message: String,
    },

    /// Non-connection transport failure (timeout, broken response).
    #[error("request failed: {0}")]
    Request(String),

    /// The 200 body was not valid JSON.
    #[error("invalid balance payload: {0}")]
    Decode(String),

    /// The HTTP client could not be constructed.
    #[error("HTTP client setup failed: {0}")]
    Client(String),
}

impl BalanceError {
    /// Short label used in structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            BalanceError::Http { .. } => "http",
            BalanceError::Transport { .. } => "transport",
            BalanceError::Request(_) => "request",
            BalanceError::Decode(_) => "decode",
            BalanceError::Client(_) => "client",
        }
    }
}
