//! Error types for the Buildkite client.

use reqwest::StatusCode;
use thiserror::Error;

/// Result type for Buildkite client operations.
pub type Result<T> = std::result::Result<T, BuildkiteError>;

/// Buildkite client errors.
///
/// A structured GraphQL error envelope takes precedence over the HTTP
/// status of the response carrying it.
#[derive(Debug, Error)]
pub enum BuildkiteError {
    /// Network failure (connection refused, timeout, TLS)
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// GraphQL error envelope returned by the API
    #[error("graphql error: {}", .messages.join(", "))]
    Api { messages: Vec<String> },

    /// Non-success HTTP status with no structured API error body
    #[error("response returned status {status}")]
    HttpStatus { status: StatusCode },

    /// Response body was not the expected shape
    #[error("error decoding response: {0}")]
    Decode(#[from] serde_json::Error),
}
