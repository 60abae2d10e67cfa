//! Probe error types.

use thiserror::Error;

/// Errors that can occur during a single probe.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("invalid method: {0}")]
    InvalidMethod(String),

    #[error("invalid header: {0}")]
    InvalidHeader(String),

    #[error("invalid matcher pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("request timed out after {0} ms")]
    Timeout(u64),

    #[error("request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("failed to read response body: {0}")]
    Body(#[source] reqwest::Error),
}
