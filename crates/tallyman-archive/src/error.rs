//! Error types for archive access

use tallyman_http::NetworkError;
use thiserror::Error;

/// Errors that can occur while fetching filings
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ArchiveError {
    /// Request failed or returned a non-success status
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    /// Filing identity does not match what the archive returned
    #[error("Invalid filing: {0}")]
    InvalidFiling(String),

    /// Response body could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),

    /// Nothing stored under the requested filing
    #[error("Not found: {0}")]
    NotFound(String),
}

impl From<serde_json::Error> for ArchiveError {
    fn from(e: serde_json::Error) -> Self {
        ArchiveError::Decode(format!("JSON parsing error: {}", e))
    }
}
