//! Error types for the Extractor

use thiserror::Error;

/// Errors that can occur during extraction
///
/// Only `Config` escapes the public API; document and handle failures are
/// logged and treated as "no result" by the strategy that hit them.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtractorError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Raw document could not be fetched
    #[error("Document error: {0}")]
    Document(String),

    /// Parsed-document handle could not be obtained or queried
    #[error("Handle error: {0}")]
    Handle(String),
}

/// Why a display value is not a number
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NumberParseError {
    /// Nothing left after removing separators and symbols
    #[error("no digits in {0:?}")]
    Empty(String),

    /// Text is not a decimal number
    #[error("not a number: {0:?}")]
    Invalid(String),

    /// Parsed, but infinite or NaN
    #[error("not a finite number: {0:?}")]
    NonFinite(String),
}
