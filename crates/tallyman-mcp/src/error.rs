//! Error types for MCP server operations.

use tallyman_http::ConfigurationError;
use thiserror::Error;

/// MCP server error types
#[derive(Error, Debug)]
pub enum McpError {
    /// Malformed JSON-RPC envelope
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Tool arguments missing or malformed
    #[error("Invalid params: {0}")]
    InvalidParams(String),

    /// Unknown method or tool
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// Startup configuration rejected
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl McpError {
    /// Convert to JSON-RPC error code
    pub fn error_code(&self) -> i32 {
        match self {
            McpError::InvalidRequest(_) => -32600,
            McpError::InvalidParams(_) => -32602,
            McpError::ToolNotFound(_) => -32601,
            McpError::Configuration(_) => -32000,
            McpError::Json(_) => -32700,
            McpError::Io(_) => -32000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(McpError::InvalidRequest("x".into()).error_code(), -32600);
        assert_eq!(McpError::InvalidParams("x".into()).error_code(), -32602);
        assert_eq!(McpError::ToolNotFound("x".into()).error_code(), -32601);
        assert_eq!(
            McpError::Configuration(ConfigurationError::MissingIdentity).error_code(),
            -32000
        );
    }
}
