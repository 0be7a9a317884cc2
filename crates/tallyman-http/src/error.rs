//! Error types for outbound archive traffic

use thiserror::Error;

/// Invalid setup detected before any network access
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    /// No identity string was provided
    #[error("SEC_EDGAR_USER_AGENT is required (e.g. \"Your Name name@example.com\")")]
    MissingIdentity,

    /// The identity string carries no contact address
    #[error("Identity must include a contact email address: {0:?}")]
    IdentityWithoutContact(String),

    /// Rate ceiling is not a positive finite number
    #[error("Invalid rate limit: {0} requests/second")]
    InvalidRate(f64),

    /// Retry policy parameters are out of range
    #[error("Invalid retry policy: {0}")]
    InvalidPolicy(String),

    /// The underlying HTTP client could not be built
    #[error("Transport setup failed: {0}")]
    Transport(String),
}

/// Coarse classification of a network failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkErrorKind {
    /// Request exceeded its timeout
    Timeout,
    /// Connection could not be established
    ConnectionFailure,
    /// Final response carried a non-success status
    HttpStatusFailure,
    /// Any other transport-level failure
    GenericTransportFailure,
}

impl NetworkErrorKind {
    /// Stable lowercase name used in logs
    pub fn as_str(&self) -> &'static str {
        match self {
            NetworkErrorKind::Timeout => "timeout",
            NetworkErrorKind::ConnectionFailure => "connection_failure",
            NetworkErrorKind::HttpStatusFailure => "http_status_failure",
            NetworkErrorKind::GenericTransportFailure => "transport_failure",
        }
    }
}

/// Failure of an outbound request, always carrying the target URL
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NetworkError {
    /// Request exceeded its timeout
    #[error("Request to {url} timed out")]
    Timeout {
        /// Target URL
        url: String,
    },

    /// Connection could not be established
    #[error("Connection to {url} failed: {message}")]
    ConnectionFailure {
        /// Target URL
        url: String,
        /// Transport detail
        message: String,
    },

    /// Final response carried a non-success status
    #[error("HTTP {status} from {url}")]
    HttpStatusFailure {
        /// Target URL
        url: String,
        /// Response status code
        status: u16,
    },

    /// Any other transport-level failure
    #[error("Request to {url} failed: {message}")]
    GenericTransportFailure {
        /// Target URL
        url: String,
        /// Transport detail
        message: String,
    },
}

impl NetworkError {
    /// Classification of this failure
    pub fn kind(&self) -> NetworkErrorKind {
        match self {
            NetworkError::Timeout { .. } => NetworkErrorKind::Timeout,
            NetworkError::ConnectionFailure { .. } => NetworkErrorKind::ConnectionFailure,
            NetworkError::HttpStatusFailure { .. } => NetworkErrorKind::HttpStatusFailure,
            NetworkError::GenericTransportFailure { .. } => {
                NetworkErrorKind::GenericTransportFailure
            }
        }
    }

    /// URL of the failed request
    pub fn url(&self) -> &str {
        match self {
            NetworkError::Timeout { url }
            | NetworkError::ConnectionFailure { url, .. }
            | NetworkError::HttpStatusFailure { url, .. }
            | NetworkError::GenericTransportFailure { url, .. } => url,
        }
    }

    /// Whether this is a transport failure rather than a status failure
    pub fn is_transport(&self) -> bool {
        self.kind() != NetworkErrorKind::HttpStatusFailure
    }

    /// Classify a reqwest error for `url`
    pub fn from_reqwest(url: &str, e: &reqwest::Error) -> Self {
        let url = url.to_string();
        if e.is_timeout() {
            NetworkError::Timeout { url }
        } else if e.is_connect() {
            NetworkError::ConnectionFailure {
                url,
                message: e.to_string(),
            }
        } else if let Some(status) = e.status() {
            NetworkError::HttpStatusFailure {
                url,
                status: status.as_u16(),
            }
        } else {
            NetworkError::GenericTransportFailure {
                url,
                message: e.to_string(),
            }
        }
    }
}
