//! Transport seam
//!
//! `ResilientClient` owns identity, pacing and retries; a `Transport` only
//! performs one request. Production uses [`ReqwestTransport`]; tests script
//! responses with [`crate::MockTransport`].

use std::fmt;
use std::time::Duration;

use tracing::debug;

use crate::{ConfigurationError, NetworkError};

/// HTTP method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// GET
    Get,
    /// HEAD
    Head,
    /// POST
    Post,
}

impl Method {
    /// Uppercase wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Post => "POST",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One fully-prepared outbound request
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    /// Method
    pub method: Method,
    /// Absolute URL
    pub url: String,
    /// Headers in send order, names unique (case-insensitive)
    pub headers: Vec<(String, String)>,
    /// Per-request timeout
    pub timeout: Duration,
}

impl HttpRequest {
    /// Value of a header, matched case-insensitively
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// A received response
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    /// URL the request was sent to
    pub url: String,
    /// Status code
    pub status: u16,
    /// Response headers
    pub headers: Vec<(String, String)>,
    /// Raw body
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Build a response with no headers
    pub fn new(url: impl Into<String>, status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            url: url.into(),
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    /// Whether the status is 2xx
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body decoded as UTF-8, replacing invalid sequences
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Turn a non-2xx response into `NetworkError::HttpStatusFailure`
    pub fn error_for_status(self) -> Result<Self, NetworkError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(NetworkError::HttpStatusFailure {
                url: self.url,
                status: self.status,
            })
        }
    }
}

/// Performs exactly one HTTP exchange
pub trait Transport: Send + Sync {
    /// Send `request` and return whatever status came back
    ///
    /// Only transport-level failures are errors; any received status,
    /// including 4xx and 5xx, is an `Ok` response.
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, NetworkError>;
}

/// Blocking reqwest transport
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
}

impl ReqwestTransport {
    /// Build the underlying client
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::Transport` if the TLS backend or client
    /// cannot be initialized.
    pub fn new() -> Result<Self, ConfigurationError> {
        let client = reqwest::blocking::Client::builder()
            .build()
            .map_err(|e| ConfigurationError::Transport(e.to_string()))?;
        Ok(Self { client })
    }
}

impl Transport for ReqwestTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, NetworkError> {
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Head => reqwest::Method::HEAD,
            Method::Post => reqwest::Method::POST,
        };

        let mut builder = self
            .client
            .request(method, &request.url)
            .timeout(request.timeout);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder
            .send()
            .map_err(|e| NetworkError::from_reqwest(&request.url, &e))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(k, v)| {
                (
                    k.as_str().to_string(),
                    String::from_utf8_lossy(v.as_bytes()).into_owned(),
                )
            })
            .collect();
        let body = response
            .bytes()
            .map_err(|e| NetworkError::from_reqwest(&request.url, &e))?
            .to_vec();

        debug!(url = %request.url, status, "Transport exchange complete");

        Ok(HttpResponse {
            url: request.url.clone(),
            status,
            headers,
            body,
        })
    }
}
