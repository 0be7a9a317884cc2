//! Resilient archive client
//!
//! Every request passes through the shared [`RequestGovernor`] before it is
//! handed to the transport, including each retry. Backoff sleeps happen
//! outside the governor lock, so other callers keep flowing while one
//! request waits to retry.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use tallyman_http::{MockTransport, RequestGovernor, ResilientClient};
//!
//! let transport = MockTransport::new();
//! transport.route("https://www.sec.gov/robots.txt", 200, "ok");
//!
//! let governor = Arc::new(RequestGovernor::new(10.0).unwrap());
//! let client = ResilientClient::with_transport(
//!     "Jane Doe jane@example.com",
//!     governor,
//!     Arc::new(transport),
//! )
//! .unwrap();
//!
//! let response = client.get("https://www.sec.gov/robots.txt", None, &[]).unwrap();
//! assert_eq!(response.text(), "ok");
//! ```

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::{validate_identity, HttpConfig, DEFAULT_TIMEOUT_SECS};
use crate::governor::RequestGovernor;
use crate::policy::RetryPolicy;
use crate::transport::{HttpRequest, HttpResponse, Method, ReqwestTransport, Transport};
use crate::{ConfigurationError, NetworkError};

/// `Accept` header sent on every request
pub const ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// `Accept-Language` header sent on every request
pub const ACCEPT_LANGUAGE: &str = "en-US,en;q=0.5";

/// Governed, retrying HTTP client for the archive
#[derive(Clone)]
pub struct ResilientClient {
    identity: String,
    governor: Arc<RequestGovernor>,
    transport: Arc<dyn Transport>,
    policy: RetryPolicy,
    timeout: Duration,
}

impl std::fmt::Debug for ResilientClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResilientClient")
            .field("identity", &self.identity)
            .field("rate", &self.governor.rate())
            .field("policy", &self.policy)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ResilientClient {
    /// Create a client backed by a blocking reqwest transport
    ///
    /// # Errors
    ///
    /// Fails if the identity carries no contact address or the transport
    /// cannot be built. No request is sent either way.
    pub fn new(identity: &str, governor: Arc<RequestGovernor>) -> Result<Self, ConfigurationError> {
        let identity = validate_identity(Some(identity))?;
        let transport = ReqwestTransport::new()?;
        Self::with_transport(identity, governor, Arc::new(transport))
    }

    /// Create a client over an explicit transport
    pub fn with_transport(
        identity: &str,
        governor: Arc<RequestGovernor>,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, ConfigurationError> {
        let identity = validate_identity(Some(identity))?.to_string();
        Ok(Self {
            identity,
            governor,
            transport,
            policy: RetryPolicy::default(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        })
    }

    /// Create a client from configuration over the reqwest transport
    pub fn from_config(
        config: &HttpConfig,
        governor: Arc<RequestGovernor>,
    ) -> Result<Self, ConfigurationError> {
        let identity = config.identity()?;
        let transport = ReqwestTransport::new()?;
        Self::from_config_with_transport(config, governor, Arc::new(transport)).map(|client| {
            info!(identity, timeout_secs = config.timeout_secs, "Archive client ready");
            client
        })
    }

    /// Create a client from configuration over an explicit transport
    pub fn from_config_with_transport(
        config: &HttpConfig,
        governor: Arc<RequestGovernor>,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, ConfigurationError> {
        let client = Self::with_transport(config.identity()?, governor, transport)?
            .with_policy(config.retry_policy()?)
            .with_timeout(config.timeout());
        Ok(client)
    }

    /// Replace the retry policy
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Replace the default per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Identity sent as `User-Agent`
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Governor every request passes through
    pub fn governor(&self) -> &Arc<RequestGovernor> {
        &self.governor
    }

    /// Active retry policy
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Default per-request timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// GET `url`
    ///
    /// `headers` are sent after the standard headers and replace any
    /// standard header of the same name.
    ///
    /// # Returns
    ///
    /// The final response, which may carry a non-success status once
    /// retries are exhausted. Use [`HttpResponse::error_for_status`] to
    /// treat that as a failure.
    ///
    /// # Errors
    ///
    /// Returns the last transport failure once retries are exhausted.
    pub fn get(
        &self,
        url: &str,
        timeout: Option<Duration>,
        headers: &[(String, String)],
    ) -> Result<HttpResponse, NetworkError> {
        self.execute(Method::Get, url, timeout, headers)
    }

    /// HEAD `url`
    pub fn head(&self, url: &str, timeout: Option<Duration>) -> Result<HttpResponse, NetworkError> {
        self.execute(Method::Head, url, timeout, &[])
    }

    fn build_request(
        &self,
        method: Method,
        url: &str,
        timeout: Option<Duration>,
        extra: &[(String, String)],
    ) -> HttpRequest {
        let mut headers: Vec<(String, String)> = vec![
            ("User-Agent".to_string(), self.identity.clone()),
            ("Accept".to_string(), ACCEPT.to_string()),
            ("Accept-Language".to_string(), ACCEPT_LANGUAGE.to_string()),
        ];
        for (name, value) in extra {
            headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
            headers.push((name.clone(), value.clone()));
        }

        HttpRequest {
            method,
            url: url.to_string(),
            headers,
            timeout: timeout.unwrap_or(self.timeout),
        }
    }

    fn execute(
        &self,
        method: Method,
        url: &str,
        timeout: Option<Duration>,
        headers: &[(String, String)],
    ) -> Result<HttpResponse, NetworkError> {
        let request = self.build_request(method, url, timeout, headers);
        let max_attempts = self.policy.max_attempts();
        let mut attempt = 1;

        loop {
            self.governor.wait_if_needed();
            debug!(url, method = %method, attempt, "Sending request");

            match self.transport.send(&request) {
                Ok(response) => {
                    info!(
                        url,
                        method = %method,
                        attempt,
                        status = response.status,
                        bytes = response.body.len(),
                        "Received response"
                    );
                    if attempt < max_attempts
                        && self.policy.should_retry_status(method, response.status)
                    {
                        let delay = self.policy.backoff_for(attempt);
                        warn!(
                            url,
                            status = response.status,
                            attempt,
                            delay_ms = delay.as_millis() as u64,
                            "Retryable status, backing off"
                        );
                        thread::sleep(delay);
                        attempt += 1;
                        continue;
                    }
                    return Ok(response);
                }
                Err(error) => {
                    warn!(
                        url,
                        method = %method,
                        attempt,
                        kind = error.kind().as_str(),
                        error = %error,
                        "Request failed"
                    );
                    if attempt < max_attempts && self.policy.is_retryable_method(method) {
                        let delay = self.policy.backoff_for(attempt);
                        thread::sleep(delay);
                        attempt += 1;
                        continue;
                    }
                    return Err(error);
                }
            }
        }
    }
}
