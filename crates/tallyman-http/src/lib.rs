//! Tallyman HTTP Layer
//!
//! Compliant, resilient outbound traffic to the SEC EDGAR archive.
//!
//! # Architecture
//!
//! - `RequestGovernor`: process-wide minimum-interval rate limiter
//! - `RetryPolicy`: bounded exponential backoff for idempotent requests
//! - `ResilientClient`: identity headers, timeout and retries, with every
//!   attempt admitted by the governor
//! - `Transport`: one-shot exchange seam (`ReqwestTransport` in production,
//!   `MockTransport` in tests)
//! - `HttpConfig`: environment / TOML configuration
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use tallyman_http::{MockTransport, RequestGovernor, ResilientClient};
//!
//! let transport = MockTransport::new();
//! transport.push_status(503, "");
//! transport.push_status(200, "ok");
//!
//! let governor = Arc::new(RequestGovernor::new(10.0).unwrap());
//! let client = ResilientClient::with_transport("Jane jane@example.com", governor, Arc::new(transport.clone()))
//!     .unwrap()
//!     .with_policy(tallyman_http::RetryPolicy::new(3, std::time::Duration::from_millis(1)).unwrap());
//!
//! assert_eq!(client.get("https://www.sec.gov/", None, &[]).unwrap().status, 200);
//! assert_eq!(transport.call_count(), 2);
//! ```

#![warn(missing_docs)]

pub mod client;
pub mod config;
pub mod error;
pub mod governor;
pub mod mock;
pub mod policy;
pub mod transport;

pub use client::ResilientClient;
pub use config::HttpConfig;
pub use error::{ConfigurationError, NetworkError, NetworkErrorKind};
pub use governor::{reset_shared_governor, shared_governor, Grant, RequestGovernor};
pub use mock::MockTransport;
pub use policy::RetryPolicy;
pub use transport::{HttpRequest, HttpResponse, Method, ReqwestTransport, Transport};
