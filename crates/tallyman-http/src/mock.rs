//! Scripted transport for deterministic testing
//!
//! Returns pre-configured responses without touching the network. Scripted
//! replies are consumed first, in order; after that, requests are answered
//! from per-URL routes; anything else gets a 404.
//!
//! # Examples
//!
//! ```
//! use tallyman_http::{HttpRequest, Method, MockTransport, Transport};
//! use std::time::Duration;
//!
//! let transport = MockTransport::new();
//! transport.route("https://www.sec.gov/a", 200, "hello");
//!
//! let request = HttpRequest {
//!     method: Method::Get,
//!     url: "https://www.sec.gov/a".to_string(),
//!     headers: Vec::new(),
//!     timeout: Duration::from_secs(5),
//! };
//! assert_eq!(transport.send(&request).unwrap().text(), "hello");
//! assert_eq!(transport.call_count(), 1);
//! ```

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use crate::transport::{HttpRequest, HttpResponse, Transport};
use crate::NetworkError;

#[derive(Debug, Clone)]
enum Reply {
    Status(u16, Vec<u8>),
    Failure(NetworkError),
}

#[derive(Debug, Default)]
struct MockState {
    script: VecDeque<Reply>,
    routes: HashMap<String, (u16, Vec<u8>)>,
    log: Vec<(HttpRequest, Instant)>,
}

/// Transport that answers from a script and a route table
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    /// Empty transport: every request gets a 404
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response for the next unscripted request
    pub fn push_status(&self, status: u16, body: impl Into<Vec<u8>>) {
        self.lock().script.push_back(Reply::Status(status, body.into()));
    }

    /// Queue a transport failure for the next unscripted request
    ///
    /// The URL inside `error` is replaced with the URL actually requested.
    pub fn push_failure(&self, error: NetworkError) {
        self.lock().script.push_back(Reply::Failure(error));
    }

    /// Answer every request for `url` with a fixed response
    pub fn route(&self, url: impl Into<String>, status: u16, body: impl Into<Vec<u8>>) {
        self.lock().routes.insert(url.into(), (status, body.into()));
    }

    /// Number of requests received
    pub fn call_count(&self) -> usize {
        self.lock().log.len()
    }

    /// Every request received, in order
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.lock().log.iter().map(|(r, _)| r.clone()).collect()
    }

    /// Arrival time of every request, in order
    pub fn timestamps(&self) -> Vec<Instant> {
        self.lock().log.iter().map(|(_, t)| *t).collect()
    }

    /// Number of requests received for `url`
    pub fn calls_to(&self, url: &str) -> usize {
        self.lock().log.iter().filter(|(r, _)| r.url == url).count()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn with_url(error: NetworkError, url: &str) -> NetworkError {
    let url = url.to_string();
    match error {
        NetworkError::Timeout { .. } => NetworkError::Timeout { url },
        NetworkError::ConnectionFailure { message, .. } => {
            NetworkError::ConnectionFailure { url, message }
        }
        NetworkError::HttpStatusFailure { status, .. } => {
            NetworkError::HttpStatusFailure { url, status }
        }
        NetworkError::GenericTransportFailure { message, .. } => {
            NetworkError::GenericTransportFailure { url, message }
        }
    }
}

impl Transport for MockTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, NetworkError> {
        let mut state = self.lock();
        state.log.push((request.clone(), Instant::now()));

        let reply = match state.script.pop_front() {
            Some(reply) => reply,
            None => match state.routes.get(&request.url) {
                Some((status, body)) => Reply::Status(*status, body.clone()),
                None => Reply::Status(404, b"Not Found".to_vec()),
            },
        };

        match reply {
            Reply::Status(status, body) => Ok(HttpResponse::new(&request.url, status, body)),
            Reply::Failure(error) => Err(with_url(error, &request.url)),
        }
    }
}
