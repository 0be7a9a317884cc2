//! Retry policy

use std::time::Duration;

use crate::transport::Method;
use crate::ConfigurationError;

/// Default number of attempts per request (first try included)
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default base delay for exponential backoff
pub const DEFAULT_BACKOFF_BASE: Duration = Duration::from_secs(1);

/// Statuses that are worth another attempt
pub const DEFAULT_RETRYABLE_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

/// Bounded retry schedule for idempotent requests
///
/// Fields are fixed at construction; only read accessors are exposed.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff_base: Duration,
    retryable_statuses: Vec<u16>,
    retryable_methods: Vec<Method>,
}

impl RetryPolicy {
    /// Policy with the default status and method sets
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::InvalidPolicy` if `max_attempts` is zero.
    pub fn new(max_attempts: u32, backoff_base: Duration) -> Result<Self, ConfigurationError> {
        if max_attempts == 0 {
            return Err(ConfigurationError::InvalidPolicy(
                "max_attempts must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            max_attempts,
            backoff_base,
            retryable_statuses: DEFAULT_RETRYABLE_STATUSES.to_vec(),
            retryable_methods: vec![Method::Get, Method::Head],
        })
    }

    /// Replace the retryable status set
    pub fn with_statuses(mut self, statuses: &[u16]) -> Self {
        self.retryable_statuses = statuses.to_vec();
        self
    }

    /// Replace the retryable method set
    pub fn with_methods(mut self, methods: &[Method]) -> Self {
        self.retryable_methods = methods.to_vec();
        self
    }

    /// A policy that never retries
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Total attempts, first try included
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Base backoff delay
    pub fn backoff_base(&self) -> Duration {
        self.backoff_base
    }

    /// Statuses that trigger a retry
    pub fn retryable_statuses(&self) -> &[u16] {
        &self.retryable_statuses
    }

    /// Methods that may be retried
    pub fn retryable_methods(&self) -> &[Method] {
        &self.retryable_methods
    }

    /// Whether `method` may be retried at all
    pub fn is_retryable_method(&self, method: Method) -> bool {
        self.retryable_methods.contains(&method)
    }

    /// Whether a response with `status` to `method` should be retried
    pub fn should_retry_status(&self, method: Method, status: u16) -> bool {
        self.is_retryable_method(method) && self.retryable_statuses.contains(&status)
    }

    /// Delay before the attempt following `attempt` (1-based)
    ///
    /// `backoff_base * 2^(attempt - 1)`, saturating on overflow.
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(31);
        self.backoff_base.saturating_mul(1u32 << exp)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff_base: DEFAULT_BACKOFF_BASE,
            retryable_statuses: DEFAULT_RETRYABLE_STATUSES.to_vec(),
            retryable_methods: vec![Method::Get, Method::Head],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts(), 3);
        assert_eq!(policy.backoff_base(), Duration::from_secs(1));
        assert_eq!(policy.retryable_statuses(), &[429, 500, 502, 503, 504]);
        assert_eq!(policy.retryable_methods(), &[Method::Get, Method::Head]);
    }

    #[test]
    fn test_zero_attempts_rejected() {
        assert!(matches!(
            RetryPolicy::new(0, Duration::from_secs(1)),
            Err(ConfigurationError::InvalidPolicy(_))
        ));
    }

    #[test]
    fn test_backoff_doubles() {
        let policy = RetryPolicy::new(5, Duration::from_millis(100)).unwrap();
        assert_eq!(policy.backoff_for(1), Duration::from_millis(100));
        assert_eq!(policy.backoff_for(2), Duration::from_millis(200));
        assert_eq!(policy.backoff_for(3), Duration::from_millis(400));
        assert_eq!(policy.backoff_for(64), Duration::from_millis(100).saturating_mul(1 << 31));
    }

    #[test]
    fn test_status_and_method_rules() {
        let policy = RetryPolicy::default();
        assert!(policy.should_retry_status(Method::Get, 503));
        assert!(policy.should_retry_status(Method::Head, 429));
        assert!(!policy.should_retry_status(Method::Get, 404));
        assert!(!policy.should_retry_status(Method::Post, 503));

        let strict = RetryPolicy::default().with_statuses(&[503]);
        assert!(!strict.should_retry_status(Method::Get, 429));
    }
}
