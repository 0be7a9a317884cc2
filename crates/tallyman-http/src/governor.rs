//! Request governor
//!
//! Enforces a minimum interval between consecutive outbound requests. The
//! check-sleep-record sequence runs under one lock, so callers on any number
//! of threads are serialized into a schedule whose gaps never drop below
//! `1 / rate`.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::config::{rate_limit_from_env, DEFAULT_RATE_LIMIT};
use crate::ConfigurationError;

/// Mutable governor state, only touched under the lock
#[derive(Debug)]
struct RateState {
    min_interval: Duration,
    last_call: Option<Instant>,
}

/// Outcome of one admission through the governor
#[derive(Debug, Clone, Copy)]
pub struct Grant {
    /// Time spent sleeping before admission
    pub waited: Duration,
    /// Timestamp recorded for this admission
    pub granted_at: Instant,
}

/// Process-wide request rate limiter
#[derive(Debug)]
pub struct RequestGovernor {
    rate: f64,
    state: Mutex<RateState>,
}

impl RequestGovernor {
    /// Create a governor admitting at most `max_calls_per_second` requests
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::InvalidRate` if the rate is not a
    /// positive finite number.
    pub fn new(max_calls_per_second: f64) -> Result<Self, ConfigurationError> {
        if !max_calls_per_second.is_finite() || max_calls_per_second <= 0.0 {
            return Err(ConfigurationError::InvalidRate(max_calls_per_second));
        }
        Ok(Self::with_valid_rate(max_calls_per_second))
    }

    fn with_valid_rate(rate: f64) -> Self {
        Self {
            rate,
            state: Mutex::new(RateState {
                min_interval: Duration::from_secs_f64(1.0 / rate),
                last_call: None,
            }),
        }
    }

    /// Configured ceiling in requests per second
    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Minimum gap enforced between consecutive admissions
    pub fn min_interval(&self) -> Duration {
        self.lock_state().min_interval
    }

    /// Block until a request may be sent, returning how long we slept
    pub fn wait_if_needed(&self) -> Duration {
        self.acquire().waited
    }

    /// Block until a request may be sent and record the admission
    pub fn acquire(&self) -> Grant {
        let mut state = self.lock_state();

        let mut waited = Duration::ZERO;
        if let Some(last) = state.last_call {
            let elapsed = last.elapsed();
            if elapsed < state.min_interval {
                waited = state.min_interval - elapsed;
                debug!(wait_ms = waited.as_millis() as u64, "Rate limit reached, sleeping");
                // Sleep while holding the lock so later callers queue behind us
                thread::sleep(waited);
            }
        }

        let granted_at = Instant::now();
        state.last_call = Some(granted_at);
        Grant { waited, granted_at }
    }

    /// Forget the last admission
    pub fn reset(&self) {
        self.lock_state().last_call = None;
    }

    fn lock_state(&self) -> MutexGuard<'_, RateState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

static SHARED: Mutex<Option<Arc<RequestGovernor>>> = Mutex::new(None);

/// The single process-wide governor, built on first use
///
/// The rate is read from `SEC_EDGAR_RATE_LIMIT` when the governor is first
/// constructed. Concurrent first callers all receive the same instance.
pub fn shared_governor() -> Arc<RequestGovernor> {
    let mut slot = SHARED.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(governor) = slot.as_ref() {
        return Arc::clone(governor);
    }

    let rate = rate_limit_from_env();
    let governor = Arc::new(
        RequestGovernor::new(rate)
            .unwrap_or_else(|_| RequestGovernor::with_valid_rate(DEFAULT_RATE_LIMIT)),
    );
    info!(rate = governor.rate(), "Request governor initialized");
    *slot = Some(Arc::clone(&governor));
    governor
}

/// Drop the shared governor so the next call re-reads the environment
pub fn reset_shared_governor() {
    let mut slot = SHARED.lock().unwrap_or_else(PoisonError::into_inner);
    *slot = None;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_invalid_rates() {
        assert!(matches!(
            RequestGovernor::new(0.0),
            Err(ConfigurationError::InvalidRate(_))
        ));
        assert!(RequestGovernor::new(-1.0).is_err());
        assert!(RequestGovernor::new(f64::NAN).is_err());
        assert!(RequestGovernor::new(f64::INFINITY).is_err());
    }

    #[test]
    fn test_min_interval() {
        let governor = RequestGovernor::new(8.0).unwrap();
        assert_eq!(governor.min_interval(), Duration::from_millis(125));
        assert_eq!(governor.rate(), 8.0);
    }

    #[test]
    fn test_first_call_does_not_wait() {
        let governor = RequestGovernor::new(2.0).unwrap();
        assert_eq!(governor.wait_if_needed(), Duration::ZERO);
    }

    #[test]
    fn test_back_to_back_gaps() {
        let governor = RequestGovernor::new(10.0).unwrap();
        let min = governor.min_interval();

        let grants: Vec<Grant> = (0..5).map(|_| governor.acquire()).collect();
        for pair in grants.windows(2) {
            assert!(pair[1].granted_at - pair[0].granted_at >= min);
        }
        assert!(grants[1..].iter().all(|g| g.waited > Duration::ZERO));
    }

    #[test]
    fn test_three_calls_at_two_per_second_span_a_second() {
        let governor = RequestGovernor::new(2.0).unwrap();

        let first = governor.acquire();
        governor.acquire();
        let third = governor.acquire();

        assert_eq!(first.waited, Duration::ZERO);
        assert!(third.granted_at - first.granted_at >= Duration::from_secs(1));
    }

    #[test]
    fn test_concurrent_callers_are_serialized() {
        let governor = Arc::new(RequestGovernor::new(20.0).unwrap());
        let min = governor.min_interval();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let governor = Arc::clone(&governor);
                thread::spawn(move || governor.acquire().granted_at)
            })
            .collect();

        let mut stamps: Vec<Instant> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        stamps.sort();
        for pair in stamps.windows(2) {
            assert!(pair[1] - pair[0] >= min);
        }
    }

    #[test]
    fn test_reset_clears_last_call() {
        let governor = RequestGovernor::new(1.0).unwrap();
        governor.acquire();
        governor.reset();
        assert_eq!(governor.wait_if_needed(), Duration::ZERO);
    }

    #[test]
    fn test_shared_governor_is_single_instance() {
        let handles: Vec<_> = (0..4).map(|_| thread::spawn(shared_governor)).collect();
        let governors: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        for g in &governors[1..] {
            assert!(Arc::ptr_eq(&governors[0], g));
        }
    }
}
