//! # Circuit Breaker Module
//!
//! Circuit breaker guarding remote embedding calls. After a run of consecutive
//! failures it rejects requests outright until a cool-down elapses, so a dead
//! embedding endpoint fails requests fast instead of stacking retries.

use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::config::RecoveryConfig;

#[derive(Debug, Default)]
struct BreakerState {
    failure_count: u32,
    last_failure: Option<Instant>,
}

/// Circuit breaker for embedding provider calls
///
/// ```text
/// CLOSED ──failures >= threshold──► OPEN ──reset timeout──► CLOSED (test request)
/// ```
///
/// A success at any point resets the failure count.
#[derive(Debug)]
pub struct CircuitBreaker {
    state: Mutex<BreakerState>,
    threshold: u32,
    reset_after: Duration,
}

impl CircuitBreaker {
    /// Create a new circuit breaker from the recovery configuration
    ///
    /// ```rust
    /// use pantry_match::circuit_breaker::CircuitBreaker;
    /// use pantry_match::config::RecoveryConfig;
    ///
    /// let breaker = CircuitBreaker::new(&RecoveryConfig::default());
    /// assert!(!breaker.is_open());
    /// ```
    pub fn new(config: &RecoveryConfig) -> Self {
        Self {
            state: Mutex::new(BreakerState::default()),
            threshold: config.circuit_breaker_threshold,
            reset_after: Duration::from_secs(config.circuit_breaker_reset_secs),
        }
    }

    /// Whether requests should currently be rejected
    ///
    /// Resets to closed once the cool-down has elapsed since the last failure.
    pub fn is_open(&self) -> bool {
        let mut state = self.state.lock();
        if state.failure_count < self.threshold {
            return false;
        }

        match state.last_failure {
            Some(last) if last.elapsed() < self.reset_after => true,
            _ => {
                *state = BreakerState::default();
                crate::observability::update_circuit_breaker_state(false);
                false
            }
        }
    }

    /// Record a failed call
    pub fn record_failure(&self) {
        let mut state = self.state.lock();
        state.failure_count += 1;
        state.last_failure = Some(Instant::now());
        if state.failure_count == self.threshold {
            tracing::warn!(
                failures = state.failure_count,
                reset_after_secs = self.reset_after.as_secs(),
                "Embedding circuit breaker opened"
            );
            crate::observability::update_circuit_breaker_state(true);
        }
    }

    /// Record a successful call
    pub fn record_success(&self) {
        let mut state = self.state.lock();
        if state.failure_count > 0 {
            *state = BreakerState::default();
            crate::observability::update_circuit_breaker_state(false);
        }
    }

    /// Current consecutive failure count
    pub fn failure_count(&self) -> u32 {
        self.state.lock().failure_count
    }
}
