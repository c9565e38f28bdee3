//! # Circuit Breaker Module
//!
//! This module implements the circuit breaker pattern for extraction service
//! calls. After repeated failures the breaker opens and the extractor goes
//! straight to the legacy parser instead of waiting on a dead service.

use log::{info, warn};
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::config::RecoveryConfig;

#[derive(Debug, Default)]
struct BreakerState {
    failure_count: u32,
    last_failure_time: Option<Instant>,
}

/// Circuit breaker for extraction service calls
///
/// # State Machine
///
/// - **Closed**: Normal operation, requests pass through
/// - **Open**: Failure threshold exceeded, requests fail fast
/// - **Half-Open**: Reset window elapsed, the next request tries the service again
///
/// # Configuration
///
/// Uses `RecoveryConfig` for:
/// - `circuit_breaker_threshold`: Failures before opening (default: 5)
/// - `circuit_breaker_reset_secs`: Time before attempting reset (default: 60s)
#[derive(Debug)]
pub struct CircuitBreaker {
    state: Mutex<BreakerState>,
    config: RecoveryConfig,
}

impl CircuitBreaker {
    /// Create a new circuit breaker with the given configuration
    ///
    /// # Examples
    ///
    /// ```rust
    /// use nutrition_engine::config::RecoveryConfig;
    /// use nutrition_engine::circuit_breaker::CircuitBreaker;
    ///
    /// let circuit_breaker = CircuitBreaker::new(RecoveryConfig::default());
    /// assert!(!circuit_breaker.is_open());
    /// ```
    pub fn new(config: RecoveryConfig) -> Self {
        Self {
            state: Mutex::new(BreakerState::default()),
            config,
        }
    }

    fn lock(&self) -> MutexGuard<'_, BreakerState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Check if the circuit breaker is open (blocking requests)
    ///
    /// Returns `true` while the failure count is at or above the threshold
    /// and the reset window has not elapsed. Once it elapses the breaker
    /// closes again and the next request goes through.
    pub fn is_open(&self) -> bool {
        let mut state = self.lock();

        if state.failure_count >= self.config.circuit_breaker_threshold {
            if let Some(last_time) = state.last_failure_time {
                let reset_after = Duration::from_secs(self.config.circuit_breaker_reset_secs);
                if last_time.elapsed() < reset_after {
                    return true;
                }
                info!(
                    "Circuit breaker reset after {}s, retrying extraction service",
                    self.config.circuit_breaker_reset_secs
                );
                *state = BreakerState::default();
            }
        }
        false
    }

    /// Record a failed service call
    pub fn record_failure(&self) {
        let mut state = self.lock();
        state.failure_count += 1;
        state.last_failure_time = Some(Instant::now());

        if state.failure_count == self.config.circuit_breaker_threshold {
            warn!(
                "Circuit breaker opened after {} consecutive extraction failures",
                state.failure_count
            );
        }
    }

    /// Record a successful service call, closing the breaker
    pub fn record_success(&self) {
        *self.lock() = BreakerState::default();
    }

    /// Current consecutive failure count
    pub fn failure_count(&self) -> u32 {
        self.lock().failure_count
    }
}
