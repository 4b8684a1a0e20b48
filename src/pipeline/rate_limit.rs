//! Adaptive delay between catalog calls
//!
//! The delay halves after a run of consecutive successes and doubles after a
//! run of consecutive failures, always staying within `[min_delay, max_delay]`.
//! One limiter is shared by all workers of a pipeline.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::sleep;
use tracing::debug;

use crate::config::RateLimitConfig;

#[derive(Debug)]
struct LimiterState {
    delay: Duration,
    successes: u32,
    failures: u32,
}

#[derive(Debug)]
pub struct AdaptiveRateLimiter {
    state: Mutex<LimiterState>,
    min_delay: Duration,
    max_delay: Duration,
    step: Duration,
    success_streak: u32,
    failure_streak: u32,
}

impl AdaptiveRateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        let min_delay = Duration::from_millis(config.min_delay_ms);
        let max_delay = Duration::from_millis(config.max_delay_ms).max(min_delay);

        Self {
            state: Mutex::new(LimiterState {
                delay: min_delay,
                successes: 0,
                failures: 0,
            }),
            min_delay,
            max_delay,
            step: Duration::from_millis(config.step_ms.max(1)),
            success_streak: config.success_streak.max(1),
            failure_streak: config.failure_streak.max(1),
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, LimiterState> {
        // State is two counters and a duration; a panic mid-update leaves it usable
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn current_delay(&self) -> Duration {
        self.lock_state().delay
    }

    /// Wait for the current delay before issuing a catalog call
    pub async fn acquire(&self) {
        let delay = self.current_delay();
        if !delay.is_zero() {
            sleep(delay).await;
        }
    }

    pub fn record_success(&self) {
        let mut state = self.lock_state();
        state.failures = 0;
        state.successes += 1;

        if state.successes >= self.success_streak {
            state.successes = 0;
            let lowered = state.delay / 2;
            state.delay = if lowered < self.step {
                self.min_delay
            } else {
                lowered.clamp(self.min_delay, self.max_delay)
            };
            debug!("Rate limiter lowered delay to {:?}", state.delay);
        }
    }

    pub fn record_failure(&self) {
        let mut state = self.lock_state();
        state.successes = 0;
        state.failures += 1;

        if state.failures >= self.failure_streak {
            state.failures = 0;
            let raised = if state.delay.is_zero() {
                self.step.max(self.min_delay)
            } else {
                state.delay.saturating_mul(2)
            };
            state.delay = raised.clamp(self.min_delay, self.max_delay);
            debug!("Rate limiter raised delay to {:?}", state.delay);
        }
    }
}

impl Default for AdaptiveRateLimiter {
    fn default() -> Self {
        Self::new(&RateLimitConfig::default())
    }
}
