use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default number of attempts per fetch cycle.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
/// Default delay before the first retry (milliseconds).
pub const DEFAULT_BASE_DELAY_MS: u64 = 1_000;
/// Default upper bound on any single backoff delay (milliseconds).
pub const DEFAULT_MAX_DELAY_MS: u64 = 30_000;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RetryBudgetError {
    #[error("max_attempts must be at least 1")]
    ZeroAttempts,

    #[error("max_delay_ms ({max_delay_ms}) is smaller than base_delay_ms ({base_delay_ms})")]
    CapBelowBase {
        base_delay_ms: u64,
        max_delay_ms: u64,
    },
}

/// Bounds on how often and how patiently a fetch is retried.
///
/// Attempts are numbered from 0. After attempt `i` fails, and only if another
/// attempt remains, the client waits [`delay_for(i)`](Self::delay_for)
/// = `min(base_delay_ms * 2^i, max_delay_ms)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetryBudget {
    /// Total attempts, including the first one. At least 1.
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryBudget {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay_ms: DEFAULT_BASE_DELAY_MS,
            max_delay_ms: DEFAULT_MAX_DELAY_MS,
        }
    }
}

impl RetryBudget {
    /// Creates a validated budget.
    pub fn new(
        max_attempts: u32,
        base_delay_ms: u64,
        max_delay_ms: u64,
    ) -> Result<Self, RetryBudgetError> {
        let budget = Self {
            max_attempts,
            base_delay_ms,
            max_delay_ms,
        };
        budget.validate()?;
        Ok(budget)
    }

    pub fn validate(&self) -> Result<(), RetryBudgetError> {
        if self.max_attempts == 0 {
            return Err(RetryBudgetError::ZeroAttempts);
        }
        if self.max_delay_ms < self.base_delay_ms {
            return Err(RetryBudgetError::CapBelowBase {
                base_delay_ms: self.base_delay_ms,
                max_delay_ms: self.max_delay_ms,
            });
        }
        Ok(())
    }

    /// Whether a failed `attempt` is followed by another one.
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt.saturating_add(1) < self.max_attempts
    }

    /// Backoff to wait after `attempt` fails, capped at `max_delay_ms`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let multiplier = 2u64.saturating_pow(attempt);
        let delay_ms = self.base_delay_ms.saturating_mul(multiplier);
        Duration::from_millis(delay_ms.min(self.max_delay_ms))
    }

    /// Sum of every backoff delay a fully failing cycle sleeps through.
    pub fn total_backoff(&self) -> Duration {
        let gaps = self.max_attempts.saturating_sub(1);
        let mut total = Duration::ZERO;
        for attempt in 0..gaps {
            let delay = self.delay_for(attempt);
            if delay >= Duration::from_millis(self.max_delay_ms) {
                // Every remaining gap is capped.
                return total.saturating_add(delay.saturating_mul(gaps - attempt));
            }
            total += delay;
        }
        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delays_double_until_capped() {
        let budget = RetryBudget::new(10, 100, 1_000).unwrap();
        let delays: Vec<u64> = (0..6)
            .map(|i| budget.delay_for(i).as_millis() as u64)
            .collect();
        assert_eq!(delays, vec![100, 200, 400, 800, 1_000, 1_000]);
    }

    #[test]
    fn huge_attempt_numbers_saturate_at_the_cap() {
        let budget = RetryBudget::new(u32::MAX, 1_000, 30_000).unwrap();
        assert_eq!(budget.delay_for(63), Duration::from_millis(30_000));
        assert_eq!(budget.delay_for(200), Duration::from_millis(30_000));
    }

    #[test]
    fn retries_stop_before_the_last_attempt() {
        let budget = RetryBudget::new(3, 10, 100).unwrap();
        assert!(budget.should_retry(0));
        assert!(budget.should_retry(1));
        assert!(!budget.should_retry(2));

        let single = RetryBudget::new(1, 10, 100).unwrap();
        assert!(!single.should_retry(0));
    }

    #[test]
    fn total_backoff_sums_delays_between_attempts() {
        let budget = RetryBudget::default();
        // 1s after attempt 0, 2s after attempt 1, nothing after the last.
        assert_eq!(budget.total_backoff(), Duration::from_millis(3_000));
        assert_eq!(
            RetryBudget::new(1, 10, 10).unwrap().total_backoff(),
            Duration::ZERO
        );
        // 100 + 200 + 250 + 250
        assert_eq!(
            RetryBudget::new(5, 100, 250).unwrap().total_backoff(),
            Duration::from_millis(800)
        );
        assert_eq!(
            RetryBudget::new(u32::MAX, 1, 1).unwrap().total_backoff(),
            Duration::from_millis(u64::from(u32::MAX - 1))
        );
    }

    #[test]
    fn rejects_zero_attempts_and_inverted_caps() {
        assert_eq!(
            RetryBudget::new(0, 10, 100),
            Err(RetryBudgetError::ZeroAttempts)
        );
        assert!(matches!(
            RetryBudget::new(3, 500, 100),
            Err(RetryBudgetError::CapBelowBase { .. })
        ));
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let budget: RetryBudget = toml::from_str("max_attempts = 5").unwrap();
        assert_eq!(budget.max_attempts, 5);
        assert_eq!(budget.base_delay_ms, DEFAULT_BASE_DELAY_MS);
        assert_eq!(budget.max_delay_ms, DEFAULT_MAX_DELAY_MS);
    }
}
