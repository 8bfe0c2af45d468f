//! Bounded-retry policy with exponential backoff.

use crate::core::error::ConfigError;
use std::time::Duration;

/// How a single logical generation call is retried.
///
/// Built once through [`RetryPolicy::builder`] and immutable afterwards.
/// Invariants: `max_attempts >= 1`, `backoff_multiplier >= 1.0`, and any
/// configured timeout is non-zero. The overall `deadline`, when set, bounds
/// the sum of all attempts and the waits between them.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: Duration,
    backoff_multiplier: f64,
    max_delay: Duration,
    attempt_timeout: Option<Duration>,
    deadline: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_millis(500),
            backoff_multiplier: 2.0,
            max_delay: Duration::from_secs(10),
            attempt_timeout: Some(Duration::from_secs(60)),
            deadline: None,
        }
    }
}

impl RetryPolicy {
    pub fn builder() -> RetryPolicyBuilder {
        RetryPolicyBuilder {
            policy: Self::default(),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn backoff_multiplier(&self) -> f64 {
        self.backoff_multiplier
    }

    pub fn max_delay(&self) -> Duration {
        self.max_delay
    }

    pub fn attempt_timeout(&self) -> Option<Duration> {
        self.attempt_timeout
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.deadline
    }

    /// Delay to wait after the given (1-based) failed attempt.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let base_ms = self.delay.as_millis() as f64 * self.backoff_multiplier.powi(exponent);
        let capped_ms = base_ms.min(self.max_delay.as_millis() as f64);
        Duration::from_millis(capped_ms as u64)
    }
}

/// Builder for [`RetryPolicy`]; validation happens in [`build`](Self::build).
#[derive(Debug, Clone)]
pub struct RetryPolicyBuilder {
    policy: RetryPolicy,
}

impl RetryPolicyBuilder {
    #[must_use]
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.policy.max_attempts = attempts;
        self
    }

    #[must_use]
    pub fn delay(mut self, delay: Duration) -> Self {
        self.policy.delay = delay;
        self
    }

    #[must_use]
    pub fn backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.policy.backoff_multiplier = multiplier;
        self
    }

    #[must_use]
    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.policy.max_delay = delay;
        self
    }

    #[must_use]
    pub fn attempt_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.policy.attempt_timeout = timeout;
        self
    }

    #[must_use]
    pub fn deadline(mut self, deadline: Option<Duration>) -> Self {
        self.policy.deadline = deadline;
        self
    }

    pub fn build(self) -> Result<RetryPolicy, ConfigError> {
        let policy = self.policy;
        if policy.max_attempts == 0 {
            return Err(ConfigError::InvalidMaxAttempts);
        }
        if policy.backoff_multiplier.is_nan() || policy.backoff_multiplier < 1.0 {
            return Err(ConfigError::InvalidBackoff(policy.backoff_multiplier));
        }
        if policy.attempt_timeout == Some(Duration::ZERO) {
            return Err(ConfigError::ZeroTimeout("attempt_timeout"));
        }
        if policy.deadline == Some(Duration::ZERO) {
            return Err(ConfigError::ZeroTimeout("deadline"));
        }
        Ok(policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts(), 3);
        assert_eq!(policy.delay(), Duration::from_millis(500));
        assert_eq!(policy.attempt_timeout(), Some(Duration::from_secs(60)));
        assert!(policy.deadline().is_none());
    }

    #[test]
    fn test_builder() {
        let policy = RetryPolicy::builder()
            .max_attempts(5)
            .delay(Duration::from_millis(200))
            .max_delay(Duration::from_secs(30))
            .backoff_multiplier(3.0)
            .deadline(Some(Duration::from_secs(90)))
            .build()
            .unwrap();

        assert_eq!(policy.max_attempts(), 5);
        assert_eq!(policy.delay(), Duration::from_millis(200));
        assert_eq!(policy.max_delay(), Duration::from_secs(30));
        assert_eq!(policy.backoff_multiplier(), 3.0);
        assert_eq!(policy.deadline(), Some(Duration::from_secs(90)));
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let err = RetryPolicy::builder().max_attempts(0).build().unwrap_err();
        assert_eq!(err, ConfigError::InvalidMaxAttempts);
    }

    #[test]
    fn test_shrinking_backoff_rejected() {
        let err = RetryPolicy::builder()
            .backoff_multiplier(0.5)
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigError::InvalidBackoff(0.5));
    }

    #[test]
    fn test_zero_timeouts_rejected() {
        assert!(
            RetryPolicy::builder()
                .attempt_timeout(Some(Duration::ZERO))
                .build()
                .is_err()
        );
        assert!(
            RetryPolicy::builder()
                .deadline(Some(Duration::ZERO))
                .build()
                .is_err()
        );
    }

    #[test]
    fn test_delay_after_grows_exponentially() {
        let policy = RetryPolicy::builder()
            .delay(Duration::from_millis(100))
            .backoff_multiplier(2.0)
            .build()
            .unwrap();

        assert_eq!(policy.delay_after(1), Duration::from_millis(100));
        assert_eq!(policy.delay_after(2), Duration::from_millis(200));
        assert_eq!(policy.delay_after(3), Duration::from_millis(400));
    }

    #[test]
    fn test_delay_after_respects_max() {
        let policy = RetryPolicy::builder()
            .delay(Duration::from_secs(1))
            .max_delay(Duration::from_secs(5))
            .backoff_multiplier(10.0)
            .build()
            .unwrap();

        assert_eq!(policy.delay_after(3), Duration::from_secs(5));
    }
}
