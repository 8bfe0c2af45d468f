//! Retry settings from TOML (`[retry]` section)

use moa_domain::{ConfigError, RetryPolicy};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Raw `[retry]` section, applied to every agent and the aggregator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileRetryConfig {
    pub max_attempts: u32,
    pub delay_ms: u64,
    pub backoff_multiplier: f64,
    pub max_delay_ms: u64,
    /// Per-attempt timeout in seconds; `0` disables it
    pub attempt_timeout_secs: u64,
    /// Overall deadline for all attempts of one call
    pub deadline_secs: Option<u64>,
}

impl Default for FileRetryConfig {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            max_attempts: policy.max_attempts(),
            delay_ms: policy.delay().as_millis() as u64,
            backoff_multiplier: policy.backoff_multiplier(),
            max_delay_ms: policy.max_delay().as_millis() as u64,
            attempt_timeout_secs: policy.attempt_timeout().map_or(0, |t| t.as_secs()),
            deadline_secs: None,
        }
    }
}

impl FileRetryConfig {
    pub fn to_policy(&self) -> Result<RetryPolicy, ConfigError> {
        RetryPolicy::builder()
            .max_attempts(self.max_attempts)
            .delay(Duration::from_millis(self.delay_ms))
            .backoff_multiplier(self.backoff_multiplier)
            .max_delay(Duration::from_millis(self.max_delay_ms))
            .attempt_timeout(
                (self.attempt_timeout_secs > 0)
                    .then(|| Duration::from_secs(self.attempt_timeout_secs)),
            )
            .deadline(self.deadline_secs.map(Duration::from_secs))
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_domain_policy() {
        let policy = FileRetryConfig::default().to_policy().unwrap();
        assert_eq!(policy, RetryPolicy::default());
    }

    #[test]
    fn test_zero_deadline_is_rejected() {
        let config = FileRetryConfig {
            deadline_secs: Some(0),
            ..Default::default()
        };
        assert!(matches!(
            config.to_policy(),
            Err(ConfigError::ZeroTimeout(_))
        ));
    }
}
