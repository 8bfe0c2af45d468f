//! Retry Executor use case
//!
//! Runs one logical generation call against a backend under a
//! [`RetryPolicy`]: bounded attempts, exponential backoff, per-attempt and
//! overall timeouts, and immediate exit on cancellation.

use crate::ports::backend::{Backend, BackendError, ErrorClass};
use moa_domain::{Completion, FailureKind, Generation, GenerationRequest, RetryPolicy};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Terminal outcome of a failed logical call.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExecutionError {
    #[error("non-retryable error after {attempts} attempt(s): {source}")]
    Fatal { attempts: u32, source: BackendError },

    #[error("failed after {attempts} attempt(s): {source}")]
    Exhausted { attempts: u32, source: BackendError },

    #[error("deadline exceeded after {attempts} attempt(s)")]
    DeadlineExceeded {
        attempts: u32,
        last: Option<BackendError>,
    },

    #[error("cancelled after {attempts} attempt(s)")]
    Cancelled { attempts: u32 },

    /// The call panicked; raised by callers that isolate panics, never by the
    /// executor itself.
    #[error("panicked after {attempts} attempt(s): {message}")]
    Crashed { attempts: u32, message: String },
}

impl ExecutionError {
    pub fn attempts(&self) -> u32 {
        match self {
            ExecutionError::Fatal { attempts, .. }
            | ExecutionError::Exhausted { attempts, .. }
            | ExecutionError::DeadlineExceeded { attempts, .. }
            | ExecutionError::Cancelled { attempts }
            | ExecutionError::Crashed { attempts, .. } => *attempts,
        }
    }

    pub fn failure_kind(&self) -> FailureKind {
        match self {
            ExecutionError::Fatal { .. } => FailureKind::Fatal,
            ExecutionError::Exhausted { .. } => FailureKind::RetriesExhausted,
            ExecutionError::DeadlineExceeded { .. } => FailureKind::DeadlineExceeded,
            ExecutionError::Cancelled { .. } => FailureKind::Cancelled,
            ExecutionError::Crashed { .. } => FailureKind::Crashed,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, ExecutionError::Cancelled { .. })
    }

    /// The last backend error seen, if any.
    pub fn last_error(&self) -> Option<&BackendError> {
        match self {
            ExecutionError::Fatal { source, .. } | ExecutionError::Exhausted { source, .. } => {
                Some(source)
            }
            ExecutionError::DeadlineExceeded { last, .. } => last.as_ref(),
            ExecutionError::Cancelled { .. } | ExecutionError::Crashed { .. } => None,
        }
    }
}

/// Executes generation calls under a retry policy.
///
/// Holds only the immutable policy, so one executor can serve any number of
/// concurrent calls.
#[derive(Debug, Clone)]
pub struct RetryExecutor {
    policy: RetryPolicy,
}

impl RetryExecutor {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub async fn execute(
        &self,
        backend: &dyn Backend,
        request: &GenerationRequest,
        cancel: &CancellationToken,
    ) -> Result<Generation, ExecutionError> {
        let attempts = AtomicU32::new(0);
        self.execute_counted(backend, request, cancel, &attempts)
            .await
    }

    /// Like [`execute`](Self::execute), but publishes the attempt number to
    /// `attempts` as each attempt starts.
    ///
    /// Lets a caller that abandons the future (an outer timeout) still report
    /// how many attempts were made.
    pub async fn execute_counted(
        &self,
        backend: &dyn Backend,
        request: &GenerationRequest,
        cancel: &CancellationToken,
        attempts: &AtomicU32,
    ) -> Result<Generation, ExecutionError> {
        // A deadline too far out to represent is no deadline at all
        let deadline = self
            .policy
            .deadline()
            .and_then(|d| Instant::now().checked_add(d));
        let max_attempts = self.policy.max_attempts();
        let mut last_error: Option<BackendError> = None;
        let mut attempt: u32 = 0;

        loop {
            if cancel.is_cancelled() {
                return Err(ExecutionError::Cancelled { attempts: attempt });
            }

            let remaining = deadline.map(|d| d.saturating_duration_since(Instant::now()));
            if remaining.is_some_and(|r| r.is_zero()) {
                return Err(ExecutionError::DeadlineExceeded {
                    attempts: attempt,
                    last: last_error,
                });
            }

            attempt += 1;
            attempts.store(attempt, Ordering::SeqCst);
            let budget = match (self.policy.attempt_timeout(), remaining) {
                (Some(t), Some(r)) => Some(t.min(r)),
                (t, r) => t.or(r),
            };

            debug!(
                "{}: attempt {}/{} (budget {:?})",
                backend.name(),
                attempt,
                max_attempts,
                budget
            );

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    return Err(ExecutionError::Cancelled { attempts: attempt });
                }
                outcome = Self::attempt(backend, request, cancel, budget) => outcome,
            };

            let error = match outcome {
                Ok(completion) if !completion.text.trim().is_empty() => {
                    return Ok(Generation::from_completion(completion, attempt));
                }
                Ok(_) => BackendError::EmptyResponse,
                Err(e) => e,
            };

            if !error.is_retryable() {
                if error.class() == ErrorClass::Cancelled {
                    return Err(ExecutionError::Cancelled { attempts: attempt });
                }
                warn!("{}: non-retryable error: {}", backend.name(), error);
                return Err(ExecutionError::Fatal {
                    attempts: attempt,
                    source: error,
                });
            }

            if attempt >= max_attempts {
                warn!(
                    "{}: giving up after {} attempt(s): {}",
                    backend.name(),
                    attempt,
                    error
                );
                return Err(ExecutionError::Exhausted {
                    attempts: attempt,
                    source: error,
                });
            }

            let mut wait = self.policy.delay_after(attempt);
            if let BackendError::RateLimited {
                retry_after: Some(hint),
            } = &error
            {
                wait = wait.max(*hint);
            }

            if let Some(deadline) = deadline
                && wait >= deadline.saturating_duration_since(Instant::now())
            {
                return Err(ExecutionError::DeadlineExceeded {
                    attempts: attempt,
                    last: Some(error),
                });
            }

            warn!(
                "{}: attempt {} failed ({}), retrying in {:?}",
                backend.name(),
                attempt,
                error,
                wait
            );
            last_error = Some(error);

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    return Err(ExecutionError::Cancelled { attempts: attempt });
                }
                _ = tokio::time::sleep(wait) => {}
            }
        }
    }

    async fn attempt(
        backend: &dyn Backend,
        request: &GenerationRequest,
        cancel: &CancellationToken,
        budget: Option<Duration>,
    ) -> Result<Completion, BackendError> {
        match budget {
            Some(limit) => tokio::time::timeout(limit, backend.generate(request, cancel))
                .await
                .unwrap_or(Err(BackendError::Timeout)),
            None => backend.generate(request, cancel).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ScriptedBackend, fast_retry};
    use std::time::Duration;

    fn transient() -> Result<String, BackendError> {
        Err(BackendError::Transport("connection reset".into()))
    }

    #[tokio::test]
    async fn test_succeeds_on_last_allowed_attempt() {
        let k = 4;
        let backend = ScriptedBackend::always("flaky", "done")
            .then((0..k - 1).map(|_| transient()));
        let executor = RetryExecutor::new(fast_retry(k));

        let generation = executor
            .execute(&backend, &GenerationRequest::new("q"), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(generation.text, "done");
        assert_eq!(generation.attempts, k);
        assert_eq!(backend.calls(), k as usize);
    }

    #[tokio::test]
    async fn test_exhausts_with_one_attempt_fewer() {
        let k = 4;
        let backend = ScriptedBackend::always("flaky", "done")
            .then((0..k - 1).map(|_| transient()));
        let executor = RetryExecutor::new(fast_retry(k - 1));

        let err = executor
            .execute(&backend, &GenerationRequest::new("q"), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, ExecutionError::Exhausted { attempts: 3, .. }));
        assert_eq!(err.failure_kind(), FailureKind::RetriesExhausted);
        assert_eq!(backend.calls(), 3);
    }

    #[tokio::test]
    async fn test_fatal_error_is_not_retried() {
        let backend =
            ScriptedBackend::failing("locked", BackendError::Unauthorized("bad key".into()));
        let executor = RetryExecutor::new(fast_retry(5));

        let err = executor
            .execute(&backend, &GenerationRequest::new("q"), &CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(
            err,
            ExecutionError::Fatal {
                attempts: 1,
                source: BackendError::Unauthorized("bad key".into()),
            }
        );
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test]
    async fn test_empty_text_is_retried() {
        let backend = ScriptedBackend::always("blank", "answer").then([Ok("   ".to_string())]);
        let executor = RetryExecutor::new(fast_retry(2));

        let generation = executor
            .execute(&backend, &GenerationRequest::new("q"), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(generation.text, "answer");
        assert_eq!(generation.attempts, 2);
    }

    #[tokio::test]
    async fn test_attempt_timeout_counts_as_transient() {
        let backend = ScriptedBackend::always("slow", "late").with_delay(Duration::from_millis(200));
        let policy = RetryPolicy::builder()
            .max_attempts(2)
            .delay(Duration::from_millis(1))
            .attempt_timeout(Some(Duration::from_millis(20)))
            .build()
            .unwrap();

        let err = RetryExecutor::new(policy)
            .execute(&backend, &GenerationRequest::new("q"), &CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(
            err,
            ExecutionError::Exhausted {
                attempts: 2,
                source: BackendError::Timeout,
            }
        );
    }

    #[tokio::test]
    async fn test_deadline_bounds_all_attempts() {
        let backend = ScriptedBackend::failing("down", BackendError::Unavailable("503".into()));
        let policy = RetryPolicy::builder()
            .max_attempts(100)
            .delay(Duration::from_millis(30))
            .backoff_multiplier(1.0)
            .deadline(Some(Duration::from_millis(100)))
            .build()
            .unwrap();

        let started = std::time::Instant::now();
        let err = RetryExecutor::new(policy)
            .execute(&backend, &GenerationRequest::new("q"), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, ExecutionError::DeadlineExceeded { .. }));
        assert!(err.attempts() < 100);
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_unrepresentable_deadline_means_no_deadline() {
        let backend = ScriptedBackend::always("steady", "fine").then([transient()]);
        let policy = RetryPolicy::builder()
            .max_attempts(2)
            .delay(Duration::from_millis(1))
            .deadline(Some(Duration::from_secs(u64::MAX)))
            .build()
            .unwrap();

        let generation = RetryExecutor::new(policy)
            .execute(&backend, &GenerationRequest::new("q"), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(generation.text, "fine");
        assert_eq!(generation.attempts, 2);
    }

    #[tokio::test]
    async fn test_rate_limit_hint_extends_backoff() {
        let backend = ScriptedBackend::always("limited", "ok").then([Err(
            BackendError::RateLimited {
                retry_after: Some(Duration::from_millis(60)),
            },
        )]);

        let started = std::time::Instant::now();
        let generation = RetryExecutor::new(fast_retry(2))
            .execute(&backend, &GenerationRequest::new("q"), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(generation.attempts, 2);
        assert!(started.elapsed() >= Duration::from_millis(60));
    }

    #[tokio::test]
    async fn test_cancellation_interrupts_backoff() {
        let backend = ScriptedBackend::failing("down", BackendError::Timeout);
        let policy = RetryPolicy::builder()
            .max_attempts(10)
            .delay(Duration::from_secs(30))
            .build()
            .unwrap();
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let started = std::time::Instant::now();
        let err = RetryExecutor::new(policy)
            .execute(&backend, &GenerationRequest::new("q"), &cancel)
            .await
            .unwrap_err();

        assert!(err.is_cancelled());
        assert_eq!(err.attempts(), 1);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_already_cancelled_makes_no_call() {
        let backend = ScriptedBackend::always("idle", "never");
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = RetryExecutor::new(fast_retry(3))
            .execute(&backend, &GenerationRequest::new("q"), &cancel)
            .await
            .unwrap_err();

        assert_eq!(err, ExecutionError::Cancelled { attempts: 0 });
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn test_counted_variant_publishes_attempts() {
        let backend = ScriptedBackend::failing("down", BackendError::Timeout);
        let attempts = AtomicU32::new(0);

        let _ = RetryExecutor::new(fast_retry(3))
            .execute_counted(
                &backend,
                &GenerationRequest::new("q"),
                &CancellationToken::new(),
                &attempts,
            )
            .await;

        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }
}
