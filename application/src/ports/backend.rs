//! Backend port
//!
//! Defines the single capability the core depends on: "generate text from a
//! prompt". Concrete backends (HTTP providers, the echo backend, test mocks)
//! live outside this crate.

use async_trait::async_trait;
use moa_domain::{AgentConfig, Completion, GenerationRequest, StreamEvent};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Errors reported by a backend.
///
/// Backends must keep credential/configuration problems distinguishable from
/// transient ones: the Retry Executor relies on [`BackendError::class`] to
/// decide whether another attempt is worthwhile.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BackendError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Timeout")]
    Timeout,

    #[error("Rate limited")]
    RateLimited { retry_after: Option<Duration> },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    #[error("Empty response")]
    EmptyResponse,

    #[error("Cancelled")]
    Cancelled,

    #[error("Other error: {0}")]
    Other(String),
}

/// Retry classification of a [`BackendError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Retrying cannot help (credentials, configuration, malformed request)
    Fatal,
    /// Another attempt may succeed
    Transient,
    /// The caller gave up; stop immediately
    Cancelled,
}

impl BackendError {
    pub fn class(&self) -> ErrorClass {
        match self {
            BackendError::Unauthorized(_)
            | BackendError::InvalidConfig(_)
            | BackendError::InvalidRequest(_) => ErrorClass::Fatal,
            BackendError::Cancelled => ErrorClass::Cancelled,
            BackendError::Timeout
            | BackendError::RateLimited { .. }
            | BackendError::Transport(_)
            | BackendError::Unavailable(_)
            | BackendError::EmptyResponse
            | BackendError::Other(_) => ErrorClass::Transient,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.class() == ErrorClass::Transient
    }
}

/// Handle for receiving streaming events from a backend.
pub struct StreamHandle {
    pub receiver: mpsc::Receiver<StreamEvent>,
}

impl StreamHandle {
    pub fn new(receiver: mpsc::Receiver<StreamEvent>) -> Self {
        Self { receiver }
    }

    /// Consume the stream and collect all text into a single string.
    pub async fn collect_text(mut self) -> Result<String, BackendError> {
        let mut full_text = String::new();
        while let Some(event) = self.receiver.recv().await {
            match event {
                StreamEvent::Delta(chunk) => full_text.push_str(&chunk),
                StreamEvent::Completed(text) => {
                    if full_text.is_empty() {
                        return Ok(text);
                    }
                    return Ok(full_text);
                }
                StreamEvent::Error(e) => return Err(BackendError::Other(e)),
            }
        }
        // Channel closed without Completed; return what we have
        Ok(full_text)
    }
}

/// Optional capability: the backend's endpoint can be redirected.
///
/// Discovered through [`Backend::as_endpoint_override_mut`]; never assumed.
pub trait EndpointOverride {
    /// The base URL currently in use.
    fn endpoint(&self) -> &str;

    /// Point the backend at another base URL.
    fn set_endpoint(&mut self, url: &str) -> Result<(), BackendError>;
}

/// A generative-text backend bound to one model.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Short name used in logs (e.g. `openai/gpt-4o-mini`).
    fn name(&self) -> &str;

    /// Generate a completion for the request.
    ///
    /// Implementations should stop promptly once `cancel` fires and return
    /// [`BackendError::Cancelled`].
    async fn generate(
        &self,
        request: &GenerationRequest,
        cancel: &CancellationToken,
    ) -> Result<Completion, BackendError>;

    /// Generate a completion as a stream of events.
    ///
    /// Default implementation calls `generate()` and wraps the result in a
    /// single `Completed` event.
    async fn stream(
        &self,
        request: &GenerationRequest,
        cancel: &CancellationToken,
    ) -> Result<StreamHandle, BackendError> {
        let completion = self.generate(request, cancel).await?;
        let (tx, rx) = mpsc::channel(1);
        // Receiver may already be gone; nothing to do in that case
        let _ = tx.send(StreamEvent::Completed(completion.text)).await;
        Ok(StreamHandle::new(rx))
    }

    /// Capability query for endpoint overriding.
    fn as_endpoint_override_mut(&mut self) -> Option<&mut dyn EndpointOverride> {
        None
    }
}

/// Builds a ready-to-call backend for an agent configuration.
///
/// Called once per agent when an orchestrator is constructed; failures there
/// are configuration errors, reported before any generation happens.
pub trait BackendFactory: Send + Sync {
    fn create(&self, config: &AgentConfig) -> Result<Arc<dyn Backend>, BackendError>;
}
