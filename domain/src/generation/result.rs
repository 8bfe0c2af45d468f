//! Generation result types.
//!
//! A backend call yields a [`Completion`]; the Retry Executor wraps it into a
//! [`Generation`] that also records how many attempts it took. Per-agent
//! outcomes in a round are [`GenerationResult`]s: exactly one of success or
//! failure.

use serde::{Deserialize, Serialize};

/// Token usage reported by a backend, when it reports any.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl Usage {
    pub fn total(&self) -> u32 {
        self.prompt_tokens.saturating_add(self.completion_tokens)
    }
}

/// Raw output of one successful backend call.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub text: String,
    pub usage: Option<Usage>,
}

impl Completion {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            usage: None,
        }
    }

    pub fn with_usage(mut self, usage: Usage) -> Self {
        self.usage = Some(usage);
        self
    }
}

/// A successful generation after retries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Generation {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
    pub attempts: u32,
}

impl Generation {
    pub fn from_completion(completion: Completion, attempts: u32) -> Self {
        Self {
            text: completion.text,
            usage: completion.usage,
            attempts,
        }
    }
}

/// Why an agent's generation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Non-retryable error (credentials, configuration, malformed request)
    Fatal,
    /// Transient errors until `max_attempts` was used up
    RetriesExhausted,
    /// The retry policy's overall deadline ran out
    DeadlineExceeded,
    /// The per-agent timeout fired
    TimedOut,
    /// The caller cancelled
    Cancelled,
    /// The call panicked or its worker was aborted
    Crashed,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Fatal => "fatal",
            FailureKind::RetriesExhausted => "retries exhausted",
            FailureKind::DeadlineExceeded => "deadline exceeded",
            FailureKind::TimedOut => "timed out",
            FailureKind::Cancelled => "cancelled",
            FailureKind::Crashed => "crashed",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed generation with its classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationFailure {
    pub kind: FailureKind,
    pub message: String,
    pub attempts: u32,
}

impl GenerationFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>, attempts: u32) -> Self {
        Self {
            kind,
            message: message.into(),
            attempts,
        }
    }
}

/// Outcome of one agent's call: exactly one of success or failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum GenerationResult {
    Success(Generation),
    Failure(GenerationFailure),
}

impl GenerationResult {
    pub fn is_success(&self) -> bool {
        matches!(self, GenerationResult::Success(_))
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            GenerationResult::Success(g) => Some(&g.text),
            GenerationResult::Failure(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&GenerationFailure> {
        match self {
            GenerationResult::Success(_) => None,
            GenerationResult::Failure(f) => Some(f),
        }
    }

    pub fn attempts(&self) -> u32 {
        match self {
            GenerationResult::Success(g) => g.attempts,
            GenerationResult::Failure(f) => f.attempts,
        }
    }
}
