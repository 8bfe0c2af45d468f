//! Domain error types

use thiserror::Error;

/// Configuration errors detected while building agents or the MOA.
///
/// These are always fatal and surface before any backend call is made.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("MOA requires at least one agent")]
    NoAgents,

    #[error("Iteration count must be at least 1 (got {0})")]
    InvalidIterations(usize),

    #[error("Max parallelism must be at least 1 (got {0})")]
    InvalidParallelism(usize),

    #[error("Retry policy must allow at least 1 attempt")]
    InvalidMaxAttempts,

    #[error("Backoff multiplier must be >= 1.0 (got {0})")]
    InvalidBackoff(f64),

    #[error("Timeout for {0} must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error("Aggregator agent is not configured")]
    MissingAggregator,

    #[error("Agent '{agent}': provider is not set")]
    MissingProvider { agent: String },

    #[error("Agent '{agent}': model name cannot be empty")]
    EmptyModel { agent: String },

    #[error("Agent '{agent}': temperature {value} is outside 0.0..=2.0")]
    InvalidTemperature { agent: String, value: f32 },

    #[error("Agent '{agent}': max_tokens must be at least 1")]
    InvalidMaxTokens { agent: String },

    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    #[error("Invalid agent spec '{0}' (expected provider/model)")]
    InvalidAgentSpec(String),
}
