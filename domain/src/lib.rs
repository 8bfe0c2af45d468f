//! Domain layer for moa
//!
//! This crate contains the value objects shared by every layer of the
//! Mixture-of-Agents orchestrator. It performs no I/O and has no
//! dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Agents
//!
//! An agent is a named, validated [`AgentConfig`]: a provider, a model, the
//! generation parameters it sends, and the [`RetryPolicy`] its calls run
//! under. Agents are plain values; they share no mutable state.
//!
//! ## Rounds
//!
//! A round sends the same input to every agent in parallel. Its
//! [`RoundResult`] keeps each agent's [`GenerationResult`] keyed by
//! [`AgentId`], failures included.
//!
//! ## Aggregation
//!
//! After each round the aggregator agent synthesizes the successful answers
//! into one text, which becomes the next round's input or the final answer.

pub mod agent;
pub mod config;
pub mod core;
pub mod generation;
pub mod orchestration;
pub mod prompt;
pub mod retry;

// Re-export commonly used types
pub use agent::{
    config::{AgentConfig, AgentConfigBuilder},
    id::AgentId,
};
pub use config::OutputFormat;
pub use core::{
    error::ConfigError,
    provider::ProviderKind,
    validation::{ConfigIssue, ConfigIssueCode, Severity},
};
pub use generation::{
    request::{GenerationParams, GenerationRequest, ToolDefinition},
    result::{
        Completion, FailureKind, Generation, GenerationFailure, GenerationResult, Usage,
    },
    stream::StreamEvent,
};
pub use orchestration::{
    config::{DEFAULT_AGENT_TIMEOUT, MoaConfig, MoaConfigBuilder},
    entities::{AggregationRecord, MoaRun, Phase},
    round::{AgentOutcome, RoundResult},
};
pub use prompt::PromptTemplate;
pub use retry::{RetryPolicy, RetryPolicyBuilder};
