//! Backend adapters for each provider family.
//!
//! - [`openai`] - OpenAI chat completions (also used for Ollama)
//! - [`anthropic`] - Anthropic messages API
//! - [`echo`] - offline backend for dry runs
//! - [`registry`] - builds the right backend for an [`AgentConfig`](moa_domain::AgentConfig)

pub mod anthropic;
pub mod echo;
mod http;
pub mod openai;
pub mod registry;

pub use anthropic::AnthropicBackend;
pub use echo::EchoBackend;
pub use openai::OpenAiBackend;
pub use registry::ProviderRegistry;
