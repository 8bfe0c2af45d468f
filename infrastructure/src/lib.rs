//! Infrastructure layer for moa
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer: provider backends, the JSONL run logger, and
//! configuration file loading.

pub mod config;
pub mod logging;
pub mod providers;

// Re-export commonly used types
pub use config::{
    ConfigLoader, ConfigSource, FileAgentEntry, FileConfig, FileConfigError, FileLoggingConfig,
    FileMoaConfig, FileOutputConfig, FileProvidersConfig, FileRetryConfig,
};
pub use logging::JsonlRunLogger;
pub use providers::{AnthropicBackend, EchoBackend, OpenAiBackend, ProviderRegistry};
