//! Configuration file loading for moa
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `MOA_`-prefixed environment variables (`MOA_MOA__ITERATIONS=3`)
//! 2. `--config <path>` specified file
//! 3. Project root: `./moa.toml` or `./.moa.toml`
//! 4. Global: `$XDG_CONFIG_HOME/moa/config.toml` (or the platform equivalent)
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    FileAgentEntry, FileAnthropicConfig, FileConfig, FileConfigError, FileLoggingConfig,
    FileMoaConfig, FileOllamaConfig, FileOpenAiConfig, FileOutputConfig, FileProvidersConfig,
    FileRetryConfig,
};
pub use loader::{ConfigLoader, ConfigSource};
