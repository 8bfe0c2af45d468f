//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly, checked with [`FileConfig::validate`], and
//! turned into the domain's [`MoaConfig`] by [`FileConfig::to_moa_config`].

mod agents;
mod logging;
mod moa;
mod output;
mod providers;
mod retry;

pub use agents::FileAgentEntry;
pub use logging::FileLoggingConfig;
pub use moa::FileMoaConfig;
pub use output::FileOutputConfig;
pub use providers::{FileAnthropicConfig, FileOllamaConfig, FileOpenAiConfig, FileProvidersConfig};
pub use retry::FileRetryConfig;

use moa_domain::{
    ConfigError, ConfigIssue, ConfigIssueCode, MoaConfig, ProviderKind, Severity,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a file configuration could not become an [`MoaConfig`].
#[derive(Error, Debug)]
pub enum FileConfigError {
    #[error("invalid configuration: {}", summarize(.0))]
    Invalid(Vec<ConfigIssue>),

    #[error(transparent)]
    Build(#[from] ConfigError),
}

fn summarize(issues: &[ConfigIssue]) -> String {
    issues
        .iter()
        .filter(|i| i.severity == Severity::Error)
        .map(|i| i.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Iterations, parallelism and the per-agent timeout
    pub moa: FileMoaConfig,
    /// Retry policy for every agent and the aggregator
    pub retry: FileRetryConfig,
    /// The agents answering each round
    pub agents: Vec<FileAgentEntry>,
    /// The agent synthesizing each round
    pub aggregator: Option<FileAgentEntry>,
    /// Credentials and base URLs per provider
    pub providers: FileProvidersConfig,
    /// Output settings
    pub output: FileOutputConfig,
    /// Diagnostic and run log destinations
    pub logging: FileLoggingConfig,
}

impl FileConfig {
    /// Validate the entire configuration, returning all detected issues.
    ///
    /// Checks, in order: the agent list, each agent entry, the aggregator,
    /// numeric ranges, and credentials for the providers in use.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        if self.agents.is_empty() {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::NoAgents,
                "no agents configured: add [[agents]] entries or pass --agent provider/model",
            ));
        }
        for (i, agent) in self.agents.iter().enumerate() {
            issues.extend(agent.validate(&format!("agents[{i}]")));
        }

        match &self.aggregator {
            Some(aggregator) => issues.extend(aggregator.validate("aggregator")),
            None => issues.push(ConfigIssue::error(
                ConfigIssueCode::MissingAggregator,
                "no aggregator configured: add an [aggregator] section or pass --aggregator provider/model",
            )),
        }

        if self.moa.iterations == 0 {
            issues.push(out_of_range("moa.iterations", "must be at least 1"));
        }
        match self.moa.max_parallel {
            Some(0) => issues.push(out_of_range("moa.max_parallel", "must be at least 1")),
            Some(n) if !self.agents.is_empty() && n > self.agents.len() => {
                issues.push(ConfigIssue::warning(
                    ConfigIssueCode::UnusedField {
                        field: "moa.max_parallel".to_string(),
                    },
                    format!(
                        "moa.max_parallel: {} exceeds the {} configured agent(s); extra slots stay idle",
                        n,
                        self.agents.len()
                    ),
                ));
            }
            _ => {}
        }

        if self.retry.max_attempts == 0 {
            issues.push(out_of_range("retry.max_attempts", "must be at least 1"));
        }
        if self.retry.backoff_multiplier.is_nan() || self.retry.backoff_multiplier < 1.0 {
            issues.push(out_of_range(
                "retry.backoff_multiplier",
                "must be at least 1.0",
            ));
        }
        if self.retry.deadline_secs == Some(0) {
            issues.push(out_of_range("retry.deadline_secs", "must be greater than 0"));
        }

        issues.extend(self.credential_issues());
        issues
    }

    fn credential_issues(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        let entries = self.agents.iter().chain(self.aggregator.iter());

        for kind in ProviderKind::all() {
            if !kind.requires_api_key() {
                continue;
            }
            let needs_shared_key = entries
                .clone()
                .any(|e| e.provider_kind() == Some(kind) && e.api_key.is_none());
            if !needs_shared_key {
                continue;
            }

            let (key, env_var) = match kind {
                ProviderKind::OpenAi => (
                    self.providers.openai.resolve_api_key(),
                    &self.providers.openai.api_key_env,
                ),
                ProviderKind::Anthropic => (
                    self.providers.anthropic.resolve_api_key(),
                    &self.providers.anthropic.api_key_env,
                ),
                ProviderKind::Ollama | ProviderKind::Echo => continue,
            };

            if key.is_none() {
                issues.push(ConfigIssue::error(
                    ConfigIssueCode::MissingCredentials {
                        provider: kind.to_string(),
                    },
                    format!("{kind}: no API key found (set {env_var} or providers.{kind}.api_key)"),
                ));
            }
        }

        issues
    }

    /// Validate and build the domain configuration.
    pub fn to_moa_config(&self) -> Result<MoaConfig, FileConfigError> {
        let issues = self.validate();
        if ConfigIssue::has_errors(&issues) {
            return Err(FileConfigError::Invalid(issues));
        }

        let retry = self.retry.to_policy()?;
        let agents = self
            .agents
            .iter()
            .map(|a| a.to_agent_config(&retry))
            .collect::<Result<Vec<_>, _>>()?;
        let aggregator = self
            .aggregator
            .as_ref()
            .ok_or(ConfigError::MissingAggregator)?
            .to_agent_config(&retry)?;

        let mut builder = MoaConfig::builder()
            .agents(agents)
            .aggregator(aggregator)
            .iterations(self.moa.iterations)
            .agent_timeout(self.moa.agent_timeout());
        if let Some(n) = self.moa.max_parallel {
            builder = builder.max_parallel(n);
        }

        Ok(builder.build()?)
    }
}

fn out_of_range(field: &str, requirement: &str) -> ConfigIssue {
    ConfigIssue::error(
        ConfigIssueCode::OutOfRange {
            field: field.to_string(),
        },
        format!("{field}: {requirement}"),
    )
}
