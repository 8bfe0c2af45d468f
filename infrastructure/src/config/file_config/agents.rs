//! Agent entries from TOML (`[[agents]]` and `[aggregator]`)

use moa_domain::{
    AgentConfig, ConfigError, ConfigIssue, ConfigIssueCode, ProviderKind, RetryPolicy,
};
use serde::{Deserialize, Serialize};

/// One raw agent entry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileAgentEntry {
    /// Display name (default: `provider/model`)
    pub name: Option<String>,
    /// Provider name: "openai", "anthropic", "ollama", "echo"
    pub provider: String,
    pub model: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub system_prompt: Option<String>,
    /// Base URL override for this agent only
    pub endpoint: Option<String>,
    /// Direct API key (not recommended — use the provider's env var instead)
    pub api_key: Option<String>,
}

impl FileAgentEntry {
    /// Parse `provider/model` shorthand as given on the command line.
    ///
    /// Unknown provider names are kept as-is and reported by
    /// [`validate`](Self::validate).
    pub fn from_spec(spec: &str) -> Result<Self, ConfigError> {
        let (provider, model) = spec
            .split_once('/')
            .ok_or_else(|| ConfigError::InvalidAgentSpec(spec.to_string()))?;
        Ok(Self {
            provider: provider.trim().to_string(),
            model: model.trim().to_string(),
            ..Default::default()
        })
    }

    pub fn provider_kind(&self) -> Option<ProviderKind> {
        self.provider.parse().ok()
    }

    /// Check this entry; `field` is its path in the config (e.g. `agents[1]`).
    pub fn validate(&self, field: &str) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        if self.provider_kind().is_none() {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::UnknownProvider {
                    field: format!("{field}.provider"),
                    value: self.provider.clone(),
                },
                format!(
                    "{field}.provider: unknown provider '{}' (expected one of: {})",
                    self.provider,
                    ProviderKind::all()
                        .iter()
                        .map(|p| p.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            ));
        }

        if self.model.trim().is_empty() {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::EmptyModelName {
                    field: format!("{field}.model"),
                },
                format!("{field}.model: model name cannot be empty"),
            ));
        }

        if let Some(t) = self.temperature
            && !(0.0..=2.0).contains(&t)
        {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::OutOfRange {
                    field: format!("{field}.temperature"),
                },
                format!("{field}.temperature: {t} is outside 0.0..=2.0"),
            ));
        }

        if self.max_tokens == Some(0) {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::OutOfRange {
                    field: format!("{field}.max_tokens"),
                },
                format!("{field}.max_tokens: must be at least 1"),
            ));
        }

        if self.endpoint.is_some() && self.provider_kind() == Some(ProviderKind::Echo) {
            issues.push(ConfigIssue::warning(
                ConfigIssueCode::UnusedField {
                    field: format!("{field}.endpoint"),
                },
                format!("{field}.endpoint: the echo provider has no endpoint to override"),
            ));
        }

        issues
    }

    /// Build the validated domain configuration.
    pub fn to_agent_config(&self, retry: &RetryPolicy) -> Result<AgentConfig, ConfigError> {
        let provider: ProviderKind = self.provider.parse()?;
        let mut builder = AgentConfig::builder()
            .provider(provider)
            .model(self.model.trim())
            .retry(retry.clone());

        if let Some(name) = &self.name {
            builder = builder.name(name);
        }
        if let Some(t) = self.temperature {
            builder = builder.temperature(t);
        }
        if let Some(n) = self.max_tokens {
            builder = builder.max_tokens(n);
        }
        if let Some(prompt) = &self.system_prompt {
            builder = builder.system_prompt(prompt);
        }
        if let Some(url) = &self.endpoint {
            builder = builder.endpoint(url);
        }
        if let Some(key) = &self.api_key {
            builder = builder.api_key(key);
        }

        builder.build()
    }
}
