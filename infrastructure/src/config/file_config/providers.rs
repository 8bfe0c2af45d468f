//! Provider configuration from TOML (`[providers]` section)

use serde::{Deserialize, Serialize};

/// Settings for an OpenAI-compatible chat completions endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileOpenAiConfig {
    /// Environment variable name for the API key (default: "OPENAI_API_KEY").
    pub api_key_env: String,
    /// Direct API key (not recommended — use env var instead).
    pub api_key: Option<String>,
    /// Base URL, including the `/v1` prefix.
    pub base_url: String,
}

impl Default for FileOpenAiConfig {
    fn default() -> Self {
        Self {
            api_key_env: "OPENAI_API_KEY".to_string(),
            api_key: None,
            base_url: "https://api.openai.com/v1".to_string(),
        }
    }
}

impl FileOpenAiConfig {
    pub fn resolve_api_key(&self) -> Option<String> {
        resolve_key(self.api_key.as_deref(), &self.api_key_env)
    }
}

/// Anthropic API provider configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileAnthropicConfig {
    /// Environment variable name for the API key (default: "ANTHROPIC_API_KEY").
    pub api_key_env: String,
    /// Direct API key (not recommended — use env var instead).
    pub api_key: Option<String>,
    /// Base URL for the Anthropic API.
    pub base_url: String,
    /// Max tokens per response when an agent sets none (the API requires one).
    pub max_tokens: u32,
    /// Anthropic API version header.
    pub api_version: String,
}

impl Default for FileAnthropicConfig {
    fn default() -> Self {
        Self {
            api_key_env: "ANTHROPIC_API_KEY".to_string(),
            api_key: None,
            base_url: "https://api.anthropic.com".to_string(),
            max_tokens: 4096,
            api_version: "2023-06-01".to_string(),
        }
    }
}

impl FileAnthropicConfig {
    pub fn resolve_api_key(&self) -> Option<String> {
        resolve_key(self.api_key.as_deref(), &self.api_key_env)
    }
}

/// Local Ollama server, reached through its OpenAI-compatible endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileOllamaConfig {
    pub base_url: String,
}

impl Default for FileOllamaConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434/v1".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileProvidersConfig {
    pub openai: FileOpenAiConfig,
    pub anthropic: FileAnthropicConfig,
    pub ollama: FileOllamaConfig,
}

fn resolve_key(direct: Option<&str>, env_var: &str) -> Option<String> {
    direct
        .map(str::to_string)
        .or_else(|| std::env::var(env_var).ok())
        .filter(|key| !key.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direct_key_wins_over_env() {
        let config = FileOpenAiConfig {
            api_key: Some("sk-direct".to_string()),
            api_key_env: "MOA_TEST_UNSET_OPENAI_KEY".to_string(),
            ..Default::default()
        };
        assert_eq!(config.resolve_api_key().as_deref(), Some("sk-direct"));
    }

    #[test]
    fn test_missing_key_resolves_to_none() {
        let config = FileAnthropicConfig {
            api_key_env: "MOA_TEST_UNSET_ANTHROPIC_KEY".to_string(),
            ..Default::default()
        };
        assert_eq!(config.resolve_api_key(), None);
    }

    #[test]
    fn test_blank_key_is_ignored() {
        let config = FileOpenAiConfig {
            api_key: Some("  ".to_string()),
            api_key_env: "MOA_TEST_UNSET_OPENAI_KEY".to_string(),
            ..Default::default()
        };
        assert_eq!(config.resolve_api_key(), None);
    }
}
