//! Provider value object identifying which backend family serves an agent

use super::error::ConfigError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Backend provider families (Value Object)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    /// OpenAI chat completions API (or any compatible endpoint)
    OpenAi,
    /// Anthropic messages API
    Anthropic,
    /// Local Ollama server through its OpenAI-compatible endpoint
    Ollama,
    /// Offline backend that echoes its prompt; useful for dry runs
    Echo,
}

impl ProviderKind {
    /// Get the string identifier for this provider
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::Ollama => "ollama",
            ProviderKind::Echo => "echo",
        }
    }

    /// All supported providers
    pub fn all() -> [ProviderKind; 4] {
        [
            ProviderKind::OpenAi,
            ProviderKind::Anthropic,
            ProviderKind::Ollama,
            ProviderKind::Echo,
        ]
    }

    /// Whether this provider needs an API key to be reachable
    pub fn requires_api_key(&self) -> bool {
        matches!(self, ProviderKind::OpenAi | ProviderKind::Anthropic)
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ProviderKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(ProviderKind::OpenAi),
            "anthropic" => Ok(ProviderKind::Anthropic),
            "ollama" => Ok(ProviderKind::Ollama),
            "echo" => Ok(ProviderKind::Echo),
            other => Err(ConfigError::UnknownProvider(other.to_string())),
        }
    }
}

impl Serialize for ProviderKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ProviderKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_roundtrip() {
        for kind in ProviderKind::all() {
            let parsed: ProviderKind = kind.to_string().parse().unwrap();
            assert_eq!(kind, parsed);
        }
    }

    #[test]
    fn test_provider_parse_is_case_insensitive() {
        assert_eq!("OpenAI".parse::<ProviderKind>().unwrap(), ProviderKind::OpenAi);
    }

    #[test]
    fn test_unknown_provider() {
        let err = "bedrock".parse::<ProviderKind>().unwrap_err();
        assert_eq!(err, ConfigError::UnknownProvider("bedrock".to_string()));
    }

    #[test]
    fn test_api_key_requirement() {
        assert!(ProviderKind::OpenAi.requires_api_key());
        assert!(!ProviderKind::Ollama.requires_api_key());
        assert!(!ProviderKind::Echo.requires_api_key());
    }
}
