//! Agent configuration value object and its builder.

use crate::core::error::ConfigError;
use crate::core::provider::ProviderKind;
use crate::generation::request::{GenerationParams, GenerationRequest, ToolDefinition};
use crate::retry::RetryPolicy;

/// Everything needed to bind one agent to a backend.
///
/// Constructed through [`AgentConfig::builder`], validated once in
/// [`AgentConfigBuilder::build`], and immutable afterwards.
///
/// # Examples
///
/// ```
/// use moa_domain::{AgentConfig, ProviderKind};
///
/// let config = AgentConfig::builder()
///     .provider(ProviderKind::OpenAi)
///     .model("gpt-4o-mini")
///     .temperature(0.7)
///     .build()
///     .unwrap();
/// assert_eq!(config.label(), "openai/gpt-4o-mini");
/// ```
#[derive(Clone, PartialEq)]
pub struct AgentConfig {
    name: Option<String>,
    provider: ProviderKind,
    model: String,
    api_key: Option<String>,
    endpoint: Option<String>,
    params: GenerationParams,
    retry: RetryPolicy,
}

impl AgentConfig {
    pub fn builder() -> AgentConfigBuilder {
        AgentConfigBuilder::default()
    }

    /// Start a builder from `provider/model` shorthand (e.g. `openai/gpt-4o-mini`).
    ///
    /// Only the first `/` separates provider from model, so model names that
    /// contain slashes are kept intact.
    pub fn parse_spec(spec: &str) -> Result<AgentConfigBuilder, ConfigError> {
        let (provider, model) = spec
            .split_once('/')
            .ok_or_else(|| ConfigError::InvalidAgentSpec(spec.to_string()))?;
        let provider: ProviderKind = provider.parse()?;
        Ok(Self::builder().provider(provider).model(model))
    }

    /// Human-readable label: the explicit name, or `provider/model`.
    pub fn label(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => format!("{}/{}", self.provider, self.model),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn provider(&self) -> ProviderKind {
        self.provider
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }

    pub fn params(&self) -> &GenerationParams {
        &self.params
    }

    pub fn retry(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Build the request this agent sends for the given prompt.
    pub fn request_for(&self, prompt: impl Into<String>) -> GenerationRequest {
        GenerationRequest::new(prompt).with_params(self.params.clone())
    }
}

impl std::fmt::Debug for AgentConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentConfig")
            .field("name", &self.name)
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("endpoint", &self.endpoint)
            .field("params", &self.params)
            .field("retry", &self.retry)
            .finish()
    }
}

/// Accumulates agent options; later calls override earlier ones.
#[derive(Debug, Clone, Default)]
pub struct AgentConfigBuilder {
    name: Option<String>,
    provider: Option<ProviderKind>,
    model: Option<String>,
    api_key: Option<String>,
    endpoint: Option<String>,
    params: GenerationParams,
    retry: Option<RetryPolicy>,
}

impl AgentConfigBuilder {
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn provider(mut self, provider: ProviderKind) -> Self {
        self.provider = Some(provider);
        self
    }

    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    #[must_use]
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    #[must_use]
    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.endpoint = Some(url.into());
        self
    }

    #[must_use]
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.params.temperature = Some(temperature);
        self
    }

    #[must_use]
    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.params.max_tokens = Some(max_tokens);
        self
    }

    #[must_use]
    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.params.system_prompt = Some(prompt.into());
        self
    }

    #[must_use]
    pub fn tool(mut self, tool: ToolDefinition) -> Self {
        self.params.tools.push(tool);
        self
    }

    #[must_use]
    pub fn retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = Some(policy);
        self
    }

    /// Validate and freeze the configuration.
    pub fn build(self) -> Result<AgentConfig, ConfigError> {
        let model = self.model.unwrap_or_default();
        let label = match (&self.name, self.provider) {
            (Some(name), _) => name.clone(),
            (None, Some(provider)) => format!("{}/{}", provider, model),
            (None, None) => model.clone(),
        };

        let provider = self
            .provider
            .ok_or_else(|| ConfigError::MissingProvider {
                agent: label.clone(),
            })?;

        if model.trim().is_empty() {
            return Err(ConfigError::EmptyModel { agent: label });
        }

        if let Some(value) = self.params.temperature
            && !(0.0..=2.0).contains(&value)
        {
            return Err(ConfigError::InvalidTemperature {
                agent: label,
                value,
            });
        }

        if self.params.max_tokens == Some(0) {
            return Err(ConfigError::InvalidMaxTokens { agent: label });
        }

        Ok(AgentConfig {
            name: self.name,
            provider,
            model,
            api_key: self.api_key,
            endpoint: self.endpoint,
            params: self.params,
            retry: self.retry.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn openai() -> AgentConfigBuilder {
        AgentConfig::builder()
            .provider(ProviderKind::OpenAi)
            .model("gpt-4o-mini")
    }

    #[test]
    fn test_build_minimal() {
        let config = openai().build().unwrap();
        assert_eq!(config.provider(), ProviderKind::OpenAi);
        assert_eq!(config.model(), "gpt-4o-mini");
        assert_eq!(config.retry(), &RetryPolicy::default());
        assert_eq!(config.label(), "openai/gpt-4o-mini");
    }

    #[test]
    fn test_later_options_override_earlier() {
        let config = openai()
            .temperature(0.1)
            .temperature(0.9)
            .model("gpt-4o")
            .build()
            .unwrap();
        assert_eq!(config.params().temperature, Some(0.9));
        assert_eq!(config.model(), "gpt-4o");
    }

    #[test]
    fn test_explicit_name_is_label() {
        let config = openai().name("fast").build().unwrap();
        assert_eq!(config.label(), "fast");
    }

    #[test]
    fn test_missing_provider() {
        let err = AgentConfig::builder().model("x").build().unwrap_err();
        assert!(matches!(err, ConfigError::MissingProvider { .. }));
    }

    #[test]
    fn test_empty_model() {
        let err = AgentConfig::builder()
            .provider(ProviderKind::Anthropic)
            .model("  ")
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::EmptyModel { .. }));
    }

    #[test]
    fn test_temperature_range() {
        let err = openai().temperature(2.5).build().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTemperature { .. }));
    }

    #[test]
    fn test_zero_max_tokens() {
        let err = openai().max_tokens(0).build().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidMaxTokens { .. }));
    }

    #[test]
    fn test_parse_spec() {
        let config = AgentConfig::parse_spec("ollama/library/llama3")
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(config.provider(), ProviderKind::Ollama);
        assert_eq!(config.model(), "library/llama3");
    }

    #[test]
    fn test_parse_spec_errors() {
        assert!(matches!(
            AgentConfig::parse_spec("gpt-4o"),
            Err(ConfigError::InvalidAgentSpec(_))
        ));
        assert!(matches!(
            AgentConfig::parse_spec("bedrock/claude"),
            Err(ConfigError::UnknownProvider(_))
        ));
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = openai().api_key("sk-secret").build().unwrap();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_request_for_carries_params() {
        let config = openai().system_prompt("be brief").max_tokens(32).build().unwrap();
        let request = config.request_for("hello");
        assert_eq!(request.prompt(), "hello");
        assert_eq!(request.system_prompt(), Some("be brief"));
        assert_eq!(request.params().max_tokens, Some(32));
    }
}
