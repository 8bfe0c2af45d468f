//! Provider registry: builds a backend for each configured agent

use super::anthropic::{AnthropicBackend, AnthropicSettings};
use super::echo::EchoBackend;
use super::openai::OpenAiBackend;
use crate::config::FileProvidersConfig;
use moa_application::{Backend, BackendError, BackendFactory};
use moa_domain::{AgentConfig, ProviderKind};
use std::sync::Arc;
use tracing::info;

/// [`BackendFactory`] backed by the `[providers]` configuration.
///
/// One HTTP client is shared by every backend it creates.
pub struct ProviderRegistry {
    client: reqwest::Client,
    providers: FileProvidersConfig,
}

impl ProviderRegistry {
    pub fn new(providers: FileProvidersConfig) -> Self {
        Self::with_client(reqwest::Client::new(), providers)
    }

    pub fn with_client(client: reqwest::Client, providers: FileProvidersConfig) -> Self {
        Self { client, providers }
    }

    fn build(&self, config: &AgentConfig) -> Result<Box<dyn Backend>, BackendError> {
        let name = config.label();
        let model = config.model();

        let backend: Box<dyn Backend> = match config.provider() {
            ProviderKind::OpenAi => {
                let api_key = self.api_key(config, || self.providers.openai.resolve_api_key())?;
                Box::new(OpenAiBackend::new(
                    self.client.clone(),
                    &self.providers.openai.base_url,
                    Some(api_key),
                    model,
                    name,
                )?)
            }
            ProviderKind::Anthropic => {
                let anthropic = &self.providers.anthropic;
                let api_key = self.api_key(config, || anthropic.resolve_api_key())?;
                let settings = AnthropicSettings {
                    base_url: anthropic.base_url.clone(),
                    api_version: anthropic.api_version.clone(),
                    default_max_tokens: anthropic.max_tokens,
                };
                Box::new(AnthropicBackend::new(
                    self.client.clone(),
                    &settings,
                    api_key,
                    model,
                    name,
                )?)
            }
            ProviderKind::Ollama => Box::new(OpenAiBackend::new(
                self.client.clone(),
                &self.providers.ollama.base_url,
                config.api_key().map(str::to_string),
                model,
                name,
            )?),
            ProviderKind::Echo => Box::new(EchoBackend::new(model, name)),
        };
        Ok(backend)
    }

    /// The agent's own key, else the provider-level one.
    fn api_key(
        &self,
        config: &AgentConfig,
        fallback: impl FnOnce() -> Option<String>,
    ) -> Result<String, BackendError> {
        config
            .api_key()
            .map(str::to_string)
            .or_else(fallback)
            .ok_or_else(|| {
                BackendError::InvalidConfig(format!(
                    "no API key for {} (set one in [providers.{}] or its environment variable)",
                    config.label(),
                    config.provider()
                ))
            })
    }
}

impl BackendFactory for ProviderRegistry {
    fn create(&self, config: &AgentConfig) -> Result<Arc<dyn Backend>, BackendError> {
        let mut backend = self.build(config)?;

        if let Some(endpoint) = config.endpoint() {
            let capability = backend.as_endpoint_override_mut().ok_or_else(|| {
                BackendError::InvalidConfig(format!(
                    "provider '{}' does not support endpoint overrides",
                    config.provider()
                ))
            })?;
            capability.set_endpoint(endpoint)?;
        }

        info!("Created backend {} ({})", backend.name(), config.provider());
        Ok(Arc::from(backend))
    }
}
