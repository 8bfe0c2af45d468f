//! Anthropic messages API backend

use super::http::{normalize_base_url, send_json};
use async_trait::async_trait;
use moa_application::{Backend, BackendError, EndpointOverride};
use moa_domain::{Completion, GenerationRequest, Usage};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;
use tracing::debug;

pub struct AnthropicBackend {
    client: reqwest::Client,
    name: String,
    base_url: String,
    api_key: String,
    api_version: String,
    default_max_tokens: u32,
    model: String,
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Message<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Value>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    usage: Option<MessagesUsage>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    text: Option<String>,
}

#[derive(Deserialize)]
struct MessagesUsage {
    input_tokens: u32,
    output_tokens: u32,
}

/// Settings shared by every Anthropic agent.
#[derive(Debug, Clone)]
pub struct AnthropicSettings {
    pub base_url: String,
    pub api_version: String,
    pub default_max_tokens: u32,
}

impl AnthropicBackend {
    pub fn new(
        client: reqwest::Client,
        settings: &AnthropicSettings,
        api_key: String,
        model: impl Into<String>,
        name: impl Into<String>,
    ) -> Result<Self, BackendError> {
        Ok(Self {
            client,
            name: name.into(),
            base_url: normalize_base_url(&settings.base_url)?,
            api_key,
            api_version: settings.api_version.clone(),
            default_max_tokens: settings.default_max_tokens,
            model: model.into(),
        })
    }

    fn body<'a>(&'a self, request: &'a GenerationRequest) -> MessagesRequest<'a> {
        let params = request.params();
        MessagesRequest {
            model: &self.model,
            max_tokens: params.max_tokens.unwrap_or(self.default_max_tokens),
            messages: vec![Message {
                role: "user",
                content: request.prompt(),
            }],
            system: request.system_prompt(),
            temperature: params.temperature,
            tools: params
                .tools
                .iter()
                .map(|tool| {
                    json!({
                        "name": tool.name,
                        "description": tool.description,
                        "input_schema": tool.parameters,
                    })
                })
                .collect(),
        }
    }
}

fn into_completion(response: MessagesResponse) -> Result<Completion, BackendError> {
    let text: String = response
        .content
        .into_iter()
        .filter(|block| block.kind == "text")
        .filter_map(|block| block.text)
        .collect::<Vec<_>>()
        .join("");

    if text.is_empty() {
        return Err(BackendError::EmptyResponse);
    }

    let completion = Completion::new(text);
    Ok(match response.usage {
        Some(usage) => completion.with_usage(Usage {
            prompt_tokens: usage.input_tokens,
            completion_tokens: usage.output_tokens,
        }),
        None => completion,
    })
}

#[async_trait]
impl Backend for AnthropicBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(
        &self,
        request: &GenerationRequest,
        cancel: &CancellationToken,
    ) -> Result<Completion, BackendError> {
        let url = format!("{}/v1/messages", self.base_url);
        debug!("{}: POST {}", self.name, url);

        let http = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", &self.api_version)
            .json(&self.body(request));

        let response: MessagesResponse = send_json(http, cancel).await?;
        into_completion(response)
    }

    fn as_endpoint_override_mut(&mut self) -> Option<&mut dyn EndpointOverride> {
        Some(self)
    }
}

impl EndpointOverride for AnthropicBackend {
    fn endpoint(&self) -> &str {
        &self.base_url
    }

    fn set_endpoint(&mut self, url: &str) -> Result<(), BackendError> {
        self.base_url = normalize_base_url(url)?;
        Ok(())
    }
}
