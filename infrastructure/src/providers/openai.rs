//! OpenAI-compatible chat completions backend
//!
//! Also serves Ollama and any other server exposing `/chat/completions`.

use super::http::{normalize_base_url, send_json};
use async_trait::async_trait;
use moa_application::{Backend, BackendError, EndpointOverride};
use moa_domain::{Completion, GenerationRequest, Usage};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;
use tracing::debug;

pub struct OpenAiBackend {
    client: reqwest::Client,
    name: String,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Value>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

impl OpenAiBackend {
    /// `api_key` is optional: local servers such as Ollama need none.
    pub fn new(
        client: reqwest::Client,
        base_url: &str,
        api_key: Option<String>,
        model: impl Into<String>,
        name: impl Into<String>,
    ) -> Result<Self, BackendError> {
        Ok(Self {
            client,
            name: name.into(),
            base_url: normalize_base_url(base_url)?,
            api_key,
            model: model.into(),
        })
    }

    fn body<'a>(&'a self, request: &'a GenerationRequest) -> ChatRequest<'a> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = request.system_prompt() {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: request.prompt(),
        });

        let params = request.params();
        ChatRequest {
            model: &self.model,
            messages,
            temperature: params.temperature,
            max_tokens: params.max_tokens,
            tools: params
                .tools
                .iter()
                .map(|tool| {
                    json!({
                        "type": "function",
                        "function": {
                            "name": tool.name,
                            "description": tool.description,
                            "parameters": tool.parameters,
                        }
                    })
                })
                .collect(),
        }
    }
}

fn into_completion(response: ChatResponse) -> Result<Completion, BackendError> {
    let text = response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or(BackendError::EmptyResponse)?;

    let completion = Completion::new(text);
    Ok(match response.usage {
        Some(usage) => completion.with_usage(Usage {
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
        }),
        None => completion,
    })
}

#[async_trait]
impl Backend for OpenAiBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(
        &self,
        request: &GenerationRequest,
        cancel: &CancellationToken,
    ) -> Result<Completion, BackendError> {
        let url = format!("{}/chat/completions", self.base_url);
        debug!("{}: POST {}", self.name, url);

        let mut http = self.client.post(&url).json(&self.body(request));
        if let Some(key) = &self.api_key {
            http = http.bearer_auth(key);
        }

        let response: ChatResponse = send_json(http, cancel).await?;
        into_completion(response)
    }

    fn as_endpoint_override_mut(&mut self) -> Option<&mut dyn EndpointOverride> {
        Some(self)
    }
}

impl EndpointOverride for OpenAiBackend {
    fn endpoint(&self) -> &str {
        &self.base_url
    }

    fn set_endpoint(&mut self, url: &str) -> Result<(), BackendError> {
        self.base_url = normalize_base_url(url)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use moa_domain::{GenerationParams, ToolDefinition};

    fn backend() -> OpenAiBackend {
        OpenAiBackend::new(
            reqwest::Client::new(),
            "https://api.openai.com/v1/",
            Some("sk-test".to_string()),
            "gpt-4o-mini",
            "openai/gpt-4o-mini",
        )
        .unwrap()
    }

    #[test]
    fn test_body_includes_system_prompt_and_params() {
        let backend = backend();
        let request = GenerationRequest::new("What is Rust?").with_params(GenerationParams {
            system_prompt: Some("Be brief.".to_string()),
            temperature: Some(0.5),
            max_tokens: Some(100),
            tools: vec![ToolDefinition::new("lookup", "Look something up")],
        });

        let body = serde_json::to_value(backend.body(&request)).unwrap();
        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "What is Rust?");
        assert_eq!(body["temperature"], 0.5);
        assert_eq!(body["max_tokens"], 100);
        assert_eq!(body["tools"][0]["function"]["name"], "lookup");
    }

    #[test]
    fn test_body_omits_unset_fields() {
        let backend = backend();
        let body = serde_json::to_value(backend.body(&GenerationRequest::new("hi"))).unwrap();
        assert_eq!(body["messages"].as_array().unwrap().len(), 1);
        assert!(body.get("temperature").is_none());
        assert!(body.get("tools").is_none());
    }

    #[test]
    fn test_parse_response() {
        let response: ChatResponse = serde_json::from_value(json!({
            "choices": [{"message": {"role": "assistant", "content": "Hello!"}}],
            "usage": {"prompt_tokens": 5, "completion_tokens": 2, "total_tokens": 7}
        }))
        .unwrap();

        let completion = into_completion(response).unwrap();
        assert_eq!(completion.text, "Hello!");
        assert_eq!(completion.usage.unwrap().total(), 7);
    }

    #[test]
    fn test_missing_content_is_empty_response() {
        let response: ChatResponse = serde_json::from_value(json!({
            "choices": [{"message": {"role": "assistant", "content": null}}]
        }))
        .unwrap();
        assert_eq!(into_completion(response), Err(BackendError::EmptyResponse));
    }

    #[test]
    fn test_endpoint_override_capability() {
        let mut backend = backend();
        assert_eq!(backend.endpoint(), "https://api.openai.com/v1");

        let capability = backend.as_endpoint_override_mut().unwrap();
        capability.set_endpoint("http://localhost:8000/v1/").unwrap();
        assert_eq!(backend.endpoint(), "http://localhost:8000/v1");

        assert!(backend.set_endpoint("ftp://example.com").is_err());
    }

    #[tokio::test]
    async fn test_unreachable_server_is_transient() {
        let backend = OpenAiBackend::new(
            reqwest::Client::new(),
            "http://127.0.0.1:9/v1",
            None,
            "llama3",
            "ollama/llama3",
        )
        .unwrap();

        let err = backend
            .generate(&GenerationRequest::new("hi"), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_cancelled_before_send() {
        let backend = backend();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = backend
            .generate(&GenerationRequest::new("hi"), &cancel)
            .await
            .unwrap_err();
        assert_eq!(err, BackendError::Cancelled);
    }
}
