//! Generation request value objects.

use serde::{Deserialize, Serialize};

/// An opaque tool definition forwarded to backends that support tools.
///
/// `parameters` is a JSON schema; it is produced and interpreted by
/// collaborators outside the core and passed through unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub parameters: serde_json::Value,
}

impl ToolDefinition {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: serde_json::json!({ "type": "object", "properties": {} }),
        }
    }

    pub fn with_parameters(mut self, parameters: serde_json::Value) -> Self {
        self.parameters = parameters;
        self
    }
}

/// Per-call generation parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    pub system_prompt: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDefinition>,
}

/// A prompt plus the parameters to generate with.
///
/// Fields are private: once a request has been dispatched to an agent it
/// cannot be changed, only replaced.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    prompt: String,
    params: GenerationParams,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            params: GenerationParams::default(),
        }
    }

    pub fn with_params(mut self, params: GenerationParams) -> Self {
        self.params = params;
        self
    }

    /// Replace the system prompt, keeping the remaining parameters.
    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.params.system_prompt = Some(system_prompt.into());
        self
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn params(&self) -> &GenerationParams {
        &self.params
    }

    pub fn system_prompt(&self) -> Option<&str> {
        self.params.system_prompt.as_deref()
    }
}
