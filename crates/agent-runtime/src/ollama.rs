//! Ollama LLM Provider
//!
//! Implementation of `LlmProvider` for local Ollama inference over
//! `POST /api/chat`. Tools are not offered natively; the model drives them
//! through the JSON envelope described in the system prompt, and tool
//! results come back as user turns.

use std::time::Duration;

use agent_core::{
    error::{AgentError, Result},
    message::{Content, Part, Role},
    provider::{FinishReason, GenerateRequest, GenerationOptions, LlmProvider, ModelResponse, TokenUsage},
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::http::send_json;

/// Ollama provider configuration
#[derive(Clone, Debug)]
pub struct OllamaConfig {
    /// Ollama host URL
    pub host: String,

    /// Ollama port
    pub port: u16,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: "http://localhost".into(),
            port: 11434,
            timeout_secs: 120,
        }
    }
}

impl OllamaConfig {
    pub fn from_env() -> Self {
        let host = std::env::var("OLLAMA_HOST")
            .unwrap_or_else(|_| "http://localhost".into());
        let port = std::env::var("OLLAMA_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(11434);

        Self {
            host,
            port,
            ..Default::default()
        }
    }

    fn base_url(&self) -> String {
        format!("{}:{}", self.host.trim_end_matches('/'), self.port)
    }
}

/// Ollama LLM provider
pub struct OllamaProvider {
    client: reqwest::Client,
    config: OllamaConfig,
}

impl OllamaProvider {
    /// Create a new Ollama provider with custom host/port
    pub fn new(host: impl Into<String>, port: u16) -> Result<Self> {
        Self::from_config(OllamaConfig {
            host: host.into(),
            port,
            ..Default::default()
        })
    }

    /// Create from configuration
    pub fn from_config(config: OllamaConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AgentError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_config(OllamaConfig::from_env())
    }

    /// Create with default localhost settings
    pub fn localhost() -> Result<Self> {
        Self::from_config(OllamaConfig::default())
    }

    /// Convert history to Ollama chat messages
    fn convert_messages(system_prompt: &str, contents: &[Content]) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(contents.len() + 1);
        if !system_prompt.is_empty() {
            messages.push(ChatMessage::new("system", system_prompt));
        }

        for content in contents {
            let role = match content.role {
                Role::User => "user",
                Role::Model => "assistant",
            };
            let text: Vec<String> = content.parts.iter().map(Self::render_part).collect();
            messages.push(ChatMessage::new(role, text.join("\n")));
        }

        messages
    }

    fn render_part(part: &Part) -> String {
        match part {
            Part::Text(text) => text.clone(),
            Part::FunctionCall(call) => json!({
                "payload": {"function_call": {"name": call.name, "arguments": call.args}}
            })
            .to_string(),
            Part::FunctionResponse { name, response } => {
                let rendered = serde_json::to_string_pretty(response)
                    .unwrap_or_else(|_| response.to_string());
                format!("Result of {}:\n```json\n{}\n```", name, rendered)
            }
        }
    }

    fn build_options(opts: &GenerationOptions) -> ChatOptions {
        ChatOptions {
            temperature: opts.temperature,
            top_p: opts.top_p,
            num_predict: opts.max_tokens,
            stop: opts.stop_sequences.clone(),
        }
    }

    /// Convert Ollama response to a model response
    fn convert_response(response: ChatResponse) -> ModelResponse {
        let prompt_tokens = response.prompt_eval_count.unwrap_or(0);
        let completion_tokens = response.eval_count.unwrap_or(0);

        ModelResponse {
            function_calls: Vec::new(),
            text: response.message.map(|m| m.content),
            usage: Some(TokenUsage {
                prompt_tokens,
                completion_tokens,
                total_tokens: prompt_tokens + completion_tokens,
            }),
            finish_reason: Some(match response.done_reason.as_deref() {
                Some("length") => FinishReason::Length,
                _ => FinishReason::Stop,
            }),
        }
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/api/tags", self.config.base_url());
        match self.client.get(url).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(e) => {
                tracing::warn!("Ollama health check failed: {}", e);
                Ok(false)
            }
        }
    }

    async fn generate(&self, request: &GenerateRequest) -> Result<ModelResponse> {
        let body = ChatRequest {
            model: request.options.model.clone(),
            messages: Self::convert_messages(&request.system_prompt, &request.contents),
            stream: false,
            options: Self::build_options(&request.options),
        };

        tracing::debug!(
            model = %body.model,
            messages = body.messages.len(),
            "Sending request to Ollama"
        );

        let response: ChatResponse = send_json(
            "ollama",
            self.client
                .post(format!("{}/api/chat", self.config.base_url()))
                .json(&body),
        )
        .await?;

        Ok(Self::convert_response(response))
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
    options: ChatOptions,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

impl ChatMessage {
    fn new(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatOptions {
    temperature: f32,
    top_p: f32,
    num_predict: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    stop: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: Option<ChatMessage>,
    #[serde(default)]
    done_reason: Option<String>,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
}
