//! Gemini LLM Provider
//!
//! Implementation of `LlmProvider` for the Google Generative Language API
//! (`models/{model}:generateContent`), with native function calling.

use std::time::Duration;

use agent_core::{
    error::{AgentError, Result},
    message::{Content, FunctionCall, Part, Role},
    provider::{FinishReason, GenerateRequest, LlmProvider, ModelResponse, TokenUsage},
    tool::ToolSchema,
};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::http::{send_json, transport_error};

/// Gemini provider configuration
#[derive(Clone, Debug)]
pub struct GeminiConfig {
    /// API key, sent as `x-goog-api-key`
    pub api_key: String,

    /// API root, without the version segment
    pub base_url: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://generativelanguage.googleapis.com".into(),
            timeout_secs: 60,
        }
    }
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    /// Read `GEMINI_API_KEY` (required) and `GEMINI_BASE_URL`
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| AgentError::Config("GEMINI_API_KEY is not set".into()))?;

        let mut config = Self::new(api_key);
        if let Ok(base_url) = std::env::var("GEMINI_BASE_URL") {
            config.base_url = base_url;
        }
        Ok(config)
    }
}

/// Gemini LLM provider
pub struct GeminiProvider {
    client: reqwest::Client,
    config: GeminiConfig,
}

impl GeminiProvider {
    /// Create from configuration
    pub fn from_config(config: GeminiConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AgentError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_config(GeminiConfig::from_env()?)
    }

    fn generate_url(&self, model: &str) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            model
        )
    }

    /// Build the `generateContent` request body
    fn build_body(request: &GenerateRequest) -> Value {
        let contents: Vec<Value> = request.contents.iter().map(Self::convert_content).collect();

        let mut generation_config = json!({
            "temperature": request.options.temperature,
            "topP": request.options.top_p,
            "maxOutputTokens": request.options.max_tokens,
        });
        if !request.options.stop_sequences.is_empty() {
            generation_config["stopSequences"] = json!(request.options.stop_sequences);
        }

        let mut body = json!({
            "contents": contents,
            "generationConfig": generation_config,
        });

        if !request.system_prompt.is_empty() {
            body["systemInstruction"] = json!({"parts": [{"text": request.system_prompt}]});
        }

        if !request.tools.is_empty() {
            let declarations: Vec<Value> = request.tools.iter().map(Self::convert_tool).collect();
            body["tools"] = json!([{"functionDeclarations": declarations}]);
        }

        body
    }

    /// Convert a history entry to Gemini format
    fn convert_content(content: &Content) -> Value {
        let role = match content.role {
            Role::User => "user",
            Role::Model => "model",
        };

        let parts: Vec<Value> = content
            .parts
            .iter()
            .map(|part| match part {
                Part::Text(text) => json!({"text": text}),
                Part::FunctionCall(call) => json!({
                    "functionCall": {"name": call.name, "args": call.args}
                }),
                Part::FunctionResponse { name, response } => {
                    // functionResponse.response must be an object
                    let response = if response.is_object() {
                        response.clone()
                    } else {
                        json!({"result": response})
                    };
                    json!({"functionResponse": {"name": name, "response": response}})
                }
            })
            .collect();

        json!({"role": role, "parts": parts})
    }

    fn convert_tool(schema: &ToolSchema) -> Value {
        let mut declaration = json!({
            "name": schema.name,
            "description": schema.description,
        });
        if !schema.parameters.is_empty() {
            declaration["parameters"] = schema.parameters_json_schema();
        }
        declaration
    }

    /// Convert a Gemini response to a model response
    fn convert_response(response: GeminiResponse) -> ModelResponse {
        let candidate = response.candidates.into_iter().next();

        let mut function_calls = Vec::new();
        let mut texts = Vec::new();
        let mut finish_reason = None;

        if let Some(candidate) = candidate {
            finish_reason = candidate.finish_reason.as_deref().map(Self::convert_finish_reason);
            for part in candidate.content.map(|c| c.parts).unwrap_or_default() {
                if let Some(call) = part.function_call {
                    function_calls.push(FunctionCall::new(call.name, call.args));
                }
                if let Some(text) = part.text {
                    texts.push(text);
                }
            }
        }

        if !function_calls.is_empty() {
            finish_reason = Some(FinishReason::ToolUse);
        }

        ModelResponse {
            function_calls,
            text: (!texts.is_empty()).then(|| texts.concat()),
            usage: response.usage_metadata.map(|u| TokenUsage {
                prompt_tokens: u.prompt_token_count,
                completion_tokens: u.candidates_token_count,
                total_tokens: u.total_token_count,
            }),
            finish_reason,
        }
    }

    fn convert_finish_reason(reason: &str) -> FinishReason {
        match reason {
            "STOP" => FinishReason::Stop,
            "MAX_TOKENS" => FinishReason::Length,
            "SAFETY" | "RECITATION" | "BLOCKLIST" | "PROHIBITED_CONTENT" | "SPII" => {
                FinishReason::ContentFilter
            }
            _ => FinishReason::Error,
        }
    }
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/v1beta/models", self.config.base_url.trim_end_matches('/'));
        let outcome = self
            .client
            .get(url)
            .header("x-goog-api-key", &self.config.api_key)
            .send()
            .await
            .map_err(|e| transport_error("gemini", &e));

        match outcome {
            Ok(response) => Ok(response.status().is_success()),
            Err(e) => {
                tracing::warn!("Gemini health check failed: {}", e);
                Ok(false)
            }
        }
    }

    async fn generate(&self, request: &GenerateRequest) -> Result<ModelResponse> {
        let body = Self::build_body(request);

        tracing::debug!(
            model = %request.options.model,
            contents = request.contents.len(),
            tools = request.tools.len(),
            "Sending request to Gemini"
        );

        let response: GeminiResponse = send_json(
            "gemini",
            self.client
                .post(self.generate_url(&request.options.model))
                .header("x-goog-api-key", &self.config.api_key)
                .json(&body),
        )
        .await?;

        Ok(Self::convert_response(response))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    usage_metadata: Option<GeminiUsage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPart {
    text: Option<String>,
    function_call: Option<GeminiFunctionCall>,
}

#[derive(Debug, Deserialize)]
struct GeminiFunctionCall {
    name: String,
    #[serde(default)]
    args: Value,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiUsage {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
    #[serde(default)]
    total_token_count: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_core::message::ConversationTurn;
    use agent_core::provider::GenerationOptions;
    use agent_core::tool::ParameterSchema;

    fn request() -> GenerateRequest {
        GenerateRequest {
            system_prompt: "Be brief.".into(),
            contents: vec![
                Content::from(&ConversationTurn::user("Weather in Lusaka?")),
                Content::new(
                    Role::Model,
                    vec![Part::FunctionCall(FunctionCall::new(
                        "googleSearch",
                        json!({"query": "Lusaka weather"}),
                    ))],
                ),
                Content::new(
                    Role::User,
                    vec![Part::FunctionResponse {
                        name: "googleSearch".into(),
                        response: json!(["27°C"]),
                    }],
                ),
            ],
            tools: vec![
                ToolSchema::new("googleSearch", "Search the web")
                    .param(ParameterSchema::required("query", "string", "Query")),
                ToolSchema::new("listModels", "List data models"),
            ],
            options: GenerationOptions::default(),
        }
    }

    #[test]
    fn test_config_defaults() {
        let config = GeminiConfig::new("key");
        assert_eq!(config.base_url, "https://generativelanguage.googleapis.com");
        assert_eq!(config.timeout_secs, 60);
    }

    #[test]
    fn test_generate_url() {
        let provider = GeminiProvider::from_config(GeminiConfig {
            base_url: "http://localhost:8080/".into(),
            ..GeminiConfig::new("key")
        })
        .unwrap();
        assert_eq!(
            provider.generate_url("gemini-1.5-flash"),
            "http://localhost:8080/v1beta/models/gemini-1.5-flash:generateContent"
        );
    }

    #[test]
    fn test_request_body() {
        let body = GeminiProvider::build_body(&request());

        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "Be brief.");
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][1]["role"], "model");
        assert_eq!(body["contents"][1]["parts"][0]["functionCall"]["args"]["query"], "Lusaka weather");
        assert_eq!(
            body["contents"][2]["parts"][0]["functionResponse"]["response"]["result"][0],
            "27°C"
        );
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 2048);

        let declarations = body["tools"][0]["functionDeclarations"].as_array().unwrap();
        assert_eq!(declarations.len(), 2);
        assert_eq!(declarations[0]["parameters"]["required"][0], "query");
        assert!(declarations[1].get("parameters").is_none());
    }

    #[test]
    fn test_function_call_response() {
        let raw = json!({
            "candidates": [{
                "content": {"role": "model", "parts": [
                    {"functionCall": {"name": "googleSearch", "args": {"query": "Lusaka"}}}
                ]},
                "finishReason": "STOP"
            }],
            "usageMetadata": {"promptTokenCount": 10, "candidatesTokenCount": 5, "totalTokenCount": 15}
        });
        let response =
            GeminiProvider::convert_response(serde_json::from_value(raw).unwrap());

        assert_eq!(response.function_calls.len(), 1);
        assert_eq!(response.function_calls[0].name, "googleSearch");
        assert_eq!(response.finish_reason, Some(FinishReason::ToolUse));
        assert!(response.text.is_none());
        assert_eq!(response.usage.unwrap().total_tokens, 15);
    }

    #[test]
    fn test_text_and_blocked_responses() {
        let raw = json!({"candidates": [{
            "content": {"parts": [{"text": "{\"payload\": "}, {"text": "{\"text\": \"hi\"}}"}]},
            "finishReason": "STOP"
        }]});
        let response = GeminiProvider::convert_response(serde_json::from_value(raw).unwrap());
        assert_eq!(response.text.as_deref(), Some("{\"payload\": {\"text\": \"hi\"}}"));
        assert_eq!(response.finish_reason, Some(FinishReason::Stop));

        let blocked = json!({"promptFeedback": {"blockReason": "SAFETY"}});
        let response = GeminiProvider::convert_response(serde_json::from_value(blocked).unwrap());
        assert!(response.text.is_none());
        assert!(response.function_calls.is_empty());
    }
}
