//! LLM Provider Strategy Pattern
//!
//! Defines a common interface for all LLM backends (Gemini, Ollama, ...)
//! so the agent loop works with any of them without code changes.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use agent_core::provider::{GenerateRequest, LlmProvider};
//!
//! let provider = GeminiProvider::from_env()?;
//! let response = provider.generate(&request).await?;
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::message::{Content, FunctionCall};
use crate::tool::ToolSchema;

/// Configuration for LLM generation
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Model identifier (e.g., "gemini-1.5-flash", "llama3.2")
    pub model: String,

    /// Temperature for sampling (0.0 = deterministic, 1.0 = creative)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Top-p nucleus sampling
    #[serde(default = "default_top_p")]
    pub top_p: f32,

    /// Stop sequences
    #[serde(default)]
    pub stop_sequences: Vec<String>,
}

fn default_temperature() -> f32 { 0.7 }
fn default_max_tokens() -> u32 { 2048 }
fn default_top_p() -> f32 { 0.9 }

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            model: "gemini-1.5-flash".into(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            top_p: default_top_p(),
            stop_sequences: Vec::new(),
        }
    }
}

/// Everything a provider needs for one generation call
#[derive(Clone, Debug)]
pub struct GenerateRequest {
    pub system_prompt: String,
    pub contents: Vec<Content>,
    /// Tools offered for native function calling
    pub tools: Vec<ToolSchema>,
    pub options: GenerationOptions,
}

/// Response from the model.
///
/// Providers with native function calling fill `function_calls`; others
/// leave it empty and put everything in `text`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ModelResponse {
    #[serde(default)]
    pub function_calls: Vec<FunctionCall>,

    #[serde(default)]
    pub text: Option<String>,

    /// Token usage statistics (if available)
    #[serde(default)]
    pub usage: Option<TokenUsage>,

    #[serde(default)]
    pub finish_reason: Option<FinishReason>,
}

impl ModelResponse {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            finish_reason: Some(FinishReason::Stop),
            ..Default::default()
        }
    }

    pub fn from_function_call(call: FunctionCall) -> Self {
        Self {
            function_calls: vec![call],
            finish_reason: Some(FinishReason::ToolUse),
            ..Default::default()
        }
    }

    /// Placeholder held when no response could be obtained at all
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Token usage statistics
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Reason for completion finishing
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    Length,
    ToolUse,
    ContentFilter,
    Error,
}

/// Strategy trait for LLM providers
///
/// Implement this trait to add support for new LLM backends.
/// Providers are stateless; conversation state lives in `ChatSession`.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Human-readable provider name
    fn name(&self) -> &str;

    /// Check if the provider is available and configured correctly
    async fn health_check(&self) -> Result<bool>;

    /// Generate the next model response for the given history
    async fn generate(&self, request: &GenerateRequest) -> Result<ModelResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_generation_options_defaults() {
        let opts = GenerationOptions::default();
        assert_eq!(opts.temperature, 0.7);
        assert_eq!(opts.max_tokens, 2048);
        assert_eq!(opts.model, "gemini-1.5-flash");
    }

    #[test]
    fn test_response_constructors() {
        let text = ModelResponse::from_text("hi");
        assert!(text.function_calls.is_empty());
        assert_eq!(text.text.as_deref(), Some("hi"));

        let call = ModelResponse::from_function_call(FunctionCall::new("listModels", json!({})));
        assert_eq!(call.finish_reason, Some(FinishReason::ToolUse));
        assert!(ModelResponse::empty().text.is_none());
    }
}
