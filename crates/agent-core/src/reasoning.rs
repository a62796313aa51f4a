//! Agent Loop
//!
//! Drives one user message to a final answer:
//!
//! ```text
//! SENDING -> INTERPRETING -> EXECUTING_TOOL -> SENDING -> ... -> DONE
//! ```
//!
//! The loop is bounded, and every failure below the entry point degrades
//! to text: a recovered answer, a fallback digest of the last tool result,
//! or a fixed apology. Only cancellation cuts it short.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::channel::{ChatSession, ModelChannel};
use crate::error::{AgentError, Result};
use crate::fallback;
use crate::interpreter::{extract_final_text, interpret};
use crate::message::{Conversation, ConversationTurn, OutgoingMessage, UserMessage};
use crate::metadata::{MetadataCache, MetadataConfig};
use crate::provider::{GenerationOptions, LlmProvider, ModelResponse};
use crate::retry::{send_with_retry, RetryPolicy};
use crate::session::SessionContext;
use crate::tool::{Tool, ToolCall, ToolRegistry, ToolResult};

/// Hard ceiling on tool round-trips per user message
pub const MAX_TOOL_ITERATIONS: usize = 5;

/// Sent in place of the user's message when it could not be delivered
pub const RECOVERY_MESSAGE: &str = "Sorry, something went wrong on my side. Please try again.";

/// Sent once when the loop ends without a final answer
pub const SUMMARY_REQUEST: &str = "Please summarize the answer to my request using the information you have gathered so far. \
Reply with your final answer in the payload text field.";

/// The output floor
pub const APOLOGY: &str =
    "I'm sorry, I wasn't able to complete your request right now. Please try again in a moment.";

/// Agent configuration
#[derive(Clone, Debug)]
pub struct AgentConfig {
    /// System prompt template
    pub system_prompt: String,

    /// Tool round-trips allowed, capped at [`MAX_TOOL_ITERATIONS`]
    pub max_iterations: usize,

    /// Backoff for sending the user's message
    pub retry: RetryPolicy,

    /// Generation options
    pub generation: GenerationOptions,

    /// Whether to append tool descriptions to system prompt
    pub inject_tool_descriptions: bool,

    /// Whether to append cached resource metadata to system prompt
    pub inject_metadata: bool,

    /// Deadline for a whole `generate_response` call
    pub request_timeout: Option<Duration>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.into(),
            max_iterations: MAX_TOOL_ITERATIONS,
            retry: RetryPolicy::default(),
            generation: GenerationOptions::default(),
            inject_tool_descriptions: true,
            inject_metadata: true,
            request_timeout: None,
        }
    }
}

const DEFAULT_SYSTEM_PROMPT: &str = r#"You are a helpful assistant with access to web search, web page extraction, a data store, and the user's documents, calendar and email.

Always reply with a single JSON object:
{"thoughts": "your private reasoning", "payload": {"function_call": {"name": "...", "arguments": {...}}}}
or, when you can answer:
{"thoughts": "your private reasoning", "payload": {"text": "your answer to the user"}}

Call at most one tool per reply. After receiving tool results, synthesize them into a helpful answer.
If you can answer directly without tools, do so.
Be concise and accurate."#;

/// Transient per-message loop state
#[derive(Debug, Default)]
struct StepState {
    response: ModelResponse,
    thoughts: Option<String>,
    function_call: Option<ToolCall>,
    iterations: usize,
    /// Last executed tool, paired with its result
    last_tool: Option<ToolResult>,
}

/// Await `future` unless `cancel` fires first
async fn cancellable<F: Future>(cancel: &CancellationToken, future: F) -> Result<F::Output> {
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(AgentError::Cancelled),
        output = future => Ok(output),
    }
}

/// The main Agent struct
pub struct Agent {
    provider: Arc<dyn LlmProvider>,
    tools: Arc<ToolRegistry>,
    metadata: Arc<MetadataCache>,
    config: AgentConfig,
}

impl Agent {
    /// Create a new agent
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        tools: Arc<ToolRegistry>,
        metadata: Arc<MetadataCache>,
        config: AgentConfig,
    ) -> Self {
        Self {
            provider,
            tools,
            metadata,
            config,
        }
    }

    /// Create with default configuration
    pub fn with_defaults(provider: Arc<dyn LlmProvider>, tools: Arc<ToolRegistry>) -> Self {
        let metadata = Arc::new(MetadataCache::with_defaults(tools.clone()));
        Self::new(provider, tools, metadata, AgentConfig::default())
    }

    /// Build the full system prompt for one conversation
    fn build_system_prompt(&self, session: Option<&SessionContext>) -> String {
        let mut prompt = self.config.system_prompt.clone();

        prompt.push_str(&format!(
            "\n\nToday's date is {}.",
            chrono::Utc::now().format("%A, %B %d, %Y")
        ));

        if let Some(session) = session {
            prompt.push('\n');
            prompt.push_str(&session.prompt_line());
        }

        if self.config.inject_tool_descriptions && !self.tools.is_empty() {
            prompt.push_str("\n\n");
            prompt.push_str(&self.tools.generate_prompt_section());
        }

        if self.config.inject_metadata {
            if let Some(section) = self.metadata.prompt_section() {
                prompt.push_str("\n\n");
                prompt.push_str(&section);
            }
        }

        prompt
    }

    /// Answer a user message. Always returns text, never an error.
    pub async fn generate_response(
        &self,
        history: &[ConversationTurn],
        user_message: &UserMessage,
        session: Option<&SessionContext>,
    ) -> String {
        self.generate_response_with_cancel(history, user_message, session, CancellationToken::new())
            .await
    }

    /// Like [`generate_response`](Self::generate_response), aborting the
    /// in-flight call when `cancel` fires or the configured deadline passes.
    pub async fn generate_response_with_cancel(
        &self,
        history: &[ConversationTurn],
        user_message: &UserMessage,
        session: Option<&SessionContext>,
        cancel: CancellationToken,
    ) -> String {
        let run = self.run(history, user_message, session, &cancel);

        let outcome = match self.config.request_timeout {
            Some(limit) => tokio::time::timeout(limit, run)
                .await
                .unwrap_or(Err(AgentError::Cancelled)),
            None => run.await,
        };

        outcome.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Agent run aborted");
            APOLOGY.into()
        })
    }

    /// Only returns `Err` on cancellation
    async fn run(
        &self,
        history: &[ConversationTurn],
        user_message: &UserMessage,
        session: Option<&SessionContext>,
        cancel: &CancellationToken,
    ) -> Result<String> {
        cancellable(cancel, self.metadata.ensure_prefetched()).await?;

        let mut channel = ChatSession::new(
            self.provider.clone(),
            self.build_system_prompt(session),
            self.tools.schemas(),
            self.config.generation.clone(),
            Conversation::from_turns(history),
        );

        let mut state = StepState {
            response: self.send_user_message(&mut channel, user_message, cancel).await?,
            ..Default::default()
        };

        let max_iterations = self.config.max_iterations.min(MAX_TOOL_ITERATIONS);

        while state.iterations < max_iterations {
            let interpretation = interpret(&state.response);
            if let Some(thoughts) = &interpretation.thoughts {
                tracing::debug!(%thoughts, "Model thoughts");
            }
            state.thoughts = interpretation.thoughts;

            let Some(call) = interpretation.function_call else {
                break;
            };
            state.iterations += 1;

            let result = self.execute_tool(&call, cancel).await?;
            let message = OutgoingMessage::function_response(&result.name, result.data.clone());
            state.function_call = Some(call);
            state.last_tool = Some(result);

            match cancellable(cancel, channel.send(&message)).await? {
                Ok(response) => state.response = response,
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to deliver tool result, ending loop");
                    break;
                }
            }
        }

        if state.iterations == max_iterations && interpret(&state.response).has_function_call() {
            tracing::warn!(iterations = state.iterations, "Tool iteration bound reached");
        }

        self.finish(&mut channel, state, cancel).await
    }

    /// Deliver the user's message, substituting the recovery message if it
    /// cannot be sent
    async fn send_user_message<C: ModelChannel>(
        &self,
        channel: &mut C,
        user_message: &UserMessage,
        cancel: &CancellationToken,
    ) -> Result<ModelResponse> {
        let message = OutgoingMessage::text(&user_message.content);

        match cancellable(cancel, send_with_retry(channel, &message, &self.config.retry)).await? {
            Ok(response) => Ok(response),
            Err(e) => {
                tracing::warn!(error = %e, "Could not send user message, sending recovery message");
                let recovery = OutgoingMessage::text(RECOVERY_MESSAGE);
                match cancellable(cancel, channel.send(&recovery)).await? {
                    Ok(response) => Ok(response),
                    Err(e) => {
                        tracing::warn!(error = %e, "Recovery message failed too");
                        Ok(ModelResponse::empty())
                    }
                }
            }
        }
    }

    /// Execute a tool call. Failures become error results for the model.
    async fn execute_tool(&self, call: &ToolCall, cancel: &CancellationToken) -> Result<ToolResult> {
        tracing::debug!(tool = %call.name, "Executing tool");

        let result = match cancellable(cancel, self.tools.execute(call)).await? {
            Ok(data) => ToolResult::success(&call.name, data),
            Err(e) => {
                tracing::warn!(tool = %call.name, error = %e, "Tool call failed, reporting to model");
                ToolResult::failure(&call.name, e.to_string())
            }
        };

        Ok(result.with_id(call.id.clone()))
    }

    /// Final answer, summary recovery, fallback digest, or apology
    async fn finish<C: ModelChannel>(
        &self,
        channel: &mut C,
        state: StepState,
        cancel: &CancellationToken,
    ) -> Result<String> {
        let text = extract_final_text(&state.response);
        if !text.is_empty() {
            tracing::info!(iterations = state.iterations, "Answered");
            return Ok(text);
        }

        tracing::debug!(thoughts = ?state.thoughts, "No final text, asking the model to summarize");
        channel.discard_unanswered_call();
        match cancellable(cancel, channel.send(&OutgoingMessage::text(SUMMARY_REQUEST))).await? {
            Ok(response) => {
                let text = extract_final_text(&response);
                if !text.is_empty() {
                    tracing::info!(iterations = state.iterations, "Answered after summary request");
                    return Ok(text);
                }
            }
            Err(e) => tracing::warn!(error = %e, "Summary request failed"),
        }

        if let Some(last) = state.last_tool.as_ref().filter(|result| result.success) {
            tracing::info!(tool = %last.name, "Falling back to formatted tool result");
            return Ok(fallback::format(&last.name, &last.data));
        }

        tracing::warn!(
            iterations = state.iterations,
            last_call = ?state.function_call.as_ref().map(|call| call.name.as_str()),
            last_error = ?state.last_tool.as_ref().and_then(ToolResult::error_message),
            "No answer could be produced"
        );
        Ok(APOLOGY.into())
    }

    /// Get the tool registry
    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn metadata(&self) -> &MetadataCache {
        &self.metadata
    }

    pub fn provider(&self) -> &Arc<dyn LlmProvider> {
        &self.provider
    }

    /// Get configuration
    pub fn config(&self) -> &AgentConfig {
        &self.config
    }
}

/// Builder for Agent configuration
pub struct AgentBuilder {
    provider: Option<Arc<dyn LlmProvider>>,
    tools: ToolRegistry,
    metadata: MetadataConfig,
    config: AgentConfig,
}

impl Default for AgentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentBuilder {
    pub fn new() -> Self {
        Self {
            provider: None,
            tools: ToolRegistry::new(),
            metadata: MetadataConfig::default(),
            config: AgentConfig::default(),
        }
    }

    pub fn provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn tool<T: Tool + 'static>(mut self, tool: T) -> Self {
        self.tools.register(tool);
        self
    }

    pub fn tools(mut self, tools: ToolRegistry) -> Self {
        self.tools = tools;
        self
    }

    pub fn metadata(mut self, metadata: MetadataConfig) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn config(mut self, config: AgentConfig) -> Self {
        self.config = config;
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = prompt.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.generation.model = model.into();
        self
    }

    pub fn temperature(mut self, temp: f32) -> Self {
        self.config.generation.temperature = temp;
        self
    }

    pub fn max_iterations(mut self, max: usize) -> Self {
        self.config.max_iterations = max;
        self
    }

    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.config.retry = retry;
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<Agent> {
        let provider = self.provider
            .ok_or_else(|| AgentError::Config("Provider is required".into()))?;

        let tools = Arc::new(self.tools);
        let metadata = Arc::new(MetadataCache::new(tools.clone(), self.metadata));

        Ok(Agent::new(provider, tools, metadata, self.config))
    }
}
