//! Model Channel
//!
//! A stateful chat with the model: each `send` delivers one message and
//! returns the model's reply. Only successful sends are committed to the
//! history, so a failed attempt can be resent unchanged.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::message::{Content, Conversation, OutgoingMessage, Part, Role};
use crate::provider::{GenerateRequest, GenerationOptions, LlmProvider, ModelResponse};
use crate::tool::ToolSchema;

/// Something the agent can send messages to
#[async_trait]
pub trait ModelChannel: Send {
    async fn send(&mut self, message: &OutgoingMessage) -> Result<ModelResponse>;

    /// Forget a trailing function call that will never get a response, so
    /// the next plain text message is a valid continuation
    fn discard_unanswered_call(&mut self) {}
}

/// Chat session over a stateless [`LlmProvider`]
pub struct ChatSession {
    provider: Arc<dyn LlmProvider>,
    system_prompt: String,
    tools: Vec<ToolSchema>,
    options: GenerationOptions,
    history: Conversation,
}

impl ChatSession {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        system_prompt: impl Into<String>,
        tools: Vec<ToolSchema>,
        options: GenerationOptions,
        history: Conversation,
    ) -> Self {
        Self {
            provider,
            system_prompt: system_prompt.into(),
            tools,
            options,
            history,
        }
    }

    pub fn history(&self) -> &Conversation {
        &self.history
    }

    /// History entry for a reply. Only the first native call is kept since
    /// it is the only one the agent answers, and providers expect one
    /// response per recorded call.
    fn response_content(response: &ModelResponse) -> Option<Content> {
        let mut parts: Vec<Part> = response
            .function_calls
            .first()
            .cloned()
            .map(Part::FunctionCall)
            .into_iter()
            .collect();
        if let Some(text) = response.text.as_ref().filter(|t| !t.is_empty()) {
            parts.push(Part::Text(text.clone()));
        }

        (!parts.is_empty()).then(|| Content::new(Role::Model, parts))
    }
}

#[async_trait]
impl ModelChannel for ChatSession {
    async fn send(&mut self, message: &OutgoingMessage) -> Result<ModelResponse> {
        let outgoing = message.to_content();

        let mut contents = self.history.messages().to_vec();
        contents.push(outgoing.clone());

        let request = GenerateRequest {
            system_prompt: self.system_prompt.clone(),
            contents,
            tools: self.tools.clone(),
            options: self.options.clone(),
        };

        let response = self.provider.generate(&request).await?;

        self.history.push(outgoing);
        if let Some(reply) = Self::response_content(&response) {
            self.history.push(reply);
        }

        Ok(response)
    }

    fn discard_unanswered_call(&mut self) {
        let Some(last) = self.history.last_mut() else {
            return;
        };
        if last.role != Role::Model {
            return;
        }

        last.parts.retain(|part| !matches!(part, Part::FunctionCall(_)));
        if last.parts.is_empty() {
            self.history.pop();
        }
    }
}
