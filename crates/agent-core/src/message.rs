//! Conversation Messages
//!
//! Turn-level history supplied by callers, plus the richer part-based
//! content exchanged with the model channel.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Role of a message sender
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// User input
    User,
    /// Model response
    #[serde(alias = "assistant")]
    Model,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Model => write!(f, "model"),
        }
    }
}

/// A single turn of caller-owned history
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
}

impl ConversationTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn model(content: impl Into<String>) -> Self {
        Self { role: Role::Model, content: content.into() }
    }
}

/// The message a user just sent
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserMessage {
    pub content: String,
}

impl UserMessage {
    pub fn new(content: impl Into<String>) -> Self {
        Self { content: content.into() }
    }
}

/// Function call as surfaced natively by a provider.
///
/// `args` is kept raw; the interpreter normalizes it into a `ToolCall`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    #[serde(default)]
    pub args: Value,
}

impl FunctionCall {
    pub fn new(name: impl Into<String>, args: Value) -> Self {
        Self { name: name.into(), args }
    }
}

/// One piece of a model-channel message
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Part {
    Text(String),
    FunctionCall(FunctionCall),
    FunctionResponse { name: String, response: Value },
}

/// A role-tagged message in the channel history
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Content {
    pub role: Role,
    pub parts: Vec<Part>,
}

impl Content {
    pub fn new(role: Role, parts: Vec<Part>) -> Self {
        Self { role, parts }
    }

    pub fn user_text(text: impl Into<String>) -> Self {
        Self::new(Role::User, vec![Part::Text(text.into())])
    }

    pub fn model_text(text: impl Into<String>) -> Self {
        Self::new(Role::Model, vec![Part::Text(text.into())])
    }

    /// Concatenated text parts, if any
    pub fn text(&self) -> Option<String> {
        let texts: Vec<&str> = self
            .parts
            .iter()
            .filter_map(|p| match p {
                Part::Text(t) => Some(t.as_str()),
                _ => None,
            })
            .collect();

        if texts.is_empty() {
            None
        } else {
            Some(texts.concat())
        }
    }
}

impl From<&ConversationTurn> for Content {
    fn from(turn: &ConversationTurn) -> Self {
        Self::new(turn.role, vec![Part::Text(turn.content.clone())])
    }
}

/// What the agent sends to the model in a single step
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutgoingMessage {
    Text(String),
    FunctionResponse { name: String, response: Value },
}

impl OutgoingMessage {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    pub fn function_response(name: impl Into<String>, response: Value) -> Self {
        Self::FunctionResponse { name: name.into(), response }
    }

    /// The history entry this message becomes once delivered
    pub fn to_content(&self) -> Content {
        match self {
            Self::Text(text) => Content::user_text(text.clone()),
            Self::FunctionResponse { name, response } => Content::new(
                Role::User,
                vec![Part::FunctionResponse {
                    name: name.clone(),
                    response: response.clone(),
                }],
            ),
        }
    }
}

/// Channel-side conversation history
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Conversation {
    messages: Vec<Content>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from caller-owned turns
    pub fn from_turns(turns: &[ConversationTurn]) -> Self {
        Self {
            messages: turns.iter().map(Content::from).collect(),
        }
    }

    pub fn push(&mut self, message: Content) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[Content] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Content> {
        self.messages.last()
    }

    pub fn last_mut(&mut self) -> Option<&mut Content> {
        self.messages.last_mut()
    }

    pub fn pop(&mut self) -> Option<Content> {
        self.messages.pop()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
