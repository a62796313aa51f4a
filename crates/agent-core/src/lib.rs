//! # agent-core
//!
//! Tool-calling conversational agent: a bounded reasoning loop over a
//! provider-agnostic model interface and a registry of named tools.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                             Agent                                │
//! │  ┌─────────────┐  ┌──────────────┐  ┌──────────────────────────┐ │
//! │  │  Reasoning  │  │ Interpreter  │  │  ChatSession + Retry     │ │
//! │  │    Loop     │──│  / Fallback  │  │  ──▶ LlmProvider         │ │
//! │  └──────┬──────┘  └──────────────┘  └──────────────────────────┘ │
//! │         │         ┌──────────────┐  ┌──────────────────────────┐ │
//! │         └─────────│ ToolRegistry │──│  MetadataCache           │ │
//! │                   └──────────────┘  └──────────────────────────┘ │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The `LlmProvider` trait lets Gemini, Ollama or a scripted mock sit
//! behind the same loop without changing agent logic.

pub mod channel;
pub mod error;
pub mod fallback;
pub mod interpreter;
pub mod message;
pub mod metadata;
pub mod mock;
pub mod provider;
pub mod reasoning;
pub mod retry;
pub mod session;
pub mod tool;

pub use channel::{ChatSession, ModelChannel};
pub use error::{AgentError, Result};
pub use interpreter::{extract_final_text, interpret, Interpretation};
pub use message::{
    Content, Conversation, ConversationTurn, FunctionCall, OutgoingMessage, Part, Role, UserMessage,
};
pub use metadata::{MetadataCache, MetadataConfig};
pub use provider::{GenerateRequest, GenerationOptions, LlmProvider, ModelResponse};
pub use reasoning::{Agent, AgentBuilder, AgentConfig, APOLOGY, MAX_TOOL_ITERATIONS};
pub use retry::{send_with_retry, RetryPolicy};
pub use session::SessionContext;
pub use tool::{FnTool, ParameterSchema, Tool, ToolCall, ToolRegistry, ToolResult, ToolSchema};
