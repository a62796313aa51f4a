//! # assistant-tools
//!
//! The assistant's tool catalog: web search and extraction, a queryable data
//! store, and the user's documents, calendar and email. Each tool forwards
//! its arguments to one endpoint of the tool service.
//!
//! ```text
//! ┌────────────┐   ToolCall   ┌────────────┐  Endpoint + args  ┌─────────────┐
//! │ ToolRegistry│────────────▶│ RemoteTool │──────────────────▶│ ToolBackend │
//! └────────────┘              └────────────┘                   └─────────────┘
//!                                                               HTTP  │  Mock
//! ```

pub mod backend;
pub mod catalog;
pub mod error;
pub mod remote;

pub use backend::{Endpoint, HttpToolBackend, Method, MockToolBackend, ToolBackend, ToolsConfig};
pub use catalog::register_all;
pub use error::{Result, ToolsError};
pub use remote::RemoteTool;

/// System prompt for the assistant agent
pub const ASSISTANT_PROMPT: &str = r#"You are a capable personal assistant. You can search the web, read web pages, query the user's data store, and work with their documents, calendar and email.

## How to Work

1. Prefer tools over guessing for anything current, personal or data-driven.
2. For data questions, check the available data models and their schemas below before writing a query or aggregation.
3. Read a page with `extractWebContent` when a search snippet is not enough.
4. Before `sendEmail` or `createCalendarEvent`, make sure the user asked for it explicitly.
5. Call at most one tool per reply and wait for its result.

## Reply Format

Always reply with a single JSON object. To call a tool:
{"thoughts": "your private reasoning", "payload": {"function_call": {"name": "...", "arguments": {...}}}}

To answer the user:
{"thoughts": "your private reasoning", "payload": {"text": "your answer"}}

Keep answers short and cite sources when they come from the web."#;
