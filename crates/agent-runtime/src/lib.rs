//! # agent-runtime
//!
//! Model providers for the assistant agent.
//!
//! ## Providers
//!
//! - **Gemini** (default): Google Generative Language API with native function calling
//! - **Ollama**: Local inference; tools are driven through the JSON text protocol
//!
//! ## Usage
//!
//! ```rust,ignore
//! use agent_runtime::gemini::GeminiProvider;
//!
//! let provider = GeminiProvider::from_env()?;
//! let agent = AgentBuilder::new()
//!     .provider(Arc::new(provider))
//!     .build()?;
//! ```

mod http;

#[cfg(feature = "gemini")]
pub mod gemini;

#[cfg(feature = "ollama")]
pub mod ollama;

#[cfg(feature = "gemini")]
pub use gemini::{GeminiConfig, GeminiProvider};

#[cfg(feature = "ollama")]
pub use ollama::{OllamaConfig, OllamaProvider};

// Re-export core types for convenience
pub use agent_core::{Agent, AgentBuilder, AgentError, LlmProvider, Result, ToolRegistry};
