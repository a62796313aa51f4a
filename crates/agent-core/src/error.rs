//! Error Types

use thiserror::Error;

/// Result type alias for agent operations
pub type Result<T> = std::result::Result<T, AgentError>;

/// Agent error types
#[derive(Error, Debug)]
pub enum AgentError {
    /// LLM provider error
    #[error("Provider error: {0}")]
    Provider(String),

    /// Provider unavailable or not responding
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// Model backend answered with a non-success HTTP status
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// Tool not found in registry
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// A required tool argument was absent
    #[error("Missing required parameter '{parameter}' for tool '{tool}'")]
    MissingParameter { tool: String, parameter: String },

    /// Tool validation failed
    #[error("Tool validation error: {0}")]
    ToolValidation(String),

    /// Tool execution failed
    #[error("Tool execution error: {0}")]
    ToolExecution(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// The caller cancelled the request or its deadline passed
    #[error("Request cancelled")]
    Cancelled,

    /// Other/unknown error
    #[error("{0}")]
    Other(String),
}

impl AgentError {
    /// Server-side fault of the 500 class.
    ///
    /// This is the only class the retrying sender retries unconditionally.
    pub fn is_transient(&self) -> bool {
        matches!(self, AgentError::Http { status, .. } if (500..600).contains(status))
    }

    pub fn is_rate_limit(&self) -> bool {
        matches!(self, AgentError::Http { status: 429, .. })
    }
}

impl From<anyhow::Error> for AgentError {
    fn from(err: anyhow::Error) -> Self {
        AgentError::Other(err.to_string())
    }
}
