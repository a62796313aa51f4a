//! Error Types for the Tool Catalog

use agent_core::AgentError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ToolsError>;

#[derive(Error, Debug)]
pub enum ToolsError {
    #[error("Tool service returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("No response configured for {0}")]
    UnknownEndpoint(String),

    #[error("Invalid argument '{name}': {reason}")]
    InvalidArgument { name: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<ToolsError> for AgentError {
    fn from(err: ToolsError) -> Self {
        AgentError::ToolExecution(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_converts_to_tool_execution() {
        let err: AgentError = ToolsError::Status { status: 502, message: "upstream".into() }.into();
        match err {
            AgentError::ToolExecution(msg) => assert!(msg.contains("502")),
            other => panic!("unexpected {other:?}"),
        }
    }
}
