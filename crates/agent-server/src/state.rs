//! Application State

use std::sync::Arc;

use agent_core::Agent;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// The agent, with its provider, tool registry and metadata cache
    pub agent: Arc<Agent>,
}

impl AppState {
    pub fn new(agent: Agent) -> Self {
        Self {
            agent: Arc::new(agent),
        }
    }
}
