//! Tool Catalog
//!
//! Every tool the assistant can call, each bound to one tool-service
//! endpoint.

mod datastore;
mod search;
mod workspace;

use std::sync::Arc;

use agent_core::{ToolRegistry, ToolSchema};

use crate::backend::{Endpoint, ToolBackend};
use crate::remote::RemoteTool;

/// All tool definitions, in registration order
pub fn definitions() -> Vec<(ToolSchema, Endpoint)> {
    let mut all = search::definitions();
    all.extend(datastore::definitions());
    all.extend(workspace::definitions());
    all
}

/// Register the whole catalog against `backend`
pub fn register_all(registry: &mut ToolRegistry, backend: Arc<dyn ToolBackend>) {
    for (schema, endpoint) in definitions() {
        registry.register(RemoteTool::new(schema, endpoint, backend.clone()));
    }
    tracing::info!(tools = registry.len(), backend = backend.name(), "Tool catalog registered");
}
