//! Remote Tool
//!
//! Adapts one tool-service endpoint to `agent_core::Tool`.

use std::sync::Arc;

use agent_core::{Result as CoreResult, Tool, ToolCall, ToolSchema};
use async_trait::async_trait;
use serde_json::Value;

use crate::backend::{Endpoint, ToolBackend};

pub struct RemoteTool {
    schema: ToolSchema,
    endpoint: Endpoint,
    backend: Arc<dyn ToolBackend>,
}

impl RemoteTool {
    pub fn new(schema: ToolSchema, endpoint: Endpoint, backend: Arc<dyn ToolBackend>) -> Self {
        Self {
            schema,
            endpoint,
            backend,
        }
    }
}

#[async_trait]
impl Tool for RemoteTool {
    fn schema(&self) -> ToolSchema {
        self.schema.clone()
    }

    async fn execute(&self, call: &ToolCall) -> CoreResult<Value> {
        // absent optionals are dropped rather than sent as null
        let mut args = call.arguments.clone();
        args.retain(|_, value| !value.is_null());

        for param in &self.schema.parameters {
            if let Some(default) = &param.default {
                args.entry(param.name.clone()).or_insert_with(|| default.clone());
            }
        }

        let result = self.backend.call(&self.endpoint, &args).await?;

        tracing::debug!(
            tool = %self.schema.name,
            backend = self.backend.name(),
            "Tool call completed"
        );

        Ok(result)
    }
}
