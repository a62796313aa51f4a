//! Mock Tool Backend
//!
//! For testing and demo purposes. Serves canned JSON per resolved path and
//! records every call.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::{Endpoint, Method, ToolBackend};
use crate::error::{Result, ToolsError};

/// A call the mock received
#[derive(Clone, Debug, PartialEq)]
pub struct RecordedCall {
    pub method: Method,
    pub path: String,
    pub args: Map<String, Value>,
}

enum Canned {
    Json(Value),
    Status(u16, String),
}

#[derive(Default)]
pub struct MockToolBackend {
    responses: Mutex<HashMap<String, Canned>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockToolBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `value` for `path`
    pub fn with_response(self, path: impl Into<String>, value: Value) -> Self {
        self.set_response(path, value);
        self
    }

    /// Fail `path` with `status`
    pub fn with_status(self, path: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        self.lock_responses()
            .insert(path.into(), Canned::Status(status, message.into()));
        self
    }

    pub fn set_response(&self, path: impl Into<String>, value: Value) {
        self.lock_responses().insert(path.into(), Canned::Json(value));
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap_or_else(std::sync::PoisonError::into_inner).clone()
    }

    fn lock_responses(&self) -> std::sync::MutexGuard<'_, HashMap<String, Canned>> {
        self.responses.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[async_trait]
impl ToolBackend for MockToolBackend {
    async fn call(&self, endpoint: &Endpoint, args: &Map<String, Value>) -> Result<Value> {
        let (path, rest) = endpoint.resolve(args)?;

        self.calls
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(RecordedCall {
                method: endpoint.method,
                path: path.clone(),
                args: rest,
            });

        match self.lock_responses().get(&path) {
            Some(Canned::Json(value)) => Ok(value.clone()),
            Some(Canned::Status(status, message)) => Err(ToolsError::Status {
                status: *status,
                message: message.clone(),
            }),
            None => Err(ToolsError::UnknownEndpoint(format!("{} {}", endpoint.method, path))),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_mock_backend() {
        let backend = MockToolBackend::new()
            .with_response("/datastore/models", json!(["orders"]))
            .with_status("/emails/send", 503, "mail relay down");

        let models = backend.call(&Endpoint::get("/datastore/models"), &Map::new()).await.unwrap();
        assert_eq!(models, json!(["orders"]));

        let sent = backend.call(&Endpoint::post("/emails/send"), &Map::new()).await;
        assert!(matches!(sent, Err(ToolsError::Status { status: 503, .. })));

        let unknown = backend.call(&Endpoint::get("/nowhere"), &Map::new()).await;
        assert!(matches!(unknown, Err(ToolsError::UnknownEndpoint(_))));

        assert_eq!(backend.calls().len(), 3);
        assert_eq!(backend.calls()[1].method, Method::Post);
    }
}
