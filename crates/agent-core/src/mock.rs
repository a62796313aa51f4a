//! Mock provider for testing.
//!
//! [`MockProvider`] is a queue-based fake: tests push the responses and
//! errors it should return, then assert on the requests it recorded.
//! When the queue runs dry it answers with the configured fallback
//! response, or an error if there is none.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::error::{AgentError, Result};
use crate::provider::{GenerateRequest, LlmProvider, ModelResponse};

#[derive(Default)]
pub struct MockProvider {
    responses: Mutex<VecDeque<Result<ModelResponse>>>,
    fallback: Option<ModelResponse>,
    delay: Option<Duration>,
    requests: Mutex<Vec<GenerateRequest>>,
    call_times: Mutex<Vec<Instant>>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Response returned whenever the queue is empty
    pub fn with_fallback(mut self, response: ModelResponse) -> Self {
        self.fallback = Some(response);
        self
    }

    /// Sleep this long inside every call
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn queue_response(&self, response: ModelResponse) {
        self.responses.lock().unwrap_or_else(PoisonError::into_inner).push_back(Ok(response));
    }

    pub fn queue_error(&self, error: AgentError) {
        self.responses.lock().unwrap_or_else(PoisonError::into_inner).push_back(Err(error));
    }

    pub fn recorded_requests(&self) -> Vec<GenerateRequest> {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// When each call started, on the tokio clock
    pub fn call_times(&self) -> Vec<Instant> {
        self.call_times.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    async fn generate(&self, request: &GenerateRequest) -> Result<ModelResponse> {
        self.call_times.lock().unwrap_or_else(PoisonError::into_inner).push(Instant::now());
        self.requests.lock().unwrap_or_else(PoisonError::into_inner).push(request.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let next = self.responses.lock().unwrap_or_else(PoisonError::into_inner).pop_front();
        match next {
            Some(result) => result,
            None => self
                .fallback
                .clone()
                .ok_or_else(|| AgentError::Provider("mock response queue is empty".into())),
        }
    }
}
