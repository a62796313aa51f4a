//! Retrying Request Sender
//!
//! Resends a message to the model with exponential backoff when the failure
//! is a transient server-side fault. Anything else propagates at once.

use std::time::Duration;

use crate::channel::ModelChannel;
use crate::error::{AgentError, Result};
use crate::message::OutgoingMessage;
use crate::provider::ModelResponse;

/// Backoff schedule for model sends
#[derive(Clone, Debug)]
pub struct RetryPolicy {
    /// Re-sends allowed after the first attempt
    pub retries: u32,

    /// Delay before the first retry
    pub initial_delay: Duration,

    /// Multiplier applied per retry
    pub backoff_factor: f64,

    /// Also retry HTTP 429 / rate-limit errors
    pub retry_rate_limits: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 5,
            initial_delay: Duration::from_millis(1000),
            backoff_factor: 2.0,
            retry_rate_limits: false,
        }
    }
}

impl RetryPolicy {
    pub fn new(retries: u32, initial_delay: Duration, backoff_factor: f64) -> Self {
        Self {
            retries,
            initial_delay,
            backoff_factor,
            ..Default::default()
        }
    }

    /// No retries at all
    pub fn none() -> Self {
        Self::new(0, Duration::ZERO, 1.0)
    }

    /// Delay before retry `n` (1-based): `initial * factor^(n-1)`
    pub fn delay_for_retry(&self, n: u32) -> Duration {
        let exponent = i32::try_from(n.saturating_sub(1)).unwrap_or(i32::MAX);
        self.initial_delay.mul_f64(self.backoff_factor.powi(exponent))
    }

    pub fn should_retry(&self, error: &AgentError) -> bool {
        error.is_transient() || (self.retry_rate_limits && error.is_rate_limit())
    }
}

/// Send `message`, retrying transient failures per `policy`.
///
/// The message is resent unchanged; after the last retry the final error
/// is returned.
pub async fn send_with_retry<C>(
    channel: &mut C,
    message: &OutgoingMessage,
    policy: &RetryPolicy,
) -> Result<ModelResponse>
where
    C: ModelChannel + ?Sized,
{
    let mut retry = 0;

    loop {
        match channel.send(message).await {
            Ok(response) => return Ok(response),
            Err(error) if retry < policy.retries && policy.should_retry(&error) => {
                retry += 1;
                let delay = policy.delay_for_retry(retry);
                tracing::warn!(
                    retry,
                    max_retries = policy.retries,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    error = %error,
                    "Transient model error, retrying"
                );
                tokio::time::sleep(delay).await;
            }
            Err(error) => {
                if retry > 0 {
                    tracing::warn!(retries = retry, error = %error, "Giving up on model send");
                }
                return Err(error);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::ChatSession;
    use crate::message::Conversation;
    use crate::mock::MockProvider;
    use crate::provider::GenerationOptions;
    use std::sync::Arc;

    fn chat(provider: Arc<MockProvider>) -> ChatSession {
        ChatSession::new(provider, "", Vec::new(), GenerationOptions::default(), Conversation::new())
    }

    fn server_error() -> AgentError {
        AgentError::Http { status: 500, message: "internal".into() }
    }

    #[test]
    fn test_delay_schedule() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for_retry(1), Duration::from_millis(1000));
        assert_eq!(policy.delay_for_retry(2), Duration::from_millis(2000));
        assert_eq!(policy.delay_for_retry(5), Duration::from_millis(16000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_then_propagate() {
        let provider = Arc::new(MockProvider::new());
        for _ in 0..4 {
            provider.queue_error(server_error());
        }
        let mut channel = chat(provider.clone());
        let policy = RetryPolicy::new(3, Duration::from_millis(1000), 2.0);

        let err = send_with_retry(&mut channel, &OutgoingMessage::text("hi"), &policy)
            .await
            .unwrap_err();
        assert!(err.is_transient());

        let times = provider.call_times();
        assert_eq!(times.len(), 4);
        assert_eq!(times[1] - times[0], Duration::from_millis(1000));
        assert_eq!(times[2] - times[1], Duration::from_millis(2000));
        assert_eq!(times[3] - times[2], Duration::from_millis(4000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_transient_is_not_retried() {
        let provider = Arc::new(MockProvider::new());
        provider.queue_error(AgentError::Http { status: 400, message: "bad".into() });
        let mut channel = chat(provider.clone());

        let result =
            send_with_retry(&mut channel, &OutgoingMessage::text("hi"), &RetryPolicy::default()).await;
        assert!(matches!(result, Err(AgentError::Http { status: 400, .. })));
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_retry_is_opt_in() {
        let provider = Arc::new(MockProvider::new());
        provider.queue_error(AgentError::Http { status: 429, message: "slow".into() });
        let mut channel = chat(provider.clone());
        let result =
            send_with_retry(&mut channel, &OutgoingMessage::text("hi"), &RetryPolicy::default()).await;
        assert!(result.is_err());
        assert_eq!(provider.call_count(), 1);

        let provider = Arc::new(MockProvider::new());
        provider.queue_error(AgentError::Http { status: 429, message: "slow".into() });
        provider.queue_response(ModelResponse::from_text("ok"));
        let mut channel = chat(provider.clone());
        let policy = RetryPolicy {
            retry_rate_limits: true,
            ..Default::default()
        };
        let response = send_with_retry(&mut channel, &OutgoingMessage::text("hi"), &policy)
            .await
            .unwrap();
        assert_eq!(response.text.as_deref(), Some("ok"));
        assert_eq!(provider.call_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_and_resends_same_message() {
        let provider = Arc::new(MockProvider::new());
        provider.queue_error(server_error());
        provider.queue_error(server_error());
        provider.queue_response(ModelResponse::from_text("finally"));
        let mut channel = chat(provider.clone());

        let response =
            send_with_retry(&mut channel, &OutgoingMessage::text("hello"), &RetryPolicy::default())
                .await
                .unwrap();
        assert_eq!(response.text.as_deref(), Some("finally"));

        let requests = provider.recorded_requests();
        assert_eq!(requests.len(), 3);
        for request in &requests {
            assert_eq!(request.contents.len(), 1);
            assert_eq!(request.contents[0].text().as_deref(), Some("hello"));
        }
        assert_eq!(channel.history().len(), 2);
    }
}
