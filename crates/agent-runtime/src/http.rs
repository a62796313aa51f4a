//! Shared request plumbing for HTTP providers.

use agent_core::error::{AgentError, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;

const ERROR_BODY_LIMIT: usize = 300;

/// Send `request` and decode a JSON body.
///
/// Non-success statuses become [`AgentError::Http`] so the retry layer can
/// tell server faults from client faults. Connection failures and timeouts
/// become [`AgentError::ProviderUnavailable`].
pub(crate) async fn send_json<T: DeserializeOwned>(
    provider: &str,
    request: reqwest::RequestBuilder,
) -> Result<T> {
    let response = request.send().await.map_err(|e| transport_error(provider, &e))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(AgentError::Http {
            status: status.as_u16(),
            message: format!("{}: {}", provider, error_message(&body)),
        });
    }

    response
        .json::<T>()
        .await
        .map_err(|e| AgentError::Provider(format!("{}: invalid response body: {}", provider, e)))
}

pub(crate) fn transport_error(provider: &str, error: &reqwest::Error) -> AgentError {
    if error.is_connect() || error.is_timeout() {
        AgentError::ProviderUnavailable(format!("{}: {}", provider, error))
    } else {
        AgentError::Provider(format!("{}: {}", provider, error))
    }
}

/// Best-effort message from an error body
fn error_message(body: &str) -> String {
    let parsed = serde_json::from_str::<Value>(body).ok();
    let message = parsed.as_ref().and_then(|value| {
        let error = value.get("error")?;
        error
            .get("message")
            .and_then(Value::as_str)
            .or_else(|| error.as_str())
            .map(str::to_string)
    });

    message.unwrap_or_else(|| body.chars().take(ERROR_BODY_LIMIT).collect())
}
