//! HTTP Tool Backend
//!
//! Talks to the tool service over HTTP. GET arguments travel as a query
//! string, POST arguments as a JSON body.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::{Endpoint, Method, ToolBackend};
use crate::error::{Result, ToolsError};

/// Tool service configuration
#[derive(Clone, Debug)]
pub struct ToolsConfig {
    pub base_url: String,

    /// Sent as `x-api-key` when present
    pub api_key: Option<String>,

    /// Per-call timeout in seconds
    pub timeout_secs: u64,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:4000".into(),
            api_key: None,
            timeout_secs: 30,
        }
    }
}

impl ToolsConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: std::env::var("TOOLS_BASE_URL").unwrap_or(defaults.base_url),
            api_key: std::env::var("TOOLS_API_KEY").ok().filter(|k| !k.is_empty()),
            timeout_secs: std::env::var("TOOLS_TIMEOUT_SECS")
                .ok()
                .and_then(|t| t.parse().ok())
                .unwrap_or(defaults.timeout_secs),
        }
    }
}

pub struct HttpToolBackend {
    client: reqwest::Client,
    config: ToolsConfig,
}

impl HttpToolBackend {
    pub fn new(config: ToolsConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ToolsError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(ToolsConfig::from_env())
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path.trim_start_matches('/'))
    }
}

/// Query pairs; non-string values are JSON-encoded
fn query_pairs(args: &Map<String, Value>) -> Vec<(String, String)> {
    args.iter()
        .filter(|(_, value)| !value.is_null())
        .map(|(key, value)| {
            let text = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (key.clone(), text)
        })
        .collect()
}

#[async_trait]
impl ToolBackend for HttpToolBackend {
    async fn call(&self, endpoint: &Endpoint, args: &Map<String, Value>) -> Result<Value> {
        let (path, rest) = endpoint.resolve(args)?;
        let url = self.url(&path);

        let mut request = match endpoint.method {
            Method::Get => self.client.get(&url).query(&query_pairs(&rest)),
            Method::Post => self.client.post(&url).json(&rest),
        };
        if let Some(key) = &self.config.api_key {
            request = request.header("x-api-key", key);
        }

        tracing::debug!(method = %endpoint.method, %path, "Calling tool service");

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            tracing::warn!(%path, status = status.as_u16(), "Tool service error");
            return Err(ToolsError::Status {
                status: status.as_u16(),
                message: message.chars().take(300).collect(),
            });
        }

        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&body)?)
    }

    fn name(&self) -> &str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_url_joining() {
        let backend = HttpToolBackend::new(ToolsConfig {
            base_url: "http://tools.local/api/".into(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(backend.url("/search"), "http://tools.local/api/search");
    }

    #[test]
    fn test_query_pairs() {
        let args = json!({"query": "rust", "num": 3, "skip": null, "tags": ["a", "b"]});
        let mut pairs = query_pairs(args.as_object().unwrap());
        pairs.sort();
        assert_eq!(
            pairs,
            vec![
                ("num".to_string(), "3".to_string()),
                ("query".to_string(), "rust".to_string()),
                ("tags".to_string(), "[\"a\",\"b\"]".to_string()),
            ]
        );
    }
}
