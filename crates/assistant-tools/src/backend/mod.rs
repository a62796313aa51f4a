//! Tool Service Backends
//!
//! Every catalog tool is a thin wrapper over one endpoint of the tool
//! service. The backend is the seam: HTTP in production, canned responses
//! in tests.

mod http;
mod mock;

pub use http::{HttpToolBackend, ToolsConfig};
pub use mock::{MockToolBackend, RecordedCall};

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::{Result, ToolsError};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Method::Get => write!(f, "GET"),
            Method::Post => write!(f, "POST"),
        }
    }
}

/// One route on the tool service. `{name}` segments in the path are filled
/// from the call's arguments.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Endpoint {
    pub method: Method,
    pub path: String,
}

impl Endpoint {
    pub fn get(path: impl Into<String>) -> Self {
        Self { method: Method::Get, path: path.into() }
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self { method: Method::Post, path: path.into() }
    }

    /// Fill path placeholders, returning the concrete path and the
    /// arguments left over for the query or body. Values are
    /// percent-encoded so each fills exactly one segment.
    pub fn resolve(&self, args: &Map<String, Value>) -> Result<(String, Map<String, Value>)> {
        let mut rest = args.clone();

        let segments = self
            .path
            .split('/')
            .map(|segment| {
                let Some(name) = segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) else {
                    return Ok(segment.to_string());
                };
                let value = rest.remove(name).ok_or_else(|| ToolsError::InvalidArgument {
                    name: name.to_string(),
                    reason: "required in path".into(),
                })?;
                let text = match value {
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                if text.is_empty() || text.contains('/') || text == "." || text == ".." {
                    return Err(ToolsError::InvalidArgument {
                        name: name.to_string(),
                        reason: "must be a non-empty path segment".into(),
                    });
                }
                Ok(urlencoding::encode(&text).into_owned())
            })
            .collect::<Result<Vec<_>>>()?;

        Ok((segments.join("/"), rest))
    }
}

/// Something that can serve tool endpoints
#[async_trait]
pub trait ToolBackend: Send + Sync {
    async fn call(&self, endpoint: &Endpoint, args: &Map<String, Value>) -> Result<Value>;

    /// Backend name for logging
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_resolve_plain_path() {
        let (path, rest) = Endpoint::get("/search").resolve(&args(json!({"query": "rust"}))).unwrap();
        assert_eq!(path, "/search");
        assert_eq!(rest.get("query"), Some(&json!("rust")));
    }

    #[test]
    fn test_resolve_placeholder() {
        let endpoint = Endpoint::post("/datastore/models/{modelName}/query");
        let (path, rest) = endpoint
            .resolve(&args(json!({"modelName": "orders", "limit": 5})))
            .unwrap();
        assert_eq!(path, "/datastore/models/orders/query");
        assert!(!rest.contains_key("modelName"));
        assert_eq!(rest.get("limit"), Some(&json!(5)));
    }

    #[test]
    fn test_resolve_rejects_bad_segments() {
        let endpoint = Endpoint::get("/documents/{documentId}");
        assert!(endpoint.resolve(&Map::new()).is_err());
        assert!(endpoint.resolve(&args(json!({"documentId": "../etc"}))).is_err());
        assert!(endpoint.resolve(&args(json!({"documentId": ".."}))).is_err());
    }

    #[test]
    fn test_resolve_encodes_reserved_characters() {
        let endpoint = Endpoint::get("/documents/{documentId}");
        let (path, _) = endpoint
            .resolve(&args(json!({"documentId": "notes?draft=1#top"})))
            .unwrap();
        assert_eq!(path, "/documents/notes%3Fdraft%3D1%23top");

        let (path, _) = endpoint.resolve(&args(json!({"documentId": "q3 plan"}))).unwrap();
        assert_eq!(path, "/documents/q3%20plan");
    }
}
