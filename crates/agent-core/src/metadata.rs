//! Metadata Cache
//!
//! Resource names and their schemas, fetched once through the registry's
//! introspection tools and reused for the life of the process.
//!
//! The prefetch is single-flight: callers arriving while it runs await the
//! same shared future. A failed listing leaves the cache empty so a later
//! caller can try again.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::future::{BoxFuture, FutureExt, Shared};
use serde_json::{Map, Value};

use crate::tool::{ToolCall, ToolRegistry};

/// Which tools the cache introspects through
#[derive(Clone, Debug)]
pub struct MetadataConfig {
    /// Tool returning the list of resource names
    pub list_tool: String,

    /// Tool returning one resource's schema
    pub schema_tool: String,

    /// Argument of `schema_tool` that carries the resource name
    pub schema_argument: String,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            list_tool: "listModels".into(),
            schema_tool: "getModelSchema".into(),
            schema_argument: "modelName".into(),
        }
    }
}

/// Cached introspection results
#[derive(Clone, Debug, Default)]
pub struct Metadata {
    pub resource_names: Vec<String>,
    pub schemas: HashMap<String, Value>,
}

impl Metadata {
    /// System prompt section describing the cached resources
    pub fn prompt_section(&self) -> String {
        let mut section = String::from("## Available Data Models\n\n");
        section.push_str(&self.resource_names.join(", "));
        section.push_str("\n\n");

        for name in &self.resource_names {
            if let Some(schema) = self.schemas.get(name) {
                let rendered = serde_json::to_string_pretty(schema).unwrap_or_else(|_| schema.to_string());
                section.push_str(&format!("### {}\n```json\n{}\n```\n\n", name, rendered));
            }
        }

        section
    }
}

type PrefetchFuture = Shared<BoxFuture<'static, Option<Arc<Metadata>>>>;

enum CacheState {
    Empty,
    InFlight(PrefetchFuture),
    Ready(Arc<Metadata>),
}

pub struct MetadataCache {
    registry: Arc<ToolRegistry>,
    config: MetadataConfig,
    state: Mutex<CacheState>,
}

impl MetadataCache {
    pub fn new(registry: Arc<ToolRegistry>, config: MetadataConfig) -> Self {
        Self {
            registry,
            config,
            state: Mutex::new(CacheState::Empty),
        }
    }

    pub fn with_defaults(registry: Arc<ToolRegistry>) -> Self {
        Self::new(registry, MetadataConfig::default())
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Populate the cache if it is not already. Never fails.
    pub async fn ensure_prefetched(&self) {
        let in_flight = {
            let mut state = self.lock();
            match &*state {
                CacheState::Ready(_) => return,
                CacheState::InFlight(running) => running.clone(),
                CacheState::Empty => {
                    tracing::debug!(tool = %self.config.list_tool, "Starting metadata prefetch");
                    let started = prefetch(self.registry.clone(), self.config.clone())
                        .boxed()
                        .shared();
                    *state = CacheState::InFlight(started.clone());
                    started
                }
            }
        };

        let outcome = in_flight.clone().await;

        let mut state = self.lock();
        let still_current =
            matches!(&*state, CacheState::InFlight(running) if running.ptr_eq(&in_flight));
        if still_current {
            *state = match outcome {
                Some(metadata) => CacheState::Ready(metadata),
                None => CacheState::Empty,
            };
        }
    }

    pub fn is_initialized(&self) -> bool {
        matches!(&*self.lock(), CacheState::Ready(_))
    }

    pub fn snapshot(&self) -> Option<Arc<Metadata>> {
        match &*self.lock() {
            CacheState::Ready(metadata) => Some(metadata.clone()),
            _ => None,
        }
    }

    pub fn resource_names(&self) -> Vec<String> {
        self.snapshot()
            .map(|m| m.resource_names.clone())
            .unwrap_or_default()
    }

    pub fn schema(&self, name: &str) -> Option<Value> {
        self.snapshot().and_then(|m| m.schemas.get(name).cloned())
    }

    /// Prompt section, once the cache holds at least one resource
    pub fn prompt_section(&self) -> Option<String> {
        self.snapshot()
            .filter(|m| !m.resource_names.is_empty())
            .map(|m| m.prompt_section())
    }
}

async fn prefetch(registry: Arc<ToolRegistry>, config: MetadataConfig) -> Option<Arc<Metadata>> {
    let listing = match registry.execute(&ToolCall::new(&config.list_tool, Map::new())).await {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(tool = %config.list_tool, error = %e, "Metadata prefetch failed, continuing without it");
            return None;
        }
    };

    let resource_names = resource_names_from(&listing);
    let mut schemas = HashMap::new();

    for name in &resource_names {
        let mut args = Map::new();
        args.insert(config.schema_argument.clone(), Value::String(name.clone()));

        match registry.execute(&ToolCall::new(&config.schema_tool, args)).await {
            Ok(schema) => {
                schemas.insert(name.clone(), schema);
            }
            Err(e) => {
                tracing::debug!(resource = %name, error = %e, "Skipping schema");
            }
        }
    }

    tracing::info!(
        resources = resource_names.len(),
        schemas = schemas.len(),
        "Metadata cache initialized"
    );

    Some(Arc::new(Metadata {
        resource_names,
        schemas,
    }))
}

/// Names from a listing result: an array of strings or `{name}` objects,
/// optionally wrapped in an object.
pub(crate) fn resource_names_from(listing: &Value) -> Vec<String> {
    let items = match listing {
        Value::Array(items) => items,
        Value::Object(map) => match ["models", "resources", "names", "data"]
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_array))
        {
            Some(items) => items,
            None => return Vec::new(),
        },
        _ => return Vec::new(),
    };

    items
        .iter()
        .filter_map(|item| match item {
            Value::String(name) => Some(name.clone()),
            Value::Object(obj) => obj.get("name").and_then(Value::as_str).map(str::to_string),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AgentError;
    use crate::tool::{ParameterSchema, ToolSchema};
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    struct Counters {
        lists: Arc<AtomicUsize>,
        list_fails: Arc<AtomicBool>,
    }

    fn registry() -> (Arc<ToolRegistry>, Counters) {
        let lists = Arc::new(AtomicUsize::new(0));
        let list_fails = Arc::new(AtomicBool::new(false));

        let mut registry = ToolRegistry::new();
        let (count, fails) = (lists.clone(), list_fails.clone());
        registry.register_fn(ToolSchema::new("listModels", "List models"), move |_args| {
            let (count, fails) = (count.clone(), fails.clone());
            async move {
                count.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(50)).await;
                if fails.load(Ordering::SeqCst) {
                    Err(AgentError::ToolExecution("backend down".into()))
                } else {
                    Ok(json!({"models": ["orders", {"name": "customers"}, "broken"]}))
                }
            }
        });
        registry.register_fn(
            ToolSchema::new("getModelSchema", "Schema")
                .param(ParameterSchema::required("modelName", "string", "Model")),
            |args| async move {
                match args.get("modelName").and_then(Value::as_str) {
                    Some("broken") => Err(AgentError::ToolExecution("no schema".into())),
                    Some(name) => Ok(json!({"model": name, "fields": {"id": "string"}})),
                    None => Err(AgentError::ToolValidation("modelName".into())),
                }
            },
        );

        (Arc::new(registry), Counters { lists, list_fails })
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_callers_share_one_prefetch() {
        let (registry, counters) = registry();
        let cache = Arc::new(MetadataCache::with_defaults(registry));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = cache.clone();
                tokio::spawn(async move { cache.ensure_prefetched().await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(counters.lists.load(Ordering::SeqCst), 1);
        assert!(cache.is_initialized());

        cache.ensure_prefetched().await;
        assert_eq!(counters.lists.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_schema_is_skipped() {
        let (registry, _counters) = registry();
        let cache = MetadataCache::with_defaults(registry);
        cache.ensure_prefetched().await;

        assert_eq!(cache.resource_names(), vec!["orders", "customers", "broken"]);
        assert!(cache.schema("orders").is_some());
        assert!(cache.schema("broken").is_none());

        let section = cache.prompt_section().unwrap();
        assert!(section.contains("### customers"));
        assert!(!section.contains("### broken"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_listing_leaves_cache_retryable() {
        let (registry, counters) = registry();
        counters.list_fails.store(true, Ordering::SeqCst);
        let cache = MetadataCache::with_defaults(registry);

        cache.ensure_prefetched().await;
        assert!(!cache.is_initialized());
        assert!(cache.resource_names().is_empty());
        assert!(cache.prompt_section().is_none());

        counters.list_fails.store(false, Ordering::SeqCst);
        cache.ensure_prefetched().await;
        assert!(cache.is_initialized());
        assert_eq!(counters.lists.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_missing_list_tool_degrades() {
        let cache = MetadataCache::with_defaults(Arc::new(ToolRegistry::new()));
        cache.ensure_prefetched().await;
        assert!(!cache.is_initialized());
    }

    #[test]
    fn test_resource_names_shapes() {
        assert_eq!(resource_names_from(&json!(["a", "b"])), vec!["a", "b"]);
        assert_eq!(resource_names_from(&json!({"resources": [{"name": "x"}]})), vec!["x"]);
        assert!(resource_names_from(&json!("nope")).is_empty());
    }
}
