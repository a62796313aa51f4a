//! End-to-end runs of the agent loop against a scripted provider.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use agent_core::mock::MockProvider;
use agent_core::{
    AgentBuilder, AgentError, FunctionCall, ModelResponse, ParameterSchema, Part, Result,
    RetryPolicy, Role, SessionContext, Tool, ToolCall, ToolRegistry, ToolSchema, UserMessage,
    APOLOGY,
};
use async_trait::async_trait;
use serde_json::{json, Value};

/// Weather search that counts its invocations
struct CountingSearch {
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl Tool for CountingSearch {
    fn schema(&self) -> ToolSchema {
        ToolSchema::new("googleSearch", "Search the web for current information")
            .param(ParameterSchema::required("query", "string", "Search query"))
            .category("search")
    }

    async fn execute(&self, call: &ToolCall) -> Result<Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let query = call.str_arg("query").unwrap_or_default();
        Ok(json!({
            "query": query,
            "results": [
                {"title": "Lusaka, Zambia weather", "snippet": "Currently 27°C and sunny."}
            ]
        }))
    }
}

fn answer(text: &str) -> ModelResponse {
    ModelResponse::from_text(json!({"thoughts": "I have what I need", "payload": {"text": text}}).to_string())
}

fn search_call(query: &str) -> ModelResponse {
    ModelResponse::from_text(format!(
        "```json\n{}\n```",
        json!({
            "thoughts": "I should look up the current weather",
            "payload": {"function_call": {"name": "googleSearch", "args": {"query": query}}}
        })
    ))
}

#[tokio::test]
async fn test_weather_question_uses_one_search() {
    let calls = Arc::new(AtomicUsize::new(0));
    let provider = Arc::new(MockProvider::new());
    provider.queue_response(search_call("weather in Lusaka right now"));
    provider.queue_response(answer("It's 27°C and sunny in Lusaka."));

    let agent = AgentBuilder::new()
        .provider(provider.clone())
        .tool(CountingSearch { calls: calls.clone() })
        .build()
        .unwrap();

    let reply = agent
        .generate_response(
            &[],
            &UserMessage::new("What's the weather like in Lusaka right now?"),
            Some(&SessionContext::new("user-42", "Mwila")),
        )
        .await;

    assert_eq!(reply, "It's 27°C and sunny in Lusaka.");
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let requests = provider.recorded_requests();
    assert_eq!(requests.len(), 2);

    // user message, model's call, tool result
    let second = &requests[1].contents;
    assert_eq!(second.len(), 3);
    assert_eq!(second[0].role, Role::User);
    assert_eq!(second[1].role, Role::Model);
    match &second[2].parts[0] {
        Part::FunctionResponse { name, response } => {
            assert_eq!(name, "googleSearch");
            assert_eq!(response["query"], "weather in Lusaka right now");
        }
        other => panic!("expected function response, got {other:?}"),
    }
}

#[tokio::test]
async fn test_native_function_call_round_trip() {
    let calls = Arc::new(AtomicUsize::new(0));
    let provider = Arc::new(MockProvider::new());
    provider.queue_response(ModelResponse::from_function_call(FunctionCall::new(
        "googleSearch",
        json!({"query": "Lusaka weather"}),
    )));
    provider.queue_response(answer("Sunny, 27°C."));

    let agent = AgentBuilder::new()
        .provider(provider)
        .tool(CountingSearch { calls: calls.clone() })
        .build()
        .unwrap();

    let reply = agent.generate_response(&[], &UserMessage::new("Weather?"), None).await;
    assert_eq!(reply, "Sunny, 27°C.");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_endless_tool_requests_stop_at_five() {
    let calls = Arc::new(AtomicUsize::new(0));
    let provider = Arc::new(MockProvider::new().with_fallback(search_call("again")));

    let agent = AgentBuilder::new()
        .provider(provider)
        .tool(CountingSearch { calls: calls.clone() })
        .build()
        .unwrap();

    let reply = agent.generate_response(&[], &UserMessage::new("Keep searching"), None).await;

    assert_eq!(calls.load(Ordering::SeqCst), 5);
    assert!(!reply.is_empty());
    assert!(reply.contains("Lusaka, Zambia weather"));
}

#[tokio::test(start_paused = true)]
async fn test_transient_failures_are_retried_with_backoff() {
    let provider = Arc::new(MockProvider::new());
    provider.queue_error(AgentError::Http { status: 503, message: "overloaded".into() });
    provider.queue_error(AgentError::Http { status: 500, message: "internal".into() });
    provider.queue_response(answer("Hello!"));

    let agent = AgentBuilder::new()
        .provider(provider.clone())
        .retry(RetryPolicy::new(3, Duration::from_millis(1000), 2.0))
        .build()
        .unwrap();

    let reply = agent.generate_response(&[], &UserMessage::new("Hi"), None).await;
    assert_eq!(reply, "Hello!");

    let times = provider.call_times();
    assert_eq!(times.len(), 3);
    assert_eq!(times[1] - times[0], Duration::from_millis(1000));
    assert_eq!(times[2] - times[1], Duration::from_millis(2000));
}

#[tokio::test(start_paused = true)]
async fn test_provider_outage_yields_apology() {
    let provider = Arc::new(MockProvider::new());
    for _ in 0..10 {
        provider.queue_error(AgentError::Http { status: 500, message: "down".into() });
    }

    let agent = AgentBuilder::new()
        .provider(provider.clone())
        .retry(RetryPolicy::new(2, Duration::from_millis(100), 2.0))
        .build()
        .unwrap();

    let reply = agent.generate_response(&[], &UserMessage::new("Anyone there?"), None).await;
    assert_eq!(reply, APOLOGY);
    // 3 attempts, recovery message, summary request
    assert_eq!(provider.call_count(), 5);
}

#[tokio::test]
async fn test_metadata_is_prefetched_once_and_injected() {
    let lists = Arc::new(AtomicUsize::new(0));
    let mut registry = ToolRegistry::new();
    let counter = lists.clone();
    registry.register_fn(ToolSchema::new("listModels", "List data models"), move |_args| {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(json!(["orders"]))
        }
    });
    registry.register_fn(
        ToolSchema::new("getModelSchema", "Schema of one data model")
            .param(ParameterSchema::required("modelName", "string", "Model name")),
        |_args| async move { Ok(json!({"total": "number", "customer": "string"})) },
    );

    let provider = Arc::new(MockProvider::new().with_fallback(answer("Done.")));
    let agent = Arc::new(
        AgentBuilder::new()
            .provider(provider.clone())
            .tools(registry)
            .build()
            .unwrap(),
    );

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let agent = agent.clone();
            tokio::spawn(async move {
                agent
                    .generate_response(&[], &UserMessage::new(format!("question {i}")), None)
                    .await
            })
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.await.unwrap(), "Done.");
    }

    assert_eq!(lists.load(Ordering::SeqCst), 1);
    let prompt = &provider.recorded_requests()[0].system_prompt;
    assert!(prompt.contains("orders"));
    assert!(prompt.contains("customer"));
}
