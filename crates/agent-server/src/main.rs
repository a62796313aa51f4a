//! Assistant HTTP Server
//!
//! Axum-based server exposing the tool-calling agent over a small REST API.

mod config;
mod handlers;
mod state;

use std::sync::Arc;

use axum::{routing::{get, post}, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use agent_core::{AgentBuilder, LlmProvider, ToolRegistry};
use agent_runtime::{GeminiProvider, OllamaProvider};
use assistant_tools::{HttpToolBackend, ASSISTANT_PROMPT};

use crate::config::{ProviderKind, ServerConfig};
use crate::handlers::{chat_handler, health_check, list_tools};
use crate::state::AppState;

fn app(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/api/tools", get(list_tools))
        .route("/api/chat", post(chat_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn build_provider(config: &ServerConfig) -> anyhow::Result<Arc<dyn LlmProvider>> {
    Ok(match config.provider {
        ProviderKind::Gemini => Arc::new(GeminiProvider::from_env()?),
        ProviderKind::Ollama => Arc::new(OllamaProvider::from_env()?),
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env()?;

    // Initialize LLM provider
    let provider = build_provider(&config)?;
    match provider.health_check().await {
        Ok(true) => tracing::info!(provider = provider.name(), model = %config.model, "✓ Model provider reachable"),
        Ok(false) | Err(_) => {
            tracing::warn!(provider = provider.name(), "⚠ Model provider not reachable, chats will degrade to apologies");
        }
    }

    // Initialize tools
    let backend = Arc::new(HttpToolBackend::from_env()?);
    let mut tools = ToolRegistry::new();
    assistant_tools::register_all(&mut tools, backend);

    tracing::info!("Registered {} tools:", tools.len());
    for name in tools.names() {
        tracing::info!("  • {}", name);
    }

    let mut builder = AgentBuilder::new()
        .provider(provider)
        .tools(tools)
        .system_prompt(ASSISTANT_PROMPT)
        .model(config.model.clone());
    if let Some(timeout) = config.request_timeout {
        builder = builder.request_timeout(timeout);
    }
    let state = AppState::new(builder.build()?);

    // Warm the metadata cache; chats arriving meanwhile join the same prefetch
    let agent = state.agent.clone();
    tokio::spawn(async move { agent.metadata().ensure_prefetched().await });

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;

    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("🚀 assistant server running on http://{}", config.bind_addr);
    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health     - Health check");
    tracing::info!("  GET  /api/tools  - List tool schemas");
    tracing::info!("  POST /api/chat   - Send message");

    axum::serve(listener, app(state)).await?;

    Ok(())
}
