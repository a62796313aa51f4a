//! HTTP Handlers

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tracing::Instrument;

use agent_core::{ConversationTurn, SessionContext, ToolSchema, UserMessage};

use crate::state::AppState;

// ============================================================================
// Request / Response Types
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub provider: String,
    pub provider_connected: bool,
    pub tools: usize,
    pub metadata_ready: bool,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// Prior turns, oldest first
    #[serde(default)]
    pub history: Vec<ConversationTurn>,
    pub message: String,
    #[serde(default)]
    pub session: Option<SessionContext>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ToolsResponse {
    pub tools: Vec<ToolSchema>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let provider = state.agent.provider();
    let provider_connected = provider.health_check().await.unwrap_or(false);

    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        provider: provider.name().to_string(),
        provider_connected,
        tools: state.agent.tools().len(),
        metadata_ready: state.agent.metadata().is_initialized(),
    })
}

/// Registered tool schemas
pub async fn list_tools(State(state): State<AppState>) -> Json<ToolsResponse> {
    Json(ToolsResponse {
        tools: state.agent.tools().schemas(),
    })
}

/// Main chat endpoint. The agent always produces text, so only malformed
/// requests are rejected.
pub async fn chat_handler(
    State(state): State<AppState>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, (StatusCode, Json<ErrorResponse>)> {
    if payload.message.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "Message must not be empty".into(),
                code: "EMPTY_MESSAGE".into(),
            }),
        ));
    }

    let request_id = uuid::Uuid::new_v4();
    let span = tracing::info_span!(
        "chat",
        %request_id,
        user = payload.session.as_ref().map_or("anonymous", |s| s.user_id.as_str()),
        history = payload.history.len(),
    );

    let message = state
        .agent
        .generate_response(
            &payload.history,
            &UserMessage::new(payload.message),
            payload.session.as_ref(),
        )
        .instrument(span)
        .await;

    Ok(Json(ChatResponse { message }))
}
