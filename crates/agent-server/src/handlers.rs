//! HTTP Handlers

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use agent_core::{
    AgentKind, RouteMode, Session, SessionId, SessionSnapshot, SessionStore, TurnStatus,
    Utterance, session::SharedSession,
};

use crate::requirements::{RequirementsTask, UNKNOWN_AGENT_TYPE};
use crate::state::AppState;

// ============================================================================
// Request / Response Types
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub llm_backend: &'static str,
    pub llm_reachable: bool,
}

#[derive(Debug, Deserialize)]
pub struct RunRequest {
    pub user_input: String,
    pub agent_type: String,
}

#[derive(Debug, Serialize)]
pub struct RunResponse {
    pub result: String,
}

#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    pub message: String,
    #[serde(default)]
    pub mode: RouteMode,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub reply: String,
    pub agent: AgentKind,
    pub outcome: TurnStatus,
    pub session: SessionSnapshot,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, code: &str, error: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
            code: code.into(),
        }),
    )
}

async fn find_session(state: &AppState, id: &str) -> Result<SharedSession, ApiError> {
    state
        .sessions
        .get(&SessionId::from_string(id))
        .await
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "SESSION_NOT_FOUND", format!("Session {id} not found")))
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let llm_reachable = match state.provider() {
        Ok(provider) => provider.health_check().await.unwrap_or(false),
        Err(_) => false,
    };

    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        llm_backend: state.backend,
        llm_reachable,
    })
}

/// Requirements gateway: `extract` or `validate`
pub async fn run_agent(
    State(state): State<AppState>,
    Json(payload): Json<RunRequest>,
) -> Result<Json<RunResponse>, ApiError> {
    let Some(task) = RequirementsTask::parse(&payload.agent_type) else {
        tracing::warn!(agent_type = %payload.agent_type, "Unknown agent type");
        return Ok(Json(RunResponse {
            result: UNKNOWN_AGENT_TYPE.into(),
        }));
    };

    let provider = state.provider().map_err(|e| {
        tracing::error!(error = %e, "Completion client unavailable");
        api_error(StatusCode::BAD_GATEWAY, "COMPLETION_ERROR", e.to_string())
    })?;

    match task.run(provider.as_ref(), &state.gateway_model, &payload.user_input).await {
        Ok(result) => Ok(Json(RunResponse { result })),
        Err(e) => {
            tracing::error!(task = ?task, error = %e, "Requirements task failed");
            Err(api_error(StatusCode::BAD_GATEWAY, "COMPLETION_ERROR", e.to_string()))
        }
    }
}

/// Create a session and initialize its agents
pub async fn create_session(
    State(state): State<AppState>,
) -> (StatusCode, Json<SessionSnapshot>) {
    let session = Session::new().with_turn_timeout(state.turn_timeout);
    let id = session.id.clone();
    let shared = state.sessions.insert(session).await;
    tracing::info!(session = %id, "Session created");

    let mut session = shared.lock().await;
    session.initialize(&state.factory).await;
    (StatusCode::CREATED, Json(session.snapshot()))
}

pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    let shared = find_session(&state, &id).await?;
    let session = shared.lock().await;
    Ok(Json(session.snapshot()))
}

/// Run one chat turn
pub async fn send_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<MessageRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let utterance = Utterance::new(payload.message).ok_or_else(|| {
        api_error(StatusCode::BAD_REQUEST, "EMPTY_MESSAGE", "Message must not be empty")
    })?;

    let shared = find_session(&state, &id).await?;
    let mut session = shared.lock().await;
    let outcome = session.run_turn(&utterance, payload.mode).await;

    Ok(Json(MessageResponse {
        reply: outcome.reply,
        agent: outcome.agent,
        outcome: outcome.status,
        session: session.snapshot(),
    }))
}

pub async fn reinitialize_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    let shared = find_session(&state, &id).await?;
    let mut session = shared.lock().await;
    session.reinitialize(&state.factory).await;
    Ok(Json(session.snapshot()))
}

pub async fn clear_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    let shared = find_session(&state, &id).await?;
    let mut session = shared.lock().await;
    session.clear_chat();
    Ok(Json(session.snapshot()))
}

/// Front end terminated; drop its session
pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state.sessions.remove(&SessionId::from_string(&id)).await {
        tracing::info!(session = %id, "Session closed");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(api_error(StatusCode::NOT_FOUND, "SESSION_NOT_FOUND", format!("Session {id} not found")))
    }
}
