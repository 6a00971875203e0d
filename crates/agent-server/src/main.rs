//! agent-platform HTTP Server
//!
//! Axum-based server providing the requirements gateway, the chat session
//! API and the compiled web front end.

mod config;
mod handlers;
mod requirements;
mod state;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use agent_core::LlmProvider;
use agent_runtime::{McpClient, OllamaProvider, OpenAiProvider};

use crate::config::{LlmBackend, ServerConfig};
use crate::handlers::{
    clear_session, create_session, delete_session, get_session, health_check,
    reinitialize_session, run_agent, send_message,
};
use crate::state::{AppState, SESSION_SWEEP_INTERVAL};

pub fn build_router(state: AppState, static_dir: &str) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health
        .route("/health", get(health_check))
        // Requirements gateway
        .route("/run", post(run_agent))
        // Chat sessions
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/{id}", get(get_session).delete(delete_session))
        .route("/api/sessions/{id}/messages", post(send_message))
        .route("/api/sessions/{id}/reinitialize", post(reinitialize_session))
        .route("/api/sessions/{id}/clear", post(clear_session))
        // Static files (WASM frontend)
        .fallback_service(ServeDir::new(static_dir))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn build_provider(config: &ServerConfig) -> agent_core::Result<Arc<dyn LlmProvider>> {
    match config.backend {
        LlmBackend::OpenAi => Ok(Arc::new(OpenAiProvider::from_env()?)),
        LlmBackend::Ollama => Ok(Arc::new(OllamaProvider::from_env())),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env()?;

    // Initialize LLM provider
    let provider = build_provider(&config);
    match &provider {
        Ok(p) => match p.health_check().await {
            Ok(true) => tracing::info!("✓ Connected to {} ({})", p.name(), config.chat_model),
            Ok(false) | Err(_) => {
                tracing::warn!("⚠ {} not reachable - agent turns will fail", p.name());
            }
        },
        Err(e) => {
            tracing::warn!("⚠ LLM backend not configured: {}", e);
            tracing::warn!("  Set OPENAI_API_KEY in .env or use LLM_BACKEND=ollama");
        }
    }

    // Remote tool providers
    let calculator = Arc::new(McpClient::new("calculator", config.calculator_url.clone()));
    let weather = Arc::new(McpClient::new("weather", config.weather_url.clone()));
    tracing::info!("Tool providers:");
    tracing::info!("  • calculator at {}", config.calculator_url);
    tracing::info!("  • weather at {}", config.weather_url);

    let state = AppState::new(&config, provider, calculator, weather);
    state.spawn_session_reaper(config.session_idle_timeout, SESSION_SWEEP_INTERVAL);
    let app = build_router(state, &config.static_dir);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;

    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("🚀 agent-platform server running on http://{}", config.bind_addr);
    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("");
    tracing::info!("Endpoints:");
    tracing::info!("  GET    /health                          - Health check");
    tracing::info!("  POST   /run                             - Extract / validate requirements");
    tracing::info!("  POST   /api/sessions                    - Start chat session");
    tracing::info!("  GET    /api/sessions/{{id}}               - Session snapshot");
    tracing::info!("  POST   /api/sessions/{{id}}/messages      - Send message");
    tracing::info!("  POST   /api/sessions/{{id}}/reinitialize  - Reinitialize agents");
    tracing::info!("  POST   /api/sessions/{{id}}/clear         - Clear chat");
    tracing::info!("  DELETE /api/sessions/{{id}}               - Close session");
    tracing::info!("");

    axum::serve(listener, app).await?;

    Ok(())
}
