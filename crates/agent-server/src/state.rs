//! Application State

use std::sync::Arc;
use std::time::Duration;

use agent_core::{
    AgentError, AgentFactory, LlmProvider, MemorySessionStore, SessionStore, ToolSource,
    provider::GenerationOptions,
};
use tokio::task::JoinHandle;

use crate::config::ServerConfig;

/// Completion client, or why there is none
#[derive(Clone)]
pub enum Completion {
    Ready(Arc<dyn LlmProvider>),
    Unconfigured(String),
}

/// How often idle sessions are swept
pub const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Completion client used by the gateway and the agents
    pub completion: Completion,

    /// Builds fresh agent pairs for each session
    pub factory: Arc<AgentFactory>,

    /// Live chat sessions
    pub sessions: Arc<MemorySessionStore>,

    pub gateway_model: String,
    pub backend: &'static str,
    pub turn_timeout: Duration,
}

impl AppState {
    pub fn new(
        config: &ServerConfig,
        provider: agent_core::Result<Arc<dyn LlmProvider>>,
        calculator: Arc<dyn ToolSource>,
        weather: Arc<dyn ToolSource>,
    ) -> Self {
        let (completion, factory) = match provider {
            Ok(provider) => (
                Completion::Ready(provider.clone()),
                AgentFactory::new(provider, calculator, weather),
            ),
            Err(e) => (
                Completion::Unconfigured(e.to_string()),
                AgentFactory::without_provider(&e, calculator, weather),
            ),
        };

        let factory = factory
            .with_generation(GenerationOptions::for_model(&config.chat_model))
            .with_load_timeout(config.tool_load_timeout);

        Self {
            completion,
            factory: Arc::new(factory),
            sessions: Arc::new(MemorySessionStore::new()),
            gateway_model: config.gateway_model.clone(),
            backend: config.backend.as_str(),
            turn_timeout: config.turn_timeout,
        }
    }

    /// The completion client, or a configuration error
    pub fn provider(&self) -> agent_core::Result<Arc<dyn LlmProvider>> {
        match &self.completion {
            Completion::Ready(provider) => Ok(provider.clone()),
            Completion::Unconfigured(reason) => Err(AgentError::Config(reason.clone())),
        }
    }

    /// Periodically drop sessions whose page went away without closing them
    pub fn spawn_session_reaper(&self, max_idle: Duration, every: Duration) -> JoinHandle<()> {
        let sessions = self.sessions.clone();
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(every);
            loop {
                tick.tick().await;
                let evicted = sessions.evict_idle(max_idle).await;
                if evicted > 0 {
                    let remaining = sessions.len().await;
                    tracing::info!(evicted, remaining, "Evicted idle sessions");
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_core::Session;
    use agent_core::testing::{ScriptedProvider, StaticSource};

    fn state() -> AppState {
        AppState::new(
            &ServerConfig::default(),
            Ok(Arc::new(ScriptedProvider::repeating("ok"))),
            Arc::new(StaticSource::ready("calculator", &["add_numbers"])),
            Arc::new(StaticSource::ready("weather", &["get_weather"])),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_reaper_drops_abandoned_sessions() {
        let state = state();

        let mut abandoned = Session::new();
        abandoned.updated_at = chrono::Utc::now() - chrono::Duration::hours(1);
        state.sessions.insert(abandoned).await;
        state.sessions.insert(Session::new()).await;

        let reaper = state.spawn_session_reaper(Duration::from_secs(30 * 60), SESSION_SWEEP_INTERVAL);
        tokio::time::sleep(SESSION_SWEEP_INTERVAL).await;

        assert_eq!(state.sessions.len().await, 1);
        reaper.abort();
    }
}
