//! Session Management
//!
//! One [`Session`] per front-end instance: the conversation history plus the
//! two agent handles, and the readiness state machine around them.
//!
//! ```text
//! Uninitialized ──► Initializing ──► Ready
//!                        │   ▲          │
//!                        ▼   └──────────┤ reinitialize
//!                      Failed ──────────┘
//! ```
//!
//! Handles are only ever set together, on the transition to `Ready`.
//! Re-entering `Initializing` drops both first. Turns never fail: every
//! outcome is recorded as a user message followed by an assistant message.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::deadline::bounded;
use crate::factory::AgentFactory;
use crate::message::{Conversation, Message, Utterance};
use crate::reasoning::Agent;
use crate::router::{self, AgentKind, RouteMode};
use crate::tool::ToolSummary;

/// Default ceiling for one agent turn
pub const DEFAULT_TURN_TIMEOUT: Duration = Duration::from_secs(60);

/// Recorded when a turn arrives before the agents are ready
pub const NOT_INITIALIZED_MESSAGE: &str = "Agents not initialized. Please start the servers first.";

/// Recorded (after the agent label) when a turn exceeds its deadline
pub const TIMEOUT_MESSAGE: &str = "Request timed out. Please try again.";

/// Unique session identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Agent readiness of a session
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Readiness {
    Uninitialized,
    Initializing,
    Ready,
    Failed { provider: String, reason: String },
}

impl Readiness {
    /// Status line for the front end
    pub fn status_message(&self) -> String {
        match self {
            Self::Uninitialized => "Agents not initialized".into(),
            Self::Initializing => "Connecting to MCP servers...".into(),
            Self::Ready => "Agents ready".into(),
            Self::Failed { reason, .. } => reason.clone(),
        }
    }
}

/// How a turn resolved
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnStatus {
    Answered,
    TimedOut,
    Failed,
    NotInitialized,
}

/// Result of one turn; its reply is already recorded in the history
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TurnOutcome {
    pub agent: AgentKind,
    pub status: TurnStatus,
    pub reply: String,
}

/// Tool catalogs of the bound agents (empty when not ready)
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ToolCatalogs {
    pub calculator: Vec<ToolSummary>,
    pub weather: Vec<ToolSummary>,
}

/// Serializable view of a session
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub id: SessionId,
    pub status: Readiness,
    pub status_message: String,
    pub history: Vec<Message>,
    pub tools: ToolCatalogs,
    pub calculator_ready: bool,
    pub weather_ready: bool,
    pub message_count: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A complete agent session
#[derive(Clone, Debug)]
pub struct Session {
    /// Unique identifier
    pub id: SessionId,

    history: Conversation,
    calculator: Option<Arc<Agent>>,
    weather: Option<Arc<Agent>>,
    readiness: Readiness,
    turn_timeout: Duration,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last activity timestamp
    pub updated_at: DateTime<Utc>,
}

impl Session {
    /// Create a new, uninitialized session
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: SessionId::new(),
            history: Conversation::new(),
            calculator: None,
            weather: None,
            readiness: Readiness::Uninitialized,
            turn_timeout: DEFAULT_TURN_TIMEOUT,
            created_at: now,
            updated_at: now,
        }
    }

    #[must_use]
    pub const fn with_turn_timeout(mut self, timeout: Duration) -> Self {
        self.turn_timeout = timeout;
        self
    }

    /// Update the activity timestamp
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub const fn readiness(&self) -> &Readiness {
        &self.readiness
    }

    pub const fn is_ready(&self) -> bool {
        matches!(self.readiness, Readiness::Ready)
    }

    pub fn history(&self) -> &[Message] {
        self.history.messages()
    }

    /// Message count
    pub fn message_count(&self) -> usize {
        self.history.len()
    }

    /// Handle for the given agent, if bound
    pub fn handle(&self, kind: AgentKind) -> Option<&Arc<Agent>> {
        match kind {
            AgentKind::Calculator => self.calculator.as_ref(),
            AgentKind::Weather => self.weather.as_ref(),
        }
    }

    /// Enter `Initializing`, unconditionally dropping both handles
    pub fn begin_initialization(&mut self) {
        self.calculator = None;
        self.weather = None;
        self.readiness = Readiness::Initializing;
        self.touch();
    }

    /// Run the initialization transition to `Ready` or `Failed`.
    ///
    /// History is left alone.
    pub async fn initialize(&mut self, factory: &AgentFactory) -> &Readiness {
        self.begin_initialization();
        tracing::info!(session = %self.id, "Initializing agents");

        match factory.build().await {
            Ok(agents) => {
                self.calculator = Some(agents.calculator);
                self.weather = Some(agents.weather);
                self.readiness = Readiness::Ready;
                tracing::info!(session = %self.id, "Session ready");
            }
            Err(failure) => {
                tracing::warn!(session = %self.id, provider = %failure.provider, reason = %failure.reason, "Session initialization failed");
                self.readiness = Readiness::Failed {
                    provider: failure.provider,
                    reason: failure.reason,
                };
            }
        }

        self.touch();
        &self.readiness
    }

    /// Discard the current agents and initialize again, whatever the state
    pub async fn reinitialize(&mut self, factory: &AgentFactory) -> &Readiness {
        self.initialize(factory).await
    }

    /// Empty the history; agents and readiness are untouched
    pub fn clear_chat(&mut self) {
        self.history.clear();
        self.touch();
    }

    /// Route, invoke and record one turn. Never fails.
    pub async fn run_turn(&mut self, utterance: &Utterance, mode: RouteMode) -> TurnOutcome {
        let kind = router::route(utterance.as_str(), mode);

        let (status, reply) = match self.handle(kind).cloned() {
            None => {
                tracing::warn!(session = %self.id, agent = %kind, "Turn before agents were ready");
                (TurnStatus::NotInitialized, NOT_INITIALIZED_MESSAGE.to_string())
            }
            Some(agent) => {
                let label = agent.label().to_string();
                tracing::info!(session = %self.id, agent = %label, "Running turn");

                let invocation = agent.respond(utterance.as_str(), self.history.messages());
                match bounded(self.turn_timeout, "agent turn", invocation).await {
                    Ok(answer) => (TurnStatus::Answered, format!("[{label}] {answer}")),
                    Err(e) if e.is_timeout() => {
                        (TurnStatus::TimedOut, format!("[{label}] {TIMEOUT_MESSAGE}"))
                    }
                    Err(e) => {
                        tracing::error!(
                            session = %self.id,
                            agent = %label,
                            connection = e.is_connection(),
                            error = %e,
                            "Agent turn failed"
                        );
                        (TurnStatus::Failed, format!("[{label}] Error: {e}"))
                    }
                }
            }
        };

        self.history.push(Message::user(utterance.as_str()));
        self.history.push(Message::assistant(&reply));
        self.touch();

        TurnOutcome {
            agent: kind,
            status,
            reply,
        }
    }

    /// Serializable view for the API
    pub fn snapshot(&self) -> SessionSnapshot {
        let catalog = |agent: &Option<Arc<Agent>>| {
            agent.as_ref().map(|a| a.tool_catalog()).unwrap_or_default()
        };

        SessionSnapshot {
            id: self.id.clone(),
            status: self.readiness.clone(),
            status_message: self.readiness.status_message(),
            history: self.history.messages().to_vec(),
            tools: ToolCatalogs {
                calculator: catalog(&self.calculator),
                weather: catalog(&self.weather),
            },
            calculator_ready: self.calculator.is_some(),
            weather_ready: self.weather.is_some(),
            message_count: self.history.len(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// A session behind its own lock; holding the lock serializes turns
pub type SharedSession = Arc<Mutex<Session>>;

/// Session store trait
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Store a session and return its shared handle
    async fn insert(&self, session: Session) -> SharedSession;

    /// Look up a session by ID
    async fn get(&self, id: &SessionId) -> Option<SharedSession>;

    /// Drop a session; returns whether it existed
    async fn remove(&self, id: &SessionId) -> bool;

    /// Number of live sessions
    async fn len(&self) -> usize;

    /// Drop sessions idle for longer than `max_idle`; returns how many went
    async fn evict_idle(&self, max_idle: Duration) -> usize;
}

/// In-memory session store
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<SessionId, SharedSession>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn insert(&self, session: Session) -> SharedSession {
        let id = session.id.clone();
        let shared = Arc::new(Mutex::new(session));
        self.sessions.write().await.insert(id, shared.clone());
        shared
    }

    async fn get(&self, id: &SessionId) -> Option<SharedSession> {
        self.sessions.read().await.get(id).cloned()
    }

    async fn remove(&self, id: &SessionId) -> bool {
        self.sessions.write().await.remove(id).is_some()
    }

    async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    async fn evict_idle(&self, max_idle: Duration) -> usize {
        let Ok(max_idle) = chrono::Duration::from_std(max_idle) else {
            return 0;
        };
        let now = Utc::now();

        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, shared| match shared.try_lock() {
            Ok(session) => now - session.updated_at <= max_idle,
            // Locked means mid-turn
            Err(_) => true,
        });
        before - sessions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AgentError;
    use crate::message::Role;
    use crate::provider::LlmProvider;
    use crate::testing::{ScriptedProvider, StaticSource};

    fn factory_with(provider: Arc<dyn LlmProvider>) -> AgentFactory {
        AgentFactory::new(
            provider,
            Arc::new(StaticSource::ready("calculator", &["add_numbers", "divide_numbers"])),
            Arc::new(StaticSource::ready("weather", &["get_weather"])),
        )
    }

    fn utterance(text: &str) -> Utterance {
        Utterance::new(text).unwrap()
    }

    #[test]
    fn test_session_creation() {
        let session = Session::new();
        assert_eq!(session.readiness(), &Readiness::Uninitialized);
        assert_eq!(session.message_count(), 0);
        assert!(session.handle(AgentKind::Calculator).is_none());
    }

    #[tokio::test]
    async fn test_initialize_reaches_ready() {
        let mut session = Session::new();
        let factory = factory_with(Arc::new(ScriptedProvider::repeating("ok")));

        assert_eq!(session.initialize(&factory).await, &Readiness::Ready);
        assert!(session.handle(AgentKind::Calculator).is_some());
        assert!(session.handle(AgentKind::Weather).is_some());

        let snapshot = session.snapshot();
        assert_eq!(snapshot.tools.calculator.len(), 2);
        assert_eq!(snapshot.tools.weather[0].name, "get_weather");
    }

    #[tokio::test(start_paused = true)]
    async fn test_weather_timeout_fails_session() {
        let mut session = Session::new();
        let factory = AgentFactory::new(
            Arc::new(ScriptedProvider::repeating("ok")),
            Arc::new(StaticSource::ready("calculator", &["add_numbers"])),
            Arc::new(StaticSource::hanging("weather")),
        );

        let readiness = session.initialize(&factory).await.clone();
        let Readiness::Failed { provider, reason } = readiness else {
            panic!("expected failure, got {readiness:?}");
        };
        assert_eq!(provider, "weather");
        assert!(reason.contains("weather server"));
        assert!(session.handle(AgentKind::Calculator).is_none());
        assert!(session.handle(AgentKind::Weather).is_none());
    }

    #[tokio::test]
    async fn test_reinitialize_discards_handles_even_on_failure() {
        let mut session = Session::new();
        let good = factory_with(Arc::new(ScriptedProvider::repeating("ok")));
        session.initialize(&good).await;
        assert!(session.is_ready());

        let bad = AgentFactory::new(
            Arc::new(ScriptedProvider::repeating("ok")),
            Arc::new(StaticSource::failing("calculator", "connection refused")),
            Arc::new(StaticSource::ready("weather", &["get_weather"])),
        );
        session.reinitialize(&bad).await;

        assert!(matches!(session.readiness(), Readiness::Failed { .. }));
        assert!(session.handle(AgentKind::Calculator).is_none());
        assert!(session.handle(AgentKind::Weather).is_none());

        // and back again
        session.reinitialize(&good).await;
        assert!(session.is_ready());
    }

    #[tokio::test]
    async fn test_turns_alternate_user_assistant() {
        let mut session = Session::new();
        session
            .initialize(&factory_with(Arc::new(ScriptedProvider::repeating("done"))))
            .await;

        let inputs = ["Multiply 8 and 12", "What's the weather in Tokyo?", "What is 15 + 27?"];
        for text in inputs {
            let outcome = session.run_turn(&utterance(text), RouteMode::Auto).await;
            assert_eq!(outcome.status, TurnStatus::Answered);
        }

        let history = session.history();
        assert_eq!(history.len(), 2 * inputs.len());
        for (i, pair) in history.chunks(2).enumerate() {
            assert_eq!(pair[0].role, Role::User);
            assert_eq!(pair[0].content, inputs[i]);
            assert_eq!(pair[1].role, Role::Assistant);
        }
        assert_eq!(history[1].content, "[🧮 Calculator] done");
        assert_eq!(history[3].content, "[🌤️ Weather] done");
        // no keyword hits: weather wins the tie
        assert_eq!(history[5].content, "[🌤️ Weather] done");
    }

    #[tokio::test]
    async fn test_turn_before_ready_records_fixed_message() {
        let mut session = Session::new();
        let outcome = session.run_turn(&utterance("add 2 and 2"), RouteMode::Auto).await;

        assert_eq!(outcome.status, TurnStatus::NotInitialized);
        assert_eq!(outcome.agent, AgentKind::Calculator);
        assert_eq!(session.history().len(), 2);
        assert_eq!(session.history()[1].content, NOT_INITIALIZED_MESSAGE);
    }

    #[tokio::test(start_paused = true)]
    async fn test_turn_timeout_is_recorded() {
        let slow = ScriptedProvider::repeating("late").with_delay(Duration::from_secs(120));
        let mut session = Session::new().with_turn_timeout(Duration::from_secs(60));
        session.initialize(&factory_with(Arc::new(slow))).await;

        let outcome = session
            .run_turn(&utterance("forecast please"), RouteMode::Auto)
            .await;

        assert_eq!(outcome.status, TurnStatus::TimedOut);
        assert_eq!(outcome.reply, "[🌤️ Weather] Request timed out. Please try again.");
        assert_eq!(session.history().len(), 2);
    }

    #[tokio::test]
    async fn test_turn_error_is_recorded() {
        let failing = ScriptedProvider::failing(AgentError::RateLimited("slow down".into()));
        let mut session = Session::new();
        session.initialize(&factory_with(Arc::new(failing))).await;

        let outcome = session
            .run_turn(&utterance("anything"), RouteMode::Calculator)
            .await;

        assert_eq!(outcome.status, TurnStatus::Failed);
        assert_eq!(outcome.reply, "[🧮 Calculator] Error: Rate limited: slow down");
        assert_eq!(session.history()[1].role, Role::Assistant);
    }

    #[tokio::test]
    async fn test_clear_chat_keeps_agents() {
        let mut session = Session::new();
        session
            .initialize(&factory_with(Arc::new(ScriptedProvider::repeating("ok"))))
            .await;
        session.run_turn(&utterance("sum"), RouteMode::Auto).await;
        assert_eq!(session.message_count(), 2);

        session.clear_chat();
        assert_eq!(session.message_count(), 0);
        assert!(session.is_ready());
        assert!(session.handle(AgentKind::Weather).is_some());
    }

    #[tokio::test]
    async fn test_memory_store() {
        let store = MemorySessionStore::new();
        let session = Session::new();
        let id = session.id.clone();

        store.insert(session).await;
        assert_eq!(store.len().await, 1);

        let loaded = store.get(&id).await.unwrap();
        assert_eq!(loaded.lock().await.id, id);

        assert!(store.remove(&id).await);
        assert!(store.get(&id).await.is_none());
        assert!(!store.remove(&id).await);
    }

    #[tokio::test]
    async fn test_store_evicts_idle_sessions() {
        let store = MemorySessionStore::new();

        let mut abandoned = Session::new();
        abandoned.updated_at = Utc::now() - chrono::Duration::minutes(45);
        let abandoned_id = abandoned.id.clone();
        store.insert(abandoned).await;

        let active = store.insert(Session::new()).await;
        let active_id = active.lock().await.id.clone();

        let mut busy = Session::new();
        busy.updated_at = Utc::now() - chrono::Duration::hours(2);
        let busy = store.insert(busy).await;
        let busy_id = busy.lock().await.id.clone();
        let turn = busy.lock().await;

        assert_eq!(store.evict_idle(Duration::from_secs(30 * 60)).await, 1);
        assert!(store.get(&abandoned_id).await.is_none());
        assert!(store.get(&active_id).await.is_some());
        assert!(store.get(&busy_id).await.is_some());

        drop(turn);
        assert_eq!(store.evict_idle(Duration::from_secs(30 * 60)).await, 1);
        assert_eq!(store.len().await, 1);
    }
}
