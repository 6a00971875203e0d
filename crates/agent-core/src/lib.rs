//! # agent-core
//!
//! Core agent logic: provider-agnostic completion client, tool catalogs,
//! keyword routing and the per-session agent lifecycle.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                          Session                              │
//! │  ┌──────────┐   ┌───────────────────────────────────────────┐ │
//! │  │  Router  │──►│ Agent (Calculator | Weather)               │ │
//! │  └──────────┘   │  ┌─────────────┐  ┌─────────────────────┐  │ │
//! │                 │  │ ToolRegistry│──│ LlmProvider         │  │ │
//! │  history        │  │ (remote)    │  │ (Strategy)          │  │ │
//! │                 │  └─────────────┘  └─────────────────────┘  │ │
//! │                 └───────────────────────────────────────────┘ │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The `LlmProvider` trait enables swapping between hosted and local
//! backends; `ToolSource` does the same for tool servers.

pub mod deadline;
pub mod error;
pub mod factory;
pub mod message;
pub mod provider;
pub mod reasoning;
pub mod router;
pub mod rpc;
pub mod session;
pub mod tool;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use error::{AgentError, Result};
pub use factory::{AgentFactory, AgentSet, InitFailure, ToolSource};
pub use message::{Conversation, Message, Role, Utterance};
pub use provider::{GenerationOptions, LlmProvider};
pub use reasoning::{Agent, AgentBuilder};
pub use router::{AgentKind, RouteMode};
pub use session::{
    MemorySessionStore, Readiness, Session, SessionId, SessionSnapshot, SessionStore, TurnOutcome,
    TurnStatus,
};
pub use tool::{Tool, ToolCall, ToolRegistry, ToolResult, ToolSchema, ToolSummary};
