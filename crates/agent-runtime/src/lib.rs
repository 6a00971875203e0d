//! # agent-runtime
//!
//! Concrete collaborators for `agent-core`: completion backends
//! (hosted OpenAI, local Ollama) and the remote tool provider client.

pub mod mcp;
pub mod openai;

#[cfg(feature = "ollama")]
pub mod ollama;

pub use mcp::{McpClient, McpTool};
pub use openai::{OpenAiConfig, OpenAiProvider};

#[cfg(feature = "ollama")]
pub use ollama::{OllamaConfig, OllamaProvider};
