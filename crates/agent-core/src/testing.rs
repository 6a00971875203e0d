//! Test doubles
//!
//! A scripted completion client and in-process tool sources, shared with
//! downstream crates through the `testing` feature.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{AgentError, Result};
use crate::factory::ToolSource;
use crate::message::Message;
use crate::provider::{Completion, GenerationOptions, LlmProvider};
use crate::tool::{Tool, ToolCall, ToolRegistry, ToolResult, ToolSchema};

enum Script {
    Queue(VecDeque<Result<String>>),
    Repeat(String),
}

/// Completion client that replays canned replies and records every prompt
pub struct ScriptedProvider {
    script: Mutex<Script>,
    calls: Mutex<Vec<Vec<Message>>>,
    options: Mutex<Vec<GenerationOptions>>,
    delay: Option<Duration>,
}

impl ScriptedProvider {
    /// Replies in order; errors once exhausted
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from_script(Script::Queue(
            replies.into_iter().map(|r| Ok(r.into())).collect(),
        ))
    }

    /// The same reply forever
    pub fn repeating(reply: impl Into<String>) -> Self {
        Self::from_script(Script::Repeat(reply.into()))
    }

    /// Fails every call with `error`
    pub fn failing(error: AgentError) -> Self {
        Self::from_script(Script::Queue(VecDeque::from([Err(error)])))
    }

    fn from_script(script: Script) -> Self {
        Self {
            script: Mutex::new(script),
            calls: Mutex::new(Vec::new()),
            options: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    /// Sleep before answering (pair with a paused tokio clock)
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Every message list sent so far
    pub fn calls(&self) -> Vec<Vec<Message>> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Every option set sent so far
    pub fn options(&self) -> Vec<GenerationOptions> {
        self.options.lock().map(|o| o.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    async fn complete(
        &self,
        messages: &[Message],
        options: &GenerationOptions,
    ) -> Result<Completion> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(messages.to_vec());
        }
        if let Ok(mut opts) = self.options.lock() {
            opts.push(options.clone());
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let next = {
            let mut script = self
                .script
                .lock()
                .map_err(|_| AgentError::Provider("script poisoned".into()))?;
            match &mut *script {
                Script::Repeat(reply) => Ok(reply.clone()),
                Script::Queue(queue) => queue
                    .pop_front()
                    .unwrap_or_else(|| Err(AgentError::Provider("script exhausted".into()))),
            }
        };

        next.map(|content| Completion::text(content, &options.model))
    }
}

/// Tool that ignores its arguments and returns a fixed output
pub struct StaticTool {
    name: String,
    output: String,
}

impl StaticTool {
    pub fn new(name: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            output: output.into(),
        }
    }
}

#[async_trait]
impl Tool for StaticTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: self.name.clone(),
            description: format!("Static tool {}", self.name),
            parameters: Vec::new(),
        }
    }

    async fn execute(&self, _call: &ToolCall) -> Result<ToolResult> {
        Ok(ToolResult::success(&self.name, &self.output))
    }
}

enum Behavior {
    Ready(Vec<String>),
    Failing(String),
    Hanging,
}

/// In-process tool source with a fixed behavior
pub struct StaticSource {
    name: String,
    endpoint: String,
    behavior: Behavior,
    loads: AtomicUsize,
}

impl StaticSource {
    fn with_behavior(name: &str, behavior: Behavior) -> Self {
        Self {
            name: name.to_string(),
            endpoint: format!("http://localhost:0/{name}"),
            behavior,
            loads: AtomicUsize::new(0),
        }
    }

    /// Loads one [`StaticTool`] per name
    pub fn ready(name: &str, tools: &[&str]) -> Self {
        Self::with_behavior(
            name,
            Behavior::Ready(tools.iter().map(ToString::to_string).collect()),
        )
    }

    /// Fails every load with a provider error
    pub fn failing(name: &str, message: &str) -> Self {
        Self::with_behavior(name, Behavior::Failing(message.to_string()))
    }

    /// Never finishes loading
    pub fn hanging(name: &str) -> Self {
        Self::with_behavior(name, Behavior::Hanging)
    }

    /// Number of load attempts so far
    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ToolSource for StaticSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn load_tools(&self) -> Result<ToolRegistry> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            Behavior::Ready(names) => {
                let mut registry = ToolRegistry::new();
                for name in names {
                    registry.register(StaticTool::new(name, "ok"));
                }
                Ok(registry)
            }
            Behavior::Failing(message) => Err(AgentError::ToolProvider {
                provider: self.name.clone(),
                message: message.clone(),
            }),
            Behavior::Hanging => std::future::pending().await,
        }
    }
}
