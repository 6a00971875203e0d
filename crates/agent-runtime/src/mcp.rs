//! Remote tool provider client
//!
//! Speaks JSON-RPC 2.0 over HTTP to a tool server's `/mcp` endpoint and
//! exposes every remote tool through the local [`Tool`] trait.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use agent_core::{
    error::{AgentError, Result},
    factory::ToolSource,
    rpc::{
        CallToolParams, CallToolResult, JsonRpcRequest, JsonRpcResponse, ListToolsResult,
        PROTOCOL_VERSION, ToolDescriptor, methods,
    },
    tool::{Tool, ToolCall, ToolRegistry, ToolResult, ToolSchema},
};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

/// Client for one tool server
#[derive(Clone)]
pub struct McpClient {
    name: String,
    endpoint: String,
    http: reqwest::Client,
    next_id: Arc<AtomicU64>,
}

impl std::fmt::Debug for McpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("McpClient")
            .field("name", &self.name)
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl McpClient {
    pub fn new(name: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self::with_http(name, endpoint, reqwest::Client::new())
    }

    pub fn with_http(
        name: impl Into<String>,
        endpoint: impl Into<String>,
        http: reqwest::Client,
    ) -> Self {
        Self {
            name: name.into(),
            endpoint: endpoint.into(),
            http,
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    fn error(&self, message: impl Into<String>) -> AgentError {
        AgentError::ToolProvider {
            provider: self.name.clone(),
            message: message.into(),
        }
    }

    async fn request<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = JsonRpcRequest::new(id, method, Some(params));

        let response = self
            .http
            .post(&self.endpoint)
            .header("Accept", "application/json, text/event-stream")
            .json(&request)
            .send()
            .await
            .map_err(|e| self.error(format!("request to {} failed: {e}", self.endpoint)))?;

        if !response.status().is_success() {
            return Err(self.error(format!("HTTP {}", response.status())));
        }

        let envelope: JsonRpcResponse = response
            .json()
            .await
            .map_err(|e| self.error(format!("invalid response: {e}")))?;

        if let Some(error) = envelope.error {
            return Err(self.error(error.to_string()));
        }

        let result = envelope
            .result
            .ok_or_else(|| self.error(format!("{method} returned no result")))?;

        serde_json::from_value(result).map_err(|e| self.error(format!("malformed {method} result: {e}")))
    }

    /// Fire a notification; any 2xx (usually an empty 202) is accepted
    async fn notify(&self, method: &str) -> Result<()> {
        let notification = JsonRpcRequest::notification(method, None);
        let response = self
            .http
            .post(&self.endpoint)
            .header("Accept", "application/json, text/event-stream")
            .json(&notification)
            .send()
            .await
            .map_err(|e| self.error(format!("notification failed: {e}")))?;

        if !response.status().is_success() {
            return Err(self.error(format!("{method} rejected: HTTP {}", response.status())));
        }
        Ok(())
    }

    /// Handshake; returns the server's advertised info
    pub async fn initialize(&self) -> Result<Value> {
        let info: Value = self
            .request(
                methods::INITIALIZE,
                json!({
                    "protocolVersion": PROTOCOL_VERSION,
                    "capabilities": {},
                    "clientInfo": {"name": "agent-platform", "version": env!("CARGO_PKG_VERSION")},
                }),
            )
            .await?;
        self.notify(methods::INITIALIZED).await?;
        Ok(info)
    }

    pub async fn list_tools(&self) -> Result<Vec<ToolDescriptor>> {
        let result: ListToolsResult = self.request(methods::TOOLS_LIST, json!({})).await?;
        Ok(result.tools)
    }

    pub async fn call_tool(
        &self,
        name: &str,
        arguments: serde_json::Map<String, Value>,
    ) -> Result<CallToolResult> {
        let params = CallToolParams {
            name: name.to_string(),
            arguments,
        };
        let params = serde_json::to_value(params)?;
        self.request(methods::TOOLS_CALL, params).await
    }
}

#[async_trait]
impl ToolSource for McpClient {
    fn name(&self) -> &str {
        &self.name
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn load_tools(&self) -> Result<ToolRegistry> {
        self.initialize().await?;
        let descriptors = self.list_tools().await?;
        tracing::debug!(provider = %self.name, count = descriptors.len(), "Listed remote tools");

        Ok(descriptors
            .into_iter()
            .map(|d| Arc::new(McpTool::new(d, self.clone())) as Arc<dyn Tool>)
            .collect())
    }
}

/// A single remote tool
pub struct McpTool {
    schema: ToolSchema,
    client: McpClient,
}

impl McpTool {
    pub fn new(descriptor: ToolDescriptor, client: McpClient) -> Self {
        Self {
            schema: descriptor.schema(),
            client,
        }
    }
}

#[async_trait]
impl Tool for McpTool {
    fn schema(&self) -> ToolSchema {
        self.schema.clone()
    }

    async fn execute(&self, call: &ToolCall) -> Result<ToolResult> {
        let arguments = call
            .arguments
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        let result = self.client.call_tool(&self.schema.name, arguments).await?;
        let text = result.joined_text();

        if result.is_error {
            Ok(ToolResult::failure(
                &self.schema.name,
                if text.is_empty() { "Tool returned an error".into() } else { text },
            ))
        } else {
            Ok(ToolResult::success(&self.schema.name, text))
        }
    }
}
