//! JSON-RPC tool server
//!
//! Serves one [`ToolRegistry`] over `POST /mcp`. Every request runs under
//! a server-side timeout.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use agent_core::{
    error::AgentError,
    rpc::{
        CallToolParams, CallToolResult, JSONRPC_VERSION, JsonRpcError, JsonRpcRequest,
        JsonRpcResponse, ListToolsResult, PROTOCOL_VERSION, ToolDescriptor, methods,
    },
    tool::{ToolCall, ToolRegistry},
};
use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Tool server for a single catalog
pub struct McpServer {
    name: String,
    registry: ToolRegistry,
    timeout: Duration,
}

impl McpServer {
    pub fn new(name: impl Into<String>, registry: ToolRegistry) -> Self {
        Self {
            name: name.into(),
            registry,
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub const fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn list_tools(&self) -> Vec<ToolDescriptor> {
        self.registry.schemas().iter().map(ToolDescriptor::from).collect()
    }

    /// Handle one request, bounded by the server timeout
    pub async fn handle_request(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        tracing::debug!(method = %request.method, id = ?request.id, "Handling JSON-RPC request");

        let id = request.id.clone().unwrap_or(Value::Null);
        if request.jsonrpc != JSONRPC_VERSION {
            return JsonRpcResponse::failure(
                id,
                JsonRpcError::invalid_request(format!("Unsupported jsonrpc version: {}", request.jsonrpc)),
            );
        }

        match tokio::time::timeout(self.timeout, self.dispatch(request)).await {
            Ok(response) => response,
            Err(_) => {
                tracing::error!(server = %self.name, "Request timed out");
                JsonRpcResponse::failure(id, JsonRpcError::request_timeout("Request timed out"))
            }
        }
    }

    /// Notifications get no response envelope
    pub fn handle_notification(&self, notification: &JsonRpcRequest) {
        match notification.method.as_str() {
            methods::INITIALIZED => tracing::info!(server = %self.name, "Client initialized"),
            other => tracing::debug!(server = %self.name, method = %other, "Ignoring notification"),
        }
    }

    async fn dispatch(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        let id = request.id.unwrap_or(Value::Null);
        match request.method.as_str() {
            methods::INITIALIZE => JsonRpcResponse::success(
                id,
                json!({
                    "protocolVersion": PROTOCOL_VERSION,
                    "capabilities": {"tools": {"listChanged": false}},
                    "serverInfo": {"name": self.name, "version": env!("CARGO_PKG_VERSION")},
                }),
            ),
            methods::TOOLS_LIST => {
                let result = ListToolsResult {
                    tools: self.list_tools(),
                };
                match serde_json::to_value(result) {
                    Ok(value) => JsonRpcResponse::success(id, value),
                    Err(e) => JsonRpcResponse::failure(id, JsonRpcError::internal_error(e.to_string())),
                }
            }
            methods::TOOLS_CALL => match self.call_tool(request.params).await {
                Ok(result) => match serde_json::to_value(result) {
                    Ok(value) => JsonRpcResponse::success(id, value),
                    Err(e) => {
                        JsonRpcResponse::failure(id, JsonRpcError::internal_error(e.to_string()))
                    }
                },
                Err(error) => JsonRpcResponse::failure(id, error),
            },
            other => JsonRpcResponse::failure(
                id,
                JsonRpcError::method_not_found(format!("Method not found: {other}")),
            ),
        }
    }

    async fn call_tool(&self, params: Option<Value>) -> Result<CallToolResult, JsonRpcError> {
        let params: CallToolParams = params
            .ok_or_else(|| JsonRpcError::invalid_params("Missing params"))
            .and_then(|p| {
                serde_json::from_value(p).map_err(|e| JsonRpcError::invalid_params(e.to_string()))
            })?;

        tracing::info!(tool = %params.name, "Calling tool");

        let call = ToolCall {
            name: params.name.clone(),
            arguments: params.arguments.into_iter().collect(),
            id: None,
        };

        match self.registry.execute(&call).await {
            Ok(result) => Ok(CallToolResult::text(result.output, !result.success)),
            Err(e @ (AgentError::ToolNotFound(_) | AgentError::ToolValidation(_))) => {
                tracing::warn!(tool = %params.name, error = %e, "Rejected tool call");
                Err(JsonRpcError::invalid_params(e.to_string()))
            }
            Err(e @ AgentError::ToolExecution(_)) => {
                tracing::warn!(tool = %params.name, error = %e, "Tool execution failed");
                Ok(CallToolResult::text(e.to_string(), true))
            }
            Err(e) => {
                tracing::error!(tool = %params.name, error = %e, "Tool call failed");
                Err(JsonRpcError::internal_error(e.to_string()))
            }
        }
    }

    /// `POST /mcp` and `GET /health`
    pub fn router(self) -> Router {
        Router::new()
            .route("/mcp", post(mcp_handler))
            .route("/health", get(health_handler))
            .layer(TraceLayer::new_for_http())
            .with_state(Arc::new(self))
    }
}

async fn mcp_handler(State(server): State<Arc<McpServer>>, body: Bytes) -> Response {
    let request = match serde_json::from_slice::<JsonRpcRequest>(&body) {
        Ok(request) => request,
        Err(e) => {
            tracing::warn!(error = %e, "Malformed JSON-RPC request");
            return Json(JsonRpcResponse::failure(
                Value::Null,
                JsonRpcError::invalid_request(format!("Invalid request: {e}")),
            ))
            .into_response();
        }
    };

    if request.is_notification() {
        server.handle_notification(&request);
        return StatusCode::ACCEPTED.into_response();
    }

    Json(server.handle_request(request).await).into_response()
}

async fn health_handler(State(server): State<Arc<McpServer>>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "server": server.name(),
        "tools": server.registry().len(),
    }))
}

/// Install the fmt subscriber with `RUST_LOG` filtering
pub fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Bind `BIND_ADDR` (or `default_addr`) and serve until shutdown
pub async fn serve(server: McpServer, default_addr: &str) -> anyhow::Result<()> {
    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| default_addr.to_string());
    let addr: SocketAddr = bind_addr.parse()?;

    tracing::info!("🚀 {} listening on http://{}", server.name(), addr);
    tracing::info!("   POST /mcp    - JSON-RPC tool endpoint");
    tracing::info!("   GET  /health - Health check");
    for name in server.registry().names() {
        tracing::info!("   tool: {}", name);
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, server.router()).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{calculator::calculator_registry, weather::weather_registry};
    use axum::{body::Body, http::Request};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn calculator() -> McpServer {
        McpServer::new("CalculatorServer", calculator_registry())
    }

    async fn call(server: &McpServer, method: &str, params: Value) -> JsonRpcResponse {
        server
            .handle_request(JsonRpcRequest::new(1, method, Some(params)))
            .await
    }

    #[tokio::test]
    async fn test_initialize_advertises_tools_capability() {
        let response = call(&calculator(), methods::INITIALIZE, json!({})).await;
        let result = response.result.unwrap();
        assert_eq!(result["protocolVersion"], PROTOCOL_VERSION);
        assert_eq!(result["serverInfo"]["name"], "CalculatorServer");
        assert_eq!(result["capabilities"]["tools"]["listChanged"], false);
    }

    #[tokio::test]
    async fn test_list_tools_in_declaration_order() {
        let server = McpServer::new("WeatherServer", weather_registry());
        let response = call(&server, methods::TOOLS_LIST, json!({})).await;
        let list: ListToolsResult = serde_json::from_value(response.result.unwrap()).unwrap();
        let names: Vec<_> = list.tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(
            names,
            ["get_weather", "get_weather_forecast", "get_temperature_conversion", "get_weather_alerts"]
        );
        assert_eq!(list.tools[1].input_schema["required"], json!(["city"]));
    }

    #[tokio::test]
    async fn test_divide_by_zero_is_not_an_error() {
        let response = call(
            &calculator(),
            methods::TOOLS_CALL,
            json!({"name": "divide_numbers", "arguments": {"a": 10, "b": 0}}),
        )
        .await;
        let result: CallToolResult = serde_json::from_value(response.result.unwrap()).unwrap();
        assert!(!result.is_error);
        assert_eq!(result.joined_text(), "Error: Cannot divide by zero");
    }

    #[tokio::test]
    async fn test_invalid_arguments_are_invalid_params() {
        let response = call(
            &calculator(),
            methods::TOOLS_CALL,
            json!({"name": "add_numbers", "arguments": {"a": "ten", "b": 1}}),
        )
        .await;
        assert_eq!(response.error.unwrap().code, JsonRpcError::INVALID_PARAMS);

        let response = call(&calculator(), methods::TOOLS_CALL, json!({"name": "sqrt", "arguments": {}})).await;
        assert_eq!(response.error.unwrap().code, JsonRpcError::INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_overflow_is_error_result() {
        let response = call(
            &calculator(),
            methods::TOOLS_CALL,
            json!({"name": "multiply_numbers", "arguments": {"a": i64::MAX, "b": 2}}),
        )
        .await;
        let result: CallToolResult = serde_json::from_value(response.result.unwrap()).unwrap();
        assert!(result.is_error);
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let response = call(&calculator(), "resources/list", json!({})).await;
        assert_eq!(response.error.unwrap().code, JsonRpcError::METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_http_round_trip() {
        let app = calculator().router();
        let body = json!({
            "jsonrpc": "2.0", "id": 7, "method": "tools/call",
            "params": {"name": "add_numbers", "arguments": {"a": 15, "b": 27}}
        });

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/mcp")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), 200);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["result"]["content"][0]["text"], "42");
    }

    #[tokio::test]
    async fn test_notification_is_accepted_without_body() {
        let body = json!({"jsonrpc": "2.0", "method": methods::INITIALIZED});
        let response = calculator()
            .router()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/mcp")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert!(bytes.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_body_is_invalid_request() {
        let response = calculator()
            .router()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/mcp")
                    .body(Body::from("not json"))
                    .unwrap(),
            )
            .await
            .unwrap();

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["error"]["code"], JsonRpcError::INVALID_REQUEST);
    }

    #[tokio::test]
    async fn test_health() {
        let response = calculator()
            .router()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
    }
}
