//! Remote tool loading against in-process tool servers

use std::sync::Arc;

use agent_core::{
    factory::{AgentFactory, ToolSource},
    testing::ScriptedProvider,
    tool::ToolCall,
};
use agent_runtime::McpClient;
use mcp_tools::{McpServer, calculator_registry, weather_registry};

async fn spawn(server: McpServer) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, server.router()).await.unwrap();
    });
    format!("http://{addr}/mcp")
}

#[tokio::test]
async fn test_load_and_call_calculator_tools() {
    let endpoint = spawn(McpServer::new("CalculatorServer", calculator_registry())).await;
    let client = McpClient::new("calculator", endpoint);

    let tools = client.load_tools().await.unwrap();
    assert_eq!(tools.len(), 5);
    assert_eq!(tools.names()[0], "add_numbers");

    let result = tools
        .execute(&ToolCall::new("divide_numbers").arg("a", 10).arg("b", 0))
        .await
        .unwrap();
    assert!(result.success);
    assert_eq!(result.output, "Error: Cannot divide by zero");

    let result = tools
        .execute(&ToolCall::new("multiply_numbers").arg("a", i64::MAX).arg("b", 2))
        .await
        .unwrap();
    assert!(!result.success);
}

#[tokio::test]
async fn test_handshake_completes_with_accepted_notification() {
    let endpoint = spawn(McpServer::new("WeatherServer", weather_registry())).await;
    let info = McpClient::new("weather", endpoint).initialize().await.unwrap();
    assert_eq!(info["serverInfo"]["name"], "WeatherServer");
}

#[tokio::test]
async fn test_invalid_arguments_surface_as_provider_error() {
    let endpoint = spawn(McpServer::new("CalculatorServer", calculator_registry())).await;
    let tools = McpClient::new("calculator", endpoint).load_tools().await.unwrap();

    let err = tools
        .execute(&ToolCall::new("calculate_power").arg("base", 2).arg("exponent", -3))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("non-negative"));
}

#[tokio::test]
async fn test_factory_builds_agents_from_remote_catalogs() {
    let calculator = spawn(McpServer::new("CalculatorServer", calculator_registry())).await;
    let weather = spawn(McpServer::new("WeatherServer", weather_registry())).await;

    let factory = AgentFactory::new(
        Arc::new(ScriptedProvider::repeating("ok")),
        Arc::new(McpClient::new("calculator", calculator)),
        Arc::new(McpClient::new("weather", weather)),
    );

    let agents = factory.build().await.unwrap();
    assert_eq!(agents.calculator.tools().len(), 5);
    assert_eq!(agents.weather.tools().len(), 4);
}

#[tokio::test]
async fn test_unreachable_calculator_fails_initialization() {
    let weather = spawn(McpServer::new("WeatherServer", weather_registry())).await;

    let factory = AgentFactory::new(
        Arc::new(ScriptedProvider::repeating("ok")),
        Arc::new(McpClient::new("calculator", "http://127.0.0.1:1/mcp")),
        Arc::new(McpClient::new("weather", weather)),
    );

    let failure = factory.build().await.unwrap_err();
    assert_eq!(failure.provider, "calculator");
    assert!(failure.reason.starts_with("Error loading calculator tools:"));
}
