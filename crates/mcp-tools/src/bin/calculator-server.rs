//! Calculator tool server

use mcp_tools::{McpServer, calculator, server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    server::init_tracing();

    let server = McpServer::new(calculator::SERVER_NAME, calculator::calculator_registry());
    server::serve(server, "127.0.0.1:8001").await
}
