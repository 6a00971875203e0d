//! Weather tool server

use mcp_tools::{McpServer, server, weather};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    server::init_tracing();

    let server = McpServer::new(weather::SERVER_NAME, weather::weather_registry());
    server::serve(server, "127.0.0.1:8002").await
}
