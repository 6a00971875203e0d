//! # mcp-tools
//!
//! The calculator and weather tool providers, plus the JSON-RPC server
//! that exposes a tool catalog over HTTP.

pub mod calculator;
pub mod server;
pub mod weather;

pub use calculator::calculator_registry;
pub use server::McpServer;
pub use weather::weather_registry;
