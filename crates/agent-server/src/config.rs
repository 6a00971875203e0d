//! Server configuration

use std::time::Duration;

use agent_core::error::{AgentError, Result};

/// Completion backend selected by `LLM_BACKEND`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LlmBackend {
    OpenAi,
    Ollama,
}

impl LlmBackend {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Ollama => "ollama",
        }
    }

    fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "ollama" => Ok(Self::Ollama),
            other => Err(AgentError::Config(format!(
                "Unknown LLM_BACKEND '{other}'. Use 'openai' or 'ollama'."
            ))),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub backend: LlmBackend,
    pub chat_model: String,
    pub gateway_model: String,
    pub calculator_url: String,
    pub weather_url: String,
    pub tool_load_timeout: Duration,
    pub turn_timeout: Duration,
    pub session_idle_timeout: Duration,
    pub bind_addr: String,
    pub static_dir: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            backend: LlmBackend::OpenAi,
            chat_model: "gpt-4o".into(),
            gateway_model: "gpt-4".into(),
            calculator_url: "http://localhost:8001/mcp".into(),
            weather_url: "http://localhost:8002/mcp".into(),
            tool_load_timeout: Duration::from_secs(30),
            turn_timeout: Duration::from_secs(60),
            session_idle_timeout: Duration::from_secs(30 * 60),
            bind_addr: "0.0.0.0:8000".into(),
            static_dir: "static".into(),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        let secs = |key: &str, default: Duration| -> Result<Duration> {
            lookup(key).map_or(Ok(default), |raw| {
                raw.trim()
                    .parse()
                    .map(Duration::from_secs)
                    .map_err(|_| AgentError::Config(format!("{key} must be a whole number of seconds, got '{raw}'")))
            })
        };

        Ok(Self {
            backend: lookup("LLM_BACKEND")
                .map_or(Ok(defaults.backend), |b| LlmBackend::parse(&b))?,
            chat_model: lookup("CHAT_MODEL").unwrap_or(defaults.chat_model),
            gateway_model: lookup("GATEWAY_MODEL").unwrap_or(defaults.gateway_model),
            calculator_url: lookup("CALCULATOR_MCP_URL").unwrap_or(defaults.calculator_url),
            weather_url: lookup("WEATHER_MCP_URL").unwrap_or(defaults.weather_url),
            tool_load_timeout: secs("TOOL_LOAD_TIMEOUT_SECS", defaults.tool_load_timeout)?,
            turn_timeout: secs("AGENT_TURN_TIMEOUT_SECS", defaults.turn_timeout)?,
            session_idle_timeout: secs("SESSION_IDLE_TIMEOUT_SECS", defaults.session_idle_timeout)?,
            bind_addr: lookup("BIND_ADDR").unwrap_or(defaults.bind_addr),
            static_dir: lookup("STATIC_DIR").unwrap_or(defaults.static_dir),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.backend, LlmBackend::OpenAi);
        assert_eq!(config.gateway_model, "gpt-4");
        assert_eq!(config.chat_model, "gpt-4o");
        assert_eq!(config.tool_load_timeout, Duration::from_secs(30));
        assert_eq!(config.turn_timeout, Duration::from_secs(60));
        assert_eq!(config.session_idle_timeout, Duration::from_secs(1800));
        assert_eq!(config.bind_addr, "0.0.0.0:8000");
    }

    #[test]
    fn test_overrides() {
        let config = ServerConfig::from_lookup(|key| match key {
            "LLM_BACKEND" => Some("Ollama".into()),
            "CHAT_MODEL" => Some("llama3.2".into()),
            "AGENT_TURN_TIMEOUT_SECS" => Some("5".into()),
            "SESSION_IDLE_TIMEOUT_SECS" => Some("120".into()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.backend, LlmBackend::Ollama);
        assert_eq!(config.chat_model, "llama3.2");
        assert_eq!(config.turn_timeout, Duration::from_secs(5));
        assert_eq!(config.session_idle_timeout, Duration::from_secs(120));
    }

    #[test]
    fn test_invalid_values_are_config_errors() {
        let err = ServerConfig::from_lookup(|key| (key == "LLM_BACKEND").then(|| "claude".into()))
            .unwrap_err();
        assert!(err.is_configuration());

        let err = ServerConfig::from_lookup(|key| {
            (key == "TOOL_LOAD_TIMEOUT_SECS").then(|| "soon".into())
        })
        .unwrap_err();
        assert!(matches!(err, AgentError::Config(_)));
    }
}
