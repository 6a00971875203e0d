//! Error Types

use std::time::Duration;

use thiserror::Error;

/// Result type alias for agent operations
pub type Result<T> = std::result::Result<T, AgentError>;

/// Agent error types
#[derive(Error, Debug)]
pub enum AgentError {
    /// Completion provider returned an error
    #[error("Provider error: {0}")]
    Provider(String),

    /// Completion provider unreachable or not responding
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// Tool not found in catalog
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// Tool arguments failed validation
    #[error("Tool validation error: {0}")]
    ToolValidation(String),

    /// Tool execution failed
    #[error("Tool execution error: {0}")]
    ToolExecution(String),

    /// A remote tool provider could not be reached or answered with a fault
    #[error("Tool provider '{provider}' failed: {message}")]
    ToolProvider { provider: String, message: String },

    /// A bounded wait elapsed before the operation finished
    #[error("{operation} timed out after {}s", after.as_secs())]
    Timeout { operation: String, after: Duration },

    /// Maximum iterations reached in reasoning loop
    #[error("Maximum iterations ({0}) reached")]
    MaxIterations(usize),

    /// Configuration error (missing credentials, bad settings)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Rate limited
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Authentication failed
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AgentError {
    /// Connection-class failure: something on the other end of the wire is
    /// unreachable or too slow.
    pub const fn is_connection(&self) -> bool {
        matches!(
            self,
            Self::ProviderUnavailable(_) | Self::ToolProvider { .. } | Self::Timeout { .. }
        )
    }

    /// Configuration-class failure: credentials or settings are missing.
    pub const fn is_configuration(&self) -> bool {
        matches!(self, Self::Config(_) | Self::Auth(_))
    }

    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_taxonomy() {
        let timeout = AgentError::Timeout {
            operation: "weather tool load".into(),
            after: Duration::from_secs(30),
        };
        assert!(timeout.is_connection());
        assert!(timeout.is_timeout());
        assert_eq!(timeout.to_string(), "weather tool load timed out after 30s");

        let missing_key = AgentError::Config("OPENAI_API_KEY is not set".into());
        assert!(missing_key.is_configuration());
        assert!(!missing_key.is_connection());
    }
}
