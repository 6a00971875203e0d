//! Agent Construction
//!
//! Loads both tool catalogs (each under its own deadline) and binds them,
//! together with the completion client and a prompt template, into the
//! calculator and weather agents. Construction is all-or-nothing: the first
//! provider that fails aborts the whole build and is named in the failure.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::deadline::bounded;
use crate::error::{AgentError, Result};
use crate::provider::{GenerationOptions, LlmProvider};
use crate::reasoning::{Agent, AgentBuilder};
use crate::router::AgentKind;
use crate::tool::ToolRegistry;

/// System prompt for the calculator agent
pub const CALCULATOR_PROMPT: &str = "You are a helpful calculator assistant. Use the available tools to perform mathematical calculations. Always use the appropriate tool for calculations.";

/// System prompt for the weather agent
pub const WEATHER_PROMPT: &str = "You are a helpful weather assistant. Use the available tools to provide weather information. Always use the appropriate tool for weather queries.";

/// Default per-provider load ceiling
pub const DEFAULT_LOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// Somewhere a catalog of callable tools can be fetched from
#[async_trait]
pub trait ToolSource: Send + Sync {
    /// Provider name ("calculator", "weather")
    fn name(&self) -> &str;

    /// Where the provider lives, for status messages
    fn endpoint(&self) -> &str;

    /// Fetch the provider's full catalog
    async fn load_tools(&self) -> Result<ToolRegistry>;
}

/// The two initialized agents of a ready session
#[derive(Clone, Debug)]
pub struct AgentSet {
    pub calculator: Arc<Agent>,
    pub weather: Arc<Agent>,
}

/// Why a build was aborted
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InitFailure {
    /// Which collaborator failed ("calculator", "weather", "llm")
    pub provider: String,
    /// Display text for the front end
    pub reason: String,
}

impl std::fmt::Display for InitFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.reason)
    }
}

enum CompletionBinding {
    Bound(Arc<dyn LlmProvider>),
    Missing(String),
}

/// Builds fresh agent pairs on demand
pub struct AgentFactory {
    completion: CompletionBinding,
    calculator: Arc<dyn ToolSource>,
    weather: Arc<dyn ToolSource>,
    generation: GenerationOptions,
    load_timeout: Duration,
}

impl AgentFactory {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        calculator: Arc<dyn ToolSource>,
        weather: Arc<dyn ToolSource>,
    ) -> Self {
        Self {
            completion: CompletionBinding::Bound(provider),
            calculator,
            weather,
            generation: GenerationOptions::default(),
            load_timeout: DEFAULT_LOAD_TIMEOUT,
        }
    }

    /// A factory whose completion client could not be configured.
    ///
    /// Every build fails with `error` once the tool catalogs have loaded.
    pub fn without_provider(
        error: &AgentError,
        calculator: Arc<dyn ToolSource>,
        weather: Arc<dyn ToolSource>,
    ) -> Self {
        Self {
            completion: CompletionBinding::Missing(error.to_string()),
            calculator,
            weather,
            generation: GenerationOptions::default(),
            load_timeout: DEFAULT_LOAD_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_generation(mut self, generation: GenerationOptions) -> Self {
        self.generation = generation;
        self
    }

    #[must_use]
    pub const fn with_load_timeout(mut self, timeout: Duration) -> Self {
        self.load_timeout = timeout;
        self
    }

    pub const fn load_timeout(&self) -> Duration {
        self.load_timeout
    }

    /// Load both catalogs, calculator first, and bind the agents
    pub async fn build(&self) -> std::result::Result<AgentSet, InitFailure> {
        let calculator_tools = self.load(self.calculator.as_ref()).await?;
        let weather_tools = self.load(self.weather.as_ref()).await?;

        let provider = match &self.completion {
            CompletionBinding::Bound(provider) => provider.clone(),
            CompletionBinding::Missing(reason) => {
                tracing::error!(reason = %reason, "Completion client not configured");
                return Err(InitFailure {
                    provider: "llm".into(),
                    reason: format!("Failed to initialize agents: {reason}"),
                });
            }
        };

        let calculator = self.bind(
            AgentKind::Calculator,
            CALCULATOR_PROMPT,
            calculator_tools,
            provider.clone(),
        )?;
        let weather = self.bind(AgentKind::Weather, WEATHER_PROMPT, weather_tools, provider)?;

        tracing::info!("Agents created successfully");
        Ok(AgentSet {
            calculator,
            weather,
        })
    }

    async fn load(&self, source: &dyn ToolSource) -> std::result::Result<ToolRegistry, InitFailure> {
        let name = source.name();
        let operation = format!("{name} tool load");

        match bounded(self.load_timeout, &operation, source.load_tools()).await {
            Ok(tools) => {
                tracing::info!(provider = name, count = tools.len(), "Tools loaded");
                Ok(tools)
            }
            Err(e) if e.is_timeout() => {
                tracing::error!(provider = name, endpoint = source.endpoint(), "Tool load timed out");
                Err(InitFailure {
                    provider: name.to_string(),
                    reason: format!(
                        "Timeout connecting to {name} server. Make sure it's running on {}",
                        source.endpoint()
                    ),
                })
            }
            Err(e) => {
                tracing::error!(provider = name, error = %e, "Tool load failed");
                Err(InitFailure {
                    provider: name.to_string(),
                    reason: format!("Error loading {name} tools: {e}"),
                })
            }
        }
    }

    fn bind(
        &self,
        kind: AgentKind,
        prompt: &str,
        tools: ToolRegistry,
        provider: Arc<dyn LlmProvider>,
    ) -> std::result::Result<Arc<Agent>, InitFailure> {
        AgentBuilder::new()
            .provider(provider)
            .label(kind.label())
            .system_prompt(prompt)
            .generation(self.generation.clone())
            .tools(tools)
            .build()
            .map(Arc::new)
            .map_err(|e| InitFailure {
                provider: kind.name().into(),
                reason: format!("Failed to initialize agents: {e}"),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedProvider, StaticSource};

    fn provider() -> Arc<dyn LlmProvider> {
        Arc::new(ScriptedProvider::repeating("ok"))
    }

    #[tokio::test]
    async fn test_build_binds_both_catalogs() {
        let factory = AgentFactory::new(
            provider(),
            Arc::new(StaticSource::ready("calculator", &["add_numbers", "divide_numbers"])),
            Arc::new(StaticSource::ready("weather", &["get_weather"])),
        );

        let agents = factory.build().await.unwrap();
        assert_eq!(agents.calculator.label(), "🧮 Calculator");
        assert_eq!(agents.calculator.tools().len(), 2);
        assert_eq!(agents.weather.tools().names(), vec!["get_weather"]);
        assert!(agents.weather.config().system_prompt.starts_with(WEATHER_PROMPT));
    }

    #[tokio::test(start_paused = true)]
    async fn test_weather_timeout_names_weather() {
        let factory = AgentFactory::new(
            provider(),
            Arc::new(StaticSource::ready("calculator", &["add_numbers"])),
            Arc::new(StaticSource::hanging("weather")),
        )
        .with_load_timeout(Duration::from_secs(30));

        let failure = factory.build().await.unwrap_err();
        assert_eq!(failure.provider, "weather");
        assert_eq!(
            failure.reason,
            "Timeout connecting to weather server. Make sure it's running on http://localhost:0/weather"
        );
    }

    #[tokio::test]
    async fn test_calculator_error_aborts_before_weather() {
        let weather = Arc::new(StaticSource::ready("weather", &["get_weather"]));
        let factory = AgentFactory::new(
            provider(),
            Arc::new(StaticSource::failing("calculator", "connection refused")),
            weather.clone(),
        );

        let failure = factory.build().await.unwrap_err();
        assert_eq!(failure.provider, "calculator");
        assert!(failure.reason.starts_with("Error loading calculator tools:"));
        assert!(failure.reason.contains("connection refused"));
        assert_eq!(weather.loads(), 0);
    }

    #[tokio::test]
    async fn test_missing_provider_fails_build() {
        let factory = AgentFactory::without_provider(
            &AgentError::Config("OPENAI_API_KEY is not set".into()),
            Arc::new(StaticSource::ready("calculator", &["add_numbers"])),
            Arc::new(StaticSource::ready("weather", &["get_weather"])),
        );

        let failure = factory.build().await.unwrap_err();
        assert_eq!(failure.provider, "llm");
        assert!(failure.reason.contains("OPENAI_API_KEY"));
    }
}
