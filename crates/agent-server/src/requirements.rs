//! Requirements gateway
//!
//! Single-shot completions that extract or review engineering requirements.

use agent_core::{
    error::Result,
    message::Message,
    provider::{GenerationOptions, LlmProvider},
};

pub const UNKNOWN_AGENT_TYPE: &str = "Unknown agent type. Use 'extract' or 'validate'.";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequirementsTask {
    Extract,
    Validate,
}

impl RequirementsTask {
    /// Exact, case-sensitive match on `extract` / `validate`
    pub fn parse(agent_type: &str) -> Option<Self> {
        match agent_type {
            "extract" => Some(Self::Extract),
            "validate" => Some(Self::Validate),
            _ => None,
        }
    }

    pub fn prompt(self, input: &str) -> String {
        match self {
            Self::Extract => format!(
                "Extract structured engineering requirements from the following text:\n\n{input}\n\nFormat:\n- [ID]: [Requirement]"
            ),
            Self::Validate => format!(
                "Check the following engineering requirements for completeness, clarity, and testability:\n\n{input}\n\nReturn feedback on each."
            ),
        }
    }

    /// One completion over a single user message; the reply is trimmed
    pub async fn run(self, provider: &dyn LlmProvider, model: &str, input: &str) -> Result<String> {
        let messages = [Message::user(self.prompt(input))];
        let options = GenerationOptions::for_model(model);

        tracing::info!(task = ?self, model, "Running requirements task");
        let completion = provider.complete(&messages, &options).await?;
        Ok(completion.content.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_core::{message::Role, testing::ScriptedProvider};

    #[test]
    fn test_parse_is_exact() {
        assert_eq!(RequirementsTask::parse("extract"), Some(RequirementsTask::Extract));
        assert_eq!(RequirementsTask::parse("validate"), Some(RequirementsTask::Validate));
        assert_eq!(RequirementsTask::parse("Extract"), None);
        assert_eq!(RequirementsTask::parse("summarize"), None);
    }

    #[test]
    fn test_prompts_embed_input() {
        let prompt = RequirementsTask::Extract.prompt("The system shall log in within 2s.");
        assert_eq!(
            prompt,
            "Extract structured engineering requirements from the following text:\n\nThe system shall log in within 2s.\n\nFormat:\n- [ID]: [Requirement]"
        );
        assert!(RequirementsTask::Validate.prompt("R1").ends_with("\n\nR1\n\nReturn feedback on each."));
    }

    #[tokio::test]
    async fn test_run_sends_single_user_message() {
        let provider = ScriptedProvider::new(["  - R1: Login within 2s\n"]);
        let reply = RequirementsTask::Extract
            .run(&provider, "gpt-4", "log in fast")
            .await
            .unwrap();

        assert_eq!(reply, "- R1: Login within 2s");
        let calls = provider.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].len(), 1);
        assert_eq!(calls[0][0].role, Role::User);

        let options = provider.options();
        assert_eq!(options[0].model, "gpt-4");
        assert!((options[0].temperature - 0.3).abs() < f32::EPSILON);
    }
}
