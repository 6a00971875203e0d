//! Agent Routing
//!
//! Picks which agent handles an utterance. Explicit modes win outright; in
//! [`RouteMode::Auto`] the lowercased text is scored against two fixed
//! keyword lists by substring containment.
//!
//! The calculator only wins on a strictly higher score. Ties, including the
//! all-zero case, go to the weather agent.

use serde::{Deserialize, Serialize};

/// Calculator keyword list
pub const CALCULATOR_KEYWORDS: [&str; 10] = [
    "add", "subtract", "multiply", "divide", "calculate", "math", "number", "sum", "product",
    "power",
];

/// Weather keyword list
pub const WEATHER_KEYWORDS: [&str; 10] = [
    "weather",
    "temperature",
    "forecast",
    "city",
    "climate",
    "hot",
    "cold",
    "rain",
    "sunny",
    "humidity",
];

/// Agent identity
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentKind {
    Calculator,
    Weather,
}

impl AgentKind {
    /// Display label used to prefix replies
    pub const fn label(self) -> &'static str {
        match self {
            Self::Calculator => "🧮 Calculator",
            Self::Weather => "🌤️ Weather",
        }
    }

    /// Short provider name used in logs and status text
    pub const fn name(self) -> &'static str {
        match self {
            Self::Calculator => "calculator",
            Self::Weather => "weather",
        }
    }
}

impl std::fmt::Display for AgentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// How the front end asked for the turn to be routed
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteMode {
    Calculator,
    Weather,
    #[default]
    Auto,
}

/// Keyword scores for one utterance
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Scores {
    pub calculator: usize,
    pub weather: usize,
}

/// Count the keywords present (as substrings) in the lowercased text.
///
/// Each keyword contributes at most one point.
pub fn score(utterance: &str) -> Scores {
    let lowered = utterance.to_lowercase();
    let hits = |keywords: &[&str]| keywords.iter().filter(|k| lowered.contains(**k)).count();

    Scores {
        calculator: hits(&CALCULATOR_KEYWORDS),
        weather: hits(&WEATHER_KEYWORDS),
    }
}

/// Resolve the target agent. Pure; never fails.
pub fn route(utterance: &str, mode: RouteMode) -> AgentKind {
    match mode {
        RouteMode::Calculator => AgentKind::Calculator,
        RouteMode::Weather => AgentKind::Weather,
        RouteMode::Auto => {
            let scores = score(utterance);
            if scores.calculator > scores.weather {
                AgentKind::Calculator
            } else {
                AgentKind::Weather
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_modes_skip_scoring() {
        assert_eq!(
            route("what's the weather in Tokyo", RouteMode::Calculator),
            AgentKind::Calculator
        );
        assert_eq!(route("multiply 8 and 12", RouteMode::Weather), AgentKind::Weather);
    }

    #[test]
    fn test_auto_prefers_calculator_on_strict_win() {
        assert_eq!(route("Multiply 8 and 12", RouteMode::Auto), AgentKind::Calculator);
        assert_eq!(
            route("Calculate 5 to the power of 3", RouteMode::Auto),
            AgentKind::Calculator
        );
    }

    #[test]
    fn test_auto_no_keywords_goes_to_weather() {
        // "What is 15 + 27?" matches no keyword in either list.
        assert_eq!(score("What is 15 + 27?"), Scores::default());
        assert_eq!(route("What is 15 + 27?", RouteMode::Auto), AgentKind::Weather);
    }

    #[test]
    fn test_auto_tie_goes_to_weather() {
        let text = "add the rain";
        assert_eq!(score(text), Scores { calculator: 1, weather: 1 });
        assert_eq!(route(text, RouteMode::Auto), AgentKind::Weather);
    }

    #[test]
    fn test_scoring_is_case_insensitive_substring() {
        // "PHOTOSYNTHESIS" contains "hot"; "ADDRESS" contains "add".
        let scores = score("ADDRESS of the PHOTOSYNTHESIS lab");
        assert_eq!(scores, Scores { calculator: 1, weather: 1 });
    }

    #[test]
    fn test_repeated_keyword_counts_once() {
        let scores = score("add add add, then add");
        assert_eq!(scores.calculator, 1);
        assert_eq!(route("add add add rain sunny", RouteMode::Auto), AgentKind::Weather);
    }

    #[test]
    fn test_route_is_deterministic() {
        for text in ["sum of the product", "hot and cold", "", "power"] {
            assert_eq!(route(text, RouteMode::Auto), route(text, RouteMode::Auto));
        }
    }

    #[test]
    fn test_mode_wire_format() {
        let mode: RouteMode = serde_json::from_str(r#""auto""#).unwrap();
        assert_eq!(mode, RouteMode::Auto);
        assert_eq!(serde_json::to_string(&AgentKind::Weather).unwrap(), r#""weather""#);
    }
}
