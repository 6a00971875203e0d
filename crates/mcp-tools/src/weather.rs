//! Weather tools
//!
//! Static sample data only; lookups are exact-match on the city name.

use std::fmt::Write;

use agent_core::{
    error::Result,
    tool::{ParameterSchema, Tool, ToolCall, ToolRegistry, ToolResult, ToolSchema},
};
use async_trait::async_trait;
use serde_json::json;

/// Server name advertised during the handshake
pub const SERVER_NAME: &str = "WeatherServer";

/// Forecasts never extend past this many days
pub const MAX_FORECAST_DAYS: usize = 3;

const CURRENT: &[(&str, &str)] = &[
    ("New York", "🌤️ Sunny, 72°F (22°C), Humidity: 65%, Wind: 8 mph"),
    ("London", "🌧️ Rainy, 55°F (13°C), Humidity: 85%, Wind: 12 mph"),
    ("Tokyo", "☁️ Cloudy, 68°F (20°C), Humidity: 70%, Wind: 5 mph"),
    ("Sydney", "☀️ Clear, 75°F (24°C), Humidity: 60%, Wind: 10 mph"),
    ("Paris", "⛅ Partly Cloudy, 62°F (17°C), Humidity: 75%, Wind: 6 mph"),
    ("Berlin", "🌦️ Light Rain, 58°F (14°C), Humidity: 80%, Wind: 9 mph"),
    ("Moscow", "❄️ Snow, 28°F (-2°C), Humidity: 70%, Wind: 15 mph"),
    ("Dubai", "☀️ Sunny, 88°F (31°C), Humidity: 45%, Wind: 3 mph"),
    ("Singapore", "🌧️ Thunderstorm, 82°F (28°C), Humidity: 90%, Wind: 7 mph"),
    ("Mumbai", "🌤️ Partly Sunny, 85°F (29°C), Humidity: 75%, Wind: 4 mph"),
];

const FORECASTS: &[(&str, [&str; MAX_FORECAST_DAYS])] = &[
    (
        "New York",
        [
            "🌤️ Day 1: Sunny, 72°F | 🌙 Night: Clear, 58°F",
            "⛅ Day 2: Partly Cloudy, 68°F | 🌙 Night: Cloudy, 55°F",
            "🌧️ Day 3: Light Rain, 65°F | 🌙 Night: Rain, 52°F",
        ],
    ),
    (
        "London",
        [
            "🌧️ Day 1: Rain, 55°F | 🌙 Night: Heavy Rain, 48°F",
            "⛅ Day 2: Partly Cloudy, 58°F | 🌙 Night: Clear, 50°F",
            "🌤️ Day 3: Sunny, 62°F | 🌙 Night: Clear, 53°F",
        ],
    ),
    (
        "Tokyo",
        [
            "☁️ Day 1: Cloudy, 68°F | 🌙 Night: Overcast, 60°F",
            "🌧️ Day 2: Rain, 65°F | 🌙 Night: Rain, 58°F",
            "⛅ Day 3: Partly Cloudy, 70°F | 🌙 Night: Clear, 62°F",
        ],
    ),
];

const ALERTS: &[(&str, &str)] = &[
    ("New York", "⚠️ No active weather alerts"),
    ("London", "⚠️ Flood warning in effect until tomorrow"),
    ("Tokyo", "⚠️ Typhoon warning - stay indoors"),
    ("Sydney", "⚠️ No active weather alerts"),
    ("Paris", "⚠️ High wind warning until evening"),
];

fn lookup<'a, T>(table: &'a [(&str, T)], city: &str) -> Option<&'a T> {
    table.iter().find(|(name, _)| *name == city).map(|(_, v)| v)
}

pub fn current_weather(city: &str) -> String {
    lookup(CURRENT, city).map_or_else(
        || format!("Weather data not available for {city}"),
        ToString::to_string,
    )
}

/// Forecast for up to [`MAX_FORECAST_DAYS`] days; non-positive `days` yields only the heading.
pub fn forecast(city: &str, days: i64) -> String {
    let Some(lines) = lookup(FORECASTS, city) else {
        return format!("Weather forecast not available for {city}");
    };

    let count = usize::try_from(days).unwrap_or(0).min(MAX_FORECAST_DAYS);
    let mut out = format!("Weather forecast for {city}:\n");
    for line in &lines[..count] {
        let _ = writeln!(out, "  {line}");
    }
    out
}

/// `C × 9 / 5 + 32` evaluated left to right (not fused), one decimal place
#[allow(clippy::suboptimal_flops)]
pub fn celsius_to_fahrenheit(celsius: f64) -> String {
    let fahrenheit = celsius * 9.0 / 5.0 + 32.0;
    format!("{celsius}°C = {fahrenheit:.1}°F")
}

pub fn alerts(city: &str) -> String {
    lookup(ALERTS, city).map_or_else(
        || format!("No weather alert data available for {city}"),
        ToString::to_string,
    )
}

fn city_parameter() -> ParameterSchema {
    ParameterSchema::required("city", "string", "City name")
}

pub struct GetWeatherTool;

#[async_trait]
impl Tool for GetWeatherTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_weather".into(),
            description: "Get weather information for a city (static data)".into(),
            parameters: vec![city_parameter()],
        }
    }

    async fn execute(&self, call: &ToolCall) -> Result<ToolResult> {
        Ok(ToolResult::success("get_weather", current_weather(call.string("city")?)))
    }
}

pub struct ForecastTool;

#[async_trait]
impl Tool for ForecastTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_weather_forecast".into(),
            description:
                "Get weather forecast for a city for specified number of days (static data)".into(),
            parameters: vec![
                city_parameter(),
                ParameterSchema::optional("days", "integer", "Number of days", json!(3)),
            ],
        }
    }

    async fn execute(&self, call: &ToolCall) -> Result<ToolResult> {
        let city = call.string("city")?;
        let days = call.optional_integer("days")?.unwrap_or(3);
        Ok(ToolResult::success("get_weather_forecast", forecast(city, days)))
    }
}

pub struct TemperatureConversionTool;

#[async_trait]
impl Tool for TemperatureConversionTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_temperature_conversion".into(),
            description: "Convert Celsius to Fahrenheit".into(),
            parameters: vec![ParameterSchema::required(
                "celsius",
                "number",
                "Temperature in Celsius",
            )],
        }
    }

    async fn execute(&self, call: &ToolCall) -> Result<ToolResult> {
        Ok(ToolResult::success(
            "get_temperature_conversion",
            celsius_to_fahrenheit(call.number("celsius")?),
        ))
    }
}

pub struct AlertsTool;

#[async_trait]
impl Tool for AlertsTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_weather_alerts".into(),
            description: "Get weather alerts for a city (static data)".into(),
            parameters: vec![city_parameter()],
        }
    }

    async fn execute(&self, call: &ToolCall) -> Result<ToolResult> {
        Ok(ToolResult::success("get_weather_alerts", alerts(call.string("city")?)))
    }
}

/// Weather catalog in declaration order
pub fn weather_registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(GetWeatherTool);
    registry.register(ForecastTool);
    registry.register(TemperatureConversionTool);
    registry.register(AlertsTool);
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_and_unknown_cities() {
        assert_eq!(
            current_weather("Tokyo"),
            "☁️ Cloudy, 68°F (20°C), Humidity: 70%, Wind: 5 mph"
        );
        assert_eq!(current_weather("Atlantis"), "Weather data not available for Atlantis");
        assert_eq!(current_weather("tokyo"), "Weather data not available for tokyo");
        assert_eq!(alerts("London"), "⚠️ Flood warning in effect until tomorrow");
        assert_eq!(alerts("Dubai"), "No weather alert data available for Dubai");
    }

    #[test]
    fn test_forecast_caps_days() {
        let out = forecast("New York", 5);
        assert!(out.starts_with("Weather forecast for New York:\n"));
        assert_eq!(out.lines().count(), 4);
        assert!(out.ends_with("🌧️ Day 3: Light Rain, 65°F | 🌙 Night: Rain, 52°F\n"));

        assert_eq!(forecast("London", 1).lines().count(), 2);
        assert_eq!(forecast("London", 0), "Weather forecast for London:\n");
        assert_eq!(forecast("Paris", 3), "Weather forecast not available for Paris");
    }

    #[test]
    fn test_temperature_conversion() {
        assert_eq!(celsius_to_fahrenheit(0.0), "0°C = 32.0°F");
        assert_eq!(celsius_to_fahrenheit(100.0), "100°C = 212.0°F");
        assert_eq!(celsius_to_fahrenheit(25.5), "25.5°C = 77.9°F");
        assert_eq!(celsius_to_fahrenheit(-40.0), "-40°C = -40.0°F");
    }

    #[test]
    fn test_temperature_conversion_rounds_ties_like_stepwise_arithmetic() {
        assert_eq!(celsius_to_fahrenheit(-50.75), "-50.75°C = -59.3°F");
        assert_eq!(celsius_to_fahrenheit(-52.25), "-52.25°C = -62.0°F");
        assert_eq!(celsius_to_fahrenheit(-58.25), "-58.25°C = -72.8°F");
    }

    #[tokio::test]
    async fn test_forecast_defaults_to_three_days() {
        let result = weather_registry()
            .execute(&ToolCall::new("get_weather_forecast").arg("city", "Tokyo"))
            .await
            .unwrap();
        assert_eq!(result.output.lines().count(), 4);
    }

    #[test]
    fn test_catalog_order() {
        assert_eq!(
            weather_registry().names(),
            vec![
                "get_weather",
                "get_weather_forecast",
                "get_temperature_conversion",
                "get_weather_alerts"
            ]
        );
    }
}
