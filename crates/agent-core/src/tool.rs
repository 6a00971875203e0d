//! Tool System
//!
//! Tool framework shared by the tool servers (which implement [`Tool`]
//! directly) and the agents (which hold remote tools behind the same trait).
//! A [`ToolRegistry`] is a fixed, ordered catalog resolved once at startup.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{AgentError, Result};

/// Tool call request from the LLM
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ToolCall {
    /// Tool identifier
    #[serde(alias = "tool")]
    pub name: String,

    /// Arguments as key-value pairs
    #[serde(default)]
    pub arguments: HashMap<String, Value>,

    /// Optional call ID for tracking
    #[serde(default)]
    pub id: Option<String>,
}

impl ToolCall {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn arg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.arguments.insert(key.into(), value.into());
        self
    }

    fn required(&self, key: &str) -> Result<&Value> {
        self.arguments
            .get(key)
            .filter(|v| !v.is_null())
            .ok_or_else(|| AgentError::ToolValidation(format!("Missing required parameter: {key}")))
    }

    /// Integer argument; integral floats and numeric strings are coerced.
    pub fn integer(&self, key: &str) -> Result<i64> {
        let value = self.required(key)?;
        coerce_integer(value).ok_or_else(|| {
            AgentError::ToolValidation(format!("Parameter '{key}' must be an integer, got {value}"))
        })
    }

    /// Integer argument that may be omitted.
    pub fn optional_integer(&self, key: &str) -> Result<Option<i64>> {
        match self.arguments.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(_) => self.integer(key).map(Some),
        }
    }

    /// Numeric argument; numeric strings are coerced.
    pub fn number(&self, key: &str) -> Result<f64> {
        let value = self.required(key)?;
        let parsed = match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        };
        parsed.ok_or_else(|| {
            AgentError::ToolValidation(format!("Parameter '{key}' must be a number, got {value}"))
        })
    }

    /// String argument.
    pub fn string(&self, key: &str) -> Result<&str> {
        self.required(key)?.as_str().ok_or_else(|| {
            AgentError::ToolValidation(format!("Parameter '{key}' must be a string"))
        })
    }
}

#[allow(clippy::cast_possible_truncation, clippy::float_cmp)]
fn coerce_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < 9.0e15)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Result from tool execution
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolResult {
    /// Tool that was called
    pub name: String,

    /// Call ID (if provided in request)
    pub id: Option<String>,

    /// Whether execution succeeded
    pub success: bool,

    /// Output (success message or error)
    pub output: String,
}

impl ToolResult {
    pub fn success(name: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: None,
            success: true,
            output: output.into(),
        }
    }

    pub fn failure(name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: None,
            success: false,
            output: error.into(),
        }
    }
}

/// Parameter definition for tool schema
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ParameterSchema {
    /// Parameter name
    pub name: String,

    /// JSON Schema type (string, integer, number, boolean, object, array)
    #[serde(rename = "type")]
    pub param_type: String,

    /// Human-readable description
    pub description: String,

    /// Whether this parameter is required
    #[serde(default)]
    pub required: bool,

    /// Default value if not provided
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl ParameterSchema {
    pub fn required(
        name: impl Into<String>,
        param_type: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            param_type: param_type.into(),
            description: description.into(),
            required: true,
            default: None,
        }
    }

    pub fn optional(
        name: impl Into<String>,
        param_type: impl Into<String>,
        description: impl Into<String>,
        default: Value,
    ) -> Self {
        Self {
            name: name.into(),
            param_type: param_type.into(),
            description: description.into(),
            required: false,
            default: Some(default),
        }
    }
}

/// Tool definition schema (for LLM function calling)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolSchema {
    /// Unique tool identifier
    pub name: String,

    /// Human-readable description (shown to LLM)
    pub description: String,

    /// Parameter definitions
    pub parameters: Vec<ParameterSchema>,
}

impl ToolSchema {
    /// Render as a JSON Schema object (`inputSchema` on the wire).
    pub fn input_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();

        for param in &self.parameters {
            let mut prop = json!({
                "type": param.param_type,
                "description": param.description,
            });
            if let Some(default) = &param.default {
                prop["default"] = default.clone();
            }
            properties.insert(param.name.clone(), prop);
            if param.required {
                required.push(Value::String(param.name.clone()));
            }
        }

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// Rebuild a schema from a name, description and JSON Schema object.
    pub fn from_input_schema(
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: &Value,
    ) -> Self {
        let required: Vec<&str> = input_schema["required"]
            .as_array()
            .map(|names| names.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();

        let parameters = input_schema["properties"]
            .as_object()
            .map(|props| {
                props
                    .iter()
                    .map(|(param, spec)| ParameterSchema {
                        name: param.clone(),
                        param_type: spec["type"].as_str().unwrap_or("string").to_string(),
                        description: spec["description"]
                            .as_str()
                            .or_else(|| spec["title"].as_str())
                            .unwrap_or_default()
                            .to_string(),
                        required: required.contains(&param.as_str()),
                        default: spec.get("default").cloned(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}

/// `{name, description}` pair shown in catalogs and the UI sidebar
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolSummary {
    pub name: String,
    pub description: String,
}

/// Tool trait - implement to add new capabilities
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get the tool's schema for LLM function calling
    fn schema(&self) -> ToolSchema;

    /// Execute the tool with given arguments
    async fn execute(&self, call: &ToolCall) -> Result<ToolResult>;

    /// Validate arguments before execution (optional)
    fn validate(&self, call: &ToolCall) -> Result<()> {
        let schema = self.schema();

        for param in &schema.parameters {
            if param.required && !call.arguments.contains_key(&param.name) {
                return Err(AgentError::ToolValidation(format!(
                    "Missing required parameter: {}",
                    param.name
                )));
            }
        }

        Ok(())
    }
}

/// Ordered catalog of available tools
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}

impl FromIterator<Arc<dyn Tool>> for ToolRegistry {
    fn from_iter<I: IntoIterator<Item = Arc<dyn Tool>>>(iter: I) -> Self {
        let mut registry = Self::new();
        for tool in iter {
            registry.register_boxed(tool);
        }
        registry
    }
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// Register a new tool
    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        self.register_boxed(Arc::new(tool));
    }

    /// Register a shared tool; a tool with the same name is replaced in place
    pub fn register_boxed(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.schema().name;
        match self.tools.iter().position(|t| t.schema().name == name) {
            Some(idx) => self.tools[idx] = tool,
            None => self.tools.push(tool),
        }
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.schema().name == name).cloned()
    }

    /// Execute a tool call
    pub async fn execute(&self, call: &ToolCall) -> Result<ToolResult> {
        let tool = self
            .get(&call.name)
            .ok_or_else(|| AgentError::ToolNotFound(call.name.clone()))?;

        tool.validate(call)?;

        tool.execute(call).await
    }

    /// All tool schemas, in registration order
    pub fn schemas(&self) -> Vec<ToolSchema> {
        self.tools.iter().map(|t| t.schema()).collect()
    }

    /// `{name, description}` catalog, in registration order
    pub fn summaries(&self) -> Vec<ToolSummary> {
        self.tools
            .iter()
            .map(|t| {
                let schema = t.schema();
                ToolSummary {
                    name: schema.name,
                    description: schema.description,
                }
            })
            .collect()
    }

    /// Tool names
    pub fn names(&self) -> Vec<String> {
        self.tools.iter().map(|t| t.schema().name).collect()
    }

    /// Number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Generate system prompt section describing available tools
    pub fn generate_prompt_section(&self) -> String {
        use std::fmt::Write;

        let mut prompt = String::from("## Available Tools\n\n");
        prompt.push_str("You can use the following tools by responding with a JSON block:\n\n");
        prompt.push_str(
            "```tool\n{\"tool\": \"tool_name\", \"arguments\": {\"arg\": \"value\"}}\n```\n\n",
        );

        for schema in self.schemas() {
            let _ = writeln!(prompt, "### {}", schema.name);
            let _ = writeln!(prompt, "{}", schema.description);

            if !schema.parameters.is_empty() {
                prompt.push_str("**Parameters:**\n");
                for param in &schema.parameters {
                    let required = if param.required { " (required)" } else { "" };
                    let _ = writeln!(
                        prompt,
                        "- `{}` ({}){}: {}",
                        param.name, param.param_type, required, param.description
                    );
                }
            }
            prompt.push('\n');
        }

        prompt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn schema(&self) -> ToolSchema {
            ToolSchema {
                name: "echo".into(),
                description: "Echo the text back".into(),
                parameters: vec![ParameterSchema::required("text", "string", "Text to echo")],
            }
        }

        async fn execute(&self, call: &ToolCall) -> Result<ToolResult> {
            Ok(ToolResult::success("echo", call.string("text")?))
        }
    }

    struct ShoutTool;

    #[async_trait]
    impl Tool for ShoutTool {
        fn schema(&self) -> ToolSchema {
            ToolSchema {
                name: "shout".into(),
                description: "Upper-case the text".into(),
                parameters: vec![],
            }
        }

        async fn execute(&self, _call: &ToolCall) -> Result<ToolResult> {
            Ok(ToolResult::success("shout", "HEY"))
        }
    }

    #[test]
    fn test_tool_registry_keeps_order() {
        let mut registry = ToolRegistry::new();
        registry.register(ShoutTool);
        registry.register(EchoTool);

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.names(), vec!["shout", "echo"]);
        assert!(registry.get("echo").is_some());
        assert!(registry.get("unknown").is_none());
    }

    #[tokio::test]
    async fn test_registry_validates_before_execute() {
        let mut registry = ToolRegistry::new();
        registry.register(EchoTool);

        let err = registry.execute(&ToolCall::new("echo")).await.unwrap_err();
        assert!(matches!(err, AgentError::ToolValidation(_)));

        let err = registry.execute(&ToolCall::new("nope")).await.unwrap_err();
        assert!(matches!(err, AgentError::ToolNotFound(_)));

        let ok = registry
            .execute(&ToolCall::new("echo").arg("text", "hi"))
            .await
            .unwrap();
        assert_eq!(ok.output, "hi");
    }

    #[test]
    fn test_argument_coercion() {
        let call = ToolCall::new("x")
            .arg("a", 4)
            .arg("b", 7.0)
            .arg("c", "12")
            .arg("d", 2.5)
            .arg("e", true);

        assert_eq!(call.integer("a").unwrap(), 4);
        assert_eq!(call.integer("b").unwrap(), 7);
        assert_eq!(call.integer("c").unwrap(), 12);
        assert!(call.integer("d").is_err());
        assert!(call.integer("e").is_err());
        assert!((call.number("d").unwrap() - 2.5).abs() < f64::EPSILON);
        assert_eq!(call.optional_integer("missing").unwrap(), None);
    }

    #[test]
    fn test_tool_call_accepts_tool_key() {
        let call: ToolCall =
            serde_json::from_str(r#"{"tool": "add_numbers", "arguments": {"a": 1, "b": 2}}"#)
                .unwrap();
        assert_eq!(call.name, "add_numbers");
        assert_eq!(call.integer("b").unwrap(), 2);
    }

    #[test]
    fn test_input_schema_roundtrips_parameters() {
        let schema = ToolSchema {
            name: "get_weather_forecast".into(),
            description: "Forecast".into(),
            parameters: vec![
                ParameterSchema::required("city", "string", "City name"),
                ParameterSchema::optional("days", "integer", "Days", json!(3)),
            ],
        };

        let value = schema.input_schema();
        assert_eq!(value["required"], json!(["city"]));
        assert_eq!(value["properties"]["days"]["default"], json!(3));

        let rebuilt = ToolSchema::from_input_schema("get_weather_forecast", "Forecast", &value);
        let city = rebuilt.parameters.iter().find(|p| p.name == "city").unwrap();
        let days = rebuilt.parameters.iter().find(|p| p.name == "days").unwrap();
        assert!(city.required);
        assert!(!days.required);
        assert_eq!(days.param_type, "integer");
    }

    #[test]
    fn test_prompt_section_lists_tools() {
        let mut registry = ToolRegistry::new();
        registry.register(EchoTool);
        let section = registry.generate_prompt_section();
        assert!(section.contains("### echo"));
        assert!(section.contains("- `text` (string) (required): Text to echo"));
    }
}
