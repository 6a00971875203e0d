//! Calculator tools
//!
//! Integer arithmetic over two operands. Overflow is reported as a tool
//! execution error; division by zero is an ordinary answer.

use agent_core::{
    error::{AgentError, Result},
    tool::{ParameterSchema, Tool, ToolCall, ToolRegistry, ToolResult, ToolSchema},
};
use async_trait::async_trait;

/// Answer returned (as a success) when dividing by zero
pub const DIVIDE_BY_ZERO: &str = "Error: Cannot divide by zero";

/// Server name advertised during the handshake
pub const SERVER_NAME: &str = "CalculatorServer";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArithmeticOp {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl ArithmeticOp {
    pub const ALL: [Self; 4] = [Self::Add, Self::Subtract, Self::Multiply, Self::Divide];

    pub const fn tool_name(self) -> &'static str {
        match self {
            Self::Add => "add_numbers",
            Self::Subtract => "subtract_numbers",
            Self::Multiply => "multiply_numbers",
            Self::Divide => "divide_numbers",
        }
    }

    pub const fn description(self) -> &'static str {
        match self {
            Self::Add => "Add two numbers together",
            Self::Subtract => "Subtract second number from first number",
            Self::Multiply => "Multiply two numbers together",
            Self::Divide => "Divide first number by second number",
        }
    }

    /// Apply to two operands, rendering the answer as text.
    pub fn apply(self, a: i64, b: i64) -> Result<String> {
        let checked = match self {
            Self::Add => a.checked_add(b),
            Self::Subtract => a.checked_sub(b),
            Self::Multiply => a.checked_mul(b),
            Self::Divide => return Ok(divide(a, b)),
        };

        checked
            .map(|n| n.to_string())
            .ok_or_else(|| AgentError::ToolExecution(format!("Integer overflow in {a} and {b}")))
    }
}

#[allow(clippy::cast_precision_loss)]
fn divide(a: i64, b: i64) -> String {
    if b == 0 {
        return DIVIDE_BY_ZERO.to_string();
    }
    format_float(a as f64 / b as f64)
}

/// Shortest float text, always with a fractional part (`5.0`, `2.5`).
pub fn format_float(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}

/// One of the four binary arithmetic tools
pub struct ArithmeticTool {
    op: ArithmeticOp,
}

impl ArithmeticTool {
    pub const fn new(op: ArithmeticOp) -> Self {
        Self { op }
    }
}

#[async_trait]
impl Tool for ArithmeticTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: self.op.tool_name().into(),
            description: self.op.description().into(),
            parameters: vec![
                ParameterSchema::required("a", "integer", "First number"),
                ParameterSchema::required("b", "integer", "Second number"),
            ],
        }
    }

    async fn execute(&self, call: &ToolCall) -> Result<ToolResult> {
        let a = call.integer("a")?;
        let b = call.integer("b")?;
        let answer = self.op.apply(a, b)?;

        tracing::debug!(tool = self.op.tool_name(), a, b, answer = %answer, "Calculated");
        Ok(ToolResult::success(self.op.tool_name(), answer))
    }
}

/// `calculate_power(base, exponent)`
pub struct PowerTool;

impl PowerTool {
    pub const NAME: &'static str = "calculate_power";

    pub fn power(base: i64, exponent: i64) -> Result<i64> {
        let exponent = u32::try_from(exponent).map_err(|_| {
            if exponent < 0 {
                AgentError::ToolValidation(format!(
                    "Parameter 'exponent' must be non-negative, got {exponent}"
                ))
            } else {
                AgentError::ToolExecution(format!("Integer overflow in {base}^{exponent}"))
            }
        })?;

        base.checked_pow(exponent)
            .ok_or_else(|| AgentError::ToolExecution(format!("Integer overflow in {base}^{exponent}")))
    }
}

#[async_trait]
impl Tool for PowerTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: Self::NAME.into(),
            description: "Calculate base raised to the power of exponent".into(),
            parameters: vec![
                ParameterSchema::required("base", "integer", "Base number"),
                ParameterSchema::required("exponent", "integer", "Exponent (non-negative)"),
            ],
        }
    }

    async fn execute(&self, call: &ToolCall) -> Result<ToolResult> {
        let base = call.integer("base")?;
        let exponent = call.integer("exponent")?;
        let answer = Self::power(base, exponent)?;

        Ok(ToolResult::success(Self::NAME, answer.to_string()))
    }
}

/// Calculator catalog in declaration order
pub fn calculator_registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    for op in ArithmeticOp::ALL {
        registry.register(ArithmeticTool::new(op));
    }
    registry.register(PowerTool);
    registry
}
