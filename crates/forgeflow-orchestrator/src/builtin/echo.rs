use serde_json::Value;

use forgeflow_core::{Component, ComponentError, ComponentKind};

/// Returns its input unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct EchoTool;

impl Component for EchoTool {
    fn name(&self) -> &str {
        "EchoTool"
    }

    fn kind(&self) -> ComponentKind {
        ComponentKind::Tool
    }

    fn description(&self) -> &str {
        "Returns its input unchanged"
    }

    fn run(&self, input: Value) -> Result<Value, ComponentError> {
        Ok(input)
    }
}

/// Agent flavour of [`EchoTool`]; the building block of `DoubleEchoTeam`.
#[derive(Debug, Default, Clone, Copy)]
pub struct EchoAgent;

impl Component for EchoAgent {
    fn name(&self) -> &str {
        "EchoAgent"
    }

    fn kind(&self) -> ComponentKind {
        ComponentKind::Agent
    }

    fn description(&self) -> &str {
        "Agent that echoes its input"
    }

    fn run(&self, input: Value) -> Result<Value, ComponentError> {
        tracing::debug!(component = "EchoAgent", "Echoing input");
        Ok(input)
    }
}
