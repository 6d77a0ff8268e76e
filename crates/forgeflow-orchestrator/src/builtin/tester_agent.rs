use serde::Deserialize;
use serde_json::Value;

use forgeflow_core::{Component, ComponentError, ComponentKind};
use forgeflow_registry::Registry;

use crate::tester::{TestCase, test_component};

const NAME: &str = "AgentTesterAgent";

#[derive(Debug, Deserialize)]
struct TestRequest {
    #[serde(alias = "agent_name", alias = "name")]
    target: String,
    #[serde(default)]
    test_cases: Vec<TestCase>,
}

/// Runs test cases against another registered component.
///
/// Accepts `{"target": <name>, "test_cases": [...]}` or a plain string. A
/// string is taken as the target name if one is registered under it;
/// otherwise the first registered name mentioned in the text is used.
pub struct AgentTesterAgent {
    registry: Registry,
}

impl AgentTesterAgent {
    pub fn new(registry: Registry) -> Self {
        Self { registry }
    }

    fn request_from(&self, input: Value) -> Result<TestRequest, ComponentError> {
        match input {
            Value::String(text) => {
                let target = if self.registry.contains(text.trim()) {
                    Some(text.trim().to_string())
                } else {
                    text.split(|c: char| !c.is_alphanumeric() && c != '_')
                        .find(|word| *word != NAME && self.registry.contains(word))
                        .map(str::to_string)
                };
                target
                    .map(|target| TestRequest {
                        target,
                        test_cases: Vec::new(),
                    })
                    .ok_or_else(|| {
                        ComponentError::invalid_input(NAME, format!("no registered component named in '{text}'"))
                    })
            }
            other => serde_json::from_value(other)
                .map_err(|e| ComponentError::invalid_input(NAME, e.to_string())),
        }
    }
}

impl Component for AgentTesterAgent {
    fn name(&self) -> &str {
        NAME
    }

    fn kind(&self) -> ComponentKind {
        ComponentKind::Agent
    }

    fn description(&self) -> &str {
        "Tests agents and tools against input/expected cases"
    }

    fn run(&self, input: Value) -> Result<Value, ComponentError> {
        let request = self.request_from(input)?;
        let report = test_component(&self.registry, &request.target, &request.test_cases)
            .map_err(|_| {
                ComponentError::execution_failed(
                    NAME,
                    format!("Agent or tool not found: {}", request.target),
                )
            })?;
        serde_json::to_value(report).map_err(|e| ComponentError::execution_failed(NAME, e.to_string()))
    }
}
