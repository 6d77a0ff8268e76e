use serde_json::Value;
use std::path::Path;

use forgeflow_core::{Component, ComponentError, ComponentKind};

use crate::classifier::{ClassifierInput, classify};

const NAME: &str = "ClassifierAgent";

/// Classifies source code as a tool, agent or team.
///
/// Accepts `{"code": ...}`, `{"path": ...}` or a string that is read as a
/// path when such a file exists and as code otherwise.
#[derive(Debug, Default, Clone, Copy)]
pub struct ClassifierAgent;

impl Component for ClassifierAgent {
    fn name(&self) -> &str {
        NAME
    }

    fn kind(&self) -> ComponentKind {
        ComponentKind::Agent
    }

    fn description(&self) -> &str {
        "Classifies source as Tool, Agent or Team"
    }

    fn run(&self, input: Value) -> Result<Value, ComponentError> {
        let source = match &input {
            Value::String(s) if Path::new(s).is_file() => ClassifierInput::path(s),
            Value::String(s) => ClassifierInput::code(s.as_str()),
            Value::Object(map) => {
                if let Some(code) = map.get("code").and_then(Value::as_str) {
                    ClassifierInput::code(code)
                } else if let Some(path) = map.get("path").and_then(Value::as_str) {
                    ClassifierInput::path(path)
                } else {
                    return Err(ComponentError::invalid_input(NAME, "expected a 'code' or 'path' field"));
                }
            }
            other => {
                return Err(ComponentError::invalid_input(
                    NAME,
                    format!("expected code or a path, got {other}"),
                ));
            }
        };
        serde_json::to_value(classify(&source))
            .map_err(|e| ComponentError::execution_failed(NAME, e.to_string()))
    }
}
