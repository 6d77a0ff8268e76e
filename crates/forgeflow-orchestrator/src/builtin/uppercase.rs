use serde_json::Value;

use forgeflow_core::{Component, ComponentError, ComponentKind};

/// Uppercases a string, or every top-level string field of an object.
#[derive(Debug, Default, Clone, Copy)]
pub struct UppercaseTool;

impl Component for UppercaseTool {
    fn name(&self) -> &str {
        "UppercaseTool"
    }

    fn kind(&self) -> ComponentKind {
        ComponentKind::Tool
    }

    fn description(&self) -> &str {
        "Converts text to uppercase"
    }

    fn run(&self, input: Value) -> Result<Value, ComponentError> {
        match input {
            Value::String(s) => Ok(Value::String(s.to_uppercase())),
            Value::Object(map) => Ok(Value::Object(
                map.into_iter()
                    .map(|(k, v)| match v {
                        Value::String(s) => (k, Value::String(s.to_uppercase())),
                        other => (k, other),
                    })
                    .collect(),
            )),
            other => Err(ComponentError::invalid_input(
                self.name(),
                format!("expected a string or object, got {other}"),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_uppercase_shapes() {
        assert_eq!(UppercaseTool.run(json!("hi")).unwrap(), json!("HI"));
        assert_eq!(
            UppercaseTool.run(json!({"a": "x", "n": 1})).unwrap(),
            json!({"a": "X", "n": 1})
        );
        assert!(matches!(
            UppercaseTool.run(json!(null)),
            Err(ComponentError::InvalidInput { .. })
        ));
    }
}
