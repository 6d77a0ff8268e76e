use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::sync::Arc;

use forgeflow_core::{Component, ComponentError, ComponentKind, Team};

/// Team that echoes its input through two agents.
///
/// The second agent sees the first agent's output with a
/// `"Second echo: "` prefix attached: merged in as a `prefix` field when
/// the output is an object, or prepended to a `message` otherwise.
pub struct DoubleEchoTeam {
    members: BTreeMap<String, Arc<dyn Component>>,
}

impl DoubleEchoTeam {
    pub const PREFIX: &'static str = "Second echo: ";

    pub fn new(echo1: Arc<dyn Component>, echo2: Arc<dyn Component>) -> Self {
        let mut members = BTreeMap::new();
        members.insert("echo1".to_string(), echo1);
        members.insert("echo2".to_string(), echo2);
        Self { members }
    }
}

impl Component for DoubleEchoTeam {
    fn name(&self) -> &str {
        "DoubleEchoTeam"
    }

    fn kind(&self) -> ComponentKind {
        ComponentKind::Team
    }

    fn description(&self) -> &str {
        "Echoes input through two agents"
    }

    fn run(&self, input: Value) -> Result<Value, ComponentError> {
        let first = self.member("echo1")?.run(input)?;
        let second_input = match first {
            Value::Object(mut map) => {
                map.insert("prefix".to_string(), json!(Self::PREFIX));
                Value::Object(map)
            }
            Value::String(s) => json!({ "message": format!("{}{s}", Self::PREFIX) }),
            other => json!({ "message": format!("{}{other}", Self::PREFIX) }),
        };
        self.member("echo2")?.run(second_input)
    }
}

impl Team for DoubleEchoTeam {
    fn members(&self) -> &BTreeMap<String, Arc<dyn Component>> {
        &self.members
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin::EchoAgent;

    fn team() -> DoubleEchoTeam {
        DoubleEchoTeam::new(Arc::new(EchoAgent), Arc::new(EchoAgent))
    }

    #[test]
    fn test_object_input_gets_prefix_field() {
        let out = team().run(json!({"input": "hello"})).unwrap();
        assert_eq!(out, json!({"input": "hello", "prefix": "Second echo: "}));
    }

    #[test]
    fn test_scalar_input_becomes_message() {
        let out = team().run(json!("hello")).unwrap();
        assert_eq!(out, json!({"message": "Second echo: hello"}));
        assert_eq!(team().decision_points(), 2);
    }
}
