//! Runtime instances for synthesized components.
//!
//! A synthesized record's implementation reference has the form
//! `generated.<behavior>.<Name>`. The `generated` scheme factory turns it
//! back into a runnable [`SynthesizedComponent`] (or [`SynthesizedTeam`])
//! whose behaviour was picked from the goal keywords at synthesis time.

use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use forgeflow_core::{Component, ComponentError, ComponentKind, ComponentRecord, RegistryError, Team};
use forgeflow_registry::{FactoryTable, Registry};

/// Scheme prefix of synthesized implementation references.
pub const GENERATED_SCHEME: &str = "generated";

/// Behaviour a synthesized component runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    Echo,
    Uppercase,
    Lowercase,
    Reverse,
    Count,
    /// No keyword matched; the component reports what it processed.
    Generic,
}

impl Behavior {
    /// Pick a behaviour from the goal's keywords.
    pub fn from_goal(goal: &str) -> Self {
        let goal = goal.to_lowercase();
        let has = |words: &[&str]| words.iter().any(|w| goal.contains(w));
        if has(&["uppercase", "upper case", "shout", "capitalize"]) {
            Behavior::Uppercase
        } else if has(&["lowercase", "lower case", "whisper"]) {
            Behavior::Lowercase
        } else if has(&["reverse", "backwards"]) {
            Behavior::Reverse
        } else if has(&["count", "length"]) {
            Behavior::Count
        } else if has(&["echo", "repeat"]) {
            Behavior::Echo
        } else {
            Behavior::Generic
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Behavior::Echo => "echo",
            Behavior::Uppercase => "uppercase",
            Behavior::Lowercase => "lowercase",
            Behavior::Reverse => "reverse",
            Behavior::Count => "count",
            Behavior::Generic => "generic",
        }
    }

    /// Source for the method body of a generated artifact, if the behaviour
    /// has a keyword default.
    pub fn default_body(&self) -> Option<&'static str> {
        match self {
            Behavior::Echo => Some("        return Ok(input);"),
            Behavior::Uppercase => Some(
                "        let text = input.as_str().map(str::to_string).unwrap_or_else(|| input.to_string());\n        return Ok(Value::String(text.to_uppercase()));",
            ),
            Behavior::Lowercase => Some(
                "        let text = input.as_str().map(str::to_string).unwrap_or_else(|| input.to_string());\n        return Ok(Value::String(text.to_lowercase()));",
            ),
            Behavior::Reverse => Some(
                "        let text = input.as_str().map(str::to_string).unwrap_or_else(|| input.to_string());\n        return Ok(Value::String(text.chars().rev().collect()));",
            ),
            Behavior::Count => Some(
                "        let text = input.as_str().map(str::to_string).unwrap_or_else(|| input.to_string());\n        return Ok(json!(text.chars().count()));",
            ),
            Behavior::Generic => None,
        }
    }

    /// Apply the behaviour to a text-like input.
    ///
    /// Objects are searched for an `input`, `message` or `text` field
    /// before falling back to their JSON rendering.
    fn apply(&self, input: &Value) -> Option<Value> {
        let text = text_of(input);
        match self {
            Behavior::Echo => Some(input.clone()),
            Behavior::Uppercase => Some(Value::String(text.to_uppercase())),
            Behavior::Lowercase => Some(Value::String(text.to_lowercase())),
            Behavior::Reverse => Some(Value::String(text.chars().rev().collect())),
            Behavior::Count => Some(json!(text.chars().count())),
            Behavior::Generic => None,
        }
    }
}

impl fmt::Display for Behavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Behavior {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "echo" => Ok(Behavior::Echo),
            "uppercase" => Ok(Behavior::Uppercase),
            "lowercase" => Ok(Behavior::Lowercase),
            "reverse" => Ok(Behavior::Reverse),
            "count" => Ok(Behavior::Count),
            "generic" => Ok(Behavior::Generic),
            other => Err(format!("unknown behavior '{other}'")),
        }
    }
}

fn text_of(input: &Value) -> String {
    match input {
        Value::String(s) => s.clone(),
        Value::Object(map) => ["input", "message", "text"]
            .iter()
            .find_map(|k| map.get(*k).and_then(Value::as_str))
            .map(str::to_string)
            .unwrap_or_else(|| input.to_string()),
        other => other.to_string(),
    }
}

fn display_of(input: &Value) -> String {
    match input {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Build the implementation reference for a synthesized component.
pub fn implementation_ref(behavior: Behavior, name: &str) -> String {
    format!("{GENERATED_SCHEME}.{behavior}.{name}")
}

/// Split `generated.<behavior>.<Name>` into its behaviour.
fn parse_implementation_ref(implementation_ref: &str) -> Result<Behavior, String> {
    let mut parts = implementation_ref.splitn(3, '.');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(GENERATED_SCHEME), Some(behavior), Some(name)) if !name.is_empty() => {
            behavior.parse()
        }
        _ => Err(format!(
            "expected {GENERATED_SCHEME}.<behavior>.<name>, got '{implementation_ref}'"
        )),
    }
}

/// A tool or agent produced by the composer.
#[derive(Debug, Clone)]
pub struct SynthesizedComponent {
    name: String,
    kind: ComponentKind,
    goal: String,
    description: String,
    behavior: Behavior,
}

impl SynthesizedComponent {
    pub fn new(
        name: impl Into<String>,
        kind: ComponentKind,
        goal: impl Into<String>,
        behavior: Behavior,
    ) -> Self {
        let goal = goal.into();
        Self {
            name: name.into(),
            kind,
            description: format!("Auto-generated {kind}: {goal}"),
            goal,
            behavior,
        }
    }

    pub fn behavior(&self) -> Behavior {
        self.behavior
    }
}

impl Component for SynthesizedComponent {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ComponentKind {
        self.kind
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn run(&self, input: Value) -> Result<Value, ComponentError> {
        let applied = self.behavior.apply(&input);
        match self.kind {
            ComponentKind::Agent => Ok(json!({
                "success": true,
                "result": applied.unwrap_or_else(|| Value::String(format!("Processed: {}", display_of(&input)))),
                "agent": self.name,
                "goal": self.goal,
            })),
            _ => Ok(applied.unwrap_or_else(|| {
                Value::String(format!("Tool {} processed: {}", self.name, display_of(&input)))
            })),
        }
    }
}

/// A two-member team produced by the composer.
///
/// `worker` applies the behaviour, `reporter` wraps the result the way a
/// synthesized agent does.
pub struct SynthesizedTeam {
    name: String,
    description: String,
    members: BTreeMap<String, Arc<dyn Component>>,
}

impl SynthesizedTeam {
    pub fn new(name: impl Into<String>, goal: &str, behavior: Behavior) -> Self {
        let name = name.into();
        let mut members: BTreeMap<String, Arc<dyn Component>> = BTreeMap::new();
        members.insert(
            "worker".to_string(),
            Arc::new(SynthesizedComponent::new(
                format!("{name}.worker"),
                ComponentKind::Tool,
                goal,
                behavior,
            )),
        );
        members.insert(
            "reporter".to_string(),
            Arc::new(SynthesizedComponent::new(
                format!("{name}.reporter"),
                ComponentKind::Agent,
                goal,
                Behavior::Echo,
            )),
        );
        Self {
            description: format!("Auto-generated team: {goal}"),
            name,
            members,
        }
    }
}

impl Component for SynthesizedTeam {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ComponentKind {
        ComponentKind::Team
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn run(&self, input: Value) -> Result<Value, ComponentError> {
        let worked = self.member("worker")?.run(input)?;
        self.member("reporter")?.run(worked)
    }
}

impl Team for SynthesizedTeam {
    fn members(&self) -> &BTreeMap<String, Arc<dyn Component>> {
        &self.members
    }
}

/// Instantiate a synthesized record.
pub fn instantiate(record: &ComponentRecord) -> Result<Arc<dyn Component>, RegistryError> {
    let behavior = parse_implementation_ref(&record.implementation_ref).map_err(|reason| {
        RegistryError::Instantiation {
            name: record.name.clone(),
            implementation_ref: record.implementation_ref.clone(),
            reason,
        }
    })?;
    let goal = record.goal.as_deref().unwrap_or(&record.description);
    Ok(match record.kind {
        ComponentKind::Team => Arc::new(SynthesizedTeam::new(&record.name, goal, behavior)),
        kind => Arc::new(SynthesizedComponent::new(&record.name, kind, goal, behavior)),
    })
}

/// Factory table entry for the `generated` scheme.
pub fn generated_factories() -> FactoryTable {
    let mut table = FactoryTable::new();
    table.register_scheme(GENERATED_SCHEME, |record: &ComponentRecord, _: &Registry| {
        instantiate(record)
    });
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_behavior_from_goal_keywords() {
        assert_eq!(Behavior::from_goal("Shout the text"), Behavior::Uppercase);
        assert_eq!(Behavior::from_goal("reverse a string"), Behavior::Reverse);
        assert_eq!(Behavior::from_goal("count characters"), Behavior::Count);
        assert_eq!(Behavior::from_goal("echo it back"), Behavior::Echo);
        assert_eq!(Behavior::from_goal("summarize a report"), Behavior::Generic);
    }

    #[test]
    fn test_default_bodies_return() {
        for behavior in [
            Behavior::Echo,
            Behavior::Uppercase,
            Behavior::Lowercase,
            Behavior::Reverse,
            Behavior::Count,
        ] {
            assert!(behavior.default_body().unwrap().contains("return"));
        }
        assert!(Behavior::Generic.default_body().is_none());
    }

    #[test]
    fn test_tool_and_agent_outputs() {
        let tool = SynthesizedComponent::new("Shouter", ComponentKind::Tool, "shout", Behavior::Uppercase);
        assert_eq!(tool.run(json!({"input": "hey"})).unwrap(), json!("HEY"));

        let generic_tool =
            SynthesizedComponent::new("Thing", ComponentKind::Tool, "do it", Behavior::Generic);
        assert_eq!(generic_tool.run(json!("x")).unwrap(), json!("Tool Thing processed: x"));

        let agent =
            SynthesizedComponent::new("Helper", ComponentKind::Agent, "help out", Behavior::Generic);
        let out = agent.run(json!("data")).unwrap();
        assert_eq!(out["result"], "Processed: data");
        assert_eq!(out["agent"], "Helper");
        assert_eq!(out["goal"], "help out");
    }

    #[test]
    fn test_team_chains_members() {
        let team = SynthesizedTeam::new("ReverseTeam", "reverse text", Behavior::Reverse);
        assert_eq!(team.decision_points(), 2);
        let out = team.run(json!("abc")).unwrap();
        assert_eq!(out["result"], "cba");
    }

    #[test]
    fn test_instantiate_from_record() {
        let record = ComponentRecord::new("Counter", ComponentKind::Tool, implementation_ref(Behavior::Count, "Counter"))
            .generated_for("count letters");
        let component = instantiate(&record).unwrap();
        assert_eq!(component.run(json!("four")).unwrap(), json!(4));

        let bad = ComponentRecord::new("Bad", ComponentKind::Tool, "generated.teleport.Bad");
        assert!(matches!(
            instantiate(&bad),
            Err(RegistryError::Instantiation { .. })
        ));
    }
}
