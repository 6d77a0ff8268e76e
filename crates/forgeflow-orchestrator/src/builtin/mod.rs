//! Built-in components and the factory table that resolves them.
//!
//! [`builtin_manifest`] seeds a registry with their records;
//! [`standard_factories`] adds the `generated` scheme so synthesized
//! components resolve in the same registry.

mod classifier_agent;
mod double_echo;
mod echo;
mod tester_agent;
mod uppercase;

pub use classifier_agent::ClassifierAgent;
pub use double_echo::DoubleEchoTeam;
pub use echo::{EchoAgent, EchoTool};
pub use tester_agent::AgentTesterAgent;
pub use uppercase::UppercaseTool;

use std::sync::Arc;

use forgeflow_core::{Component, ComponentKind, ComponentRecord};
use forgeflow_registry::{FactoryTable, Manifest, ManifestEntry, Registry};

use crate::synthesized::generated_factories;

pub const ECHO_TOOL_REF: &str = "builtin.echo.EchoTool";
pub const ECHO_AGENT_REF: &str = "builtin.echo.EchoAgent";
pub const UPPERCASE_TOOL_REF: &str = "builtin.uppercase.UppercaseTool";
pub const DOUBLE_ECHO_TEAM_REF: &str = "builtin.double_echo.DoubleEchoTeam";
pub const AGENT_TESTER_REF: &str = "builtin.tester.AgentTesterAgent";
pub const CLASSIFIER_REF: &str = "builtin.classifier.ClassifierAgent";

/// Records for every built-in component.
pub fn builtin_manifest() -> Manifest {
    let text = |field: &str| (field.to_string(), "string".to_string());
    let mut manifest = Manifest::new()
        .with_entry(
            ManifestEntry::new("EchoTool", ComponentKind::Tool, ECHO_TOOL_REF)
                .with_description("Returns its input unchanged"),
        )
        .with_entry(
            ManifestEntry::new("UppercaseTool", ComponentKind::Tool, UPPERCASE_TOOL_REF)
                .with_description("Converts text to uppercase"),
        )
        .with_entry(
            ManifestEntry::new("EchoAgent", ComponentKind::Agent, ECHO_AGENT_REF)
                .with_description("Agent that echoes its input"),
        )
        .with_entry(
            ManifestEntry::new("DoubleEchoTeam", ComponentKind::Team, DOUBLE_ECHO_TEAM_REF)
                .with_description("Echoes input through two agents")
                .with_decision_points(2),
        )
        .with_entry(
            ManifestEntry::new("AgentTesterAgent", ComponentKind::Agent, AGENT_TESTER_REF)
                .with_description("Tests agents and tools against input/expected cases"),
        )
        .with_entry(
            ManifestEntry::new("ClassifierAgent", ComponentKind::Agent, CLASSIFIER_REF)
                .with_description("Classifies source as Tool, Agent or Team"),
        );

    for entry in &mut manifest.components {
        entry.tags.insert("builtin".to_string());
        entry.input_schema.extend([text("input")]);
        entry.output_schema.extend([text("output")]);
    }
    manifest
}

/// Factories for the built-in implementation references.
pub fn builtin_factories() -> FactoryTable {
    fn shared(component: impl Component + 'static) -> Arc<dyn Component> {
        Arc::new(component)
    }

    FactoryTable::new()
        .with(ECHO_TOOL_REF, |_: &ComponentRecord, _: &Registry| Ok(shared(EchoTool)))
        .with(ECHO_AGENT_REF, |_: &ComponentRecord, _: &Registry| Ok(shared(EchoAgent)))
        .with(UPPERCASE_TOOL_REF, |_: &ComponentRecord, _: &Registry| {
            Ok(shared(UppercaseTool))
        })
        .with(DOUBLE_ECHO_TEAM_REF, |_: &ComponentRecord, registry: &Registry| {
            let echo1 = registry.try_resolve("EchoAgent")?;
            let echo2 = registry.try_resolve("EchoAgent")?;
            Ok(shared(DoubleEchoTeam::new(echo1, echo2)))
        })
        .with(AGENT_TESTER_REF, |_: &ComponentRecord, registry: &Registry| {
            Ok(shared(AgentTesterAgent::new(registry.clone())))
        })
        .with(CLASSIFIER_REF, |_: &ComponentRecord, _: &Registry| {
            Ok(shared(ClassifierAgent))
        })
}

/// Built-in factories plus the `generated` scheme.
pub fn standard_factories() -> FactoryTable {
    let mut table = builtin_factories();
    table.extend(generated_factories());
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use forgeflow_core::ReusabilityTier;
    use serde_json::json;

    fn seeded() -> Registry {
        let registry = Registry::builder()
            .with_factories(standard_factories())
            .build()
            .unwrap();
        registry.seed(&builtin_manifest()).unwrap();
        registry
    }

    #[test]
    fn test_every_builtin_resolves() {
        let registry = seeded();
        for entry in &builtin_manifest().components {
            let component = registry.resolve(&entry.name).unwrap();
            assert_eq!(component.name(), entry.name);
            assert_eq!(component.kind(), entry.kind);
        }
        assert_eq!(
            registry.get_metadata("DoubleEchoTeam").unwrap().reusability_tier,
            ReusabilityTier::C
        );
    }

    #[test]
    fn test_tester_agent_tests_by_name() {
        let registry = seeded();
        let tester = registry.resolve("AgentTesterAgent").unwrap();
        let report = tester.run(json!("please test EchoTool")).unwrap();
        assert_eq!(report["success"], true);
        assert_eq!(report["component"], "EchoTool");

        let report = tester
            .run(json!({
                "target": "UppercaseTool",
                "test_cases": [{"input": "a", "expected": "A"}, {"input": "b", "expected": "b"}]
            }))
            .unwrap();
        assert_eq!(report["passed"], 1);
        assert_eq!(report["total"], 2);

        let err = tester.run(json!({"target": "Ghost"})).unwrap_err();
        assert!(err.to_string().contains("Agent or tool not found: Ghost"));
    }

    #[test]
    fn test_classifier_agent_accepts_code() {
        let registry = seeded();
        let classifier = registry.resolve("ClassifierAgent").unwrap();
        let out = classifier
            .run(json!({"code": "@tool\ndef shout(x):\n    return x.upper()\n"}))
            .unwrap();
        assert_eq!(out["kind"], "tool");
        assert_eq!(out["name"], "shout");
        assert_eq!(out["reusability_tier"], "A");
    }

    #[test]
    fn test_double_echo_needs_echo_agent() {
        let registry = Registry::builder()
            .with_factories(builtin_factories())
            .build()
            .unwrap();
        registry
            .register(
                ComponentRecord::new("DoubleEchoTeam", ComponentKind::Team, DOUBLE_ECHO_TEAM_REF),
            )
            .unwrap();
        assert!(registry.resolve("DoubleEchoTeam").is_none());
    }
}
