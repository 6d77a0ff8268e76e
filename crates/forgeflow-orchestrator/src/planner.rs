//! # Planner
//!
//! Turns a goal into a candidate [`WorkflowSpec`] plus the capability gaps it
//! still has. With an oracle configured the planner first asks it for an
//! ordered step list; any failure there falls back to the rule table.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use forgeflow_core::{
    Binding, CapabilityGap, DEFAULT_INPUT_KEY, DEFAULT_OUTPUT_KEY, GenerationOracle,
    OracleParams, PlanOutcome, PlanStrategy, Step, WorkflowSpec,
};
use forgeflow_registry::Registry;

use crate::oracle::{invoke_with_timeout, strip_code_fences};

/// Component used when no rule matches.
pub const DEFAULT_PIPELINE: &[&str] = &["EchoTool"];

/// One keyword rule. A `None` component means "use capture group 1".
struct PlanRule {
    pattern: &'static str,
    component: Option<&'static str>,
}

const RULES: &[PlanRule] = &[
    PlanRule {
        pattern: r"(?i)\b(?:echo|repeat)\b",
        component: Some("EchoTool"),
    },
    PlanRule {
        pattern: r"(?i)\b(?:uppercase|shout)\b",
        component: Some("UppercaseTool"),
    },
    PlanRule {
        pattern: r"(?i)\b(?:test|validate)\b",
        component: Some("AgentTesterAgent"),
    },
    PlanRule {
        pattern: r"(?i)\b(?:classify|categori[sz]e)\b",
        component: Some("ClassifierAgent"),
    },
    PlanRule {
        pattern: r"(?i)\b(?:twice|double)\b",
        component: Some("DoubleEchoTeam"),
    },
    PlanRule {
        pattern: r"\b[Uu]se\s+([A-Z][A-Za-z0-9_]*)",
        component: None,
    },
];

static COMPILED_RULES: Lazy<Vec<(Regex, Option<&'static str>)>> = Lazy::new(|| {
    RULES
        .iter()
        .filter_map(|rule| Regex::new(rule.pattern).ok().map(|re| (re, rule.component)))
        .collect()
});

/// Component names the rule table selects for `goal`, in goal order.
///
/// Every match is kept, duplicates included. Matches at the same offset
/// keep rule-table order.
pub fn match_rules(goal: &str) -> Vec<String> {
    let mut matches: Vec<(usize, usize, String)> = Vec::new();
    for (rule_index, (re, component)) in COMPILED_RULES.iter().enumerate() {
        for caps in re.captures_iter(goal) {
            let Some(whole) = caps.get(0) else { continue };
            let name = match component {
                Some(name) => Some((*name).to_string()),
                None => caps.get(1).map(|m| m.as_str().to_string()),
            };
            if let Some(name) = name {
                matches.push((whole.start(), rule_index, name));
            }
        }
    }
    matches.sort_by_key(|(offset, rule, _)| (*offset, *rule));
    matches.into_iter().map(|(_, _, name)| name).collect()
}

/// One step as proposed by the oracle.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ProposedStep {
    Name(String),
    Detailed {
        #[serde(alias = "component_name", alias = "componentName")]
        component: String,
        #[serde(default, alias = "inputFrom", alias = "input_binding")]
        input_from: Option<Value>,
    },
}

/// Goal planner over a registry, optionally oracle-assisted.
#[derive(Clone)]
pub struct Planner {
    registry: Registry,
    oracle: Option<Arc<dyn GenerationOracle>>,
    oracle_params: OracleParams,
    oracle_timeout: Duration,
}

impl Planner {
    pub fn new(registry: Registry) -> Self {
        Self {
            registry,
            oracle: None,
            oracle_params: OracleParams::default(),
            oracle_timeout: Duration::from_secs(30),
        }
    }

    pub fn with_oracle(mut self, oracle: Arc<dyn GenerationOracle>, timeout: Duration) -> Self {
        self.oracle = Some(oracle);
        self.oracle_timeout = timeout;
        self
    }

    pub fn with_oracle_params(mut self, params: OracleParams) -> Self {
        self.oracle_params = params;
        self
    }

    /// Plan a workflow for `goal` and list the components it is missing.
    pub async fn plan(&self, goal: &str) -> PlanOutcome {
        if let Some(oracle) = &self.oracle
            && let Some(outcome) = self.plan_with_oracle(oracle, goal).await
        {
            return outcome;
        }
        self.plan_rule_based(goal)
    }

    /// Plan from the rule table alone.
    pub fn plan_rule_based(&self, goal: &str) -> PlanOutcome {
        let matched = match_rules(goal);
        let (names, strategy) = if matched.is_empty() {
            (
                DEFAULT_PIPELINE.iter().map(|s| s.to_string()).collect(),
                PlanStrategy::DefaultPipeline,
            )
        } else {
            (matched, PlanStrategy::RuleBased)
        };
        let steps = names.into_iter().map(|name| (name, None)).collect();
        self.finish(goal, steps, strategy)
    }

    async fn plan_with_oracle(
        &self,
        oracle: &Arc<dyn GenerationOracle>,
        goal: &str,
    ) -> Option<PlanOutcome> {
        let available = self.registry.names().join(", ");
        let prompt = format!(
            "Plan a sequential workflow for the goal: {goal}\n\
             Available components: {available}\n\
             Answer with a JSON array of steps, each {{\"component\": <name>, \"input_from\": <context key or step index, optional>}}."
        );
        let text = invoke_with_timeout(oracle, &prompt, &self.oracle_params, self.oracle_timeout).await?;

        let proposed: Vec<ProposedStep> = match serde_json::from_str(&strip_code_fences(&text)) {
            Ok(steps) => steps,
            Err(e) => {
                tracing::warn!(error = %e, "Oracle plan unparseable, falling back to rules");
                return None;
            }
        };
        if proposed.is_empty() {
            tracing::warn!("Oracle proposed an empty plan, falling back to rules");
            return None;
        }

        let mut steps = Vec::with_capacity(proposed.len());
        for (index, step) in proposed.into_iter().enumerate() {
            let (name, binding) = match step {
                ProposedStep::Name(name) => (name, None),
                ProposedStep::Detailed {
                    component,
                    input_from,
                } => (component, parse_binding(input_from.as_ref(), index)?),
            };
            if name.trim().is_empty() {
                tracing::warn!(step = index, "Oracle step without a component, falling back to rules");
                return None;
            }
            steps.push((name, binding));
        }
        Some(self.finish(goal, steps, PlanStrategy::Oracle))
    }

    /// Assemble the workflow and compute its gaps against the registry.
    fn finish(
        &self,
        goal: &str,
        steps: Vec<(String, Option<Binding>)>,
        strategy: PlanStrategy,
    ) -> PlanOutcome {
        let count = steps.len();
        let mut workflow = WorkflowSpec::new(format!("goal-workflow-{}", uuid::Uuid::new_v4()))
            .with_description(format!("Workflow for goal: {goal}"))
            .with_input(DEFAULT_INPUT_KEY, DEFAULT_INPUT_KEY)
            .with_output("result", DEFAULT_OUTPUT_KEY);

        for (index, (name, binding)) in steps.into_iter().enumerate() {
            let output = if index + 1 == count {
                DEFAULT_OUTPUT_KEY.to_string()
            } else {
                format!("step_{index}")
            };
            let binding = binding.or_else(|| (index > 0).then(|| Binding::step(index - 1)));
            let mut step = Step::new(&name)
                .with_output(output)
                .with_description(format!("Run {name}"));
            if let Some(binding) = binding {
                step = step.with_input(binding);
            }
            workflow = workflow.with_step(step);
        }

        // One gap per missing name, even when several steps use it.
        let mut gaps: Vec<CapabilityGap> = Vec::new();
        for name in workflow.component_names() {
            if gaps.iter().any(|g| g.name == name) || self.registry.resolve(name).is_some() {
                continue;
            }
            gaps.push(CapabilityGap::for_missing(name, goal));
        }

        tracing::info!(
            workflow = %workflow.id,
            steps = workflow.steps.len(),
            gaps = gaps.len(),
            strategy = ?strategy,
            "Planned workflow"
        );

        PlanOutcome {
            workflow,
            gaps,
            strategy,
        }
    }
}

/// Interpret an oracle `input_from` value.
///
/// Integers name an earlier step; strings name a context key. A step index
/// that is not earlier than `index` rejects the whole plan.
fn parse_binding(value: Option<&Value>, index: usize) -> Option<Option<Binding>> {
    match value {
        None | Some(Value::Null) => Some(None),
        Some(Value::Number(n)) => {
            let source = n.as_u64()? as usize;
            if source >= index {
                tracing::warn!(step = index, source, "Oracle bound a step to a later step");
                return None;
            }
            Some(Some(Binding::step(source)))
        }
        Some(Value::String(key)) => Some(Some(Binding::context(key.clone()))),
        Some(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forgeflow_testing::{FailingOracle, MockComponent, ScriptedOracle, fixtures};
    use rstest::rstest;

    fn registry() -> Registry {
        fixtures::registry_with(vec![
            MockComponent::echo("EchoTool").into_registration(),
            MockComponent::echo("UppercaseTool").into_registration(),
        ])
    }

    #[rstest]
    #[case("echo hello", &["EchoTool"])]
    #[case("Shout it", &["UppercaseTool"])]
    #[case("validate the agent", &["AgentTesterAgent"])]
    #[case("categorize this file", &["ClassifierAgent"])]
    #[case("shout then echo", &["UppercaseTool", "EchoTool"])]
    #[case("echo, repeat, echo", &["EchoTool", "EchoTool", "EchoTool"])]
    #[case("use Foo and then use BarTool", &["Foo", "BarTool"])]
    #[case("echo twice", &["EchoTool", "DoubleEchoTeam"])]
    #[case("summarize", &[])]
    fn test_match_rules(#[case] goal: &str, #[case] expected: &[&str]) {
        assert_eq!(match_rules(goal), expected);
    }

    #[tokio::test]
    async fn test_single_step_plan_has_no_gaps() {
        let outcome = Planner::new(registry()).plan("echo hello").await;
        assert!(outcome.is_complete());
        assert_eq!(outcome.strategy, PlanStrategy::RuleBased);
        assert_eq!(outcome.workflow.steps.len(), 1);
        let step = &outcome.workflow.steps[0];
        assert_eq!(step.component_name, "EchoTool");
        assert_eq!(step.output_to, "output");
        assert!(step.input_from.is_none());
        assert_eq!(outcome.workflow.outputs.get("result").map(String::as_str), Some("output"));
    }

    #[tokio::test]
    async fn test_steps_chain_and_gaps_are_reported() {
        let outcome = Planner::new(registry()).plan("shout then use Foo then use Foo").await;
        let steps = &outcome.workflow.steps;
        assert_eq!(steps.len(), 3);
        assert_eq!(steps[0].output_to, "step_0");
        assert_eq!(steps[1].input_from, Some(Binding::step(0)));
        assert_eq!(steps[2].input_from, Some(Binding::step(1)));
        assert_eq!(steps[2].output_to, "output");
        assert_eq!(outcome.gap_names(), vec!["Foo"]);
    }

    #[tokio::test]
    async fn test_default_pipeline() {
        let outcome = Planner::new(registry()).plan("summarize the news").await;
        assert_eq!(outcome.strategy, PlanStrategy::DefaultPipeline);
        assert_eq!(outcome.workflow.component_names().collect::<Vec<_>>(), vec!["EchoTool"]);
    }

    #[tokio::test]
    async fn test_oracle_plan_is_used() {
        let oracle = ScriptedOracle::always(
            "```json\n[{\"component\": \"UppercaseTool\"}, {\"component\": \"EchoTool\", \"input_from\": 0}]\n```",
        );
        let planner = Planner::new(registry()).with_oracle(Arc::new(oracle.clone()), Duration::from_secs(1));

        let outcome = planner.plan("anything").await;
        assert_eq!(outcome.strategy, PlanStrategy::Oracle);
        assert_eq!(
            outcome.workflow.component_names().collect::<Vec<_>>(),
            vec!["UppercaseTool", "EchoTool"]
        );
        assert_eq!(outcome.workflow.steps[1].input_from, Some(Binding::step(0)));
        assert!(oracle.prompts()[0].contains("EchoTool"));
    }

    #[rstest]
    #[case("not json at all")]
    #[case("[]")]
    #[case("[{\"component\": \"EchoTool\", \"input_from\": 3}]")]
    #[tokio::test]
    async fn test_bad_oracle_plan_falls_back(#[case] response: &str) {
        let planner = Planner::new(registry())
            .with_oracle(Arc::new(ScriptedOracle::always(response)), Duration::from_secs(1));
        let outcome = planner.plan("echo hello").await;
        assert_eq!(outcome.strategy, PlanStrategy::RuleBased);
    }

    #[tokio::test]
    async fn test_failing_oracle_falls_back() {
        let planner =
            Planner::new(registry()).with_oracle(Arc::new(FailingOracle), Duration::from_secs(1));
        let outcome = planner.plan("echo hello").await;
        assert_eq!(outcome.strategy, PlanStrategy::RuleBased);
        assert!(outcome.is_complete());
    }
}
