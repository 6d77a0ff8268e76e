//! # Coordinator
//!
//! Drives one request through the pipeline:
//!
//! ```text
//! Received -> Classified? -> Planned -> GapCheck -> [Synthesizing -> Replanned]*
//!          -> Evaluated -> Executed -> Done
//! ```
//!
//! `Failed` is reachable from `Planned` (no planner), `Synthesizing`
//! (composer failure, or the replan budget is spent) and `Executed` (no
//! executor). Every gap found by one planning pass is synthesized before a
//! single replan. Evaluation is advisory and never blocks execution.
//!
//! Collaborators are optional so a partially wired coordinator still
//! reports a structured failure instead of panicking.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tracing::Instrument;

use forgeflow_core::{
    EvaluationResult, GenerationOracle, OrchestrationError, PlanOutcome, TestResults, WorkflowSpec,
};
use forgeflow_registry::Registry;

use crate::classifier::{Classification, ClassifierInput, classify};
use crate::composer::{Composer, ComposerError};
use crate::config::ForgeConfig;
use crate::evaluator::Evaluator;
use crate::executor::{StepReport, WorkflowExecutor};
use crate::planner::Planner;
use crate::tester::{TestCase, test_component};

/// Default bound on synthesize/replan rounds per request.
pub const DEFAULT_MAX_REPLAN_CYCLES: u32 = 3;

/// What a caller asks the pipeline to do.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrchestrationRequest {
    #[serde(default)]
    pub goal: String,
    /// Source to classify before planning.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Initial execution context; defaults to `{"input": goal}`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<Value>,
    /// Component to test before evaluation; its results adjust the score.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_component: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub test_cases: Vec<TestCase>,
}

impl OrchestrationRequest {
    pub fn new(goal: impl Into<String>) -> Self {
        Self {
            goal: goal.into(),
            ..Self::default()
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_input(mut self, input: Value) -> Self {
        self.input = Some(input);
        self
    }

    pub fn with_test(mut self, component: impl Into<String>, cases: Vec<TestCase>) -> Self {
        self.test_component = Some(component.into());
        self.test_cases = cases;
        self
    }
}

/// Pipeline states, recorded in order in [`OrchestrationResult::state_trace`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    Received,
    Classified,
    Planned,
    GapCheck,
    Synthesizing,
    Replanned,
    Evaluated,
    Executed,
    Done,
    Failed,
}

/// Structured outcome of one request. Never a panic, never a bare error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestrationResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow: Option<WorkflowSpec>,
    #[serde(default)]
    pub steps: Vec<StepReport>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evaluation: Option<EvaluationResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classification: Option<Classification>,
    /// Names of components synthesized while serving the request.
    #[serde(default)]
    pub synthesized: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<OrchestrationError>,
    pub state_trace: Vec<PipelineState>,
}

impl OrchestrationResult {
    fn empty() -> Self {
        Self {
            success: false,
            result: None,
            workflow_id: None,
            workflow: None,
            steps: Vec::new(),
            evaluation: None,
            classification: None,
            synthesized: Vec::new(),
            error: None,
            details: None,
            state_trace: Vec::new(),
        }
    }

    fn enter(&mut self, state: PipelineState) {
        tracing::debug!(state = ?state, "Pipeline state");
        self.state_trace.push(state);
    }

    fn fail(mut self, error: OrchestrationError) -> Self {
        tracing::warn!(
            code = error.error_code(),
            error = %error,
            "Orchestration failed"
        );
        self.enter(PipelineState::Failed);
        self.success = false;
        self.error = Some(error.to_string());
        self.details = Some(error);
        self
    }

    fn finish(mut self) -> Self {
        self.enter(PipelineState::Done);
        self.success = self.details.is_none();
        self
    }

    /// The last state reached.
    pub fn final_state(&self) -> Option<PipelineState> {
        self.state_trace.last().copied()
    }
}

/// Drives the plan, synthesize, evaluate and execute pipeline.
pub struct Coordinator {
    registry: Registry,
    planner: Option<Planner>,
    composer: Option<Composer>,
    evaluator: Option<Evaluator>,
    executor: Option<WorkflowExecutor>,
    max_replan_cycles: u32,
    deadline: Option<Duration>,
}

impl Coordinator {
    /// A coordinator with no collaborators attached.
    pub fn new(registry: Registry) -> Self {
        Self {
            registry,
            planner: None,
            composer: None,
            evaluator: None,
            executor: None,
            max_replan_cycles: DEFAULT_MAX_REPLAN_CYCLES,
            deadline: None,
        }
    }

    /// Wire every collaborator from `config`.
    ///
    /// # Errors
    ///
    /// Fails only when the composer's templates cannot be loaded.
    pub fn from_config(
        registry: Registry,
        config: &ForgeConfig,
        oracle: Option<Arc<dyn GenerationOracle>>,
    ) -> Result<Self, ComposerError> {
        let mut planner = Planner::new(registry.clone());
        let mut composer = Composer::new(registry.clone())?.with_artifacts_dir(&config.artifacts_dir);
        if let Some(oracle) = oracle {
            planner = planner.with_oracle(Arc::clone(&oracle), config.oracle_timeout());
            composer = composer.with_oracle(oracle, config.oracle_timeout());
        }

        let mut coordinator = Self::new(registry.clone())
            .with_planner(planner)
            .with_composer(composer)
            .with_evaluator(Evaluator::new(registry.clone()))
            .with_executor(WorkflowExecutor::new(registry).with_policy(config.step_error_policy))
            .with_max_replan_cycles(config.max_replan_cycles);
        coordinator.deadline = config.deadline();
        Ok(coordinator)
    }

    pub fn with_planner(mut self, planner: Planner) -> Self {
        self.planner = Some(planner);
        self
    }

    pub fn with_composer(mut self, composer: Composer) -> Self {
        self.composer = Some(composer);
        self
    }

    pub fn with_evaluator(mut self, evaluator: Evaluator) -> Self {
        self.evaluator = Some(evaluator);
        self
    }

    pub fn with_executor(mut self, executor: WorkflowExecutor) -> Self {
        self.executor = Some(executor);
        self
    }

    pub fn with_max_replan_cycles(mut self, cycles: u32) -> Self {
        self.max_replan_cycles = cycles;
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn composer(&self) -> Option<&Composer> {
        self.composer.as_ref()
    }

    /// Serve one request.
    ///
    /// With a deadline configured the whole pipeline runs under
    /// `tokio::time::timeout`; on expiry the result names the deadline.
    pub async fn run(&self, request: OrchestrationRequest) -> OrchestrationResult {
        let span = tracing::info_span!("orchestrate", goal = %request.goal);
        let pipeline = self.run_pipeline(request).instrument(span);

        match self.deadline {
            None => pipeline.await,
            Some(deadline) => match tokio::time::timeout(deadline, pipeline).await {
                Ok(result) => result,
                Err(_) => {
                    let mut result = OrchestrationResult::empty();
                    result.enter(PipelineState::Received);
                    result.fail(OrchestrationError::DeadlineExceeded {
                        millis: u64::try_from(deadline.as_millis()).unwrap_or(u64::MAX),
                    })
                }
            },
        }
    }

    /// Component runs may block, so tests run off the async task where the
    /// deadline can still interrupt them.
    async fn run_component_tests(&self, name: String, cases: Vec<TestCase>) -> Option<TestResults> {
        let registry = self.registry.clone();
        let task_name = name.clone();
        let outcome =
            tokio::task::spawn_blocking(move || test_component(&registry, &task_name, &cases)).await;
        match outcome {
            Ok(Ok(report)) => Some(report.to_test_results()),
            Ok(Err(e)) => {
                tracing::warn!(component = %name, error = %e, "Skipping component tests");
                None
            }
            Err(e) => {
                tracing::warn!(component = %name, error = %e, "Component test task failed");
                None
            }
        }
    }

    async fn run_pipeline(&self, request: OrchestrationRequest) -> OrchestrationResult {
        let mut result = OrchestrationResult::empty();
        result.enter(PipelineState::Received);
        tracing::info!(goal = %request.goal, has_code = request.code.is_some(), "Request received");

        if let Some(code) = &request.code {
            let classification = classify(&ClassifierInput::code(code.as_str()));
            result.enter(PipelineState::Classified);
            if request.goal.trim().is_empty() {
                result.result = serde_json::to_value(&classification).ok();
                result.classification = Some(classification);
                return result.finish();
            }
            result.classification = Some(classification);
        }

        let Some(planner) = &self.planner else {
            result.enter(PipelineState::Planned);
            return result.fail(OrchestrationError::PlanningFailure(
                "no planner is configured".to_string(),
            ));
        };

        let mut outcome = planner.plan(&request.goal).await;
        result.enter(PipelineState::Planned);

        let mut cycles = 0u32;
        loop {
            result.enter(PipelineState::GapCheck);
            if outcome.is_complete() {
                break;
            }
            result.enter(PipelineState::Synthesizing);
            if cycles >= self.max_replan_cycles {
                return result.fail(OrchestrationError::SynthesisFailure {
                    gaps: outcome.gap_names(),
                    reason: format!(
                        "gaps still unresolved after {} replan cycle(s)",
                        self.max_replan_cycles
                    ),
                });
            }
            if let Err(error) = self.synthesize_gaps(&outcome, &request.goal, &mut result).await {
                return result.fail(error);
            }
            cycles += 1;
            outcome = planner.plan(&request.goal).await;
            result.enter(PipelineState::Replanned);
            tracing::info!(cycle = cycles, gaps = outcome.gaps.len(), "Replanned");
        }

        let workflow = outcome.workflow;
        result.workflow_id = Some(workflow.id.clone());

        if let Some(evaluator) = &self.evaluator {
            let test_results = match request.test_component.clone() {
                Some(name) => self.run_component_tests(name, request.test_cases.clone()).await,
                None => None,
            };
            let evaluation = evaluator.evaluate(&workflow, test_results.as_ref());
            if evaluation.needs_improvement {
                tracing::info!(
                    score = evaluation.score,
                    suggestions = ?evaluation.suggestions,
                    "Workflow needs improvement, executing anyway"
                );
            }
            result.evaluation = Some(evaluation);
            result.enter(PipelineState::Evaluated);
        }

        let Some(executor) = &self.executor else {
            result.workflow = Some(workflow);
            result.enter(PipelineState::Executed);
            return result.fail(OrchestrationError::ExecutorMissing);
        };

        let initial = request
            .input
            .clone()
            .unwrap_or_else(|| json!({ "input": request.goal }));
        let executor = executor.clone();
        let run_workflow = workflow.clone();
        let report = match tokio::task::spawn_blocking(move || {
            executor.execute_with_report(&run_workflow, initial)
        })
        .await
        {
            Ok(report) => report,
            Err(e) => {
                let error = OrchestrationError::ExecutionStep {
                    index: 0,
                    component: workflow.id.clone(),
                    message: format!("executor task failed: {e}"),
                };
                result.workflow = Some(workflow);
                result.enter(PipelineState::Executed);
                return result.fail(error);
            }
        };
        result.enter(PipelineState::Executed);
        result.workflow = Some(workflow);
        result.steps = report.steps;

        if let Some(aborted) = report.aborted {
            return result.fail(aborted);
        }
        result.result = Some(report.outputs);
        result.finish()
    }

    /// Synthesize every gap of one planning pass.
    async fn synthesize_gaps(
        &self,
        outcome: &PlanOutcome,
        goal: &str,
        result: &mut OrchestrationResult,
    ) -> Result<(), OrchestrationError> {
        let Some(composer) = &self.composer else {
            return Err(OrchestrationError::SynthesisFailure {
                gaps: outcome.gap_names(),
                reason: "no composer is configured".to_string(),
            });
        };
        for gap in &outcome.gaps {
            tracing::info!(gap = %gap.name, kind = %gap.kind, "Synthesizing missing component");
            match composer.synthesize(gap, goal).await {
                Ok(synthesis) => result.synthesized.push(synthesis.record.name),
                Err(e) => {
                    return Err(OrchestrationError::SynthesisFailure {
                        gaps: vec![gap.name.clone()],
                        reason: e.to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin::{builtin_manifest, standard_factories};
    use forgeflow_core::ComponentKind;
    use forgeflow_registry::FactoryTable;

    fn seeded() -> Registry {
        let registry = Registry::builder()
            .with_factories(standard_factories())
            .build()
            .unwrap();
        registry.seed(&builtin_manifest()).unwrap();
        registry
    }

    fn wired(registry: Registry) -> Coordinator {
        let config = crate::config::ForgeConfigBuilder::new()
            .artifacts_dir(std::env::temp_dir().join("forgeflow-coordinator-tests"))
            .build()
            .unwrap();
        Coordinator::from_config(registry, &config, None).unwrap()
    }

    #[tokio::test]
    async fn test_echo_happy_path() {
        let result = wired(seeded())
            .run(OrchestrationRequest::new("echo hello").with_input(json!({"input": "hello"})))
            .await;
        assert!(result.success, "{:?}", result.error);
        assert_eq!(result.result, Some(json!({"result": "hello"})));
        assert_eq!(
            result.state_trace,
            vec![
                PipelineState::Received,
                PipelineState::Planned,
                PipelineState::GapCheck,
                PipelineState::Evaluated,
                PipelineState::Executed,
                PipelineState::Done,
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_planner_fails() {
        let result = Coordinator::new(seeded()).run(OrchestrationRequest::new("echo")).await;
        assert!(!result.success);
        assert!(matches!(result.details, Some(OrchestrationError::PlanningFailure(_))));
        assert_eq!(result.final_state(), Some(PipelineState::Failed));
    }

    #[tokio::test]
    async fn test_missing_executor_fails_after_evaluation() {
        let registry = seeded();
        let result = Coordinator::new(registry.clone())
            .with_planner(Planner::new(registry.clone()))
            .with_evaluator(Evaluator::new(registry))
            .run(OrchestrationRequest::new("echo"))
            .await;
        assert!(matches!(result.details, Some(OrchestrationError::ExecutorMissing)));
        assert!(result.evaluation.is_some());
        assert!(result.state_trace.contains(&PipelineState::Executed));
    }

    #[tokio::test]
    async fn test_code_only_request_returns_classification() {
        let result = Coordinator::new(seeded())
            .run(OrchestrationRequest::default().with_code("@tool\ndef f(x):\n    return x\n"))
            .await;
        assert!(result.success);
        assert_eq!(result.classification.unwrap().kind, ComponentKind::Tool);
        assert_eq!(result.result.unwrap()["name"], "f");
    }

    #[tokio::test]
    async fn test_gap_is_synthesized_then_executed() {
        let registry = seeded();
        let coordinator = Coordinator::new(registry.clone())
            .with_planner(Planner::new(registry.clone()))
            .with_composer(Composer::new(registry.clone()).unwrap())
            .with_executor(WorkflowExecutor::new(registry.clone()));

        let result = coordinator
            .run(OrchestrationRequest::new("use Reverser to reverse text").with_input(json!({"input": "abc"})))
            .await;
        assert!(result.success, "{:?}", result.error);
        assert_eq!(result.synthesized, vec!["Reverser"]);
        assert_eq!(result.result.unwrap()["result"]["result"], "cba");
        assert!(registry.get_metadata("Reverser").unwrap().generated);
    }

    #[tokio::test]
    async fn test_unresolvable_synthesis_exhausts_budget() {
        // No `generated` scheme, so synthesized records never resolve.
        let registry = Registry::builder()
            .with_factories(FactoryTable::new())
            .build()
            .unwrap();
        let coordinator = Coordinator::new(registry.clone())
            .with_planner(Planner::new(registry.clone()))
            .with_composer(Composer::new(registry.clone()).unwrap())
            .with_executor(WorkflowExecutor::new(registry))
            .with_max_replan_cycles(2);

        let result = coordinator.run(OrchestrationRequest::new("use Foo")).await;
        assert!(!result.success);
        match result.details {
            Some(OrchestrationError::SynthesisFailure { gaps, .. }) => assert_eq!(gaps, vec!["Foo"]),
            other => panic!("unexpected details: {other:?}"),
        }
        let replans = result
            .state_trace
            .iter()
            .filter(|s| **s == PipelineState::Replanned)
            .count();
        assert_eq!(replans, 2);
    }

    #[tokio::test]
    async fn test_missing_composer_reports_gap() {
        let registry = seeded();
        let result = Coordinator::new(registry.clone())
            .with_planner(Planner::new(registry))
            .run(OrchestrationRequest::new("use Foo"))
            .await;
        assert_eq!(result.error.as_deref(), Some("Failed to generate capability: Foo"));
    }
}
