//! # Workflow Executor
//!
//! Runs a workflow's steps in order against the registry, threading one
//! [`ExecutionContext`] through them.
//!
//! - A step whose component does not resolve is skipped and the context is
//!   left untouched.
//! - A step whose `run` fails records `error_<index>` (and mirrors the
//!   message under `on_error` when set). Under
//!   [`StepErrorPolicy::ContinueOnError`] execution then continues.
//! - Declared workflow outputs are projected from the final context; with
//!   no declared outputs the whole context is returned.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::time::Instant;

use forgeflow_core::{ExecutionContext, OrchestrationError, WorkflowSpec};
use forgeflow_registry::Registry;

/// What to do after a step's `run` returns an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepErrorPolicy {
    #[default]
    ContinueOnError,
    AbortOnError,
}

impl FromStr for StepErrorPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "continue" | "continue_on_error" => Ok(StepErrorPolicy::ContinueOnError),
            "abort" | "abort_on_error" => Ok(StepErrorPolicy::AbortOnError),
            other => Err(format!(
                "unknown step error policy '{other}', expected continue or abort"
            )),
        }
    }
}

impl fmt::Display for StepErrorPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepErrorPolicy::ContinueOnError => f.write_str("continue_on_error"),
            StepErrorPolicy::AbortOnError => f.write_str("abort_on_error"),
        }
    }
}

/// Outcome of a single step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepStatus {
    Succeeded,
    Skipped { reason: String },
    Failed { error: String },
    /// Not attempted because an earlier step aborted the run.
    NotRun,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepReport {
    pub index: usize,
    pub component: String,
    pub output_to: String,
    #[serde(flatten)]
    pub status: StepStatus,
    pub duration_ms: u64,
}

/// Outputs plus per-step status records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionReport {
    pub workflow_id: String,
    pub outputs: Value,
    pub steps: Vec<StepReport>,
    /// Set when the run stopped early under [`StepErrorPolicy::AbortOnError`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aborted: Option<OrchestrationError>,
}

impl ExecutionReport {
    pub fn succeeded(&self) -> usize {
        self.count(|s| matches!(s, StepStatus::Succeeded))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, StepStatus::Failed { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|s| matches!(s, StepStatus::Skipped { .. }))
    }

    fn count(&self, pred: impl Fn(&StepStatus) -> bool) -> usize {
        self.steps.iter().filter(|s| pred(&s.status)).count()
    }
}

/// Sequential workflow runner.
#[derive(Debug, Clone)]
pub struct WorkflowExecutor {
    registry: Registry,
    policy: StepErrorPolicy,
}

impl WorkflowExecutor {
    pub fn new(registry: Registry) -> Self {
        Self {
            registry,
            policy: StepErrorPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: StepErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> StepErrorPolicy {
        self.policy
    }

    /// Run the workflow and return its outputs.
    ///
    /// # Errors
    ///
    /// Only under [`StepErrorPolicy::AbortOnError`], with the first step
    /// failure.
    pub fn execute(
        &self,
        workflow: &WorkflowSpec,
        initial_context: Value,
    ) -> Result<Value, OrchestrationError> {
        let report = self.execute_with_report(workflow, initial_context);
        match report.aborted {
            Some(err) => Err(err),
            None => Ok(report.outputs),
        }
    }

    /// Run the workflow, recording a status for every step.
    pub fn execute_with_report(&self, workflow: &WorkflowSpec, initial_context: Value) -> ExecutionReport {
        let mut context = ExecutionContext::from_input(initial_context);
        let mut step_outputs: Vec<String> = Vec::with_capacity(workflow.steps.len());
        let mut reports = Vec::with_capacity(workflow.steps.len());
        let mut aborted = None;

        tracing::info!(
            workflow = %workflow.id,
            steps = workflow.steps.len(),
            policy = %self.policy,
            "Executing workflow"
        );

        for (index, step) in workflow.steps.iter().enumerate() {
            step_outputs.push(step.output_to.clone());

            if aborted.is_some() {
                reports.push(StepReport {
                    index,
                    component: step.component_name.clone(),
                    output_to: step.output_to.clone(),
                    status: StepStatus::NotRun,
                    duration_ms: 0,
                });
                continue;
            }

            let started = Instant::now();
            let status = match self.registry.resolve(&step.component_name) {
                None => {
                    tracing::warn!(
                        workflow = %workflow.id,
                        step = index,
                        component = %step.component_name,
                        "Component not resolvable, skipping step"
                    );
                    StepStatus::Skipped {
                        reason: format!("component '{}' not resolvable", step.component_name),
                    }
                }
                Some(component) => {
                    let input = context.resolve_binding(step.input_from.as_ref(), &step_outputs);
                    match component.run(input) {
                        Ok(output) => {
                            tracing::debug!(
                                workflow = %workflow.id,
                                step = index,
                                component = %step.component_name,
                                output_to = %step.output_to,
                                "Step completed"
                            );
                            context.insert(step.output_to.clone(), output);
                            StepStatus::Succeeded
                        }
                        Err(e) => {
                            let message = e.to_string();
                            tracing::warn!(
                                workflow = %workflow.id,
                                step = index,
                                component = %step.component_name,
                                error = %message,
                                code = e.error_code(),
                                "Step failed"
                            );
                            context.record_error(index, message.clone());
                            if let Some(handler_key) = &step.on_error {
                                context.insert(handler_key.clone(), Value::String(message.clone()));
                            }
                            if self.policy == StepErrorPolicy::AbortOnError {
                                aborted = Some(OrchestrationError::ExecutionStep {
                                    index,
                                    component: step.component_name.clone(),
                                    message: message.clone(),
                                });
                            }
                            StepStatus::Failed { error: message }
                        }
                    }
                }
            };

            reports.push(StepReport {
                index,
                component: step.component_name.clone(),
                output_to: step.output_to.clone(),
                status,
                duration_ms: started.elapsed().as_millis() as u64,
            });
        }

        let outputs = context.outputs_for(workflow);
        let report = ExecutionReport {
            workflow_id: workflow.id.clone(),
            outputs,
            steps: reports,
            aborted,
        };

        tracing::info!(
            workflow = %workflow.id,
            succeeded = report.succeeded(),
            failed = report.failed(),
            skipped = report.skipped(),
            aborted = report.aborted.is_some(),
            "Workflow finished"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forgeflow_core::{Binding, Step};
    use forgeflow_testing::{FailingComponent, MockComponent, fixtures};
    use serde_json::json;

    fn registry() -> Registry {
        fixtures::registry_with(vec![
            MockComponent::echo("EchoTool").into_registration(),
            MockComponent::returning("Upper", json!("UPPER")).into_registration(),
            FailingComponent::new("Boom", "kaboom").into_registration(),
        ])
    }

    #[test]
    fn test_policy_parsing() {
        assert_eq!(
            "abort".parse::<StepErrorPolicy>(),
            Ok(StepErrorPolicy::AbortOnError)
        );
        assert_eq!(
            "Continue_On_Error".parse::<StepErrorPolicy>(),
            Ok(StepErrorPolicy::ContinueOnError)
        );
        assert!("retry".parse::<StepErrorPolicy>().is_err());
    }

    #[test]
    fn test_outputs_are_projected() {
        let wf = WorkflowSpec::new("wf")
            .with_step(Step::new("EchoTool").with_output("step_0"))
            .with_step(Step::new("Upper").with_input(Binding::step(0)))
            .with_output("result", "output");

        let out = WorkflowExecutor::new(registry())
            .execute(&wf, json!("hi"))
            .unwrap();
        assert_eq!(out, json!({"result": "UPPER"}));
    }

    #[test]
    fn test_missing_component_is_skipped() {
        let wf = WorkflowSpec::new("wf")
            .with_step(Step::new("Nowhere"))
            .with_step(Step::new("EchoTool"));

        let report = WorkflowExecutor::new(registry()).execute_with_report(&wf, json!("x"));
        assert_eq!(report.skipped(), 1);
        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.outputs, json!({"input": "x", "output": "x"}));
    }

    #[test]
    fn test_abort_policy_stops_run() {
        let wf = WorkflowSpec::new("wf")
            .with_step(Step::new("Boom").with_output("step_0"))
            .with_step(Step::new("EchoTool"));

        let executor = WorkflowExecutor::new(registry()).with_policy(StepErrorPolicy::AbortOnError);
        let report = executor.execute_with_report(&wf, json!("x"));
        assert_eq!(report.failed(), 1);
        assert_eq!(report.steps[1].status, StepStatus::NotRun);
        assert!(matches!(
            report.aborted,
            Some(OrchestrationError::ExecutionStep { index: 0, .. })
        ));

        assert!(executor.execute(&wf, json!("x")).is_err());
    }

    #[test]
    fn test_on_error_handler_key_receives_message() {
        let wf = WorkflowSpec::new("wf").with_step(Step::new("Boom").with_on_error("boom_failed"));
        let out = WorkflowExecutor::new(registry())
            .execute(&wf, json!({"input": 1}))
            .unwrap();
        assert!(out["error_0"].as_str().unwrap().contains("kaboom"));
        assert_eq!(out["boom_failed"], out["error_0"]);
        assert!(out.get("output").is_none());
    }
}
