//! # Evaluator
//!
//! Scores a workflow on five weighted dimensions. The score is advisory: the
//! coordinator logs it and carries on.
//!
//! | metric                  | weight | rule                                               |
//! |-------------------------|--------|----------------------------------------------------|
//! | structural completeness | 0.25   | `min(1, steps/5)`, -20% per later step w/o binding |
//! | component suitability   | 0.30   | 1.0 iff every component resolves                   |
//! | error resilience        | 0.15   | 0.5 if any step has `on_error`, else 0.2           |
//! | efficiency              | 0.15   | 0.9 up to 10 steps, else 0.6                       |
//! | clarity                 | 0.15   | 1.0 / 0.7 / 0.3 by description coverage           |

use forgeflow_core::{EvaluationMetrics, EvaluationResult, TestResults, WorkflowSpec};
use forgeflow_registry::Registry;

/// Step count at which structural completeness saturates.
const FULL_STRUCTURE_STEPS: f64 = 5.0;

/// Largest workflow still considered efficient.
const EFFICIENT_STEP_LIMIT: usize = 10;

/// Number of failing-test messages carried into suggestions.
const MAX_TEST_SUGGESTIONS: usize = 3;

#[derive(Debug, Clone)]
pub struct Evaluator {
    registry: Registry,
}

impl Evaluator {
    pub fn new(registry: Registry) -> Self {
        Self { registry }
    }

    /// Score `workflow`, adjusted by `test_results` when given.
    pub fn evaluate(&self, workflow: &WorkflowSpec, test_results: Option<&TestResults>) -> EvaluationResult {
        let mut suggestions = Vec::new();
        let step_count = workflow.steps.len();

        let structural_completeness = if step_count == 0 {
            suggestions.push("Workflow has no steps; add at least one step".to_string());
            0.0
        } else {
            let unbound = workflow
                .steps
                .iter()
                .skip(1)
                .filter(|s| !s.has_explicit_input())
                .count();
            if unbound > 0 {
                suggestions.push(format!(
                    "{unbound} step(s) after the first read the default input; bind them to an earlier step"
                ));
            }
            let coverage = (step_count as f64 / FULL_STRUCTURE_STEPS).min(1.0);
            (coverage * (1.0 - 0.2 * unbound as f64)).clamp(0.0, 1.0)
        };

        let unresolved: Vec<&str> = workflow
            .component_names()
            .filter(|name| self.registry.resolve(name).is_none())
            .collect();
        let component_suitability = if unresolved.is_empty() {
            1.0
        } else {
            for name in &unresolved {
                suggestions.push(format!("Component '{name}' is not available in the registry"));
            }
            0.0
        };

        let error_resilience = if workflow.steps.iter().any(|s| s.on_error.is_some()) {
            0.5
        } else {
            0.2
        };

        let efficiency = if step_count <= EFFICIENT_STEP_LIMIT {
            0.9
        } else {
            suggestions.push(format!(
                "Workflow has {step_count} steps; consider consolidating steps"
            ));
            0.6
        };

        let clarity = match (
            workflow.description.is_some(),
            workflow.steps.iter().all(|s| s.description.is_some()),
        ) {
            (true, true) => 1.0,
            (true, false) => 0.7,
            _ => 0.3,
        };

        let mut metrics = EvaluationMetrics {
            structural_completeness,
            component_suitability,
            error_resilience,
            efficiency,
            clarity,
        };

        if let Some(results) = test_results {
            if results.passed {
                metrics = metrics.scaled(1.1);
            } else {
                metrics = metrics.scaled(0.7);
                suggestions.extend(
                    results
                        .failures
                        .iter()
                        .take(MAX_TEST_SUGGESTIONS)
                        .map(|f| format!("Failing test: {f}")),
                );
            }
        }

        let result = EvaluationResult::from_metrics(metrics, suggestions);
        tracing::info!(
            workflow = %workflow.id,
            score = result.score,
            needs_improvement = result.needs_improvement,
            suggestions = result.suggestions.len(),
            "Evaluated workflow"
        );
        result
    }
}
