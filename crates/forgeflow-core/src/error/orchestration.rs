//! Coordinator and executor failures.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced while driving a request through the pipeline.
///
/// Only the first three variants terminate a coordinator run. Step errors
/// are terminal only under the abort-on-error policy.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum OrchestrationError {
    #[error("Planning failed: {0}")]
    PlanningFailure(String),

    #[error("Failed to generate capability: {}", .gaps.join(", "))]
    SynthesisFailure { gaps: Vec<String>, reason: String },

    #[error("No workflow executor configured")]
    ExecutorMissing,

    #[error("Step {index} ({component}) failed: {message}")]
    ExecutionStep {
        index: usize,
        component: String,
        message: String,
    },

    #[error("Orchestration deadline of {millis}ms exceeded")]
    DeadlineExceeded { millis: u64 },
}

impl OrchestrationError {
    /// Optional detail text carried alongside the headline message.
    pub fn details(&self) -> Option<&str> {
        match self {
            OrchestrationError::SynthesisFailure { reason, .. } => Some(reason),
            OrchestrationError::ExecutionStep { message, .. } => Some(message),
            _ => None,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            OrchestrationError::PlanningFailure(_) => "PLANNING_FAILURE",
            OrchestrationError::SynthesisFailure { .. } => "SYNTHESIS_FAILURE",
            OrchestrationError::ExecutorMissing => "EXECUTOR_MISSING",
            OrchestrationError::ExecutionStep { .. } => "EXECUTION_STEP_FAILED",
            OrchestrationError::DeadlineExceeded { .. } => "DEADLINE_EXCEEDED",
        }
    }
}
