//! Errors raised by a component's `run` operation.

use thiserror::Error;

/// Failure reported by a single component invocation.
///
/// The executor never propagates these; it records them in the execution
/// context under `error_<index>` and moves on (or aborts, depending on the
/// configured policy).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ComponentError {
    /// The input value did not have the shape the component expects.
    #[error("Component '{component}' received invalid input: {reason}")]
    InvalidInput { component: String, reason: String },

    /// The component ran but could not produce an output.
    #[error("Component '{component}' execution failed: {message}")]
    ExecutionFailed { component: String, message: String },

    /// A team tried to delegate to a member it does not own.
    #[error("Team '{team}' has no member named '{member}'")]
    MissingMember { team: String, member: String },
}

impl ComponentError {
    pub fn invalid_input(component: impl Into<String>, reason: impl Into<String>) -> Self {
        ComponentError::InvalidInput {
            component: component.into(),
            reason: reason.into(),
        }
    }

    pub fn execution_failed(component: impl Into<String>, message: impl Into<String>) -> Self {
        ComponentError::ExecutionFailed {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Name of the component that failed, if known.
    pub fn component_name(&self) -> &str {
        match self {
            ComponentError::InvalidInput { component, .. }
            | ComponentError::ExecutionFailed { component, .. } => component,
            ComponentError::MissingMember { team, .. } => team,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ComponentError::InvalidInput { .. } => "COMPONENT_INVALID_INPUT",
            ComponentError::ExecutionFailed { .. } => "COMPONENT_EXECUTION_FAILED",
            ComponentError::MissingMember { .. } => "TEAM_MEMBER_MISSING",
        }
    }
}
