//! # Forgeflow Core
//!
//! Core traits and types for the Forgeflow orchestration pipeline.
//! This crate provides the building blocks shared by the registry, the
//! planner/composer/evaluator/executor stages and the front-ends:
//!
//! - **Component contract**: the [`Component`] trait every Tool, Agent and Team implements
//! - **Records**: [`ComponentRecord`] metadata persisted by the registry
//! - **Workflow model**: [`WorkflowSpec`], [`Step`] and typed [`Binding`]s
//! - **Oracle boundary**: the [`GenerationOracle`] trait for untrusted text generation
//! - **Pipeline values**: [`CapabilityGap`], [`EvaluationResult`], [`ExecutionContext`]
//! - **Errors**: one error enum per concern plus the umbrella [`ForgeError`]

pub mod component;
pub mod context;
pub mod error;
pub mod evaluation;
pub mod gap;
pub mod identifiers;
pub mod oracle;
pub mod record;
pub mod workflow;

pub use component::{Component, ComponentKind, ReusabilityTier, Team};
pub use context::ExecutionContext;
pub use error::{
    ComponentError, ForgeError, ForgeResult, OracleError, OrchestrationError, RecordError,
    RegistryError, RegistryResult, WorkflowFileError,
};
pub use evaluation::{EvaluationMetrics, EvaluationResult, IMPROVEMENT_THRESHOLD, TestResults};
pub use gap::{CapabilityGap, PlanOutcome, PlanStrategy};
pub use identifiers::{IdValidator, MAX_NAME_LENGTH, NameError};
pub use oracle::{GenerationOracle, OracleParams};
pub use record::{
    ComponentRecord, DeploymentInfo, FEEDBACK_LOG_CAP, FeedbackEvent, FieldSchema,
};
pub use workflow::{Binding, DEFAULT_INPUT_KEY, DEFAULT_OUTPUT_KEY, Step, WorkflowSpec};
