//! # Forgeflow
//!
//! Forgeflow turns a goal written in plain language into a runnable workflow
//! of registered components, synthesizing whatever the registry is missing
//! along the way.
//!
//! ## Core Components
//!
//! - **[Component]**: the `run(input) -> output` contract shared by tools, agents and teams
//! - **[Registry]**: durable, explicitly injected catalog of [ComponentRecord]s
//! - **[Planner]**, **[Composer]**, **[Evaluator]**, **[WorkflowExecutor]**: pipeline stages
//! - **[Coordinator]**: drives one request through the stages
//!
//! ## Quick Start
//!
//! ```rust
//! use forgeflow::{Registry, WorkflowExecutor, WorkflowSpec, Step};
//! use forgeflow::{builtin_manifest, standard_factories};
//! use serde_json::json;
//!
//! let registry = Registry::builder()
//!     .with_factories(standard_factories())
//!     .build()
//!     .unwrap();
//! registry.seed(&builtin_manifest()).unwrap();
//!
//! let workflow = WorkflowSpec::new("shout").with_step(Step::new("UppercaseTool"));
//! let output = WorkflowExecutor::new(registry)
//!     .execute(&workflow, json!({"input": "hello"}))
//!     .unwrap();
//! assert_eq!(output["output"], "HELLO");
//! ```

// ============================================================================
// Module aliases for namespaced access
// ============================================================================

pub use forgeflow_core as core;
pub use forgeflow_orchestrator as orchestrator;
pub use forgeflow_registry as registry;

#[cfg(feature = "testing")]
pub use forgeflow_testing as testing;

// ============================================================================
// Component contract and records
// ============================================================================

pub use forgeflow_core::{Component, ComponentKind, ReusabilityTier, Team};

pub use forgeflow_core::{ComponentRecord, DeploymentInfo, FeedbackEvent, FieldSchema};

// ============================================================================
// Workflow model
// ============================================================================

pub use forgeflow_core::{Binding, ExecutionContext, Step, WorkflowSpec};

pub use forgeflow_core::{CapabilityGap, PlanOutcome, PlanStrategy};

pub use forgeflow_core::{EvaluationMetrics, EvaluationResult, TestResults};

// ============================================================================
// Errors
// ============================================================================

pub use forgeflow_core::{
    ComponentError, ForgeError, ForgeResult, OracleError, OrchestrationError, RecordError,
    RegistryError, RegistryResult, WorkflowFileError,
};

// ============================================================================
// Registry
// ============================================================================

pub use forgeflow_registry::{
    FactoryTable, Manifest, ManifestEntry, Registry, RegistryBuilder, record_feedback,
    set_deployment,
};

// ============================================================================
// Pipeline
// ============================================================================

pub use forgeflow_orchestrator::{
    Composer, Coordinator, Evaluator, OrchestrationRequest, OrchestrationResult, PipelineState,
    Planner, StepErrorPolicy, WorkflowExecutor,
};

pub use forgeflow_orchestrator::{ForgeConfig, ForgeConfigBuilder};

pub use forgeflow_orchestrator::{Classification, ClassifierInput, classify};

pub use forgeflow_orchestrator::{TestCase, TestReport, test_component};

pub use forgeflow_orchestrator::{builtin_manifest, standard_factories};

// Oracle boundary
pub use forgeflow_core::{GenerationOracle, OracleParams};
pub use forgeflow_orchestrator::HttpOracle;
