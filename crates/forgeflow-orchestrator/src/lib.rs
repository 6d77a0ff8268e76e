//! # Forgeflow Orchestrator
//!
//! The self-extending pipeline on top of the component registry. A goal in
//! natural language is planned into a [`WorkflowSpec`](forgeflow_core::WorkflowSpec),
//! missing components are synthesized and registered, the workflow is scored
//! and then executed step by step.
//!
//! ## Pieces
//!
//! - **[`Planner`]**: goal to workflow, oracle first with a keyword-rule fallback
//! - **[`Composer`]**: creates and rewrites components for capability gaps
//! - **[`Evaluator`]**: weighted advisory score plus suggestions
//! - **[`WorkflowExecutor`]**: runs a workflow against a shared context
//! - **[`Coordinator`]**: the state machine tying the above together
//! - **[`classify`]**: kind, decision points and tier for source text
//! - **[`test_component`]**: input/expected checks against a registered component
//!
//! ## Example
//!
//! ```rust,no_run
//! use forgeflow_orchestrator::{Coordinator, ForgeConfig, OrchestrationRequest};
//! use forgeflow_orchestrator::{builtin_manifest, standard_factories};
//! use forgeflow_registry::Registry;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = Registry::builder()
//!     .with_factories(standard_factories())
//!     .build()?;
//! registry.seed(&builtin_manifest())?;
//!
//! let coordinator = Coordinator::from_config(registry, &ForgeConfig::default(), None)?;
//! let result = coordinator
//!     .run(OrchestrationRequest::new("Echo the input").with_input("hello".into()))
//!     .await;
//! assert!(result.success);
//! # Ok(())
//! # }
//! ```

pub mod builtin;
pub mod classifier;
pub mod composer;
pub mod config;
pub mod coordinator;
pub mod evaluator;
pub mod executor;
pub mod oracle;
pub mod planner;
pub mod synthesized;
pub mod templates;
pub mod tester;

pub use builtin::{builtin_factories, builtin_manifest, standard_factories};
pub use classifier::{Classification, ClassifierInput, classify};
pub use composer::{BodySource, Composer, ComposerError, SynthesisOutcome};
pub use config::{ConfigError, ForgeConfig, ForgeConfigBuilder};
pub use coordinator::{
    Coordinator, DEFAULT_MAX_REPLAN_CYCLES, OrchestrationRequest, OrchestrationResult,
    PipelineState,
};
pub use evaluator::Evaluator;
pub use executor::{ExecutionReport, StepErrorPolicy, StepReport, StepStatus, WorkflowExecutor};
pub use oracle::HttpOracle;
pub use planner::{DEFAULT_PIPELINE, Planner};
pub use synthesized::{Behavior, GENERATED_SCHEME};
pub use tester::{TestCase, TestReport, test_component};
