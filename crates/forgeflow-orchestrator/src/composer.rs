//! # Composer
//!
//! Turns a [`CapabilityGap`] into a registered component:
//!
//! 1. pick a behaviour from the goal keywords
//! 2. ask the oracle for a method body, falling back to the behaviour's
//!    default body and then to a generic stub
//! 3. render the artifact from the kind's template and persist it
//! 4. derive the record and register it
//!
//! The registered record points at `generated.<behavior>.<Name>`, which the
//! `generated` scheme factory resolves into a runnable instance.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use forgeflow_core::{
    CapabilityGap, ComponentKind, ComponentRecord, ForgeError, GenerationOracle, OracleParams,
    RecordError, RegistryError,
};
use forgeflow_registry::Registry;

use crate::oracle::{extract_method_body, invoke_with_timeout};
use crate::synthesized::{self, Behavior};
use crate::templates::{TemplateError, TemplateLoader};

/// Body inserted when neither the oracle nor a keyword supplies one.
const STUB_BODY: &str = "        // TODO: implement the generated behaviour\n        return Ok(input);";

#[derive(Debug, thiserror::Error)]
pub enum ComposerError {
    #[error("Goal is required")]
    EmptyGoal,

    #[error("Component {0} not found")]
    NotFound(String),

    #[error(transparent)]
    InvalidRecord(#[from] RecordError),

    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    #[error("Failed to write artifact {path}: {source}")]
    Artifact {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),
}

impl ComposerError {
    pub fn error_code(&self) -> &'static str {
        match self {
            ComposerError::EmptyGoal => "GOAL_REQUIRED",
            ComposerError::NotFound(_) => "COMPONENT_NOT_FOUND",
            ComposerError::InvalidRecord(e) => e.error_code(),
            ComposerError::Template(_) => "TEMPLATE_ERROR",
            ComposerError::Artifact { .. } => "ARTIFACT_WRITE_FAILED",
            ComposerError::Registry(e) => e.error_code(),
        }
    }
}

impl From<ComposerError> for ForgeError {
    fn from(err: ComposerError) -> Self {
        match err {
            ComposerError::Registry(e) => ForgeError::Registry(e),
            other => ForgeError::Synthesis(other.to_string()),
        }
    }
}

/// Where the generated method body came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodySource {
    Oracle,
    Keyword,
    Stub,
}

/// A successfully synthesized and registered component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthesisOutcome {
    pub success: bool,
    pub record: ComponentRecord,
    pub artifact: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact_path: Option<PathBuf>,
    pub body_source: BodySource,
}

/// Synthesizes missing components and registers them.
pub struct Composer {
    registry: Registry,
    templates: TemplateLoader,
    oracle: Option<Arc<dyn GenerationOracle>>,
    oracle_params: OracleParams,
    oracle_timeout: Duration,
    artifacts_dir: Option<PathBuf>,
}

impl Composer {
    pub fn new(registry: Registry) -> Result<Self, ComposerError> {
        Ok(Self {
            registry,
            templates: TemplateLoader::new()?,
            oracle: None,
            oracle_params: OracleParams::default(),
            oracle_timeout: Duration::from_secs(30),
            artifacts_dir: None,
        })
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

    /// Persist artifacts under `dir`. Without it artifacts are returned only.
    pub fn with_artifacts_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.artifacts_dir = Some(dir.into());
        self
    }

    /// Synthesize the component a gap asks for.
    ///
    /// `context_goal` is the request goal; when empty the gap's own
    /// description is used.
    pub async fn synthesize(
        &self,
        gap: &CapabilityGap,
        context_goal: &str,
    ) -> Result<SynthesisOutcome, ComposerError> {
        let goal = if context_goal.trim().is_empty() {
            gap.description.as_str()
        } else {
            context_goal
        };
        self.generate(&gap.name, gap.kind, goal).await
    }

    /// Generate and register a component of `kind` named `name` for `goal`.
    pub async fn generate(
        &self,
        name: &str,
        kind: ComponentKind,
        goal: &str,
    ) -> Result<SynthesisOutcome, ComposerError> {
        let outcome = self.build(name, kind, goal).await?;
        self.registry.register(outcome.record.clone())?;
        log_synthesis(&outcome);
        Ok(outcome)
    }

    /// Regenerate an existing component for a new goal, keeping its kind.
    ///
    /// The new implementation is swapped in with a single registry write
    /// that carries over the stored feedback log and deployment info.
    pub async fn regenerate(&self, name: &str, new_goal: &str) -> Result<SynthesisOutcome, ComposerError> {
        let existing = self
            .registry
            .get_metadata(name)
            .ok_or_else(|| ComposerError::NotFound(name.to_string()))?;
        let mut outcome = self.build(name, existing.kind, new_goal).await?;

        let fresh = outcome.record.clone();
        outcome.record = self.registry.update_with(name, move |current| {
            let feedback_log = std::mem::take(&mut current.feedback_log);
            let deployment_info = current.deployment_info.take();
            *current = fresh;
            current.feedback_log = feedback_log;
            current.deployment_info = deployment_info;
        })?;
        log_synthesis(&outcome);
        Ok(outcome)
    }

    /// Render, persist and derive the record without touching the registry.
    async fn build(
        &self,
        name: &str,
        kind: ComponentKind,
        goal: &str,
    ) -> Result<SynthesisOutcome, ComposerError> {
        let goal = goal.trim();
        if goal.is_empty() {
            return Err(ComposerError::EmptyGoal);
        }

        let behavior = Behavior::from_goal(goal);
        let mut record = ComponentRecord::new(name, kind, synthesized::implementation_ref(behavior, name))
            .with_description(format!("Auto-generated {kind}: {goal}"))
            .with_input_field("input", "any")
            .with_output_field("output", "any")
            .generated_for(goal);
        record.validate()?;

        let (body, body_source) = self.method_body(name, kind, goal, behavior).await;
        let artifact = self.templates.render(kind, name, goal, &body)?;
        let artifact_path = self.persist_artifact(name, &artifact)?;
        record.artifact_path = artifact_path.as_ref().map(|p| p.display().to_string());

        Ok(SynthesisOutcome {
            success: true,
            record,
            artifact,
            artifact_path,
            body_source,
        })
    }

    /// Records produced by synthesis.
    pub fn list_generated(&self) -> Vec<ComponentRecord> {
        self.registry
            .list_all()
            .into_iter()
            .filter(|r| r.generated)
            .collect()
    }

    async fn method_body(
        &self,
        name: &str,
        kind: ComponentKind,
        goal: &str,
        behavior: Behavior,
    ) -> (String, BodySource) {
        if kind != ComponentKind::Team
            && let Some(oracle) = &self.oracle
        {
            let prompt = format!(
                "Write the body of the `run` method for a Rust {kind} named {name} that {goal}. \
                 The method takes `input: serde_json::Value` and must return \
                 `Result<serde_json::Value, ComponentError>` using an explicit `return`."
            );
            if let Some(text) =
                invoke_with_timeout(oracle, &prompt, &self.oracle_params, self.oracle_timeout).await
            {
                match extract_method_body(&text) {
                    Some(body) => return (indent(&body), BodySource::Oracle),
                    None => tracing::warn!(
                        component = %name,
                        "Oracle response had no usable method body, using default"
                    ),
                }
            }
        }

        match behavior.default_body() {
            Some(body) => (body.to_string(), BodySource::Keyword),
            None => (STUB_BODY.to_string(), BodySource::Stub),
        }
    }

    fn persist_artifact(&self, name: &str, artifact: &str) -> Result<Option<PathBuf>, ComposerError> {
        let Some(dir) = &self.artifacts_dir else {
            return Ok(None);
        };
        fs::create_dir_all(dir).map_err(|source| ComposerError::Artifact {
            path: dir.clone(),
            source,
        })?;
        let path = dir.join(format!("{name}.rs"));
        fs::write(&path, artifact).map_err(|source| {
            tracing::error!(path = %path.display(), error = %source, "Failed to write artifact");
            ComposerError::Artifact {
                path: path.clone(),
                source,
            }
        })?;
        Ok(Some(path))
    }
}

fn log_synthesis(outcome: &SynthesisOutcome) {
    tracing::info!(
        component = %outcome.record.name,
        kind = %outcome.record.kind,
        implementation = %outcome.record.implementation_ref,
        body_source = ?outcome.body_source,
        artifact = ?outcome.artifact_path,
        "Synthesized component"
    );
}

fn indent(body: &str) -> String {
    body.lines()
        .map(|line| format!("        {}", line.trim_start()))
        .collect::<Vec<_>>()
        .join("\n")
}
