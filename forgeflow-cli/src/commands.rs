//! Command implementations.
//!
//! Every command returns a JSON value; `main` prints it to stdout and logs go
//! to stderr, so output can be piped into other tools.

use serde::Serialize;
use serde_json::{Value, json};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use forgeflow::orchestrator::{ComposerError, ConfigError};
use forgeflow::registry::summarize_feedback;
use forgeflow::{
    ClassifierInput, Composer, ComponentKind, ComponentRecord, Coordinator, DeploymentInfo,
    ForgeConfig, ForgeConfigBuilder, GenerationOracle, HttpOracle, Manifest, OrchestrationRequest,
    OracleError, Registry, RegistryError, builtin_manifest, classify, record_feedback,
    set_deployment, standard_factories,
};

/// Read by `Session::open` in addition to the config layers.
const API_KEY_VAR: &str = "FORGEFLOW_ORACLE_API_KEY";

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Synthesis error: {0}")]
    Composer(#[from] ComposerError),

    #[error("Oracle error: {0}")]
    Oracle(#[from] OracleError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to render output: {0}")]
    Output(#[from] serde_json::Error),

    #[error("Orchestration failed: {0}")]
    Orchestration(String),
}

impl CliError {
    pub fn error_code(&self) -> &'static str {
        match self {
            CliError::Config(_) => "CONFIG_ERROR",
            CliError::Registry(e) => e.error_code(),
            CliError::Composer(e) => e.error_code(),
            CliError::Oracle(e) => e.error_code(),
            CliError::InvalidArgument(_) => "INVALID_ARGUMENT",
            CliError::Read { .. } => "READ_FAILED",
            CliError::Output(_) => "OUTPUT_FAILED",
            CliError::Orchestration(_) => "ORCHESTRATION_FAILED",
        }
    }
}

/// One row of `forgeflow list`.
#[derive(Debug, Serialize)]
struct ListEntry<'a> {
    name: &'a str,
    kind: ComponentKind,
    tier: String,
    generated: bool,
    description: &'a str,
}

/// Resolved config plus the registry and oracle it describes.
pub struct Session {
    config: ForgeConfig,
    registry: Registry,
    oracle: Option<Arc<dyn GenerationOracle>>,
}

impl Session {
    /// Load config (file, then environment) and open the registry file.
    pub fn open(config_path: Option<&Path>) -> Result<Self, CliError> {
        let mut builder = ForgeConfigBuilder::new();
        if let Some(path) = config_path {
            builder = builder.apply_file(path)?;
        }
        let config = builder.apply_env()?.build()?;
        Self::with_config(config)
    }

    pub fn with_config(config: ForgeConfig) -> Result<Self, CliError> {
        let registry = Registry::builder()
            .with_file(config.registry_path.clone())
            .with_factories(standard_factories())
            .build()?;

        let oracle = match &config.oracle_url {
            Some(url) => {
                let mut oracle =
                    HttpOracle::new(url.as_str(), config.oracle_model.as_str(), config.oracle_timeout())?;
                if let Ok(key) = std::env::var(API_KEY_VAR) {
                    oracle = oracle.with_api_key(key);
                }
                tracing::info!(url = %url, model = %config.oracle_model, "Generation oracle enabled");
                Some(Arc::new(oracle) as Arc<dyn GenerationOracle>)
            }
            None => None,
        };

        tracing::debug!(registry = ?config.registry_path, "Session opened");
        Ok(Self {
            config,
            registry,
            oracle,
        })
    }

    pub fn init(&self, manifest: Option<&Path>) -> Result<Value, CliError> {
        let mut registered = self.registry.seed(&builtin_manifest())?;
        if let Some(path) = manifest {
            registered += self.registry.seed(&Manifest::load(path)?)?;
        }
        tracing::info!(registered, registry = ?self.config.registry_path, "Registry initialised");
        Ok(json!({
            "registered": registered,
            "registry_path": self.config.registry_path,
            "components": self.registry.names(),
        }))
    }

    pub async fn run(
        &self,
        goal: &str,
        input: Option<&str>,
        code: Option<&Path>,
    ) -> Result<Value, CliError> {
        let mut request = OrchestrationRequest::new(goal);
        if let Some(text) = input {
            request = request.with_input(parse_input(text));
        }
        if let Some(path) = code {
            request = request.with_code(read_file(path)?);
        }

        let coordinator =
            Coordinator::from_config(self.registry.clone(), &self.config, self.oracle.clone())?;
        let result = coordinator.run(request).await;
        Ok(serde_json::to_value(&result)?)
    }

    pub fn list(&self, kind: Option<&str>) -> Result<Value, CliError> {
        let records = match kind {
            Some(kind) => self.registry.list_by_kind(parse_kind(kind)?),
            None => self.registry.list_all(),
        };
        let entries: Vec<ListEntry<'_>> = records.iter().map(list_entry).collect();
        Ok(serde_json::to_value(&entries)?)
    }

    pub fn classify(&self, path: &Path) -> Result<Value, CliError> {
        if !path.exists() {
            return Err(CliError::InvalidArgument(format!(
                "no such file: {}",
                path.display()
            )));
        }
        let classification = classify(&ClassifierInput::path(path));
        Ok(serde_json::to_value(&classification)?)
    }

    pub async fn generate(&self, name: &str, kind: &str, goal: &str) -> Result<Value, CliError> {
        let outcome = self
            .composer()?
            .generate(name, parse_kind(kind)?, goal)
            .await?;
        Ok(serde_json::to_value(&outcome)?)
    }

    pub async fn regenerate(&self, name: &str, goal: &str) -> Result<Value, CliError> {
        let outcome = self.composer()?.regenerate(name, goal).await?;
        Ok(serde_json::to_value(&outcome)?)
    }

    pub fn feedback(&self, name: &str, rating: u8, comment: &str) -> Result<Value, CliError> {
        let event = record_feedback(&self.registry, name, rating, comment, "cli")?;
        let summary = self
            .registry
            .get_metadata(name)
            .map(|record| summarize_feedback(&record));
        Ok(json!({ "event": event, "summary": summary }))
    }

    pub fn deploy(
        &self,
        name: &str,
        endpoint: &str,
        target: &str,
        region: Option<String>,
    ) -> Result<Value, CliError> {
        let mut info = DeploymentInfo::new(target, endpoint);
        info.region = region;
        set_deployment(&self.registry, name, info)?;
        let deployment = self
            .registry
            .get_metadata(name)
            .and_then(|record| record.deployment_info);
        Ok(json!({ "component": name, "deployment": deployment }))
    }

    fn composer(&self) -> Result<Composer, CliError> {
        let mut composer =
            Composer::new(self.registry.clone())?.with_artifacts_dir(&self.config.artifacts_dir);
        if let Some(oracle) = &self.oracle {
            composer = composer.with_oracle(Arc::clone(oracle), self.config.oracle_timeout());
        }
        Ok(composer)
    }
}

fn list_entry(record: &ComponentRecord) -> ListEntry<'_> {
    ListEntry {
        name: &record.name,
        kind: record.kind,
        tier: record.reusability_tier.to_string(),
        generated: record.generated,
        description: &record.description,
    }
}

fn parse_kind(kind: &str) -> Result<ComponentKind, CliError> {
    kind.parse().map_err(CliError::InvalidArgument)
}

/// JSON objects become the context; anything else is wrapped as `input`.
fn parse_input(text: &str) -> Value {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => Value::Object(map),
        Ok(other) => json!({ "input": other }),
        Err(_) => json!({ "input": text }),
    }
}

fn read_file(path: &Path) -> Result<String, CliError> {
    fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn session(dir: &TempDir) -> Session {
        let config = ForgeConfigBuilder::new()
            .registry_path(dir.path().join("registry.json"))
            .artifacts_dir(dir.path().join("generated"))
            .build()
            .unwrap();
        Session::with_config(config).unwrap()
    }

    #[test]
    fn test_parse_input() {
        assert_eq!(parse_input(r#"{"input": "hi"}"#), json!({"input": "hi"}));
        assert_eq!(parse_input("42"), json!({"input": 42}));
        assert_eq!(parse_input("hello world"), json!({"input": "hello world"}));
    }

    #[test]
    fn test_init_then_list() {
        let dir = TempDir::new().unwrap();
        let session = session(&dir);
        let out = session.init(None).unwrap();
        assert_eq!(out["registered"], 6);
        assert!(dir.path().join("registry.json").exists());

        let tools = session.list(Some("tool")).unwrap();
        let names: Vec<&str> = tools
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|e| e["name"].as_str())
            .collect();
        assert!(names.contains(&"EchoTool"));
        assert!(names.contains(&"UppercaseTool"));
        assert!(!names.contains(&"EchoAgent"));

        assert!(matches!(
            session.list(Some("robot")),
            Err(CliError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_registry_survives_reopen() {
        let dir = TempDir::new().unwrap();
        session(&dir).init(None).unwrap();
        let reopened = session(&dir);
        reopened.feedback("EchoTool", 2, "too quiet").unwrap();
        let out = reopened
            .deploy("EchoTool", "https://echo.internal", "container", None)
            .unwrap();
        assert_eq!(out["deployment"]["endpoint"], "https://echo.internal");

        let record = session(&dir)
            .registry
            .get_metadata("EchoTool")
            .unwrap();
        assert_eq!(record.feedback_log.len(), 1);
        assert!(record.deployment_info.is_some());
    }

    #[test]
    fn test_feedback_rejects_unknown_component() {
        let dir = TempDir::new().unwrap();
        let session = session(&dir);
        assert!(matches!(
            session.feedback("Ghost", 4, ""),
            Err(CliError::Registry(_))
        ));
    }

    #[tokio::test]
    async fn test_run_and_generate() {
        let dir = TempDir::new().unwrap();
        let session = session(&dir);
        session.init(None).unwrap();

        let out = session.run("echo hello", Some("hello"), None).await.unwrap();
        assert_eq!(out["success"], true);
        assert_eq!(out["result"]["result"], "hello");

        let out = session
            .generate("LoudTool", "tool", "shout the input")
            .await
            .unwrap();
        assert_eq!(out["record"]["name"], "LoudTool");
        assert!(dir.path().join("generated").join("LoudTool.rs").exists());
    }

    #[test]
    fn test_classify_missing_file() {
        let dir = TempDir::new().unwrap();
        let session = session(&dir);
        assert!(matches!(
            session.classify(&dir.path().join("nope.py")),
            Err(CliError::InvalidArgument(_))
        ));
    }
}
