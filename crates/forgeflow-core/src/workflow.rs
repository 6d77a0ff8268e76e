//! # Workflow Model
//!
//! A [`WorkflowSpec`] is an ordered list of [`Step`]s. Each step names a
//! registered component, says where its input comes from through a typed
//! [`Binding`], and where its output lands in the execution context.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::error::WorkflowFileError;

/// Context key a step reads when it declares no input binding.
pub const DEFAULT_INPUT_KEY: &str = "input";

/// Context key a step writes when it declares no output key.
pub const DEFAULT_OUTPUT_KEY: &str = "output";

/// Where a step reads its input from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Binding {
    /// Read a top-level key of the execution context.
    ContextKey { key: String },
    /// Read the output of an earlier step, optionally one field of it.
    StepOutput {
        source_step_index: usize,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        source_key: Option<String>,
    },
}

impl Binding {
    pub fn context(key: impl Into<String>) -> Self {
        Binding::ContextKey { key: key.into() }
    }

    pub fn step(source_step_index: usize) -> Self {
        Binding::StepOutput {
            source_step_index,
            source_key: None,
        }
    }

    pub fn step_field(source_step_index: usize, source_key: impl Into<String>) -> Self {
        Binding::StepOutput {
            source_step_index,
            source_key: Some(source_key.into()),
        }
    }
}

/// One unit of work inside a workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub component_name: String,
    /// `None` reads [`DEFAULT_INPUT_KEY`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_from: Option<Binding>,
    #[serde(default = "default_output_key")]
    pub output_to: String,
    /// Context key where a failure of this step is mirrored, when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

fn default_output_key() -> String {
    DEFAULT_OUTPUT_KEY.to_string()
}

impl Step {
    pub fn new(component_name: impl Into<String>) -> Self {
        Self {
            component_name: component_name.into(),
            input_from: None,
            output_to: default_output_key(),
            on_error: None,
            description: None,
        }
    }

    pub fn with_input(mut self, binding: Binding) -> Self {
        self.input_from = Some(binding);
        self
    }

    pub fn with_output(mut self, key: impl Into<String>) -> Self {
        self.output_to = key.into();
        self
    }

    pub fn with_on_error(mut self, key: impl Into<String>) -> Self {
        self.on_error = Some(key.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Whether the step declares where its input comes from.
    pub fn has_explicit_input(&self) -> bool {
        self.input_from.is_some()
    }
}

/// A declarative, sequential workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowSpec {
    pub id: String,
    #[serde(default)]
    pub steps: Vec<Step>,
    /// Workflow input name to context key.
    #[serde(default)]
    pub inputs: BTreeMap<String, String>,
    /// Workflow output name to context key.
    #[serde(default)]
    pub outputs: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl WorkflowSpec {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            steps: Vec::new(),
            inputs: BTreeMap::new(),
            outputs: BTreeMap::new(),
            description: None,
        }
    }

    pub fn with_step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    pub fn with_input(mut self, name: impl Into<String>, key: impl Into<String>) -> Self {
        self.inputs.insert(name.into(), key.into());
        self
    }

    pub fn with_output(mut self, name: impl Into<String>, key: impl Into<String>) -> Self {
        self.outputs.insert(name.into(), key.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Component names in step order, duplicates included.
    pub fn component_names(&self) -> impl Iterator<Item = &str> {
        self.steps.iter().map(|s| s.component_name.as_str())
    }

    pub fn to_json(&self) -> Result<String, WorkflowFileError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self, WorkflowFileError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_yaml(&self) -> Result<String, WorkflowFileError> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn from_yaml(text: &str) -> Result<Self, WorkflowFileError> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Load a workflow from a `.json`, `.yaml` or `.yml` file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, WorkflowFileError> {
        let path = path.as_ref();
        let format = WorkflowFormat::from_path(path)?;
        let text = fs::read_to_string(path).map_err(|source| WorkflowFileError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        match format {
            WorkflowFormat::Json => Self::from_json(&text),
            WorkflowFormat::Yaml => Self::from_yaml(&text),
        }
    }

    /// Save the workflow, picking the format from the file extension.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), WorkflowFileError> {
        let path = path.as_ref();
        let text = match WorkflowFormat::from_path(path)? {
            WorkflowFormat::Json => self.to_json()?,
            WorkflowFormat::Yaml => self.to_yaml()?,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| WorkflowFileError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(path, text).map_err(|source| WorkflowFileError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

enum WorkflowFormat {
    Json,
    Yaml,
}

impl WorkflowFormat {
    fn from_path(path: &Path) -> Result<Self, WorkflowFileError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("json") => Ok(WorkflowFormat::Json),
            Some("yaml") | Some("yml") => Ok(WorkflowFormat::Yaml),
            _ => Err(WorkflowFileError::UnsupportedExtension(ext)),
        }
    }
}
