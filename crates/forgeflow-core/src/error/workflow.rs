//! Workflow file I/O errors.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkflowFileError {
    #[error("Failed to access workflow file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON workflow: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid YAML workflow: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Unsupported workflow file extension: {0:?} (expected .json, .yaml or .yml)")]
    UnsupportedExtension(Option<String>),
}

impl WorkflowFileError {
    pub fn error_code(&self) -> &'static str {
        match self {
            WorkflowFileError::Io { .. } => "WORKFLOW_IO",
            WorkflowFileError::Json(_) => "WORKFLOW_JSON",
            WorkflowFileError::Yaml(_) => "WORKFLOW_YAML",
            WorkflowFileError::UnsupportedExtension(_) => "WORKFLOW_UNSUPPORTED_FORMAT",
        }
    }
}
