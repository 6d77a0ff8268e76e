//! The umbrella error type and its conversions.

use thiserror::Error;

use super::component::ComponentError;
use super::oracle::OracleError;
use super::orchestration::OrchestrationError;
use super::record::RecordError;
use super::registry::RegistryError;
use super::workflow::WorkflowFileError;

/// Main error type for Forgeflow operations.
///
/// Crates further up the stack (configuration, synthesis) convert their
/// own errors into the `Config` and `Synthesis` variants.
#[derive(Debug, Error)]
pub enum ForgeError {
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Component error: {0}")]
    Component(#[from] ComponentError),

    #[error("Record error: {0}")]
    Record(#[from] RecordError),

    #[error("Oracle error: {0}")]
    Oracle(#[from] OracleError),

    #[error("Orchestration error: {0}")]
    Orchestration(#[from] OrchestrationError),

    #[error("Workflow file error: {0}")]
    WorkflowFile(#[from] WorkflowFileError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Synthesis error: {0}")]
    Synthesis(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ForgeError {
    pub fn error_code(&self) -> &'static str {
        match self {
            ForgeError::Registry(e) => e.error_code(),
            ForgeError::Component(e) => e.error_code(),
            ForgeError::Record(e) => e.error_code(),
            ForgeError::Oracle(e) => e.error_code(),
            ForgeError::Orchestration(e) => e.error_code(),
            ForgeError::WorkflowFile(e) => e.error_code(),
            ForgeError::Config(_) => "CONFIG_ERROR",
            ForgeError::Synthesis(_) => "SYNTHESIS_ERROR",
            ForgeError::Io(_) => "IO_ERROR",
            ForgeError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }
}

/// Result type for top-level Forgeflow operations.
pub type ForgeResult<T> = Result<T, ForgeError>;
