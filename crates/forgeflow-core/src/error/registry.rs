//! Registry lookup, instantiation and persistence errors.

use std::path::PathBuf;
use thiserror::Error;

use super::record::RecordError;

/// Errors surfaced by registry operations.
///
/// `resolve` never returns these to callers; it logs them and yields `None`.
/// The explicit variants exist for the `try_resolve` path and for writes.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// No record is registered under this name.
    #[error("Component '{0}' not found in registry")]
    NotFound(String),

    /// The record failed structural validation.
    #[error(transparent)]
    InvalidRecord(#[from] RecordError),

    /// No factory is registered for the record's implementation reference.
    #[error("No factory registered for implementation '{implementation_ref}' (component '{name}')")]
    UnknownFactory {
        name: String,
        implementation_ref: String,
    },

    /// A factory was found but failed to build an instance.
    #[error("Failed to instantiate component '{name}' from '{implementation_ref}': {reason}")]
    Instantiation {
        name: String,
        implementation_ref: String,
        reason: String,
    },

    /// Writing the store to disk failed; the in-memory view is unchanged.
    #[error("Failed to persist registry to {path}: {message}")]
    Persistence { path: PathBuf, message: String },

    /// The on-disk store could not be parsed.
    #[error("Registry store at {path} is corrupt: {message}")]
    Corrupt { path: PathBuf, message: String },

    /// A manifest file could not be read or parsed.
    #[error("Invalid manifest: {0}")]
    Manifest(String),

    /// A previous writer panicked while holding the lock.
    #[error("Registry lock poisoned")]
    LockPoisoned,
}

impl RegistryError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, RegistryError::Persistence { .. })
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            RegistryError::NotFound(_) => "COMPONENT_NOT_FOUND",
            RegistryError::InvalidRecord(_) => "INVALID_RECORD",
            RegistryError::UnknownFactory { .. } => "UNKNOWN_FACTORY",
            RegistryError::Instantiation { .. } => "INSTANTIATION_FAILED",
            RegistryError::Persistence { .. } => "PERSISTENCE_FAILED",
            RegistryError::Corrupt { .. } => "REGISTRY_CORRUPT",
            RegistryError::Manifest(_) => "INVALID_MANIFEST",
            RegistryError::LockPoisoned => "LOCK_POISONED",
        }
    }
}

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;
