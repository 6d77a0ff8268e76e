//! Validation failures for component records.

use thiserror::Error;

use crate::component::{ComponentKind, ReusabilityTier};
use crate::identifiers::NameError;

/// A record that breaks one of the registry's structural rules.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RecordError {
    #[error("Invalid component name '{name}': {source}")]
    InvalidName {
        name: String,
        #[source]
        source: NameError,
    },

    #[error("Component '{name}' is a {kind} but declares {count} decision points")]
    DecisionPointMismatch {
        name: String,
        kind: ComponentKind,
        count: u32,
    },

    #[error("Component '{name}' has tier {actual} but its decision points imply tier {expected}")]
    TierMismatch {
        name: String,
        expected: ReusabilityTier,
        actual: ReusabilityTier,
    },

    #[error("Record key '{key}' does not match record name '{name}'")]
    KeyMismatch { key: String, name: String },

    #[error("Feedback rating {rating} is outside 1..=5")]
    InvalidRating { rating: u8 },

    #[error("Component '{name}' has an empty implementation reference")]
    MissingImplementation { name: String },
}

impl RecordError {
    pub fn error_code(&self) -> &'static str {
        match self {
            RecordError::InvalidName { .. } => "INVALID_COMPONENT_NAME",
            RecordError::DecisionPointMismatch { .. } => "DECISION_POINT_MISMATCH",
            RecordError::TierMismatch { .. } => "TIER_MISMATCH",
            RecordError::KeyMismatch { .. } => "RECORD_KEY_MISMATCH",
            RecordError::InvalidRating { .. } => "INVALID_RATING",
            RecordError::MissingImplementation { .. } => "MISSING_IMPLEMENTATION",
        }
    }
}
