//! Generation oracle errors.

use thiserror::Error;

/// Failures talking to, or interpreting, the generation oracle.
///
/// Every caller treats these as a signal to fall back to deterministic
/// behaviour, never as terminal.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OracleError {
    #[error("Oracle unavailable: {0}")]
    Unavailable(String),

    #[error("Oracle call timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("Oracle returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Oracle response could not be used: {0}")]
    InvalidResponse(String),
}

impl OracleError {
    pub fn is_retryable(&self) -> bool {
        match self {
            OracleError::Unavailable(_) | OracleError::Timeout { .. } => true,
            OracleError::Status { status, .. } => *status == 429 || *status >= 500,
            OracleError::InvalidResponse(_) => false,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            OracleError::Unavailable(_) => "ORACLE_UNAVAILABLE",
            OracleError::Timeout { .. } => "ORACLE_TIMEOUT",
            OracleError::Status { .. } => "ORACLE_STATUS",
            OracleError::InvalidResponse(_) => "ORACLE_INVALID_RESPONSE",
        }
    }
}
