//! The generation oracle boundary.
//!
//! An oracle is an opaque text generator. Its output is untrusted and every
//! caller must be ready to ignore it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::OracleError;

/// Generation parameters passed alongside a prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OracleParams {
    pub max_tokens: u32,
    pub temperature: f32,
    /// Optional model override for this call.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl Default for OracleParams {
    fn default() -> Self {
        Self {
            max_tokens: 1024,
            temperature: 0.2,
            model: None,
        }
    }
}

/// Text generation backend.
#[async_trait]
pub trait GenerationOracle: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    async fn invoke(&self, prompt: &str, params: &OracleParams) -> Result<String, OracleError>;
}
