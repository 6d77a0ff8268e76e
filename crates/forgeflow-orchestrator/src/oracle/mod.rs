//! # Generation Oracle
//!
//! The oracle is an opaque text generator used for two best-effort tasks:
//! proposing a workflow for a goal, and proposing a method body for a
//! synthesized component. Its output is untrusted. Every caller wraps the
//! call in [`invoke_with_timeout`] and falls back to deterministic
//! behaviour on any error.

mod http;
mod parse;

pub use http::HttpOracle;
pub use parse::{extract_method_body, strip_code_fences};

use std::sync::Arc;
use std::time::Duration;

pub use forgeflow_core::{GenerationOracle, OracleParams};

/// Call the oracle under a deadline, returning `None` on timeout or error.
///
/// Failures are logged at `warn` so the fallback is visible.
pub async fn invoke_with_timeout(
    oracle: &Arc<dyn GenerationOracle>,
    prompt: &str,
    params: &OracleParams,
    timeout: Duration,
) -> Option<String> {
    match tokio::time::timeout(timeout, oracle.invoke(prompt, params)).await {
        Ok(Ok(text)) => {
            tracing::debug!(oracle = oracle.name(), chars = text.len(), "Oracle responded");
            Some(text)
        }
        Ok(Err(e)) => {
            tracing::warn!(
                oracle = oracle.name(),
                error = %e,
                code = e.error_code(),
                "Oracle call failed, falling back"
            );
            None
        }
        Err(_) => {
            tracing::warn!(
                oracle = oracle.name(),
                timeout_secs = timeout.as_secs(),
                "Oracle call timed out, falling back"
            );
            None
        }
    }
}
