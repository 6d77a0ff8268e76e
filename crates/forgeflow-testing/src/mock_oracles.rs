//! # Mock Oracles for Testing

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use forgeflow_core::{GenerationOracle, OracleError, OracleParams};

/// Returns scripted responses in order, then fails once exhausted.
///
/// A response of `Err(..)` in the script is returned as that error.
#[derive(Debug, Clone, Default)]
pub struct ScriptedOracle {
    script: Arc<Mutex<VecDeque<Result<String, OracleError>>>>,
    prompts: Arc<Mutex<Vec<String>>>,
    repeat_last: bool,
}

impl ScriptedOracle {
    pub fn new<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            script: Arc::new(Mutex::new(
                responses.into_iter().map(|r| Ok(r.into())).collect(),
            )),
            prompts: Arc::new(Mutex::new(Vec::new())),
            repeat_last: false,
        }
    }

    /// Always answer with `response`.
    pub fn always(response: impl Into<String>) -> Self {
        let mut oracle = Self::new([response.into()]);
        oracle.repeat_last = true;
        oracle
    }

    /// Append an error to the script.
    pub fn then_error(self, error: OracleError) -> Self {
        self.script
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push_back(Err(error));
        self
    }

    /// Prompts received, in call order
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap_or_else(|p| p.into_inner()).len()
    }
}

#[async_trait]
impl GenerationOracle for ScriptedOracle {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn invoke(&self, prompt: &str, _params: &OracleParams) -> Result<String, OracleError> {
        self.prompts
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(prompt.to_string());

        let mut script = self.script.lock().unwrap_or_else(|p| p.into_inner());
        if self.repeat_last && script.len() == 1 {
            return script
                .front()
                .cloned()
                .unwrap_or_else(|| Err(OracleError::Unavailable("script exhausted".into())));
        }
        script
            .pop_front()
            .unwrap_or_else(|| Err(OracleError::Unavailable("script exhausted".into())))
    }
}

/// Always fails with [`OracleError::Unavailable`].
#[derive(Debug, Clone, Default)]
pub struct FailingOracle;

#[async_trait]
impl GenerationOracle for FailingOracle {
    fn name(&self) -> &str {
        "failing"
    }

    async fn invoke(&self, _prompt: &str, _params: &OracleParams) -> Result<String, OracleError> {
        Err(OracleError::Unavailable("oracle offline".into()))
    }
}

/// Sleeps before answering, for exercising timeouts.
#[derive(Debug, Clone)]
pub struct SlowOracle {
    delay: Duration,
    response: String,
}

impl SlowOracle {
    pub fn new(delay: Duration, response: impl Into<String>) -> Self {
        Self {
            delay,
            response: response.into(),
        }
    }
}

#[async_trait]
impl GenerationOracle for SlowOracle {
    fn name(&self) -> &str {
        "slow"
    }

    async fn invoke(&self, _prompt: &str, _params: &OracleParams) -> Result<String, OracleError> {
        tokio::time::sleep(self.delay).await;
        Ok(self.response.clone())
    }
}
