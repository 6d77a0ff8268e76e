//! Oracle backed by an HTTP completion endpoint.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

use forgeflow_core::{GenerationOracle, OracleError, OracleParams};

/// Calls a JSON completion endpoint.
///
/// The request body is `{model, prompt, max_tokens, temperature}`. The
/// response text is read from the first of `completion`, `text`,
/// `choices[0].text` or `choices[0].message.content` that is present.
#[derive(Debug, Clone)]
pub struct HttpOracle {
    client: reqwest::Client,
    url: String,
    model: String,
    api_key: Option<String>,
    timeout: Duration,
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    max_tokens: u32,
    temperature: f32,
}

impl HttpOracle {
    /// Build a client with a per-request timeout.
    pub fn new(
        url: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, OracleError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| OracleError::Unavailable(e.to_string()))?;
        Ok(Self {
            client,
            url: url.into(),
            model: model.into(),
            api_key: None,
            timeout,
        })
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn extract_text(body: &Value) -> Option<String> {
        let candidates = [
            body.get("completion"),
            body.get("text"),
            body.pointer("/choices/0/text"),
            body.pointer("/choices/0/message/content"),
        ];
        candidates
            .into_iter()
            .flatten()
            .find_map(|v| v.as_str().map(str::to_string))
    }
}

#[async_trait]
impl GenerationOracle for HttpOracle {
    fn name(&self) -> &str {
        "http"
    }

    async fn invoke(&self, prompt: &str, params: &OracleParams) -> Result<String, OracleError> {
        let request = CompletionRequest {
            model: params.model.as_deref().unwrap_or(&self.model),
            prompt,
            max_tokens: params.max_tokens,
            temperature: params.temperature,
        };

        let mut builder = self.client.post(&self.url).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                OracleError::Timeout {
                    secs: self.timeout.as_secs(),
                }
            } else {
                OracleError::Unavailable(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OracleError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| OracleError::InvalidResponse(e.to_string()))?;

        Self::extract_text(&body).ok_or_else(|| {
            OracleError::InvalidResponse("response carried no completion text".to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_text_shapes() {
        assert_eq!(
            HttpOracle::extract_text(&json!({"completion": "a"})).as_deref(),
            Some("a")
        );
        assert_eq!(
            HttpOracle::extract_text(&json!({"choices": [{"text": "b"}]})).as_deref(),
            Some("b")
        );
        assert_eq!(
            HttpOracle::extract_text(&json!({"choices": [{"message": {"content": "c"}}]}))
                .as_deref(),
            Some("c")
        );
        assert!(HttpOracle::extract_text(&json!({"other": 1})).is_none());
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_unavailable() {
        let oracle = HttpOracle::new("http://127.0.0.1:9/complete", "test", Duration::from_secs(2))
            .unwrap();
        let err = oracle
            .invoke("hello", &OracleParams::default())
            .await
            .unwrap_err();
        assert!(err.is_retryable());
    }
}
