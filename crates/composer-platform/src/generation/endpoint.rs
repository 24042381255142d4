//! Backend for a generation service that accepts the request as JSON.
//!
//! The service answers with an object, an array or plain text; all three
//! are handed to the client unchanged for normalization.

use async_trait::async_trait;
use gloo_net::http::Request;
use serde_json::Value;

use composer_core::ports::GenerationPort;
use composer_types::{ComposerError, Result, generation::GenerationRequest};
use super::with_timeout;

pub struct EndpointBackend {
    url: String,
    timeout_ms: u64,
}

impl EndpointBackend {
    pub fn new(url: impl Into<String>, timeout_ms: u64) -> Self {
        Self {
            url: url.into(),
            timeout_ms,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn post(&self, req: &GenerationRequest) -> Result<Value> {
        let response = Request::post(&self.url)
            .header("Content-Type", "application/json")
            .json(req)
            .map_err(|e| ComposerError::Network(e.to_string()))?
            .send()
            .await
            .map_err(|e| ComposerError::Network(e.to_string()))?;

        if !response.ok() {
            let status = response.status();
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(ComposerError::Generation(format!("HTTP {}: {}", status, text)));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ComposerError::Network(e.to_string()))?;
        Ok(parse_body(body))
    }
}

#[async_trait(?Send)]
impl GenerationPort for EndpointBackend {
    async fn generate(&self, req: &GenerationRequest) -> Result<Value> {
        with_timeout(self.timeout_ms, self.post(req)).await
    }

    fn backend_name(&self) -> &str {
        "endpoint"
    }
}

/// JSON when the body is JSON, otherwise the raw text.
pub fn parse_body(body: String) -> Value {
    match serde_json::from_str(&body) {
        Ok(value) => value,
        Err(_) => Value::String(body),
    }
}
