//! OpenAI-compatible chat backend.
//!
//! Works with DeepSeek, OpenAI, and any provider using the
//! OpenAI chat completions API format.
//! Uses browser `fetch()` via gloo-net for WASM compatibility.

use async_trait::async_trait;
use gloo_net::http::Request;
use serde::Deserialize;
use serde_json::{json, Value};

use composer_core::ports::GenerationPort;
use composer_types::{
    ComposerError, Result,
    config::LlmConfig,
    generation::{ContentType, GenerationRequest},
};
use super::with_timeout;

/// Sends the prompt as a single user turn under a writing-assistant system
/// prompt and returns the reply text as a JSON string.
pub struct OpenAiCompatBackend {
    config: LlmConfig,
    base_url: String,
    timeout_ms: u64,
}

impl OpenAiCompatBackend {
    pub fn new(config: LlmConfig, timeout_ms: u64) -> Self {
        let base_url = config
            .api_base
            .clone()
            .filter(|b| !b.trim().is_empty())
            .unwrap_or_else(|| config.provider.default_base_url().to_string());
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            config,
            timeout_ms,
        }
    }

    pub fn completions_url(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }

    pub fn request_body(&self, req: &GenerationRequest) -> Value {
        json!({
            "model": self.config.model,
            "messages": [
                { "role": "system", "content": system_prompt(req) },
                { "role": "user", "content": req.prompt },
            ],
            "max_tokens": self.config.max_tokens,
            "temperature": self.config.temperature,
        })
    }

    async fn complete(&self, req: &GenerationRequest) -> Result<Value> {
        let mut request = Request::post(&self.completions_url()).header("Content-Type", "application/json");
        if !self.config.api_key.is_empty() {
            request = request.header("Authorization", &format!("Bearer {}", self.config.api_key));
        }

        let response = request
            .json(&self.request_body(req))
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

        let data: ApiResponse = response
            .json()
            .await
            .map_err(|e| ComposerError::Generation(e.to_string()))?;

        let content = data
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ComposerError::Generation("No choices in response".to_string()))?;

        Ok(Value::String(content))
    }
}

#[async_trait(?Send)]
impl GenerationPort for OpenAiCompatBackend {
    async fn generate(&self, req: &GenerationRequest) -> Result<Value> {
        with_timeout(self.timeout_ms, self.complete(req)).await
    }

    fn backend_name(&self) -> &str {
        "openai-compat"
    }
}

pub fn system_prompt(req: &GenerationRequest) -> String {
    let what = match req.content_type {
        ContentType::Post => "social media posts",
        ContentType::Comment => "replies to social media posts",
        ContentType::Email => "emails",
        ContentType::CoverLetter => "cover letters",
        ContentType::Rewrite => "rewrites of existing text",
        ContentType::Custom => "whatever the user asks for",
    };
    format!(
        "You are a writing assistant that drafts {} in a {} tone. \
         When the user asks for JSON, reply with JSON only.",
        what, req.tone
    )
}

// ─── API response types ──────────────────────────────────────

#[derive(Deserialize)]
struct ApiResponse {
    choices: Vec<ApiChoice>,
}

#[derive(Deserialize)]
struct ApiChoice {
    message: ApiMessage,
}

#[derive(Deserialize)]
struct ApiMessage {
    #[serde(default)]
    content: Option<String>,
}
