use serde::{Deserialize, Serialize};
use crate::store::DEFAULT_SAVED_ITEMS_CAP;

/// Top-level assistant configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComposerConfig {
    pub llm: LlmConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    pub model: String,
    pub api_key: String,
    pub api_base: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::DeepSeek,
            model: "deepseek-chat".to_string(),
            api_key: String::new(),
            api_base: None,
            max_tokens: 2048,
            temperature: 0.7,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LlmProvider {
    DeepSeek,
    OpenAI,
    Anthropic,
    Google,
    Custom,
}

impl LlmProvider {
    pub fn default_base_url(&self) -> &str {
        match self {
            LlmProvider::DeepSeek => "https://api.deepseek.com",
            LlmProvider::OpenAI => "https://api.openai.com",
            LlmProvider::Anthropic => "https://api.anthropic.com",
            LlmProvider::Google => "https://generativelanguage.googleapis.com",
            LlmProvider::Custom => "",
        }
    }

    pub fn all() -> &'static [LlmProvider] {
        &[
            LlmProvider::DeepSeek,
            LlmProvider::OpenAI,
            LlmProvider::Anthropic,
            LlmProvider::Google,
            LlmProvider::Custom,
        ]
    }

    pub fn label(&self) -> &str {
        match self {
            LlmProvider::DeepSeek => "DeepSeek",
            LlmProvider::OpenAI => "OpenAI",
            LlmProvider::Anthropic => "Anthropic",
            LlmProvider::Google => "Google",
            LlmProvider::Custom => "Custom",
        }
    }
}

/// How generation requests are routed and defaulted
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// When set, requests go to this endpoint instead of the LLM provider
    pub endpoint_url: Option<String>,
    pub timeout_ms: u64,
    pub default_tone: String,
    pub default_length: String,
    pub saved_items_cap: usize,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            endpoint_url: None,
            timeout_ms: 60_000,
            default_tone: "professional".to_string(),
            default_length: "medium".to_string(),
            saved_items_cap: DEFAULT_SAVED_ITEMS_CAP,
        }
    }
}

impl GenerationConfig {
    pub fn uses_endpoint(&self) -> bool {
        self.endpoint_url
            .as_deref()
            .map(|u| !u.trim().is_empty())
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub backend: StorageBackendType,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackendType::Auto,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageBackendType {
    /// Auto-detect best available backend
    Auto,
    Memory,
    IndexedDb,
}
