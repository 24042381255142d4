//! Port traits: the hexagonal architecture boundary.
//!
//! These traits are defined here in `composer-core` (pure Rust).
//! Implementations live in `composer-platform` (browser adapters).
//! The core never imports platform code; it only depends on these traits.

use async_trait::async_trait;
use serde_json::Value;
use composer_types::{Result, generation::GenerationRequest};

// ─── Generation Port ─────────────────────────────────────────

/// A backend that turns a prompt into content.
///
/// The returned value is whatever the service produced: an object, an array
/// or a bare string. Shape normalization happens in `GenerationClient`.
#[async_trait(?Send)]
pub trait GenerationPort {
    async fn generate(&self, req: &GenerationRequest) -> Result<Value>;

    /// Name of this backend (for logging/debug)
    fn backend_name(&self) -> &str;
}

// ─── Storage Port ────────────────────────────────────────────

#[async_trait(?Send)]
pub trait StoragePort {
    /// Get a value by key
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Set a value
    async fn set(&self, key: &str, value: &[u8]) -> Result<()>;

    /// Delete a value
    async fn delete(&self, key: &str) -> Result<()>;

    /// List keys with a given prefix
    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>>;

    /// Check if a key exists
    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.get(key).await?.is_some())
    }

    /// Name of this backend (for logging/debug)
    fn backend_name(&self) -> &str;
}

// ─── Editable Port ───────────────────────────────────────────

/// The host page's composer box that results get inserted into.
pub trait EditablePort {
    fn get_text(&self) -> Result<String>;
    fn set_text(&self, text: &str) -> Result<()>;
    fn focus(&self) -> Result<()>;
}
