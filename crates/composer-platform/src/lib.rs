//! Browser adapters for the composer ports.
//!
//! Everything here needs `window`/`document` and is only exercised under
//! wasm32-unknown-unknown.

pub mod generation;
pub mod storage;
pub mod editable;

pub use editable::{DomEditable, DEFAULT_TARGET_SELECTOR};
pub use generation::{backend_from_config, EndpointBackend, OpenAiCompatBackend};
pub use storage::{open_storage, IndexedDbStorage, MemoryStorage};
