//! Generation backends for the `GenerationPort`.
//!
//! `EndpointBackend` talks to a dedicated generation service;
//! `OpenAiCompatBackend` goes straight to an OpenAI-style chat API. Both
//! give up after the configured timeout.

pub mod endpoint;
pub mod openai_compat;

use std::future::Future;
use std::rc::Rc;
use futures::future::{select, Either};
use gloo_timers::future::TimeoutFuture;

use composer_core::ports::GenerationPort;
use composer_types::{ComposerError, Result, config::ComposerConfig};

pub use endpoint::EndpointBackend;
pub use openai_compat::OpenAiCompatBackend;

/// The endpoint backend when an endpoint URL is configured, the LLM
/// provider otherwise.
pub fn backend_from_config(config: &ComposerConfig) -> Rc<dyn GenerationPort> {
    let timeout_ms = config.generation.timeout_ms;
    match config.generation.endpoint_url.as_deref().map(str::trim) {
        Some(url) if !url.is_empty() => {
            log::info!("Generation backend: endpoint {}", url);
            Rc::new(EndpointBackend::new(url, timeout_ms))
        }
        _ => {
            log::info!("Generation backend: {} ({})", config.llm.provider.label(), config.llm.model);
            Rc::new(OpenAiCompatBackend::new(config.llm.clone(), timeout_ms))
        }
    }
}

/// Race `fut` against a timer. A zero timeout waits forever.
pub(crate) async fn with_timeout<T>(timeout_ms: u64, fut: impl Future<Output = Result<T>>) -> Result<T> {
    if timeout_ms == 0 {
        return fut.await;
    }
    let timer = TimeoutFuture::new(u32::try_from(timeout_ms).unwrap_or(u32::MAX));
    futures::pin_mut!(fut);
    futures::pin_mut!(timer);

    match select(fut, timer).await {
        Either::Left((result, _)) => result,
        Either::Right(((), _)) => {
            log::warn!("Generation timed out after {} ms", timeout_ms);
            Err(ComposerError::Timeout(timeout_ms))
        }
    }
}
