//! WASM-target tests for composer-core.
//!
//! Runs EventBus, lenient JSON, normalization and panel flow tests under
//! wasm32-unknown-unknown via `wasm-pack test --node`.

use wasm_bindgen_test::*;

use composer_core::event_bus::EventBus;
use composer_core::generation::{normalize_response, GenerationClient};
use composer_core::lenient::parse_lenient_json;
use composer_core::panel::{PanelController, SubmitOutcome};
use composer_core::persistence::Persistence;
use composer_core::ports::*;
use composer_types::event::PanelEvent;
use composer_types::generation::*;
use composer_types::Result;

use async_trait::async_trait;
use serde_json::{json, Value};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

struct EchoGenerator {
    calls: RefCell<usize>,
}

#[async_trait(?Send)]
impl GenerationPort for EchoGenerator {
    async fn generate(&self, req: &GenerationRequest) -> Result<Value> {
        *self.calls.borrow_mut() += 1;
        Ok(json!({ "content": format!("echo: {}", req.tone) }))
    }

    fn backend_name(&self) -> &str {
        "echo"
    }
}

#[derive(Default)]
struct MapStorage {
    data: RefCell<HashMap<String, Vec<u8>>>,
}

#[async_trait(?Send)]
impl StoragePort for MapStorage {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.data.borrow().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        self.data.borrow_mut().insert(key.to_string(), value.to_vec());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.data.borrow_mut().remove(key);
        Ok(())
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>> {
        Ok(self.data.borrow().keys().filter(|k| k.starts_with(prefix)).cloned().collect())
    }

    fn backend_name(&self) -> &str {
        "map"
    }
}

fn panel(generator: Rc<EchoGenerator>) -> (PanelController, EventBus) {
    let bus = EventBus::new();
    let store = Rc::new(Persistence::new(Rc::new(MapStorage::default())));
    let client = Rc::new(GenerationClient::new(generator));
    (PanelController::new(client, store, bus.clone()), bus)
}

// ─── EventBus Tests ──────────────────────────────────────

#[wasm_bindgen_test]
fn event_bus_emit_and_drain() {
    let bus = EventBus::new();
    bus.emit(PanelEvent::Closed);
    bus.emit(PanelEvent::TranscriptCleared);

    assert!(bus.has_pending());
    assert_eq!(bus.drain().len(), 2);
    assert!(!bus.has_pending());
}

// ─── Lenient JSON Tests ──────────────────────────────────

#[wasm_bindgen_test]
fn lenient_fenced_email() {
    let input = "```json\n{\"subjects\": [\"A\",\"B\"], \"body_standard\": \"Hello\nWorld\",}\n```";
    assert_eq!(
        parse_lenient_json(input),
        Some(json!({ "subjects": ["A", "B"], "body_standard": "Hello\nWorld" }))
    );
}

#[wasm_bindgen_test]
fn lenient_plain_text_is_none() {
    assert!(parse_lenient_json("not json at all").is_none());
}

#[wasm_bindgen_test]
fn normalize_variants_from_array() {
    let content = normalize_response(json!(["one", "two"]));
    assert!(matches!(content, GeneratedContent::Variants { ref variants } if variants.len() == 2));
}

// ─── Panel Tests ─────────────────────────────────────────

#[wasm_bindgen_test]
async fn post_flow_generates_once() {
    let generator = Rc::new(EchoGenerator { calls: RefCell::new(0) });
    let (mut panel, _bus) = panel(generator.clone());

    panel.select_template("post_content").await;
    panel.submit_user_message("Shipping our first WASM build").await;
    panel.submit_user_message("skip").await;
    panel.submit_user_message("playful").await;

    assert_eq!(*generator.calls.borrow(), 1);
    assert_eq!(panel.last_result_text().as_deref(), Some("echo: playful"));
}

#[wasm_bindgen_test]
async fn blank_message_is_ignored() {
    let generator = Rc::new(EchoGenerator { calls: RefCell::new(0) });
    let (mut panel, _bus) = panel(generator);

    panel.select_template("comment_reply").await;
    assert_eq!(panel.submit_user_message("  ").await, SubmitOutcome::Empty);
    assert_eq!(panel.messages().len(), 1);
}
