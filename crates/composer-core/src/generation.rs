//! Generation client. Submits prompts to a `GenerationPort` and normalizes
//! whatever comes back into a `GeneratedContent`.
//!
//! Each call is wrapped in `futures::future::Abortable` so a closing panel
//! can cancel the request it no longer wants the answer to.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use futures::future::{AbortHandle, Abortable};
use serde_json::{Map, Value};

use composer_types::{
    ComposerError, Result,
    generation::{EmailPackage, GeneratedContent, GenerationRequest, Variant},
};
use crate::lenient::parse_lenient_json;
use crate::ports::GenerationPort;

/// Object keys that hold the generated text itself
const TEXT_KEYS: &[&str] = &["content", "text", "result", "output", "message", "response"];

/// Object keys that hold a list of alternatives
const VARIANT_KEYS: &[&str] = &["variants", "options", "comments", "posts", "suggestions", "replies"];

/// Object keys that mark an email package
const EMAIL_KEYS: &[&str] = &["subjects", "body_formal", "body_standard", "body_short", "follow_up"];

pub struct GenerationClient {
    backend: Rc<dyn GenerationPort>,
    in_flight: RefCell<Option<(u64, AbortHandle)>>,
    next_call: Cell<u64>,
}

impl GenerationClient {
    pub fn new(backend: Rc<dyn GenerationPort>) -> Self {
        Self {
            backend,
            in_flight: RefCell::new(None),
            next_call: Cell::new(0),
        }
    }

    pub fn backend_name(&self) -> &str {
        self.backend.backend_name()
    }

    /// Submit a request and return the normalized result.
    ///
    /// Errors from the backend propagate unchanged; nothing is retried.
    /// Resolves to `ComposerError::Cancelled` if `cancel_in_flight` is called
    /// while waiting.
    pub async fn generate(&self, req: &GenerationRequest) -> Result<GeneratedContent> {
        log::debug!(
            "Generating {} ({} chars, tone={}) via {}",
            req.content_type.as_str(),
            req.prompt.len(),
            req.tone,
            self.backend.backend_name()
        );

        let call = self.next_call.get() + 1;
        self.next_call.set(call);

        let (handle, registration) = AbortHandle::new_pair();
        if let Some((_, previous)) = self.in_flight.replace(Some((call, handle))) {
            previous.abort();
        }

        let outcome = Abortable::new(self.backend.generate(req), registration).await;
        {
            let mut slot = self.in_flight.borrow_mut();
            if matches!(slot.as_ref(), Some((id, _)) if *id == call) {
                slot.take();
            }
        }

        let raw = match outcome {
            Ok(result) => result?,
            Err(_aborted) => {
                log::warn!("Generation cancelled before completion");
                return Err(ComposerError::Cancelled);
            }
        };

        let content = normalize_response(raw);
        if content.is_empty() {
            return Err(ComposerError::Generation("Empty response".to_string()));
        }
        Ok(content)
    }

    /// Abort the request currently awaiting a response, if any.
    pub fn cancel_in_flight(&self) -> bool {
        match self.in_flight.borrow_mut().take() {
            Some((_, handle)) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.borrow().is_some()
    }
}

/// Map any of the service's response shapes onto `GeneratedContent`.
pub fn normalize_response(raw: Value) -> GeneratedContent {
    normalize_value(raw, true)
}

fn normalize_value(raw: Value, reparse_strings: bool) -> GeneratedContent {
    match raw {
        Value::String(s) => normalize_string(s, reparse_strings),
        Value::Array(items) => GeneratedContent::Variants {
            variants: variants_from_array(items),
        },
        Value::Object(map) => normalize_object(map, reparse_strings),
        Value::Null => GeneratedContent::text(String::new()),
        other => GeneratedContent::text(other.to_string()),
    }
}

/// A bare string may itself be JSON the model produced.
fn normalize_string(s: String, reparse: bool) -> GeneratedContent {
    if reparse {
        if let Some(parsed) = parse_lenient_json(&s) {
            let content = normalize_value(parsed, false);
            if !content.is_empty() {
                return content;
            }
        }
    }
    GeneratedContent::text(s.trim())
}

fn normalize_object(map: Map<String, Value>, reparse: bool) -> GeneratedContent {
    if EMAIL_KEYS.iter().any(|k| map.contains_key(*k)) {
        if let Ok(package) = serde_json::from_value::<EmailPackage>(Value::Object(map.clone())) {
            return GeneratedContent::EmailPackage { package };
        }
    }

    for key in VARIANT_KEYS {
        if let Some(Value::Array(items)) = map.get(*key) {
            return GeneratedContent::Variants {
                variants: variants_from_array(items.clone()),
            };
        }
    }

    for key in TEXT_KEYS {
        if let Some(value) = map.get(*key) {
            return match value {
                Value::String(s) => normalize_string(s.clone(), reparse),
                nested @ (Value::Object(_) | Value::Array(_)) => normalize_value(nested.clone(), reparse),
                other => GeneratedContent::text(other.to_string()),
            };
        }
    }

    GeneratedContent::text(Value::Object(map).to_string())
}

fn variants_from_array(items: Vec<Value>) -> Vec<Variant> {
    items
        .into_iter()
        .filter_map(|item| match item {
            Value::String(s) => Some(Variant::plain(s)),
            Value::Object(map) => variant_from_object(map),
            _ => None,
        })
        .filter(|v| !v.text.trim().is_empty())
        .collect()
}

fn variant_from_object(map: Map<String, Value>) -> Option<Variant> {
    let text = TEXT_KEYS
        .iter()
        .find_map(|k| map.get(*k).and_then(|v| v.as_str()))?
        .to_string();
    let field = |key: &str| map.get(key).and_then(|v| v.as_str()).map(String::from);
    Some(Variant {
        text,
        kind: field("type"),
        length: field("length"),
    })
}
