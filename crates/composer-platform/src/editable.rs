//! DOM adapter for the host page's text box.
//!
//! Handles `<textarea>`, `<input>` and `contenteditable` elements. After a
//! write a bubbling `input` event is dispatched so frameworks that own the
//! element see the new value.

use wasm_bindgen::JsCast;
use web_sys::{Element, Event, EventInit, HtmlElement, HtmlInputElement, HtmlTextAreaElement};

use composer_core::ports::EditablePort;
use composer_types::{ComposerError, Result};

/// Elements opted in explicitly, then any plain text box on the page.
pub const DEFAULT_TARGET_SELECTOR: &str =
    "[data-composer-target], textarea, [contenteditable=\"true\"], input[type=\"text\"]";

enum Target {
    TextArea(HtmlTextAreaElement),
    Input(HtmlInputElement),
    ContentEditable(HtmlElement),
}

pub struct DomEditable {
    target: Target,
}

impl DomEditable {
    /// First element matching `selector`.
    pub fn find(selector: &str) -> Result<Self> {
        let element = gloo_utils::document()
            .query_selector(selector)
            .map_err(js_err)?
            .ok_or_else(|| ComposerError::Validation(format!("No element matches '{}'", selector)))?;
        Self::from_element(element)
    }

    pub fn from_element(element: Element) -> Result<Self> {
        let element = match element.dyn_into::<HtmlTextAreaElement>() {
            Ok(textarea) => return Ok(Self { target: Target::TextArea(textarea) }),
            Err(element) => element,
        };
        let element = match element.dyn_into::<HtmlInputElement>() {
            Ok(input) => return Ok(Self { target: Target::Input(input) }),
            Err(element) => element,
        };
        match element.dyn_into::<HtmlElement>() {
            Ok(html) if html.is_content_editable() => Ok(Self {
                target: Target::ContentEditable(html),
            }),
            _ => Err(ComposerError::Validation("Element is not editable".to_string())),
        }
    }

    fn element(&self) -> &HtmlElement {
        match &self.target {
            Target::TextArea(el) => el.unchecked_ref(),
            Target::Input(el) => el.unchecked_ref(),
            Target::ContentEditable(el) => el,
        }
    }

    fn notify_input(&self) -> Result<()> {
        let init = EventInit::new();
        init.set_bubbles(true);
        let event = Event::new_with_event_init_dict("input", &init).map_err(js_err)?;
        self.element().dispatch_event(&event).map_err(js_err)?;
        Ok(())
    }
}

impl EditablePort for DomEditable {
    fn get_text(&self) -> Result<String> {
        Ok(match &self.target {
            Target::TextArea(el) => el.value(),
            Target::Input(el) => el.value(),
            Target::ContentEditable(el) => el.inner_text(),
        })
    }

    fn set_text(&self, text: &str) -> Result<()> {
        match &self.target {
            Target::TextArea(el) => el.set_value(text),
            Target::Input(el) => el.set_value(text),
            Target::ContentEditable(el) => el.set_inner_text(text),
        }
        self.notify_input()
    }

    fn focus(&self) -> Result<()> {
        self.element().focus().map_err(js_err)
    }
}

fn js_err(e: wasm_bindgen::JsValue) -> ComposerError {
    ComposerError::JsInterop(format!("{:?}", e))
}
