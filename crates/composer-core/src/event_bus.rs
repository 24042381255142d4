//! Simple event bus for decoupled communication between panel controller and UI.
//!
//! The bus is single-threaded (WASM constraint) and uses interior mutability
//! via RefCell. Events are buffered and drained by the UI on each frame.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use composer_types::event::{PanelEvent, ToastLevel};

/// Shared event bus, cloned via Rc.
#[derive(Clone)]
pub struct EventBus {
    inner: Rc<RefCell<VecDeque<PanelEvent>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(VecDeque::new())),
        }
    }

    /// Publish an event. Called by the panel controller.
    pub fn emit(&self, event: PanelEvent) {
        self.inner.borrow_mut().push_back(event);
    }

    pub fn toast(&self, level: ToastLevel, message: impl Into<String>) {
        self.emit(PanelEvent::Toast {
            level,
            message: message.into(),
        });
    }

    /// Drain all pending events. Called by the UI layer each frame.
    pub fn drain(&self) -> Vec<PanelEvent> {
        self.inner.borrow_mut().drain(..).collect()
    }

    /// Check if there are pending events (useful for egui repaint triggers).
    pub fn has_pending(&self) -> bool {
        !self.inner.borrow().is_empty()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
