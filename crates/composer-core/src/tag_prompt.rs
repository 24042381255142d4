//! Inline "type a tag" prompt shown before saving an untagged result.
//!
//! `ask` parks a oneshot sender; the UI answers through `submit` or
//! `cancel` on its own clone of the handle. Nothing else is blocked while
//! the answer is pending.

use std::cell::RefCell;
use std::rc::Rc;
use futures::channel::oneshot;
use composer_types::event::PanelEvent;
use crate::event_bus::EventBus;

/// Shared prompt handle, cloned via Rc.
#[derive(Clone, Default)]
pub struct TagPrompt {
    pending: Rc<RefCell<Option<oneshot::Sender<String>>>>,
}

impl TagPrompt {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for the user's tag. Cancel (or a superseding `ask`) yields "".
    pub async fn ask(&self) -> String {
        let (tx, rx) = oneshot::channel();
        // A second ask supersedes the first; dropping its sender resolves it empty
        self.pending.borrow_mut().replace(tx);
        rx.await.unwrap_or_default()
    }

    /// `ask`, with the UI told to show and then hide the prompt.
    pub async fn collect(&self, events: &EventBus) -> String {
        events.emit(PanelEvent::TagRequested);
        let tag = self.ask().await;
        events.emit(PanelEvent::TagResolved);
        tag
    }

    pub fn submit(&self, tag: impl Into<String>) -> bool {
        match self.pending.borrow_mut().take() {
            Some(tx) => tx.send(tag.into().trim().to_string()).is_ok(),
            None => false,
        }
    }

    pub fn cancel(&self) -> bool {
        self.submit(String::new())
    }

    pub fn is_pending(&self) -> bool {
        self.pending.borrow().is_some()
    }
}
