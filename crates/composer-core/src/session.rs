//! Per-open-panel state.
//!
//! A `Session` exists from `open` to `close` and is owned by the panel
//! controller. Its `Transcript` is append-only; every change is mirrored to
//! the UI through the event bus.

use std::collections::BTreeMap;
use composer_types::{
    event::PanelEvent,
    generation::GeneratedContent,
    message::{ChatMessage, RenderOptions},
    store::UserProfile,
    template::TemplateKey,
};
use crate::event_bus::EventBus;
use crate::flows::Flow;

pub struct Session {
    pub id: String,
    pub active_flow: Option<Box<dyn Flow>>,
    pub last_user_message: Option<String>,
    pub transcript: Transcript,
    /// Profile snapshot used as prompt fallback
    pub profile: UserProfile,
    /// Remembered answers for the active template
    pub answers: BTreeMap<String, String>,
    send_enabled: bool,
}

impl Session {
    pub fn new(events: EventBus) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            active_flow: None,
            last_user_message: None,
            transcript: Transcript::new(events),
            profile: UserProfile::default(),
            answers: BTreeMap::new(),
            send_enabled: true,
        }
    }

    pub fn template(&self) -> Option<TemplateKey> {
        self.active_flow.as_ref().map(|f| f.key())
    }

    pub fn send_enabled(&self) -> bool {
        self.send_enabled
    }

    pub(crate) fn set_send_enabled(&mut self, enabled: bool) {
        if self.send_enabled != enabled {
            self.send_enabled = enabled;
            self.transcript.events.emit(PanelEvent::SendEnabled { enabled });
        }
    }
}

/// Ordered chat history plus the "current result" bookkeeping.
pub struct Transcript {
    messages: Vec<ChatMessage>,
    /// Index of the message whose action row is visible
    action_row: Option<usize>,
    last_result_text: Option<String>,
    last_result_options: Option<RenderOptions>,
    events: EventBus,
}

impl Transcript {
    pub fn new(events: EventBus) -> Self {
        Self {
            messages: Vec::new(),
            action_row: None,
            last_result_text: None,
            last_result_options: None,
            events,
        }
    }

    /// Append a message and announce it. Returns its index.
    pub fn push(&mut self, message: ChatMessage) -> usize {
        let index = self.messages.len();
        let has_actions = message.render.has_actions();
        self.messages.push(message.clone());
        self.events.emit(PanelEvent::MessageAppended { index, message });
        if has_actions {
            self.action_row = Some(index);
            self.events.emit(PanelEvent::ActionRowShown { index });
        }
        index
    }

    pub fn push_user(&mut self, text: impl Into<String>) -> usize {
        self.push(ChatMessage::user(text))
    }

    pub fn push_bot(&mut self, text: impl Into<String>) -> usize {
        self.push(ChatMessage::bot(text))
    }

    /// Render a generated result with its action row, replacing any earlier row.
    pub fn show_result(&mut self, content: GeneratedContent) -> usize {
        self.clear_action_row();
        let text = content.display_text();
        self.last_result_text = Some(content.primary_text());
        let render = RenderOptions::for_result(content);
        self.last_result_options = Some(render.clone());
        self.push(ChatMessage::bot_with(text, render))
    }

    pub fn clear_action_row(&mut self) {
        if self.action_row.take().is_some() {
            self.events.emit(PanelEvent::ActionRowCleared);
        }
    }

    pub fn clear(&mut self) {
        self.messages.clear();
        self.action_row = None;
        self.last_result_text = None;
        self.last_result_options = None;
        self.events.emit(PanelEvent::TranscriptCleared);
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn action_row(&self) -> Option<usize> {
        self.action_row
    }

    pub fn last_result_text(&self) -> Option<&str> {
        self.last_result_text.as_deref()
    }

    pub fn last_result_options(&self) -> Option<&RenderOptions> {
        self.last_result_options.as_ref()
    }
}
