//! Panel controller. Owns the session and routes every user action.
//!
//! This is the error boundary: flows propagate generation failures and the
//! controller turns each into a single bot message. A session never ends
//! because of a failure.

use std::rc::Rc;

use composer_types::{
    ComposerError, Result,
    config::GenerationConfig,
    event::{PanelEvent, ToastLevel},
    message::ChatMessage,
    message::RenderOptions,
    store::{SavedItem, UserProfile},
    template::TemplateKey,
};
use crate::event_bus::EventBus;
use crate::flows::{create_flow, FlowContext, FlowDefaults};
use crate::generation::GenerationClient;
use crate::persistence::Persistence;
use crate::ports::EditablePort;
use crate::session::Session;
use crate::tag_prompt::TagPrompt;

pub const GENERATION_ERROR_MESSAGE: &str = "Sorry, an error occurred while generating. Please try again.";
pub const NOTHING_TO_REGENERATE: &str = "Nothing to regenerate yet.";
pub const PICK_TEMPLATE_MESSAGE: &str = "Pick a template to get started.";

/// What happened to a submitted message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Routed to the active flow (or answered by the panel)
    Handled,
    /// Empty or whitespace-only; nothing appended
    Empty,
    /// The panel is not open
    Closed,
}

pub struct PanelController {
    generator: Rc<GenerationClient>,
    store: Rc<Persistence>,
    events: EventBus,
    defaults: FlowDefaults,
    session: Option<Session>,
}

impl PanelController {
    pub fn new(generator: Rc<GenerationClient>, store: Rc<Persistence>, events: EventBus) -> Self {
        Self {
            generator,
            store,
            events,
            defaults: FlowDefaults::default(),
            session: None,
        }
    }

    pub fn with_generation_config(mut self, config: &GenerationConfig) -> Self {
        self.defaults = FlowDefaults::from(config);
        self
    }

    /// Swap backend, storage and defaults after a settings change. Any
    /// in-flight generation on the old client is abandoned.
    pub fn reconfigure(
        &mut self,
        generator: Rc<GenerationClient>,
        store: Rc<Persistence>,
        config: &GenerationConfig,
    ) {
        self.generator.cancel_in_flight();
        log::info!(
            "Reconfigured: generation via {}, storage {}",
            generator.backend_name(),
            store.backend_name()
        );
        self.generator = generator;
        self.store = store;
        self.defaults = FlowDefaults::from(config);
    }

    // ─── Lifecycle ───────────────────────────────────────────

    /// Open the panel with a fresh session. No-op when already open.
    pub fn open(&mut self) -> bool {
        if self.session.is_some() {
            return false;
        }
        let session = Session::new(self.events.clone());
        log::info!("Panel opened (session {})", session.id);
        self.events.emit(PanelEvent::Opened {
            session_id: session.id.clone(),
        });
        self.session = Some(session);
        true
    }

    /// Close the panel, abandoning any in-flight generation.
    pub fn close(&mut self) -> bool {
        if self.generator.cancel_in_flight() {
            log::info!("Cancelled in-flight generation on close");
        }
        match self.session.take() {
            Some(session) => {
                log::info!("Panel closed (session {})", session.id);
                self.events.emit(PanelEvent::Closed);
                true
            }
            None => false,
        }
    }

    pub fn toggle(&mut self) -> bool {
        if self.is_open() {
            self.close();
        } else {
            self.open();
        }
        self.is_open()
    }

    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn active_template(&self) -> Option<TemplateKey> {
        self.session.as_ref().and_then(|s| s.template())
    }

    pub fn messages(&self) -> &[ChatMessage] {
        self.session
            .as_ref()
            .map(|s| s.transcript.messages())
            .unwrap_or(&[])
    }

    pub fn generator(&self) -> Rc<GenerationClient> {
        self.generator.clone()
    }

    pub fn events(&self) -> EventBus {
        self.events.clone()
    }

    // ─── Template selection ──────────────────────────────────

    /// Start the flow for `name`; unknown names get the custom prompt flow.
    /// Opens the panel first if needed.
    pub async fn select_template(&mut self, name: &str) -> TemplateKey {
        self.open();
        let flow = create_flow(name);
        let key = flow.key();
        log::info!("Template selected: {}", key);

        let answers = self.store.template_answers(key.as_str()).await;
        let profile = match self.store.user_profile().await {
            Ok(p) => p,
            Err(e) => {
                log::warn!("User profile unavailable: {}", e);
                UserProfile::default()
            }
        };

        let Some(session) = self.session.as_mut() else {
            return key;
        };
        session.transcript.clear();
        session.last_user_message = None;
        session.answers = answers;
        session.profile = profile;
        session.active_flow = Some(flow);
        self.events.emit(PanelEvent::TemplateSelected { template: key });

        if let Some(flow) = session.active_flow.as_mut() {
            session.transcript.push_bot(flow.start());
            let mut ctx = FlowContext::new(
                &self.generator,
                &self.store,
                &self.defaults,
                key,
                &session.profile,
                &mut session.answers,
                &mut session.transcript,
            );
            flow.on_start(&mut ctx);
        }
        key
    }

    // ─── Messages ────────────────────────────────────────────

    pub async fn submit_user_message(&mut self, text: &str) -> SubmitOutcome {
        let Some(session) = self.session.as_mut() else {
            return SubmitOutcome::Closed;
        };
        let text = text.trim();
        if text.is_empty() {
            return SubmitOutcome::Empty;
        }
        session.transcript.push_user(text);
        session.last_user_message = Some(text.to_string());
        session.set_send_enabled(false);

        let result = match session.active_flow.as_mut() {
            Some(flow) => {
                let mut ctx = FlowContext::new(
                    &self.generator,
                    &self.store,
                    &self.defaults,
                    flow.key(),
                    &session.profile,
                    &mut session.answers,
                    &mut session.transcript,
                );
                flow.on_user_message(text, &mut ctx).await
            }
            None => {
                session.transcript.push_bot(PICK_TEMPLATE_MESSAGE);
                Ok(())
            }
        };

        if let Err(e) = result {
            report_failure(session, &self.events, e);
        }
        session.set_send_enabled(true);
        SubmitOutcome::Handled
    }

    /// The "use saved value" shortcut: answer with `value` without typing.
    pub async fn choose_quick_reply(&mut self, value: &str) -> SubmitOutcome {
        self.submit_user_message(value).await
    }

    pub async fn regenerate(&mut self) -> SubmitOutcome {
        let Some(session) = self.session.as_mut() else {
            return SubmitOutcome::Closed;
        };
        session.transcript.clear_action_row();
        session.set_send_enabled(false);

        let replay = session.last_user_message.clone();
        let result = match session.active_flow.as_mut() {
            Some(flow) => {
                let can_regenerate = flow.can_regenerate();
                let mut ctx = FlowContext::new(
                    &self.generator,
                    &self.store,
                    &self.defaults,
                    flow.key(),
                    &session.profile,
                    &mut session.answers,
                    &mut session.transcript,
                );
                if can_regenerate {
                    flow.on_regenerate(&mut ctx).await
                } else if let Some(last) = replay.as_deref() {
                    flow.on_user_message(last, &mut ctx).await
                } else {
                    ctx.say(NOTHING_TO_REGENERATE);
                    Ok(())
                }
            }
            None => {
                session.transcript.push_bot(NOTHING_TO_REGENERATE);
                Ok(())
            }
        };

        if let Err(e) = result {
            report_failure(session, &self.events, e);
        }
        session.set_send_enabled(true);
        SubmitOutcome::Handled
    }

    /// "New": clear the transcript and restart the active flow.
    pub fn reset(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.transcript.clear();
        session.last_user_message = None;

        if let Some(flow) = session.active_flow.as_mut() {
            flow.reset();
            session.transcript.push_bot(flow.start());
            let mut ctx = FlowContext::new(
                &self.generator,
                &self.store,
                &self.defaults,
                flow.key(),
                &session.profile,
                &mut session.answers,
                &mut session.transcript,
            );
            flow.on_start(&mut ctx);
        }
    }

    // ─── Result actions ──────────────────────────────────────

    pub fn last_result_text(&self) -> Option<String> {
        self.session
            .as_ref()
            .and_then(|s| s.transcript.last_result_text())
            .map(String::from)
    }

    /// Hand the last result to the UI for the clipboard.
    pub fn copy_result(&self) -> Option<String> {
        let text = self.last_result_text();
        match &text {
            Some(text) => {
                self.events.emit(PanelEvent::ClipboardRequested { text: text.clone() });
                self.events.toast(ToastLevel::Success, "Copied");
            }
            None => self.events.toast(ToastLevel::Info, "Nothing to copy yet"),
        }
        text
    }

    /// Write the last result into the host page's composer.
    pub fn insert_result(&self, target: &dyn EditablePort) -> Result<()> {
        let Some(text) = self.last_result_text() else {
            self.events.toast(ToastLevel::Info, "Nothing to insert yet");
            return Ok(());
        };
        let outcome = target.set_text(&text).and_then(|_| target.focus());
        match &outcome {
            Ok(()) => self.events.toast(ToastLevel::Success, "Inserted"),
            Err(e) => {
                log::error!("Insert failed: {}", e);
                self.events.toast(ToastLevel::Error, "Insert failed");
            }
        }
        outcome
    }

    /// Save the last result. With no `tag` the user is asked through `prompt`.
    pub async fn save_result(&self, tag: Option<String>, prompt: &TagPrompt) -> Option<SavedItem> {
        let Some(text) = self.last_result_text() else {
            self.events.toast(ToastLevel::Info, "Nothing to save yet");
            return None;
        };

        let asking = tag.is_none();
        if asking {
            self.events.emit(PanelEvent::TagRequested);
        }
        let saved = self.store.save_item_prompted(&text, tag, prompt).await;
        if asking {
            self.events.emit(PanelEvent::TagResolved);
        }

        match saved {
            Ok(item) => {
                self.events.toast(ToastLevel::Success, "Saved");
                self.load_saved_items().await;
                Some(item)
            }
            Err(e) => {
                log::error!("Save failed: {}", e);
                self.events.toast(ToastLevel::Error, "Save failed");
                None
            }
        }
    }

    // ─── Saved items & profile ───────────────────────────────

    pub async fn load_saved_items(&self) {
        match self.store.grouped_saved_items().await {
            Ok(groups) => self.events.emit(PanelEvent::SavedItemsUpdated { groups }),
            Err(e) => {
                log::error!("Loading saved items failed: {}", e);
                self.events.toast(ToastLevel::Error, "Could not load saved items");
            }
        }
    }

    pub async fn delete_saved_item(&self, id: &str) -> bool {
        match self.store.delete_saved_item(id).await {
            Ok(removed) => {
                self.load_saved_items().await;
                removed
            }
            Err(e) => {
                log::error!("Delete failed: {}", e);
                self.events.toast(ToastLevel::Error, "Delete failed");
                false
            }
        }
    }

    pub async fn load_profile(&mut self) -> UserProfile {
        let profile = match self.store.user_profile().await {
            Ok(p) => p,
            Err(e) => {
                log::warn!("User profile unavailable: {}", e);
                UserProfile::default()
            }
        };
        if let Some(session) = self.session.as_mut() {
            session.profile = profile.clone();
        }
        self.events.emit(PanelEvent::ProfileUpdated {
            profile: profile.clone(),
        });
        profile
    }

    pub async fn update_profile(&mut self, profile: UserProfile) -> bool {
        match self.store.set_user_profile(&profile).await {
            Ok(()) => {
                if let Some(session) = self.session.as_mut() {
                    session.profile = profile.clone();
                }
                self.events.emit(PanelEvent::ProfileUpdated { profile });
                self.events.toast(ToastLevel::Success, "Profile saved");
                true
            }
            Err(e) => {
                log::error!("Profile save failed: {}", e);
                self.events.toast(ToastLevel::Error, "Save failed");
                false
            }
        }
    }
}

/// Render a flow failure as one bot message. Cancellation is silent.
fn report_failure(session: &mut Session, events: &EventBus, e: ComposerError) {
    if e.is_cancelled() {
        log::warn!("Generation abandoned (session {})", session.id);
        return;
    }
    log::error!("Generation failed: {}", e);
    session
        .transcript
        .push(ChatMessage::bot_with(GENERATION_ERROR_MESSAGE, RenderOptions::error()));
    events.toast(ToastLevel::Error, "Generation failed");
}
