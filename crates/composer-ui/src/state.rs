//! UI-level state that drives rendering.
//! This is a read-only projection of the panel controller's session,
//! updated each frame by draining the EventBus. The only fields the UI
//! writes itself are the text inputs and the selected view.

use composer_types::event::{PanelEvent, ToastLevel};
use composer_types::message::ChatMessage;
use composer_types::store::{SavedGroup, UserProfile};
use composer_types::template::TemplateKey;

/// Seconds a toast stays on screen
pub const TOAST_SECONDS: f64 = 3.0;

/// Which tab of the panel is showing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Chat,
    Saved,
    Profile,
    Settings,
}

impl View {
    pub fn all() -> &'static [View] {
        &[View::Chat, View::Saved, View::Profile, View::Settings]
    }

    pub fn label(&self) -> &str {
        match self {
            View::Chat => "Chat",
            View::Saved => "Saved",
            View::Profile => "Profile",
            View::Settings => "Settings",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub level: ToastLevel,
    pub message: String,
    /// Frame time the toast was first drawn; set by `expire_toasts`
    pub shown_at: Option<f64>,
}

/// Something the user did that the app must forward to the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum PanelAction {
    Toggle,
    SelectTemplate(TemplateKey),
    Submit(String),
    QuickReply(String),
    Copy,
    Insert,
    Save,
    Regenerate,
    New,
    SubmitTag(String),
    CancelTag,
    RefreshSaved,
    CopySaved(String),
    DeleteSaved(String),
    SaveProfile(UserProfile),
}

/// State visible to UI panels
pub struct UiState {
    pub panel_open: bool,
    pub session_id: Option<String>,
    pub active_template: Option<TemplateKey>,
    /// Mirror of the session transcript
    pub messages: Vec<ChatMessage>,
    /// Message whose action row is visible
    pub action_row: Option<usize>,
    pub send_enabled: bool,
    /// Input field content
    pub input_text: String,
    pub tag_prompt_open: bool,
    pub tag_input: String,
    pub toasts: Vec<Toast>,
    /// Text waiting to be copied by the app on this frame
    pub clipboard: Option<String>,
    pub saved_groups: Vec<SavedGroup>,
    /// Editable copy of the stored profile
    pub profile_draft: UserProfile,
    pub view: View,
    /// Status line text
    pub status_text: String,
}

impl UiState {
    pub fn new() -> Self {
        Self {
            panel_open: false,
            session_id: None,
            active_template: None,
            messages: Vec::new(),
            action_row: None,
            send_enabled: true,
            input_text: String::new(),
            tag_prompt_open: false,
            tag_input: String::new(),
            toasts: Vec::new(),
            clipboard: None,
            saved_groups: Vec::new(),
            profile_draft: UserProfile::default(),
            view: View::Chat,
            status_text: "Ready".to_string(),
        }
    }

    /// Process events from the EventBus and update UI state
    pub fn process_events(&mut self, events: Vec<PanelEvent>) {
        for event in events {
            match event {
                PanelEvent::Opened { session_id } => {
                    self.panel_open = true;
                    self.session_id = Some(session_id);
                    self.active_template = None;
                    self.clear_transcript();
                    self.send_enabled = true;
                    self.status_text = "Pick a template".to_string();
                }
                PanelEvent::Closed => {
                    self.panel_open = false;
                    self.session_id = None;
                    self.active_template = None;
                    self.clear_transcript();
                    self.tag_prompt_open = false;
                    self.send_enabled = true;
                    self.status_text = "Ready".to_string();
                }
                PanelEvent::TemplateSelected { template } => {
                    self.active_template = Some(template);
                    self.view = View::Chat;
                    self.status_text = template.label().to_string();
                }
                PanelEvent::MessageAppended { index, message } => {
                    if index < self.messages.len() {
                        self.messages[index] = message;
                    } else {
                        self.messages.push(message);
                    }
                }
                PanelEvent::TranscriptCleared => self.clear_transcript(),
                PanelEvent::ActionRowShown { index } => self.action_row = Some(index),
                PanelEvent::ActionRowCleared => self.action_row = None,
                PanelEvent::SendEnabled { enabled } => {
                    self.send_enabled = enabled;
                    self.status_text = if enabled {
                        self.active_template
                            .map(|t| t.label().to_string())
                            .unwrap_or_else(|| "Ready".to_string())
                    } else {
                        "Generating...".to_string()
                    };
                }
                PanelEvent::TagRequested => {
                    self.tag_prompt_open = true;
                    self.tag_input.clear();
                }
                PanelEvent::TagResolved => self.tag_prompt_open = false,
                PanelEvent::ClipboardRequested { text } => self.clipboard = Some(text),
                PanelEvent::Toast { level, message } => self.toasts.push(Toast {
                    level,
                    message,
                    shown_at: None,
                }),
                PanelEvent::SavedItemsUpdated { groups } => self.saved_groups = groups,
                PanelEvent::ProfileUpdated { profile } => self.profile_draft = profile,
            }
        }
    }

    /// Stamp new toasts with `now` and drop the ones older than `TOAST_SECONDS`.
    pub fn expire_toasts(&mut self, now: f64) {
        for toast in &mut self.toasts {
            toast.shown_at.get_or_insert(now);
        }
        self.toasts
            .retain(|t| t.shown_at.map(|at| now - at < TOAST_SECONDS).unwrap_or(true));
    }

    pub fn take_clipboard(&mut self) -> Option<String> {
        self.clipboard.take()
    }

    pub fn is_busy(&self) -> bool {
        !self.send_enabled
    }

    pub fn can_send(&self) -> bool {
        self.panel_open && self.send_enabled && !self.input_text.trim().is_empty()
    }

    pub fn saved_count(&self) -> usize {
        self.saved_groups.iter().map(|g| g.items.len()).sum()
    }

    fn clear_transcript(&mut self) {
        self.messages.clear();
        self.action_row = None;
    }
}

impl Default for UiState {
    fn default() -> Self {
        Self::new()
    }
}
