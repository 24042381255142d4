use serde::{Deserialize, Serialize};
use crate::message::ChatMessage;
use crate::store::{SavedGroup, UserProfile};
use crate::template::TemplateKey;

/// Events emitted by the panel controller.
/// UI subscribes to these for reactive updates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PanelEvent {
    /// Panel opened with a fresh session
    Opened { session_id: String },

    /// Panel closed; the session is gone
    Closed,

    /// A template was picked and its flow started
    TemplateSelected { template: TemplateKey },

    /// A message was appended to the transcript
    MessageAppended { index: usize, message: ChatMessage },

    /// The transcript was emptied (reset or template change)
    TranscriptCleared,

    /// The result action row now belongs to this message
    ActionRowShown { index: usize },

    /// Any visible result action row was removed
    ActionRowCleared,

    /// Send control enabled/disabled around a submission
    SendEnabled { enabled: bool },

    /// A tag is being collected for a save
    TagRequested,

    /// The tag prompt was answered or cancelled
    TagResolved,

    /// Text the UI should place on the clipboard
    ClipboardRequested { text: String },

    /// Transient notification
    Toast { level: ToastLevel, message: String },

    /// Fresh grouped view of the saved items
    SavedItemsUpdated { groups: Vec<SavedGroup> },

    /// The stored profile changed or was loaded
    ProfileUpdated { profile: UserProfile },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToastLevel {
    Info,
    Success,
    Error,
}
