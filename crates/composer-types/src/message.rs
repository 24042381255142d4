use serde::{Deserialize, Serialize};
use crate::generation::GeneratedContent;

/// Who wrote a transcript entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Bot,
}

/// A single entry in the panel transcript. Never mutated once appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub text: String,
    #[serde(default)]
    pub render: RenderOptions,
}

/// Extra rendering hints attached to a bot message
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RenderOptions {
    /// Buttons shown in the result action row
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub actions: Vec<ResultAction>,
    /// One-click answers, e.g. a remembered value for the current step
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub quick_replies: Vec<QuickReply>,
    /// Structured result the text was rendered from
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub result: Option<GeneratedContent>,
    #[serde(default)]
    pub is_error: bool,
}

impl RenderOptions {
    /// Options for a generated result: the full action row.
    pub fn for_result(result: GeneratedContent) -> Self {
        Self {
            actions: ResultAction::all().to_vec(),
            quick_replies: Vec::new(),
            result: Some(result),
            is_error: false,
        }
    }

    pub fn with_quick_replies(quick_replies: Vec<QuickReply>) -> Self {
        Self {
            quick_replies,
            ..Self::default()
        }
    }

    pub fn error() -> Self {
        Self {
            is_error: true,
            ..Self::default()
        }
    }

    pub fn has_actions(&self) -> bool {
        !self.actions.is_empty()
    }
}

/// Per-result buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultAction {
    Copy,
    Insert,
    Save,
    Regenerate,
    New,
}

impl ResultAction {
    pub fn all() -> &'static [ResultAction] {
        &[
            ResultAction::Copy,
            ResultAction::Insert,
            ResultAction::Save,
            ResultAction::Regenerate,
            ResultAction::New,
        ]
    }

    pub fn label(&self) -> &str {
        match self {
            ResultAction::Copy => "Copy",
            ResultAction::Insert => "Insert",
            ResultAction::Save => "Save",
            ResultAction::Regenerate => "Regenerate",
            ResultAction::New => "New",
        }
    }
}

/// A button that answers the current question without typing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuickReply {
    pub label: String,
    pub value: String,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
            render: RenderOptions::default(),
        }
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Self {
            role: Role::Bot,
            text: text.into(),
            render: RenderOptions::default(),
        }
    }

    pub fn bot_with(text: impl Into<String>, render: RenderOptions) -> Self {
        Self {
            role: Role::Bot,
            text: text.into(),
            render,
        }
    }

    pub fn is_user(&self) -> bool {
        self.role == Role::User
    }
}
