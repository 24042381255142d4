//! Persisted records and their storage keys.

use std::collections::BTreeMap;
use serde::{Deserialize, Serialize};

pub const SAVED_ITEMS_KEY: &str = "savedItems";
pub const TEMPLATE_ANSWERS_KEY: &str = "templateAnswers";
pub const USER_PROFILE_KEY: &str = "userProfile";

pub const DEFAULT_SAVED_ITEMS_CAP: usize = 50;
pub const UNTAGGED_LABEL: &str = "Untagged";

/// A generated result the user chose to keep
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedItem {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub tag: String,
    pub created_at: String,
}

impl SavedItem {
    pub fn new(text: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            text: text.into(),
            tag: tag.into().trim().to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn group_label(&self) -> &str {
        if self.tag.is_empty() {
            UNTAGGED_LABEL
        } else {
            &self.tag
        }
    }
}

/// Saved items sharing one tag, for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedGroup {
    pub label: String,
    pub untagged: bool,
    pub items: Vec<SavedItem>,
}

/// Remembered answers: template key → field → last value
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateAnswers(pub BTreeMap<String, BTreeMap<String, String>>);

impl TemplateAnswers {
    pub fn get(&self, template: &str, field: &str) -> Option<&str> {
        self.0
            .get(template)
            .and_then(|fields| fields.get(field))
            .map(|v| v.as_str())
    }

    pub fn set(&mut self, template: &str, field: &str, value: impl Into<String>) {
        self.0
            .entry(template.to_string())
            .or_default()
            .insert(field.to_string(), value.into());
    }

    pub fn for_template(&self, template: &str) -> BTreeMap<String, String> {
        self.0.get(template).cloned().unwrap_or_default()
    }
}

/// The user's own details, used as fallback prompt context
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserProfile {
    pub name: String,
    pub title: String,
    pub skills: String,
    pub experience: String,
    pub projects: String,
    pub tone: String,
    pub length: String,
    pub signature: String,
    pub language: String,
}

impl UserProfile {
    /// "Label: value" lines for every non-empty background field.
    pub fn background_lines(&self) -> Vec<String> {
        [
            ("Name", &self.name),
            ("Title", &self.title),
            ("Skills", &self.skills),
            ("Experience", &self.experience),
            ("Projects", &self.projects),
        ]
        .into_iter()
        .filter(|(_, v)| !v.trim().is_empty())
        .map(|(label, v)| format!("{}: {}", label, v.trim()))
        .collect()
    }
}
