//! Template flows.
//!
//! A flow is a small linear state machine: it asks a question per step,
//! stores the answer under a field name, and on the last step calls the
//! generation client. Flows only mutate their own `FlowState`; everything
//! they show goes through `FlowContext`.

mod custom;
mod linear;
mod templates;

use std::collections::BTreeMap;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use composer_types::{
    Result,
    config::GenerationConfig,
    generation::GeneratedContent,
    message::{ChatMessage, QuickReply, RenderOptions},
    store::UserProfile,
    template::TemplateKey,
};
use crate::generation::GenerationClient;
use crate::persistence::Persistence;
use crate::session::Transcript;

pub use custom::CustomPromptFlow;
pub use linear::{LinearFlow, PromptInputs, StepSpec, TemplateSpec, REVISION_FIELD, REVISION_HINT};
pub use templates::spec_for;

/// Literal answer that leaves an optional field empty
pub const SKIP_WORD: &str = "skip";

#[async_trait(?Send)]
pub trait Flow {
    fn key(&self) -> TemplateKey;

    /// Initial bot prompt
    fn start(&self) -> &str;

    fn state(&self) -> &FlowState;

    fn state_mut(&mut self) -> &mut FlowState;

    /// Called once after the initial prompt is shown.
    fn on_start(&mut self, _ctx: &mut FlowContext<'_>) {}

    async fn on_user_message(&mut self, text: &str, ctx: &mut FlowContext<'_>) -> Result<()>;

    /// Whether `on_regenerate` is implemented. When false the panel replays
    /// the last user message instead.
    fn can_regenerate(&self) -> bool {
        false
    }

    async fn on_regenerate(&mut self, _ctx: &mut FlowContext<'_>) -> Result<()> {
        Ok(())
    }

    fn reset(&mut self) {
        self.state_mut().reset();
    }
}

/// Build the flow for a picker key. Unknown keys get the custom prompt flow.
pub fn create_flow(name: &str) -> Box<dyn Flow> {
    match spec_for(TemplateKey::from_key(name)) {
        Some(spec) => Box::new(LinearFlow::new(spec)),
        None => Box::new(CustomPromptFlow::new()),
    }
}

pub fn is_skip(text: &str) -> bool {
    text.trim().eq_ignore_ascii_case(SKIP_WORD)
}

// ─── Flow state ──────────────────────────────────────────────

/// Step counter and collected answers.
///
/// `step` can only move forward or go back to zero through `reset`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowState {
    step: usize,
    data: BTreeMap<String, String>,
}

impl FlowState {
    pub fn step(&self) -> usize {
        self.step
    }

    pub fn advance(&mut self) {
        self.step += 1;
    }

    pub fn reset(&mut self) {
        self.step = 0;
        self.data.clear();
    }

    pub fn set(&mut self, field: &str, value: impl Into<String>) {
        self.data.insert(field.to_string(), value.into());
    }

    pub fn unset(&mut self, field: &str) {
        self.data.remove(field);
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.data.get(field).map(|v| v.as_str())
    }

    /// Present and not blank
    pub fn has(&self, field: &str) -> bool {
        self.get(field).map(|v| !v.trim().is_empty()).unwrap_or(false)
    }

    pub fn data(&self) -> &BTreeMap<String, String> {
        &self.data
    }
}

// ─── Flow context ────────────────────────────────────────────

/// Fallbacks for fields neither the user nor the profile supplied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowDefaults {
    pub tone: String,
    pub length: String,
}

impl Default for FlowDefaults {
    fn default() -> Self {
        Self::from(&GenerationConfig::default())
    }
}

impl From<&GenerationConfig> for FlowDefaults {
    fn from(config: &GenerationConfig) -> Self {
        Self {
            tone: config.default_tone.clone(),
            length: config.default_length.clone(),
        }
    }
}

/// Everything a flow may touch while handling one message.
pub struct FlowContext<'a> {
    pub generator: &'a GenerationClient,
    pub store: &'a Persistence,
    pub defaults: &'a FlowDefaults,
    pub template: TemplateKey,
    pub profile: &'a UserProfile,
    answers: &'a mut BTreeMap<String, String>,
    transcript: &'a mut Transcript,
}

impl<'a> FlowContext<'a> {
    pub fn new(
        generator: &'a GenerationClient,
        store: &'a Persistence,
        defaults: &'a FlowDefaults,
        template: TemplateKey,
        profile: &'a UserProfile,
        answers: &'a mut BTreeMap<String, String>,
        transcript: &'a mut Transcript,
    ) -> Self {
        Self {
            generator,
            store,
            defaults,
            template,
            profile,
            answers,
            transcript,
        }
    }

    pub fn say(&mut self, text: impl Into<String>) {
        self.transcript.push_bot(text);
    }

    pub fn say_with(&mut self, text: impl Into<String>, render: RenderOptions) {
        self.transcript.push(ChatMessage::bot_with(text, render));
    }

    /// Ask a question, offering the remembered answer for `field` if any.
    pub fn ask(&mut self, prompt: &str, field: &str, offer_saved: bool) {
        let saved = if offer_saved { self.remembered(field) } else { None };
        match saved {
            Some(value) => {
                let reply = QuickReply {
                    label: format!("Use saved: {}", preview(&value, 40)),
                    value,
                };
                self.say_with(prompt, RenderOptions::with_quick_replies(vec![reply]));
            }
            None => self.say(prompt),
        }
    }

    pub fn show_result(&mut self, content: GeneratedContent) {
        self.transcript.show_result(content);
    }

    pub fn clear_action_row(&mut self) {
        self.transcript.clear_action_row();
    }

    pub fn remembered(&self, field: &str) -> Option<String> {
        self.answers
            .get(field)
            .filter(|v| !v.trim().is_empty())
            .cloned()
    }

    /// Store an answer for future runs of this template. Failures are logged
    /// and do not interrupt the flow.
    pub async fn remember(&mut self, field: &str, value: &str) {
        self.answers.insert(field.to_string(), value.to_string());
        if let Err(e) = self
            .store
            .set_template_answer(self.template.as_str(), field, value)
            .await
        {
            log::warn!("Could not remember {}.{}: {}", self.template, field, e);
        }
    }

    /// Profile tone, then configured default.
    pub fn default_tone(&self) -> String {
        non_empty(&self.profile.tone).unwrap_or_else(|| self.defaults.tone.clone())
    }

    pub fn default_length(&self) -> String {
        non_empty(&self.profile.length).unwrap_or_else(|| self.defaults.length.clone())
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn preview(value: &str, max_chars: usize) -> String {
    let single_line = value.split_whitespace().collect::<Vec<_>>().join(" ");
    if single_line.chars().count() <= max_chars {
        single_line
    } else {
        let cut: String = single_line.chars().take(max_chars).collect();
        format!("{}…", cut.trim_end())
    }
}
