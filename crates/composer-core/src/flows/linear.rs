//! Generic N-step question/answer flow driven by a `TemplateSpec`.

use async_trait::async_trait;
use composer_types::{
    Result,
    generation::GenerationRequest,
    store::UserProfile,
    template::TemplateKey,
};
use super::{is_skip, Flow, FlowContext, FlowState};

/// Field that holds follow-up instructions after the flow completed
pub const REVISION_FIELD: &str = "revision";
/// Reply to an empty or "skip" message once the result is out
pub const REVISION_HINT: &str = "Tell me what to change, or press Regenerate.";

/// One question of a linear flow
#[derive(Debug)]
pub struct StepSpec {
    pub field: &'static str,
    pub prompt: &'static str,
    /// Noun phrase used in "Please provide ... first."
    pub label: &'static str,
    pub required: bool,
    /// Store the answer in TemplateAnswers and offer it next time
    pub remember: bool,
}

/// Inputs handed to a template's prompt builder
pub struct PromptInputs<'a> {
    pub state: &'a FlowState,
    pub profile: &'a UserProfile,
    pub tone: &'a str,
    pub length: &'a str,
}

impl PromptInputs<'_> {
    /// Trimmed field value, empty when unset or skipped.
    pub fn field(&self, name: &str) -> &str {
        self.state.get(name).map(str::trim).unwrap_or("")
    }
}

pub struct TemplateSpec {
    pub key: TemplateKey,
    pub steps: &'static [StepSpec],
    pub build_prompt: fn(&PromptInputs<'_>) -> String,
}

impl std::fmt::Debug for TemplateSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateSpec")
            .field("key", &self.key)
            .field("steps", &self.steps.len())
            .finish()
    }
}

pub struct LinearFlow {
    spec: &'static TemplateSpec,
    state: FlowState,
}

impl LinearFlow {
    pub fn new(spec: &'static TemplateSpec) -> Self {
        Self {
            spec,
            state: FlowState::default(),
        }
    }

    pub fn spec(&self) -> &'static TemplateSpec {
        self.spec
    }

    pub fn is_complete(&self) -> bool {
        self.state.step() >= self.spec.steps.len()
    }

    fn missing_required(&self) -> Option<&'static StepSpec> {
        self.spec
            .steps
            .iter()
            .find(|s| s.required && !self.state.has(s.field))
    }

    async fn generate(&mut self, ctx: &mut FlowContext<'_>) -> Result<()> {
        if let Some(step) = self.missing_required() {
            ctx.say(format!("Please provide {} first.", step.label));
            return Ok(());
        }

        let tone = match self.state.get("tone").map(str::trim) {
            Some(t) if !t.is_empty() => t.to_string(),
            _ => ctx.default_tone(),
        };
        let length = ctx.default_length();
        let prompt = (self.spec.build_prompt)(&PromptInputs {
            state: &self.state,
            profile: ctx.profile,
            tone: &tone,
            length: &length,
        });

        let req = GenerationRequest::new(prompt, tone, self.spec.key.content_type());
        let content = ctx.generator.generate(&req).await?;
        ctx.show_result(content);
        Ok(())
    }
}

#[async_trait(?Send)]
impl Flow for LinearFlow {
    fn key(&self) -> TemplateKey {
        self.spec.key
    }

    fn start(&self) -> &str {
        self.spec.steps.first().map(|s| s.prompt).unwrap_or("")
    }

    fn state(&self) -> &FlowState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut FlowState {
        &mut self.state
    }

    fn on_start(&mut self, ctx: &mut FlowContext<'_>) {
        if let Some(first) = self.spec.steps.first() {
            if first.remember && ctx.remembered(first.field).is_some() {
                ctx.ask("Or reuse your last answer:", first.field, true);
            }
        }
    }

    async fn on_user_message(&mut self, text: &str, ctx: &mut FlowContext<'_>) -> Result<()> {
        let text = text.trim();

        if self.is_complete() {
            if text.is_empty() || is_skip(text) {
                ctx.say(REVISION_HINT);
                return Ok(());
            }
            self.state.set(REVISION_FIELD, text);
            return self.generate(ctx).await;
        }

        let spec = self.spec;
        let step = &spec.steps[self.state.step()];
        if text.is_empty() || is_skip(text) {
            if step.required {
                ctx.say(format!("I need {} to continue. {}", step.label, step.prompt));
                return Ok(());
            }
            self.state.unset(step.field);
        } else {
            self.state.set(step.field, text);
            if step.remember {
                ctx.remember(step.field, text).await;
            }
        }

        self.state.advance();
        log::debug!("{}: step {}/{}", self.spec.key, self.state.step(), self.spec.steps.len());

        match spec.steps.get(self.state.step()) {
            Some(next) => {
                ctx.ask(next.prompt, next.field, next.remember);
                Ok(())
            }
            None => self.generate(ctx).await,
        }
    }

    fn can_regenerate(&self) -> bool {
        true
    }

    async fn on_regenerate(&mut self, ctx: &mut FlowContext<'_>) -> Result<()> {
        ctx.clear_action_row();
        self.generate(ctx).await
    }
}
