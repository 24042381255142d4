//! Free-form prompt: every message is sent to the generator as-is.

use async_trait::async_trait;
use composer_types::{Result, generation::GenerationRequest, template::TemplateKey};
use super::{Flow, FlowContext, FlowState};

const PROMPT_FIELD: &str = "prompt";

pub struct CustomPromptFlow {
    state: FlowState,
}

impl CustomPromptFlow {
    pub fn new() -> Self {
        Self {
            state: FlowState::default(),
        }
    }
}

impl Default for CustomPromptFlow {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait(?Send)]
impl Flow for CustomPromptFlow {
    fn key(&self) -> TemplateKey {
        TemplateKey::CustomPrompt
    }

    fn start(&self) -> &str {
        "What would you like me to write? Describe it in your own words."
    }

    fn state(&self) -> &FlowState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut FlowState {
        &mut self.state
    }

    async fn on_user_message(&mut self, text: &str, ctx: &mut FlowContext<'_>) -> Result<()> {
        let text = text.trim();
        if text.is_empty() {
            ctx.say("Tell me what to write first.");
            return Ok(());
        }

        self.state.set(PROMPT_FIELD, text);
        if self.state.step() == 0 {
            self.state.advance();
        }

        let req = GenerationRequest::new(text, ctx.default_tone(), ctx.template.content_type());
        let content = ctx.generator.generate(&req).await?;
        ctx.show_result(content);
        Ok(())
    }
}
