#[cfg(test)]
mod tests {
    use crate::commands::{self, save_with_prompt, PanelCommand, STILL_WORKING_MESSAGE};
    use crate::event_bus::EventBus;
    use crate::flows::{create_flow, is_skip, spec_for, FlowState, REVISION_HINT};
    use crate::generation::{normalize_response, GenerationClient};
    use crate::lenient::parse_lenient_json;
    use crate::panel::*;
    use crate::persistence::{group_saved_items, Persistence};
    use crate::ports::*;
    use crate::tag_prompt::TagPrompt;
    use composer_types::event::{PanelEvent, ToastLevel};
    use composer_types::generation::*;
    use composer_types::store::*;
    use composer_types::template::TemplateKey;
    use composer_types::{ComposerError, Result};
    use async_trait::async_trait;
    use futures::channel::oneshot;
    use futures::executor::block_on;
    use serde_json::{json, Value};
    use std::cell::{Cell, RefCell};
    use std::collections::HashMap;
    use std::rc::Rc;

    // ─── Mocks ───────────────────────────────────────────────

    /// Generator that answers every request with a fixed value
    struct MockGenerator {
        response: Value,
        requests: RefCell<Vec<GenerationRequest>>,
    }

    impl MockGenerator {
        fn new(response: Value) -> Rc<Self> {
            Rc::new(Self {
                response,
                requests: RefCell::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.requests.borrow().len()
        }

        fn last_request(&self) -> GenerationRequest {
            self.requests.borrow().last().cloned().expect("no request recorded")
        }
    }

    #[async_trait(?Send)]
    impl GenerationPort for MockGenerator {
        async fn generate(&self, req: &GenerationRequest) -> Result<Value> {
            self.requests.borrow_mut().push(req.clone());
            Ok(self.response.clone())
        }

        fn backend_name(&self) -> &str {
            "mock"
        }
    }

    struct FailingGenerator;

    #[async_trait(?Send)]
    impl GenerationPort for FailingGenerator {
        async fn generate(&self, _req: &GenerationRequest) -> Result<Value> {
            Err(ComposerError::Network("connection refused".to_string()))
        }

        fn backend_name(&self) -> &str {
            "failing"
        }
    }

    /// Generator whose response never arrives
    struct PendingGenerator;

    #[async_trait(?Send)]
    impl GenerationPort for PendingGenerator {
        async fn generate(&self, _req: &GenerationRequest) -> Result<Value> {
            futures::future::pending::<()>().await;
            Ok(Value::Null)
        }

        fn backend_name(&self) -> &str {
            "pending"
        }
    }

    /// Generator whose first call waits until the gate is opened
    struct GatedGenerator {
        gate: RefCell<Option<oneshot::Receiver<()>>>,
        requests: RefCell<Vec<GenerationRequest>>,
    }

    impl GatedGenerator {
        fn new(gate: oneshot::Receiver<()>) -> Rc<Self> {
            Rc::new(Self {
                gate: RefCell::new(Some(gate)),
                requests: RefCell::new(Vec::new()),
            })
        }

        fn prompts(&self) -> Vec<String> {
            self.requests.borrow().iter().map(|r| r.prompt.clone()).collect()
        }
    }

    #[async_trait(?Send)]
    impl GenerationPort for GatedGenerator {
        async fn generate(&self, req: &GenerationRequest) -> Result<Value> {
            self.requests.borrow_mut().push(req.clone());
            let gate = self.gate.borrow_mut().take();
            if let Some(gate) = gate {
                let _ = gate.await;
            }
            Ok(json!("done"))
        }

        fn backend_name(&self) -> &str {
            "gated"
        }
    }

    #[derive(Default)]
    struct MockStorage {
        data: RefCell<HashMap<String, Vec<u8>>>,
        fail_writes: Cell<bool>,
    }

    impl MockStorage {
        fn put_json(&self, key: &str, value: Value) {
            self.data
                .borrow_mut()
                .insert(key.to_string(), serde_json::to_vec(&value).unwrap());
        }

        fn get_json(&self, key: &str) -> Option<Value> {
            self.data
                .borrow()
                .get(key)
                .map(|bytes| serde_json::from_slice(bytes).unwrap())
        }
    }

    #[async_trait(?Send)]
    impl StoragePort for MockStorage {
        async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
            Ok(self.data.borrow().get(key).cloned())
        }

        async fn set(&self, key: &str, value: &[u8]) -> Result<()> {
            if self.fail_writes.get() {
                return Err(ComposerError::Storage("quota exceeded".to_string()));
            }
            self.data.borrow_mut().insert(key.to_string(), value.to_vec());
            Ok(())
        }

        async fn delete(&self, key: &str) -> Result<()> {
            self.data.borrow_mut().remove(key);
            Ok(())
        }

        async fn list_keys(&self, prefix: &str) -> Result<Vec<String>> {
            Ok(self
                .data
                .borrow()
                .keys()
                .filter(|k| k.starts_with(prefix))
                .cloned()
                .collect())
        }

        fn backend_name(&self) -> &str {
            "mock"
        }
    }

    #[derive(Default)]
    struct MockEditable {
        text: RefCell<String>,
        focused: Cell<bool>,
    }

    impl EditablePort for MockEditable {
        fn get_text(&self) -> Result<String> {
            Ok(self.text.borrow().clone())
        }

        fn set_text(&self, text: &str) -> Result<()> {
            *self.text.borrow_mut() = text.to_string();
            Ok(())
        }

        fn focus(&self) -> Result<()> {
            self.focused.set(true);
            Ok(())
        }
    }

    struct Harness {
        panel: PanelController,
        bus: EventBus,
        storage: Rc<MockStorage>,
    }

    fn harness_with(backend: Rc<dyn GenerationPort>) -> Harness {
        let bus = EventBus::new();
        let storage = Rc::new(MockStorage::default());
        let store = Rc::new(Persistence::new(storage.clone()));
        let client = Rc::new(GenerationClient::new(backend));
        Harness {
            panel: PanelController::new(client, store, bus.clone()),
            bus,
            storage,
        }
    }

    fn harness(generator: &Rc<MockGenerator>) -> Harness {
        harness_with(generator.clone())
    }

    fn last_text(panel: &PanelController) -> String {
        panel.messages().last().map(|m| m.text.clone()).unwrap_or_default()
    }

    fn step(panel: &PanelController) -> usize {
        panel
            .session()
            .and_then(|s| s.active_flow.as_ref())
            .map(|f| f.state().step())
            .expect("no active flow")
    }

    // ─── EventBus Tests ──────────────────────────────────────

    #[test]
    fn test_event_bus_new_is_empty() {
        let bus = EventBus::new();
        assert!(!bus.has_pending());
        assert!(bus.drain().is_empty());
    }

    #[test]
    fn test_event_bus_clone_shares_state() {
        let bus1 = EventBus::new();
        let bus2 = bus1.clone();

        bus1.toast(ToastLevel::Info, "hello");
        assert!(bus2.has_pending());

        let events = bus2.drain();
        assert_eq!(events.len(), 1);
        assert!(!bus1.has_pending());
        assert!(matches!(&events[0], PanelEvent::Toast { message, .. } if message == "hello"));
    }

    // ─── Lenient JSON Tests ──────────────────────────────────

    #[test]
    fn test_lenient_fenced_with_trailing_comma_and_raw_newline() {
        let input = "```json\n{\"subjects\": [\"A\",\"B\"], \"body_standard\": \"Hello\nWorld\",}\n```";
        let parsed = parse_lenient_json(input).expect("should parse");
        assert_eq!(parsed, json!({ "subjects": ["A", "B"], "body_standard": "Hello\nWorld" }));
    }

    #[test]
    fn test_lenient_rejects_plain_text() {
        assert!(parse_lenient_json("not json at all").is_none());
        assert!(parse_lenient_json("").is_none());
        assert!(parse_lenient_json("[1, 2, 3]").is_none());
    }

    #[test]
    fn test_lenient_strips_surrounding_prose() {
        let input = "Sure! Here is your result:\n{\"content\": \"Hi there\"}\nLet me know if you need more.";
        assert_eq!(parse_lenient_json(input), Some(json!({ "content": "Hi there" })));
    }

    #[test]
    fn test_lenient_normalizes_smart_quotes() {
        let input = "{\u{201c}content\u{201d}: \u{201c}Hello\u{201d}}";
        assert_eq!(parse_lenient_json(input), Some(json!({ "content": "Hello" })));
    }

    #[test]
    fn test_lenient_trailing_commas_in_nested_arrays() {
        let input = "{\"variants\": [{\"text\": \"a\",}, {\"text\": \"b\"},],}";
        let parsed = parse_lenient_json(input).unwrap();
        assert_eq!(parsed["variants"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_lenient_keeps_commas_inside_strings() {
        let input = "{\"text\": \"one, two,}\"}";
        assert_eq!(parse_lenient_json(input), Some(json!({ "text": "one, two,}" })));
    }

    #[test]
    fn test_lenient_retries_with_tabs_as_spaces() {
        let input = "{\"a\": \"x\ty\"}";
        assert!(serde_json::from_str::<Value>(input).is_err());
        assert_eq!(parse_lenient_json(input), Some(json!({ "a": "x y" })));
    }

    #[test]
    fn test_lenient_unclosed_fence() {
        let input = "```\n{\"text\": \"partial\"}";
        assert_eq!(parse_lenient_json(input), Some(json!({ "text": "partial" })));
    }

    // ─── Normalization Tests ─────────────────────────────────

    #[test]
    fn test_normalize_plain_string() {
        let content = normalize_response(json!("  Just text  "));
        assert_eq!(content, GeneratedContent::text("Just text"));
    }

    #[test]
    fn test_normalize_content_key() {
        let content = normalize_response(json!({ "content": "Dear team" }));
        assert_eq!(content, GeneratedContent::text("Dear team"));
    }

    #[test]
    fn test_normalize_variants() {
        let content = normalize_response(json!({
            "variants": [
                { "text": "Short take", "type": "hook", "length": "short" },
                "Plain take",
                { "text": "" }
            ]
        }));
        match content {
            GeneratedContent::Variants { variants } => {
                assert_eq!(variants.len(), 2);
                assert_eq!(variants[0].kind.as_deref(), Some("hook"));
                assert_eq!(variants[1], Variant::plain("Plain take"));
            }
            other => panic!("expected variants, got {:?}", other),
        }
    }

    #[test]
    fn test_normalize_comments_array_alias() {
        let content = normalize_response(json!({ "comments": ["Great point!", "Thanks"] }));
        assert!(matches!(content, GeneratedContent::Variants { ref variants } if variants.len() == 2));
        assert_eq!(content.primary_text(), "Great point!");
    }

    #[test]
    fn test_normalize_email_package() {
        let content = normalize_response(json!({
            "subjects": ["Re: Role"],
            "body_standard": "Hello",
            "follow_up": "Checking in"
        }));
        match &content {
            GeneratedContent::EmailPackage { package } => {
                assert_eq!(package.subjects, vec!["Re: Role".to_string()]);
                assert_eq!(package.follow_up, "Checking in");
            }
            other => panic!("expected email package, got {:?}", other),
        }
        assert_eq!(content.primary_text(), "Subject: Re: Role\n\nHello");
    }

    #[test]
    fn test_normalize_json_inside_string() {
        let raw = json!({ "content": "```json\n{\"comments\": [\"Nice\", \"Agreed\",]}\n```" });
        let content = normalize_response(raw);
        assert!(matches!(content, GeneratedContent::Variants { ref variants } if variants.len() == 2));
    }

    #[test]
    fn test_normalize_null_is_empty() {
        assert!(normalize_response(Value::Null).is_empty());
    }

    #[test]
    fn test_client_rejects_empty_response() {
        let client = GenerationClient::new(MockGenerator::new(json!({ "content": "   " })));
        let req = GenerationRequest::new("p", "professional", ContentType::Custom);
        let err = block_on(client.generate(&req)).unwrap_err();
        assert!(matches!(err, ComposerError::Generation(_)));
    }

    #[test]
    fn test_client_cancel_in_flight() {
        let client = GenerationClient::new(Rc::new(PendingGenerator));
        let req = GenerationRequest::new("p", "professional", ContentType::Post);

        let (result, cancelled) = block_on(async {
            futures::join!(client.generate(&req), async { client.cancel_in_flight() })
        });

        assert!(cancelled);
        assert!(result.unwrap_err().is_cancelled());
        assert!(!client.is_in_flight());
        assert!(!client.cancel_in_flight());
    }

    // ─── Flow Tests ──────────────────────────────────────────

    #[test]
    fn test_create_flow_known_and_unknown() {
        assert_eq!(create_flow("cover_letter").key(), TemplateKey::CoverLetter);
        assert_eq!(create_flow("Comment-Reply").key(), TemplateKey::CommentReply);
        assert_eq!(create_flow("something-new").key(), TemplateKey::CustomPrompt);
        assert!(spec_for(TemplateKey::CustomPrompt).is_none());
    }

    #[test]
    fn test_flow_state_reset() {
        let mut state = FlowState::default();
        state.set("topic", "Rust");
        state.advance();
        state.advance();
        assert_eq!(state.step(), 2);
        assert!(state.has("topic"));

        state.reset();
        assert_eq!(state.step(), 0);
        assert!(state.data().is_empty());
    }

    #[test]
    fn test_is_skip() {
        assert!(is_skip("skip"));
        assert!(is_skip("  SKIP "));
        assert!(!is_skip("skip it"));
    }

    #[test]
    fn test_required_steps_declared_first() {
        for key in TemplateKey::all() {
            if let Some(spec) = spec_for(*key) {
                assert!(spec.steps[0].required, "{} should open with its required input", key);
            }
        }
    }

    // ─── Panel Scenario Tests ────────────────────────────────

    #[test]
    fn test_cover_letter_scenario() {
        let generator = MockGenerator::new(json!({ "content": "Dear hiring manager," }));
        let mut h = harness(&generator);

        block_on(h.panel.select_template("cover_letter"));
        assert_eq!(h.panel.messages().len(), 1);

        block_on(h.panel.submit_user_message("Senior Rust engineer, WASM experience"));
        assert!(last_text(&h.panel).contains("highlighted"));

        block_on(h.panel.submit_user_message("skip"));
        assert!(last_text(&h.panel).contains("tone"));

        block_on(h.panel.submit_user_message("friendly"));
        assert_eq!(generator.calls(), 1);

        let req = generator.last_request();
        assert_eq!(req.tone, "friendly");
        assert_eq!(req.content_type, ContentType::CoverLetter);
        assert!(req.prompt.contains("Senior Rust engineer, WASM experience"));
        assert!(req.prompt.contains("Additional notes: \n"));

        let last = h.panel.messages().last().unwrap();
        assert_eq!(last.text, "Dear hiring manager,");
        assert!(last.render.has_actions());
        let session = h.panel.session().unwrap();
        assert_eq!(session.transcript.action_row(), Some(session.transcript.len() - 1));

        // tone is remembered for next time
        let answers = h.storage.get_json(TEMPLATE_ANSWERS_KEY).unwrap();
        assert_eq!(answers["cover_letter"]["tone"], "friendly");
    }

    #[test]
    fn test_email_regenerate_without_job_description() {
        let generator = MockGenerator::new(json!("unused"));
        let mut h = harness(&generator);

        block_on(h.panel.select_template("email"));
        block_on(h.panel.regenerate());

        assert_eq!(last_text(&h.panel), "Please provide the job description first.");
        assert_eq!(generator.calls(), 0);
    }

    #[test]
    fn test_empty_submit_is_ignored() {
        let generator = MockGenerator::new(json!("unused"));
        let mut h = harness(&generator);
        block_on(h.panel.select_template("post_content"));
        let before = h.panel.messages().len();

        assert_eq!(block_on(h.panel.submit_user_message("   \n ")), SubmitOutcome::Empty);
        assert_eq!(h.panel.messages().len(), before);
        assert_eq!(step(&h.panel), 0);
        assert_eq!(generator.calls(), 0);
    }

    #[test]
    fn test_submit_while_closed() {
        let generator = MockGenerator::new(json!("unused"));
        let mut h = harness(&generator);
        assert_eq!(block_on(h.panel.submit_user_message("hi")), SubmitOutcome::Closed);
    }

    #[test]
    fn test_required_step_does_not_advance_on_skip() {
        let generator = MockGenerator::new(json!("unused"));
        let mut h = harness(&generator);
        block_on(h.panel.select_template("rewriter"));

        block_on(h.panel.submit_user_message("skip"));
        assert_eq!(step(&h.panel), 0);
        assert!(last_text(&h.panel).starts_with("I need the text to rewrite to continue."));
    }

    #[test]
    fn test_step_is_monotonic_and_revision_keeps_step() {
        let generator = MockGenerator::new(json!("Rewritten."));
        let mut h = harness(&generator);
        block_on(h.panel.select_template("rewriter"));

        let mut seen = vec![step(&h.panel)];
        for text in ["Please fix this sentance.", "shorter", "make it warmer"] {
            block_on(h.panel.submit_user_message(text));
            seen.push(step(&h.panel));
        }
        assert!(seen.windows(2).all(|w| w[0] <= w[1]), "steps went backwards: {:?}", seen);
        assert_eq!(seen.last(), Some(&2));

        assert_eq!(generator.calls(), 2);
        assert!(generator
            .last_request()
            .prompt
            .contains("Revise the previous version as follows: make it warmer"));
    }

    #[test]
    fn test_skip_after_completion_gets_a_hint() {
        let generator = MockGenerator::new(json!("Rewritten."));
        let mut h = harness(&generator);
        block_on(h.panel.select_template("rewriter"));
        block_on(h.panel.submit_user_message("Please fix this sentance."));
        block_on(h.panel.submit_user_message("skip"));
        assert_eq!(generator.calls(), 1);

        block_on(h.panel.submit_user_message("skip"));
        assert_eq!(last_text(&h.panel), REVISION_HINT);
        assert_eq!(generator.calls(), 1);
        assert_eq!(step(&h.panel), 2);
    }

    #[test]
    fn test_remembered_answer_offered_as_quick_reply() {
        let generator = MockGenerator::new(json!("unused"));
        let mut h = harness(&generator);
        h.storage.put_json(
            TEMPLATE_ANSWERS_KEY,
            json!({ "email": { "recipient": "Hiring team" } }),
        );

        block_on(h.panel.select_template("email"));
        block_on(h.panel.submit_user_message("Backend role at Acme"));

        let last = h.panel.messages().last().unwrap();
        assert_eq!(last.render.quick_replies.len(), 1);
        assert_eq!(last.render.quick_replies[0].value, "Hiring team");
        assert!(last.render.quick_replies[0].label.starts_with("Use saved:"));

        block_on(h.panel.choose_quick_reply("Hiring team"));
        assert_eq!(step(&h.panel), 2);
    }

    #[test]
    fn test_generation_error_is_contained() {
        let mut h = harness_with(Rc::new(FailingGenerator));
        block_on(h.panel.select_template("custom_prompt"));
        h.bus.drain();

        assert_eq!(block_on(h.panel.submit_user_message("A haiku about Rust")), SubmitOutcome::Handled);

        let last = h.panel.messages().last().unwrap();
        assert_eq!(last.text, GENERATION_ERROR_MESSAGE);
        assert!(last.render.is_error);
        assert!(h.panel.session().unwrap().send_enabled());

        let events = h.bus.drain();
        assert!(events.iter().any(|e| matches!(e, PanelEvent::SendEnabled { enabled: false })));
        assert!(events.iter().any(|e| matches!(e, PanelEvent::Toast { level: ToastLevel::Error, .. })));

        // the panel stays usable
        assert_eq!(block_on(h.panel.submit_user_message("again")), SubmitOutcome::Handled);
    }

    #[test]
    fn test_cancelled_generation_renders_nothing() {
        let mut h = harness_with(Rc::new(PendingGenerator));
        block_on(h.panel.select_template("custom_prompt"));
        let client = h.panel.generator();

        let (outcome, cancelled) = block_on(async {
            futures::join!(h.panel.submit_user_message("Write a toast"), async {
                client.cancel_in_flight()
            })
        });

        assert!(cancelled);
        assert_eq!(outcome, SubmitOutcome::Handled);
        assert_eq!(last_text(&h.panel), "Write a toast");
        assert!(h.panel.session().unwrap().send_enabled());
    }

    #[test]
    fn test_custom_flow_uses_profile_tone_and_replays_on_regenerate() {
        let generator = MockGenerator::new(json!({ "text": "Done" }));
        let mut h = harness(&generator);
        h.storage.put_json(USER_PROFILE_KEY, json!({ "tone": "warm" }));

        let key = block_on(h.panel.select_template("no-such-template"));
        assert_eq!(key, TemplateKey::CustomPrompt);

        block_on(h.panel.submit_user_message("A thank-you note"));
        assert_eq!(generator.last_request().tone, "warm");

        block_on(h.panel.regenerate());
        assert_eq!(generator.calls(), 2);
        assert_eq!(generator.last_request().prompt, "A thank-you note");
    }

    #[test]
    fn test_regenerate_with_nothing_to_replay() {
        let generator = MockGenerator::new(json!("unused"));
        let mut h = harness(&generator);
        block_on(h.panel.select_template("custom_prompt"));
        block_on(h.panel.regenerate());
        assert_eq!(last_text(&h.panel), NOTHING_TO_REGENERATE);
        assert_eq!(generator.calls(), 0);
    }

    #[test]
    fn test_reset_restarts_flow() {
        let generator = MockGenerator::new(json!("Text"));
        let mut h = harness(&generator);
        block_on(h.panel.select_template("rewriter"));
        block_on(h.panel.submit_user_message("Some text"));
        block_on(h.panel.submit_user_message("skip"));
        assert!(h.panel.last_result_text().is_some());

        h.panel.reset();
        assert_eq!(h.panel.messages().len(), 1);
        assert_eq!(step(&h.panel), 0);
        assert!(h.panel.last_result_text().is_none());
    }

    #[test]
    fn test_open_close_toggle() {
        let generator = MockGenerator::new(json!("unused"));
        let mut h = harness(&generator);

        assert!(h.panel.open());
        assert!(!h.panel.open());
        assert!(h.panel.close());
        assert!(!h.panel.close());
        assert!(h.panel.toggle());
        assert!(!h.panel.toggle());

        let events = h.bus.drain();
        assert_eq!(events.iter().filter(|e| matches!(e, PanelEvent::Opened { .. })).count(), 2);
        assert_eq!(events.iter().filter(|e| matches!(e, PanelEvent::Closed)).count(), 2);
    }

    #[test]
    fn test_reconfigure_swaps_backend_and_defaults() {
        let old = MockGenerator::new(json!("old"));
        let mut h = harness(&old);

        let new = MockGenerator::new(json!("new"));
        let storage = Rc::new(MockStorage::default());
        let config = composer_types::config::GenerationConfig {
            default_tone: "formal".to_string(),
            ..Default::default()
        };
        h.panel.reconfigure(
            Rc::new(GenerationClient::new(new.clone())),
            Rc::new(Persistence::new(storage)),
            &config,
        );

        block_on(h.panel.select_template("custom_prompt"));
        block_on(h.panel.submit_user_message("A short bio"));
        assert_eq!(old.calls(), 0);
        assert_eq!(new.calls(), 1);
        assert_eq!(new.last_request().tone, "formal");
        assert_eq!(h.panel.last_result_text().as_deref(), Some("new"));
    }

    // ─── Result Action Tests ─────────────────────────────────

    fn panel_with_email_result(generator: &Rc<MockGenerator>) -> Harness {
        let mut h = harness(generator);
        block_on(h.panel.select_template("email"));
        for text in ["Platform role", "skip", "skip", "skip"] {
            block_on(h.panel.submit_user_message(text));
        }
        h
    }

    #[test]
    fn test_copy_and_insert_use_primary_text() {
        let generator = MockGenerator::new(json!({
            "subjects": ["Re: Platform role", "Quick question"],
            "body_standard": "Hello Dana"
        }));
        let h = panel_with_email_result(&generator);

        h.bus.drain();
        assert_eq!(h.panel.copy_result().as_deref(), Some("Subject: Re: Platform role\n\nHello Dana"));
        assert!(h.bus.drain().iter().any(|e| matches!(
            e,
            PanelEvent::ClipboardRequested { text } if text.starts_with("Subject: Re: Platform role")
        )));

        let editable = MockEditable::default();
        h.panel.insert_result(&editable).unwrap();
        assert_eq!(editable.get_text().unwrap(), "Subject: Re: Platform role\n\nHello Dana");
        assert!(editable.focused.get());
    }

    #[test]
    fn test_save_result_with_tag() {
        let generator = MockGenerator::new(json!("A post"));
        let h = panel_with_email_result(&generator);
        h.bus.drain();

        let prompt = TagPrompt::new();
        let item = block_on(h.panel.save_result(Some("Jobs".to_string()), &prompt)).unwrap();
        assert_eq!(item.tag, "Jobs");
        assert_eq!(item.text, "A post");

        let events = h.bus.drain();
        assert!(!events.iter().any(|e| matches!(e, PanelEvent::TagRequested)));
        assert!(events.iter().any(|e| matches!(e, PanelEvent::SavedItemsUpdated { groups } if groups.len() == 1)));
        assert!(events
            .iter()
            .any(|e| matches!(e, PanelEvent::Toast { level: ToastLevel::Success, message } if message == "Saved")));
    }

    #[test]
    fn test_save_result_prompts_for_tag() {
        let generator = MockGenerator::new(json!("A post"));
        let h = panel_with_email_result(&generator);
        let prompt = TagPrompt::new();
        let answer = prompt.clone();

        let (item, submitted) = block_on(async {
            futures::join!(h.panel.save_result(None, &prompt), async { answer.submit("  Outreach ") })
        });

        assert!(submitted);
        assert_eq!(item.unwrap().tag, "Outreach");
        let events = h.bus.drain();
        assert!(events.iter().any(|e| matches!(e, PanelEvent::TagRequested)));
        assert!(events.iter().any(|e| matches!(e, PanelEvent::TagResolved)));
    }

    #[test]
    fn test_save_failure_is_toasted() {
        let generator = MockGenerator::new(json!("A post"));
        let h = panel_with_email_result(&generator);
        h.storage.fail_writes.set(true);
        h.bus.drain();

        let saved = block_on(h.panel.save_result(Some(String::new()), &TagPrompt::new()));
        assert!(saved.is_none());
        let events = h.bus.drain();
        assert!(events
            .iter()
            .any(|e| matches!(e, PanelEvent::Toast { level: ToastLevel::Error, message } if message == "Save failed")));
        // in-memory result is untouched
        assert_eq!(h.panel.last_result_text().as_deref(), Some("A post"));
    }

    #[test]
    fn test_update_profile_persists() {
        let generator = MockGenerator::new(json!("unused"));
        let mut h = harness(&generator);
        h.panel.open();

        let profile = UserProfile {
            name: "Dana".to_string(),
            tone: "direct".to_string(),
            ..UserProfile::default()
        };
        assert!(block_on(h.panel.update_profile(profile.clone())));
        assert_eq!(h.panel.session().unwrap().profile, profile);
        assert_eq!(block_on(h.panel.load_profile()), profile);
    }

    // ─── Command Loop Tests ──────────────────────────────────

    fn send(tx: &commands::CommandSender, command: PanelCommand) {
        tx.unbounded_send(command).unwrap();
    }

    #[test]
    fn test_second_submission_rejected_while_first_in_flight() {
        let (open_gate, gate) = oneshot::channel();
        let generator = GatedGenerator::new(gate);
        let mut h = harness_with(generator.clone());
        let (tx, rx) = commands::channel();
        send(&tx, PanelCommand::SelectTemplate(TemplateKey::CustomPrompt));
        send(&tx, PanelCommand::Submit("First draft".to_string()));

        let user = async move {
            YieldOnce(false).await;
            send(&tx, PanelCommand::Submit("Second draft".to_string()));
            YieldOnce(false).await;
            open_gate.send(()).unwrap();
        };
        block_on(async { futures::join!(h.panel.run(rx), user) });

        assert_eq!(generator.prompts(), vec!["First draft".to_string()]);
        assert!(!h.panel.messages().iter().any(|m| m.text == "Second draft"));
        assert_eq!(h.panel.last_result_text().as_deref(), Some("done"));
        assert!(h.panel.session().unwrap().send_enabled());
        assert!(h.bus.drain().iter().any(|e| matches!(
            e,
            PanelEvent::Toast { message, .. } if message == STILL_WORKING_MESSAGE
        )));
    }

    #[test]
    fn test_close_while_generating_cancels_then_closes() {
        let (_open_gate, gate) = oneshot::channel::<()>();
        let generator = GatedGenerator::new(gate);
        let mut h = harness_with(generator.clone());
        let (tx, rx) = commands::channel();
        send(&tx, PanelCommand::SelectTemplate(TemplateKey::CustomPrompt));
        send(&tx, PanelCommand::Submit("Write a toast".to_string()));

        let user = async move {
            YieldOnce(false).await;
            send(&tx, PanelCommand::Toggle);
        };
        block_on(async { futures::join!(h.panel.run(rx), user) });

        assert!(!h.panel.is_open());
        let events = h.bus.drain();
        assert!(events.iter().any(|e| matches!(e, PanelEvent::Closed)));
        assert!(!events.iter().any(|e| matches!(
            e,
            PanelEvent::MessageAppended { message, .. } if message.text == GENERATION_ERROR_MESSAGE
        )));
    }

    #[test]
    fn test_tag_prompt_does_not_hold_up_other_commands() {
        let generator = MockGenerator::new(json!("Thanks!"));
        let mut h = harness(&generator);
        let prompt = TagPrompt::new();
        let (tx, rx) = commands::channel();
        send(&tx, PanelCommand::SelectTemplate(TemplateKey::CustomPrompt));
        send(&tx, PanelCommand::Submit("A thank-you note".to_string()));

        let saving = save_with_prompt(prompt.clone(), h.bus.clone(), tx.clone());
        let answer = prompt.clone();
        let user = async move {
            YieldOnce(false).await;
            send(&tx, PanelCommand::Submit("Make it shorter".to_string()));
            YieldOnce(false).await;
            assert!(answer.is_pending());
            answer.submit("notes");
        };
        block_on(async { futures::join!(h.panel.run(rx), saving, user) });

        assert_eq!(generator.calls(), 2);
        assert!(h.panel.messages().iter().any(|m| m.text == "Make it shorter"));
        let saved = h.storage.get_json(SAVED_ITEMS_KEY).unwrap();
        assert_eq!(saved[0]["tag"], json!("notes"));

        let events = h.bus.drain();
        assert!(events.iter().any(|e| matches!(e, PanelEvent::TagResolved)));
        assert!(!events.iter().any(|e| matches!(
            e,
            PanelEvent::Toast { message, .. } if message == STILL_WORKING_MESSAGE
        )));
    }

    #[test]
    fn test_toggle_command_opens_and_loads_library() {
        let generator = MockGenerator::new(json!("unused"));
        let mut h = harness(&generator);
        h.storage.put_json(USER_PROFILE_KEY, json!({ "name": "Dana" }));
        let (tx, rx) = commands::channel();
        send(&tx, PanelCommand::Toggle);
        drop(tx);

        block_on(h.panel.run(rx));
        assert!(h.panel.is_open());
        let events = h.bus.drain();
        assert!(events.iter().any(|e| matches!(e, PanelEvent::SavedItemsUpdated { .. })));
        assert!(events.iter().any(|e| matches!(
            e,
            PanelEvent::ProfileUpdated { profile } if profile.name == "Dana"
        )));
    }

    // ─── Persistence Tests ───────────────────────────────────

    #[test]
    fn test_save_evicts_oldest_past_cap() {
        let storage = Rc::new(MockStorage::default());
        let store = Persistence::new(storage);

        for i in 0..=DEFAULT_SAVED_ITEMS_CAP {
            block_on(store.save_item(&format!("item {}", i), "")).unwrap();
        }

        let items = block_on(store.saved_items()).unwrap();
        assert_eq!(items.len(), DEFAULT_SAVED_ITEMS_CAP);
        assert_eq!(items[0].text, format!("item {}", DEFAULT_SAVED_ITEMS_CAP));
        assert!(!items.iter().any(|item| item.text == "item 0"));
    }

    /// Completes on its second poll, letting other joined futures run in between
    struct YieldOnce(bool);

    impl std::future::Future for YieldOnce {
        type Output = ();

        fn poll(mut self: std::pin::Pin<&mut Self>, cx: &mut std::task::Context<'_>) -> std::task::Poll<()> {
            if self.0 {
                return std::task::Poll::Ready(());
            }
            self.0 = true;
            cx.waker().wake_by_ref();
            std::task::Poll::Pending
        }
    }

    /// Storage whose reads suspend once before answering
    #[derive(Default)]
    struct SlowReadStorage {
        inner: MockStorage,
    }

    #[async_trait(?Send)]
    impl StoragePort for SlowReadStorage {
        async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
            YieldOnce(false).await;
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, value: &[u8]) -> Result<()> {
            self.inner.set(key, value).await
        }

        async fn delete(&self, key: &str) -> Result<()> {
            self.inner.delete(key).await
        }

        async fn list_keys(&self, prefix: &str) -> Result<Vec<String>> {
            self.inner.list_keys(prefix).await
        }

        fn backend_name(&self) -> &str {
            "slow"
        }
    }

    #[test]
    fn test_concurrent_saves_are_not_lost() {
        let store = Persistence::new(Rc::new(SlowReadStorage::default()));

        let (a, b) = block_on(async {
            futures::join!(store.save_item("first", ""), store.save_item("second", ""))
        });
        a.unwrap();
        b.unwrap();

        let items = block_on(store.saved_items()).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].text, "second");
    }

    #[test]
    fn test_delete_saved_item() {
        let store = Persistence::new(Rc::new(MockStorage::default()));
        let keep = block_on(store.save_item("keep", "a")).unwrap();
        let gone = block_on(store.save_item("drop", "a")).unwrap();

        assert!(block_on(store.delete_saved_item(&gone.id)).unwrap());
        assert!(!block_on(store.delete_saved_item(&gone.id)).unwrap());
        let items = block_on(store.saved_items()).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, keep.id);
    }

    #[test]
    fn test_group_saved_items_keeps_case_distinct_tags_apart() {
        let items = vec![
            SavedItem::new("1", "work"),
            SavedItem::new("2", "Apple"),
            SavedItem::new("3", ""),
            SavedItem::new("4", "banana"),
            SavedItem::new("5", "Work"),
        ];
        let groups = group_saved_items(&items);
        let labels: Vec<&str> = groups.iter().map(|g| g.label.as_str()).collect();
        assert_eq!(labels, vec!["Apple", "banana", "Work", "work", UNTAGGED_LABEL]);
        assert_eq!(groups[2].items[0].text, "5");
        assert_eq!(groups[3].items[0].text, "1");
        assert!(groups[4].untagged);
    }

    #[test]
    fn test_unreadable_value_treated_as_absent() {
        let storage = Rc::new(MockStorage::default());
        storage.data.borrow_mut().insert(SAVED_ITEMS_KEY.to_string(), b"{oops".to_vec());
        let store = Persistence::new(storage);

        assert!(block_on(store.saved_items()).unwrap().is_empty());
        block_on(store.save_item("fresh", "")).unwrap();
        assert_eq!(block_on(store.saved_items()).unwrap().len(), 1);
    }

    #[test]
    fn test_template_answers_round_trip() {
        let store = Persistence::new(Rc::new(MockStorage::default()));
        block_on(store.set_template_answer("email", "recipient", "Ops lead")).unwrap();
        block_on(store.set_template_answer("email", "tone", "calm")).unwrap();
        block_on(store.set_template_answer("post_content", "tone", "bold")).unwrap();

        let email = block_on(store.template_answers("email"));
        assert_eq!(email.len(), 2);
        assert_eq!(block_on(store.template_answer("post_content", "tone")).as_deref(), Some("bold"));
        assert!(block_on(store.template_answer("rewriter", "style")).is_none());
    }

    // ─── Tag Prompt Tests ────────────────────────────────────

    #[test]
    fn test_tag_prompt_cancel_yields_untagged() {
        let store = Persistence::new(Rc::new(MockStorage::default()));
        let prompt = TagPrompt::new();

        let (item, _) = block_on(async {
            futures::join!(store.save_item_prompted("text", None, &prompt), async { prompt.cancel() })
        });
        let item = item.unwrap();
        assert_eq!(item.tag, "");
        assert_eq!(item.group_label(), UNTAGGED_LABEL);
        assert!(!prompt.is_pending());
    }

    #[test]
    fn test_tag_prompt_submit_without_ask() {
        let prompt = TagPrompt::new();
        assert!(!prompt.is_pending());
        assert!(!prompt.submit("nobody asked"));
    }
}
