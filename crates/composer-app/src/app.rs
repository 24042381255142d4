//! Main egui application. Composes the panels and feeds the controller loop.

use std::cell::RefCell;
use std::rc::Rc;

use egui::{self, Align2, CentralPanel, RichText, TopBottomPanel};

use composer_core::commands::{self, save_with_prompt, CommandSender, PanelCommand};
use composer_core::event_bus::EventBus;
use composer_core::generation::GenerationClient;
use composer_core::panel::PanelController;
use composer_core::persistence::Persistence;
use composer_core::ports::StoragePort;
use composer_core::tag_prompt::TagPrompt;
use composer_platform::{backend_from_config, open_storage, DomEditable, DEFAULT_TARGET_SELECTOR};
use composer_types::config::{ComposerConfig, StorageBackendType};
use composer_types::event::ToastLevel;
use composer_ui::panels::{chat, profile, saved, settings};
use composer_ui::panels::settings::{SaveFeedback, SettingsAction};
use composer_ui::state::{PanelAction, UiState, View};
use composer_ui::theme;

const CONFIG_STORAGE_KEY: &str = "composer:config";

/// Storage and config, ready once the async start-up finishes
struct Boot {
    /// Where the config itself lives; always the persistent backend if any
    config_storage: Rc<dyn StoragePort>,
    data_storage: Rc<dyn StoragePort>,
    config: ComposerConfig,
}

/// How long to keep repainting after a command, waiting for its events
const REPLY_REPAINT_SECS: f64 = 2.0;

/// Everything that exists after start-up
struct Wiring {
    config_storage: Rc<dyn StoragePort>,
    data_storage: Rc<dyn StoragePort>,
    /// Input of the task that owns the controller
    commands: CommandSender,
}

/// The main application state
pub struct ComposerApp {
    ui_state: UiState,
    config: ComposerConfig,
    events: EventBus,
    tag_prompt: TagPrompt,
    boot: Rc<RefCell<Option<Boot>>>,
    wiring: Option<Wiring>,
    save_feedback: Option<SaveFeedback>,
    /// A command went out and its deadline is not set yet
    command_sent: bool,
    /// Keep repainting until this time so replies show up
    repaint_until: f64,
    first_frame: bool,
}

impl ComposerApp {
    pub fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        let boot = Rc::new(RefCell::new(None));
        Self::start_boot(boot.clone());

        Self {
            ui_state: UiState::new(),
            config: ComposerConfig::default(),
            events: EventBus::new(),
            tag_prompt: TagPrompt::new(),
            boot,
            wiring: None,
            save_feedback: None,
            command_sent: false,
            repaint_until: 0.0,
            first_frame: true,
        }
    }

    /// Open storage and restore the saved config (async)
    fn start_boot(slot: Rc<RefCell<Option<Boot>>>) {
        wasm_bindgen_futures::spawn_local(async move {
            let config_storage = open_storage(&ComposerConfig::default().storage).await;

            let config = match config_storage.get(CONFIG_STORAGE_KEY).await {
                Ok(Some(data)) => match serde_json::from_slice::<ComposerConfig>(&data) {
                    Ok(config) => {
                        log::info!("Config restored from storage");
                        config
                    }
                    Err(e) => {
                        log::warn!("Stored config unreadable, using defaults: {}", e);
                        ComposerConfig::default()
                    }
                },
                Ok(None) => ComposerConfig::default(),
                Err(e) => {
                    log::warn!("Could not read config: {}", e);
                    ComposerConfig::default()
                }
            };

            let data_storage = if config.storage.backend == StorageBackendType::Memory {
                open_storage(&config.storage).await
            } else {
                config_storage.clone()
            };

            *slot.borrow_mut() = Some(Boot {
                config_storage,
                data_storage,
                config,
            });
        });
    }

    fn finish_boot(&mut self, ctx: &egui::Context) {
        let Some(boot) = self.boot.borrow_mut().take() else {
            return;
        };
        self.config = boot.config;

        let generator = Rc::new(GenerationClient::new(backend_from_config(&self.config)));
        let store = Rc::new(Persistence::with_cap(
            boot.data_storage.clone(),
            self.config.generation.saved_items_cap,
        ));
        let panel = PanelController::new(generator.clone(), store, self.events.clone())
            .with_generation_config(&self.config.generation);

        log::info!(
            "Composer ready (generation: {}, storage: {})",
            generator.backend_name(),
            boot.data_storage.backend_name()
        );

        let (tx, rx) = commands::channel();
        wasm_bindgen_futures::spawn_local(async move {
            let mut panel = panel;
            panel.run(rx).await;
        });
        self.wiring = Some(Wiring {
            config_storage: boot.config_storage,
            data_storage: boot.data_storage,
            commands: tx,
        });
        self.send(PanelCommand::RefreshLibrary);
        ctx.request_repaint();
    }

    /// Save config to storage (async, fire-and-forget)
    fn save_config(storage: Rc<dyn StoragePort>, config: &ComposerConfig, events: EventBus) {
        let json = match serde_json::to_vec(config) {
            Ok(json) => json,
            Err(e) => {
                log::error!("Config not serializable: {}", e);
                return;
            }
        };
        wasm_bindgen_futures::spawn_local(async move {
            match storage.set(CONFIG_STORAGE_KEY, &json).await {
                Ok(()) => log::info!("Config saved to storage"),
                Err(e) => {
                    log::error!("Config save failed: {}", e);
                    events.toast(ToastLevel::Error, "Settings could not be saved");
                }
            }
        });
    }
}

impl eframe::App for ComposerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.first_frame {
            theme::apply_theme(ctx);
            self.first_frame = false;
        }

        if self.wiring.is_none() {
            self.finish_boot(ctx);
        }
        let now = ctx.input(|i| i.time);
        if self.command_sent {
            self.command_sent = false;
            self.repaint_until = now + REPLY_REPAINT_SECS;
        }

        // Drain events from the panel controller
        let events = self.events.drain();
        if !events.is_empty() {
            self.ui_state.process_events(events);
            ctx.request_repaint();
        }
        if let Some(text) = self.ui_state.take_clipboard() {
            ctx.copy_text(text);
        }
        self.ui_state.expire_toasts(now);
        if self.ui_state.is_busy()
            || !self.ui_state.toasts.is_empty()
            || self.wiring.is_none()
            || now < self.repaint_until
        {
            ctx.request_repaint();
        }

        let mut actions = Vec::new();

        // ── Top bar ──────────────────────────────────────────
        TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(RichText::new("Composer").strong().color(theme::ACCENT).size(16.0));
                ui.separator();
                for view in View::all() {
                    if ui.selectable_label(self.ui_state.view == *view, view.label()).clicked() {
                        self.ui_state.view = *view;
                        if *view == View::Saved {
                            actions.push(PanelAction::RefreshSaved);
                        }
                    }
                }
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let label = if self.ui_state.panel_open { "Close" } else { "Open" };
                    if ui.button(label).clicked() {
                        actions.push(PanelAction::Toggle);
                    }
                });
            });
        });

        // ── Main content ─────────────────────────────────────
        CentralPanel::default().show(ctx, |ui| {
            if self.wiring.is_none() {
                ui.centered_and_justified(|ui| ui.spinner());
                return;
            }
            match self.ui_state.view {
                View::Chat if !self.ui_state.panel_open => {
                    ui.vertical_centered(|ui| {
                        ui.add_space(40.0);
                        ui.label(RichText::new("The composer is closed.").color(theme::TEXT_SECONDARY));
                        if ui.button("Open composer").clicked() {
                            actions.push(PanelAction::Toggle);
                        }
                    });
                }
                View::Chat => actions.extend(chat::chat_panel(ui, &mut self.ui_state)),
                View::Saved => actions.extend(saved::saved_panel(ui, &self.ui_state)),
                View::Profile => actions.extend(profile::profile_panel(ui, &mut self.ui_state)),
                View::Settings => {
                    match settings::settings_panel(ui, &mut self.config, self.save_feedback.as_ref()) {
                        SettingsAction::SaveClicked => self.save_settings(),
                        SettingsAction::Changed => self.save_feedback = None,
                        SettingsAction::None => {}
                    }
                }
            }
        });

        self.show_toasts(ctx);

        for action in actions {
            self.dispatch(action, ctx);
        }
    }
}

impl ComposerApp {
    fn save_settings(&mut self) {
        let Some(wiring) = &self.wiring else {
            return;
        };
        Self::save_config(wiring.config_storage.clone(), &self.config, self.events.clone());

        let generator = Rc::new(GenerationClient::new(backend_from_config(&self.config)));
        let store = Rc::new(Persistence::with_cap(
            wiring.data_storage.clone(),
            self.config.generation.saved_items_cap,
        ));
        self.send(PanelCommand::Reconfigure {
            generator,
            store,
            config: self.config.generation.clone(),
        });
        self.save_feedback = Some(SaveFeedback {
            message: "Saved".to_string(),
            success: true,
        });
    }

    /// Queue a command for the controller loop.
    fn send(&mut self, command: PanelCommand) {
        let Some(wiring) = &self.wiring else {
            return;
        };
        let name = command.name();
        if wiring.commands.unbounded_send(command).is_err() {
            log::warn!("{} not sent: panel command loop is gone", name);
            self.events.toast(ToastLevel::Error, "The composer stopped responding");
        }
        self.command_sent = true;
    }

    fn show_toasts(&self, ctx: &egui::Context) {
        if self.ui_state.toasts.is_empty() {
            return;
        }
        egui::Area::new(egui::Id::new("toasts"))
            .anchor(Align2::RIGHT_BOTTOM, [-16.0, -16.0])
            .show(ctx, |ui| {
                for toast in &self.ui_state.toasts {
                    egui::Frame::default()
                        .fill(theme::BG_SURFACE)
                        .corner_radius(theme::PANEL_ROUNDING)
                        .inner_margin(8.0)
                        .show(ui, |ui| {
                            ui.label(RichText::new(&toast.message).color(theme::toast_color(toast.level)));
                        });
                }
            });
    }

    /// Route a UI action to the controller loop. Clipboard and tag-prompt
    /// actions are handled here.
    fn dispatch(&mut self, action: PanelAction, ctx: &egui::Context) {
        let Some(wiring) = &self.wiring else {
            return;
        };

        let command = match action {
            PanelAction::Toggle => {
                if self.ui_state.panel_open {
                    self.tag_prompt.cancel();
                }
                PanelCommand::Toggle
            }
            PanelAction::SelectTemplate(key) => PanelCommand::SelectTemplate(key),
            PanelAction::Submit(text) => PanelCommand::Submit(text),
            PanelAction::QuickReply(value) => PanelCommand::QuickReply(value),
            PanelAction::Regenerate => PanelCommand::Regenerate,
            PanelAction::New => PanelCommand::Reset,
            PanelAction::Copy => PanelCommand::Copy,
            PanelAction::CopySaved(text) => {
                ctx.copy_text(text);
                self.events.toast(ToastLevel::Success, "Copied");
                return;
            }
            PanelAction::Insert => match DomEditable::find(DEFAULT_TARGET_SELECTOR) {
                Ok(target) => PanelCommand::Insert(Rc::new(target)),
                Err(e) => {
                    log::warn!("No insert target: {}", e);
                    self.events.toast(ToastLevel::Error, "No text box to insert into");
                    return;
                }
            },
            PanelAction::Save => {
                if self.tag_prompt.is_pending() {
                    log::debug!("Save ignored: a tag is already being asked for");
                    return;
                }
                wasm_bindgen_futures::spawn_local(save_with_prompt(
                    self.tag_prompt.clone(),
                    self.events.clone(),
                    wiring.commands.clone(),
                ));
                return;
            }
            PanelAction::SubmitTag(tag) => {
                // The save it releases reaches the loop on its own
                self.tag_prompt.submit(tag);
                self.command_sent = true;
                return;
            }
            PanelAction::CancelTag => {
                self.tag_prompt.cancel();
                return;
            }
            PanelAction::RefreshSaved => PanelCommand::RefreshLibrary,
            PanelAction::DeleteSaved(id) => PanelCommand::DeleteSaved(id),
            PanelAction::SaveProfile(profile) => PanelCommand::UpdateProfile(profile),
        };
        self.send(command);
    }
}
