//! Settings panel. Generation routing, LLM provider and storage backend.

use egui::{self, RichText, Vec2};
use composer_types::config::{ComposerConfig, LlmProvider, StorageBackendType};
use crate::theme::*;

/// What the caller should do after rendering the settings panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsAction {
    /// Nothing changed
    None,
    /// A field was changed; not yet persisted
    Changed,
    /// The user clicked the explicit Save button
    SaveClicked,
}

/// Save feedback passed in from the app layer
#[derive(Clone)]
pub struct SaveFeedback {
    pub message: String,
    pub success: bool,
}

/// Render the settings panel. Returns an action for the caller to handle.
pub fn settings_panel(
    ui: &mut egui::Ui,
    config: &mut ComposerConfig,
    save_feedback: Option<&SaveFeedback>,
) -> SettingsAction {
    let mut changed = false;
    let mut save_clicked = false;

    egui::Frame::default()
        .fill(BG_SECONDARY)
        .inner_margin(PANEL_PADDING)
        .corner_radius(PANEL_ROUNDING)
        .show(ui, |ui| {
            ui.heading(RichText::new("Settings").color(TEXT_PRIMARY));
            ui.separator();

            egui::ScrollArea::vertical().auto_shrink([false, true]).show(ui, |ui| {
                changed |= generation_section(ui, config);
                section_break(ui);
                changed |= llm_section(ui, config);
                section_break(ui);
                changed |= storage_section(ui, config);
            });

            ui.add_space(16.0);
            ui.separator();
            ui.add_space(8.0);

            ui.horizontal(|ui| {
                let btn = ui.add(
                    egui::Button::new(RichText::new("Save Settings").color(TEXT_PRIMARY).strong())
                        .fill(ACCENT)
                        .corner_radius(PANEL_ROUNDING)
                        .min_size(Vec2::new(120.0, 28.0)),
                );
                if btn.clicked() {
                    save_clicked = true;
                }

                if let Some(fb) = save_feedback {
                    let color = if fb.success { SUCCESS } else { ERROR };
                    ui.label(RichText::new(&fb.message).color(color).small());
                }
            });
        });

    if save_clicked {
        SettingsAction::SaveClicked
    } else if changed {
        SettingsAction::Changed
    } else {
        SettingsAction::None
    }
}

fn generation_section(ui: &mut egui::Ui, config: &mut ComposerConfig) -> bool {
    let mut changed = false;
    let generation = &mut config.generation;

    ui.label(RichText::new("Generation").color(ACCENT).strong());
    ui.add_space(2.0);

    field_label(ui, "Endpoint URL (optional)");
    let mut endpoint = generation.endpoint_url.clone().unwrap_or_default();
    if ui
        .add(egui::TextEdit::singleline(&mut endpoint).hint_text("https://… (leave empty to use the LLM below)"))
        .changed()
    {
        generation.endpoint_url = optional(endpoint);
        changed = true;
    }

    field_label(ui, "Timeout (seconds)");
    let mut seconds = generation.timeout_ms / 1000;
    if ui.add(egui::Slider::new(&mut seconds, 5..=300)).changed() {
        generation.timeout_ms = seconds * 1000;
        changed = true;
    }

    field_label(ui, "Default tone");
    changed |= ui.text_edit_singleline(&mut generation.default_tone).changed();

    field_label(ui, "Default length");
    changed |= ui.text_edit_singleline(&mut generation.default_length).changed();

    field_label(ui, "Saved items kept");
    changed |= ui
        .add(egui::Slider::new(&mut generation.saved_items_cap, 1..=200))
        .changed();

    changed
}

fn llm_section(ui: &mut egui::Ui, config: &mut ComposerConfig) -> bool {
    let mut changed = false;
    let llm = &mut config.llm;

    ui.label(RichText::new("LLM").color(ACCENT).strong());
    if config.generation.uses_endpoint() {
        ui.label(
            RichText::new("Not used while an endpoint URL is set.")
                .color(TEXT_SECONDARY)
                .small()
                .italics(),
        );
    }
    ui.add_space(2.0);

    field_label(ui, "Provider");
    egui::ComboBox::from_id_salt("llm_provider")
        .selected_text(llm.provider.label())
        .show_ui(ui, |ui| {
            for p in LlmProvider::all() {
                changed |= ui.selectable_value(&mut llm.provider, p.clone(), p.label()).changed();
            }
        });

    field_label(ui, "Model");
    changed |= ui.text_edit_singleline(&mut llm.model).changed();

    field_label(ui, "API Key");
    changed |= ui
        .add(egui::TextEdit::singleline(&mut llm.api_key).password(true).hint_text("sk-..."))
        .changed();

    field_label(ui, "API Base URL (optional)");
    let mut base_url = llm.api_base.clone().unwrap_or_default();
    if ui
        .add(egui::TextEdit::singleline(&mut base_url).hint_text(llm.provider.default_base_url()))
        .changed()
    {
        llm.api_base = optional(base_url);
        changed = true;
    }

    field_label(ui, "Temperature");
    changed |= ui.add(egui::Slider::new(&mut llm.temperature, 0.0..=2.0)).changed();

    field_label(ui, "Max Tokens");
    changed |= ui.add(egui::Slider::new(&mut llm.max_tokens, 256..=8192)).changed();

    changed
}

fn storage_section(ui: &mut egui::Ui, config: &mut ComposerConfig) -> bool {
    let mut changed = false;

    ui.label(RichText::new("Storage").color(ACCENT).strong());
    ui.add_space(2.0);

    field_label(ui, "Backend");
    egui::ComboBox::from_id_salt("storage_backend")
        .selected_text(storage_label(&config.storage.backend))
        .show_ui(ui, |ui| {
            for backend in [StorageBackendType::Auto, StorageBackendType::Memory, StorageBackendType::IndexedDb] {
                let label = storage_label(&backend);
                changed |= ui.selectable_value(&mut config.storage.backend, backend, label).changed();
            }
        });

    ui.add_space(4.0);
    ui.label(
        RichText::new(storage_description(&config.storage.backend))
            .color(TEXT_SECONDARY)
            .small()
            .italics(),
    );
    changed
}

fn field_label(ui: &mut egui::Ui, text: &str) {
    ui.add_space(4.0);
    ui.label(RichText::new(text).color(TEXT_SECONDARY).small());
}

fn section_break(ui: &mut egui::Ui) {
    ui.add_space(12.0);
    ui.separator();
    ui.add_space(4.0);
}

/// Empty or whitespace becomes `None`.
pub(crate) fn optional(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

pub(crate) fn storage_label(backend: &StorageBackendType) -> &'static str {
    match backend {
        StorageBackendType::Auto => "Auto-detect",
        StorageBackendType::Memory => "Memory",
        StorageBackendType::IndexedDb => "IndexedDB",
    }
}

fn storage_description(backend: &StorageBackendType) -> &'static str {
    match backend {
        StorageBackendType::Auto => "Uses IndexedDB when the browser allows it, memory otherwise.",
        StorageBackendType::Memory => "Saved items and remembered answers are lost on reload.",
        StorageBackendType::IndexedDb => "Saved items, answers and profile survive reloads. Applies after a reload.",
    }
}
