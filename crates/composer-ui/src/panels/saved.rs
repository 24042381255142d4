//! Saved items, grouped by tag.

use egui::{self, RichText, ScrollArea};
use composer_types::store::SavedItem;
use crate::state::{PanelAction, UiState};
use crate::theme::*;

/// Characters of an item shown before it is collapsed
const PREVIEW_CHARS: usize = 160;

pub fn saved_panel(ui: &mut egui::Ui, state: &UiState) -> Option<PanelAction> {
    let mut action = None;

    egui::Frame::default()
        .fill(BG_PRIMARY)
        .inner_margin(PANEL_PADDING)
        .show(ui, |ui| {
            ui.horizontal(|ui| {
                ui.heading(RichText::new("Saved").color(TEXT_PRIMARY).strong());
                ui.label(
                    RichText::new(format!("{} items", state.saved_count()))
                        .color(TEXT_SECONDARY)
                        .small(),
                );
                if ui.small_button("Refresh").clicked() {
                    action = Some(PanelAction::RefreshSaved);
                }
            });
            ui.separator();

            if state.saved_groups.is_empty() {
                ui.label(
                    RichText::new("Nothing saved yet. Use Save on a result to keep it here.")
                        .color(TEXT_SECONDARY)
                        .italics(),
                );
                return;
            }

            ScrollArea::vertical().auto_shrink([false, false]).show(ui, |ui| {
                for group in &state.saved_groups {
                    let title = format!("{} ({})", group.label, group.items.len());
                    egui::CollapsingHeader::new(RichText::new(title).color(ACCENT).strong())
                        .id_salt(("saved_group", group.label.as_str()))
                        .default_open(true)
                        .show(ui, |ui| {
                            for item in &group.items {
                                if let Some(a) = saved_item(ui, item) {
                                    action = Some(a);
                                }
                            }
                        });
                }
            });
        });

    action
}

fn saved_item(ui: &mut egui::Ui, item: &SavedItem) -> Option<PanelAction> {
    let mut action = None;
    egui::Frame::default()
        .fill(BG_SECONDARY)
        .corner_radius(PANEL_ROUNDING)
        .inner_margin(8.0)
        .show(ui, |ui| {
            ui.label(RichText::new(preview(&item.text)).color(TEXT_PRIMARY));
            ui.horizontal(|ui| {
                ui.label(RichText::new(short_date(&item.created_at)).color(TEXT_SECONDARY).small());
                if ui.small_button("Copy").clicked() {
                    action = Some(PanelAction::CopySaved(item.text.clone()));
                }
                if ui.small_button("Delete").clicked() {
                    action = Some(PanelAction::DeleteSaved(item.id.clone()));
                }
            });
        });
    ui.add_space(4.0);
    action
}

pub(crate) fn preview(text: &str) -> String {
    if text.chars().count() <= PREVIEW_CHARS {
        return text.to_string();
    }
    let cut: String = text.chars().take(PREVIEW_CHARS).collect();
    format!("{}…", cut.trim_end())
}

/// `2026-03-01T10:22:05+00:00` → `2026-03-01`
pub(crate) fn short_date(created_at: &str) -> &str {
    created_at.split('T').next().unwrap_or(created_at)
}
