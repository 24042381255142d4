//! Profile editor. The profile fills in background, tone and signature
//! that flows fall back on when the user skips a question.

use egui::{self, RichText, Vec2};
use crate::state::{PanelAction, UiState};
use crate::theme::*;

pub fn profile_panel(ui: &mut egui::Ui, state: &mut UiState) -> Option<PanelAction> {
    let mut action = None;

    egui::Frame::default()
        .fill(BG_SECONDARY)
        .inner_margin(PANEL_PADDING)
        .corner_radius(PANEL_ROUNDING)
        .show(ui, |ui| {
            ui.heading(RichText::new("Profile").color(TEXT_PRIMARY));
            ui.separator();

            egui::ScrollArea::vertical().auto_shrink([false, true]).show(ui, |ui| {
                let profile = &mut state.profile_draft;
                single(ui, "Name", &mut profile.name, "Dana Smith");
                single(ui, "Title", &mut profile.title, "Backend engineer");
                multi(ui, "Skills", &mut profile.skills);
                multi(ui, "Experience", &mut profile.experience);
                multi(ui, "Projects", &mut profile.projects);
                single(ui, "Preferred tone", &mut profile.tone, "professional");
                single(ui, "Preferred length", &mut profile.length, "medium");
                single(ui, "Language", &mut profile.language, "English");
                multi(ui, "Signature", &mut profile.signature);
            });

            ui.add_space(8.0);
            let btn = ui.add(
                egui::Button::new(RichText::new("Save Profile").color(TEXT_PRIMARY).strong())
                    .fill(ACCENT)
                    .corner_radius(PANEL_ROUNDING)
                    .min_size(Vec2::new(120.0, 28.0)),
            );
            if btn.clicked() {
                action = Some(PanelAction::SaveProfile(state.profile_draft.clone()));
            }
        });

    action
}

fn single(ui: &mut egui::Ui, label: &str, value: &mut String, hint: &str) {
    ui.label(RichText::new(label).color(TEXT_SECONDARY).small());
    ui.add(egui::TextEdit::singleline(value).hint_text(hint));
    ui.add_space(4.0);
}

fn multi(ui: &mut egui::Ui, label: &str, value: &mut String) {
    ui.label(RichText::new(label).color(TEXT_SECONDARY).small());
    ui.add(egui::TextEdit::multiline(value).desired_rows(2));
    ui.add_space(4.0);
}
