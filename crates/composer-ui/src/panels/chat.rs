//! Chat panel. Template picker, transcript, result actions and input.

use egui::{self, Align, Layout, RichText, ScrollArea, Vec2};
use composer_types::message::{ChatMessage, ResultAction};
use composer_types::template::TemplateKey;
use crate::state::{PanelAction, UiState};
use crate::theme::*;

/// Render the chat panel. Returns the action the user took this frame, if any.
pub fn chat_panel(ui: &mut egui::Ui, state: &mut UiState) -> Option<PanelAction> {
    let mut action = None;

    egui::Frame::default()
        .fill(BG_PRIMARY)
        .inner_margin(PANEL_PADDING)
        .show(ui, |ui| {
            ui.vertical(|ui| {
                ui.horizontal(|ui| {
                    ui.heading(RichText::new("Composer").color(TEXT_PRIMARY).strong());
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        let status_color = if state.is_busy() { WARNING } else { SUCCESS };
                        ui.label(RichText::new(&state.status_text).color(status_color).small());
                    });
                });

                ui.horizontal_wrapped(|ui| {
                    for key in TemplateKey::all() {
                        let selected = state.active_template == Some(*key);
                        if ui.selectable_label(selected, key.label()).clicked() {
                            action = Some(PanelAction::SelectTemplate(*key));
                        }
                    }
                });

                ui.separator();

                let reserved = if state.tag_prompt_open { 100.0 } else { 60.0 };
                let available_height = ui.available_height() - reserved;
                ScrollArea::vertical()
                    .max_height(available_height)
                    .auto_shrink([false, false])
                    .stick_to_bottom(true)
                    .show(ui, |ui| {
                        if state.messages.is_empty() {
                            ui.label(
                                RichText::new("Pick a template above to start.")
                                    .color(TEXT_SECONDARY)
                                    .italics(),
                            );
                        }
                        let last = state.messages.len().saturating_sub(1);
                        for (index, message) in state.messages.iter().enumerate() {
                            render_message(ui, message);
                            if index == last && state.send_enabled {
                                if let Some(a) = quick_replies(ui, message) {
                                    action = Some(a);
                                }
                            }
                            if state.action_row == Some(index) && state.send_enabled {
                                if let Some(a) = action_row(ui, message) {
                                    action = Some(a);
                                }
                            }
                            ui.add_space(4.0);
                        }
                    });

                if state.tag_prompt_open {
                    if let Some(a) = tag_prompt(ui, state) {
                        action = Some(a);
                    }
                }

                ui.add_space(8.0);

                if let Some(a) = input_row(ui, state) {
                    action = Some(a);
                }
            });
        });

    action
}

fn render_message(ui: &mut egui::Ui, message: &ChatMessage) {
    let (label, label_color, bg) = if message.is_user() {
        ("You", ACCENT, BG_USER)
    } else if message.render.is_error {
        ("Composer", ERROR, BG_ERROR)
    } else {
        ("Composer", SUCCESS, BG_SECONDARY)
    };

    egui::Frame::default()
        .fill(bg)
        .corner_radius(BUBBLE_ROUNDING)
        .inner_margin(8.0)
        .show(ui, |ui| {
            ui.label(RichText::new(label).color(label_color).strong().small());
            ui.label(RichText::new(&message.text).color(TEXT_PRIMARY));
        });
}

fn quick_replies(ui: &mut egui::Ui, message: &ChatMessage) -> Option<PanelAction> {
    let mut action = None;
    if message.render.quick_replies.is_empty() {
        return None;
    }
    ui.horizontal_wrapped(|ui| {
        for reply in &message.render.quick_replies {
            let btn = egui::Button::new(RichText::new(&reply.label).color(TEXT_PRIMARY).small())
                .fill(BG_SURFACE)
                .corner_radius(PANEL_ROUNDING);
            if ui.add(btn).on_hover_text(&reply.value).clicked() {
                action = Some(PanelAction::QuickReply(reply.value.clone()));
            }
        }
    });
    action
}

fn action_row(ui: &mut egui::Ui, message: &ChatMessage) -> Option<PanelAction> {
    let mut action = None;
    ui.horizontal(|ui| {
        for result_action in &message.render.actions {
            if ui.small_button(result_action.label()).clicked() {
                action = Some(match result_action {
                    ResultAction::Copy => PanelAction::Copy,
                    ResultAction::Insert => PanelAction::Insert,
                    ResultAction::Save => PanelAction::Save,
                    ResultAction::Regenerate => PanelAction::Regenerate,
                    ResultAction::New => PanelAction::New,
                });
            }
        }
    });
    action
}

fn tag_prompt(ui: &mut egui::Ui, state: &mut UiState) -> Option<PanelAction> {
    let mut action = None;
    egui::Frame::default()
        .fill(BG_SURFACE)
        .corner_radius(PANEL_ROUNDING)
        .inner_margin(6.0)
        .show(ui, |ui| {
            ui.horizontal(|ui| {
                ui.label(RichText::new("Tag").color(TEXT_SECONDARY).small());
                let response = ui.add(
                    egui::TextEdit::singleline(&mut state.tag_input)
                        .hint_text("e.g. outreach (optional)")
                        .desired_width(ui.available_width() - 120.0),
                );
                let entered = response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
                if ui.button("Save").clicked() || entered {
                    action = Some(PanelAction::SubmitTag(state.tag_input.trim().to_string()));
                }
                if ui.button("Skip").clicked() {
                    action = Some(PanelAction::CancelTag);
                }
            });
        });
    action
}

fn input_row(ui: &mut egui::Ui, state: &mut UiState) -> Option<PanelAction> {
    let mut action = None;
    ui.horizontal(|ui| {
        let hint = if state.active_template.is_some() {
            "Type your answer..."
        } else {
            "Pick a template first"
        };
        let input = egui::TextEdit::multiline(&mut state.input_text)
            .hint_text(hint)
            .desired_rows(1)
            .desired_width(ui.available_width() - 70.0)
            .font(egui::FontId::proportional(14.0));
        let response = ui.add(input);

        let send_enabled = state.can_send();
        let send_btn = ui.add_enabled(
            send_enabled,
            egui::Button::new(RichText::new("Send").color(TEXT_PRIMARY))
                .fill(if send_enabled { ACCENT } else { BG_SURFACE })
                .corner_radius(PANEL_ROUNDING)
                .min_size(Vec2::new(60.0, 0.0)),
        );

        // Enter sends, Shift+Enter keeps the newline
        let enter = response.has_focus()
            && ui.input(|i| i.key_pressed(egui::Key::Enter) && !i.modifiers.shift);
        if (enter && send_enabled) || send_btn.clicked() {
            let text = state.input_text.trim().to_string();
            state.input_text.clear();
            action = Some(PanelAction::Submit(text));
            response.request_focus();
        }
    });
    action
}
