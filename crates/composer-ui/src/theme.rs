//! Composer palette and egui style.

use egui::{Color32, CornerRadius, Stroke, Vec2};
use composer_types::event::ToastLevel;

// Slate backgrounds, teal accent
pub const BG_PRIMARY: Color32 = Color32::from_rgb(17, 22, 29);
pub const BG_SECONDARY: Color32 = Color32::from_rgb(28, 35, 45);
pub const BG_SURFACE: Color32 = Color32::from_rgb(41, 50, 63);
/// User bubbles
pub const BG_USER: Color32 = Color32::from_rgb(22, 63, 70);
/// Error bubbles
pub const BG_ERROR: Color32 = Color32::from_rgb(66, 27, 31);
pub const TEXT_PRIMARY: Color32 = Color32::from_rgb(226, 232, 240);
pub const TEXT_SECONDARY: Color32 = Color32::from_rgb(148, 163, 184);
pub const ACCENT: Color32 = Color32::from_rgb(45, 180, 170);
pub const SUCCESS: Color32 = Color32::from_rgb(74, 200, 120);
pub const ERROR: Color32 = Color32::from_rgb(244, 96, 96);
pub const WARNING: Color32 = Color32::from_rgb(240, 180, 60);

pub const PANEL_ROUNDING: CornerRadius = CornerRadius::same(8);
pub const BUBBLE_ROUNDING: CornerRadius = CornerRadius::same(12);
pub const PANEL_PADDING: Vec2 = Vec2::new(14.0, 10.0);

pub fn toast_color(level: ToastLevel) -> Color32 {
    match level {
        ToastLevel::Info => ACCENT,
        ToastLevel::Success => SUCCESS,
        ToastLevel::Error => ERROR,
    }
}

/// Install the composer look on an egui context. Called once, on the first frame.
pub fn apply_theme(ctx: &egui::Context) {
    let mut style = (*ctx.style()).clone();
    let visuals = &mut style.visuals;

    visuals.dark_mode = true;
    visuals.panel_fill = BG_PRIMARY;
    visuals.window_fill = BG_SECONDARY;
    visuals.extreme_bg_color = BG_SECONDARY;
    visuals.window_corner_radius = PANEL_ROUNDING;
    visuals.hyperlink_color = ACCENT;

    let widgets = &mut visuals.widgets;
    widgets.noninteractive.fg_stroke = Stroke::new(1.0, TEXT_PRIMARY);
    for (state, fill, text) in [
        (&mut widgets.inactive, BG_SURFACE, TEXT_SECONDARY),
        (&mut widgets.hovered, BG_SURFACE, TEXT_PRIMARY),
        (&mut widgets.active, ACCENT, TEXT_PRIMARY),
    ] {
        state.bg_fill = fill;
        state.weak_bg_fill = fill;
        state.fg_stroke = Stroke::new(1.0, text);
        state.corner_radius = PANEL_ROUNDING;
    }

    visuals.selection.bg_fill = ACCENT.linear_multiply(0.35);
    visuals.selection.stroke = Stroke::new(1.0, ACCENT);

    style.spacing.item_spacing = Vec2::new(8.0, 8.0);
    style.spacing.button_padding = Vec2::new(10.0, 4.0);

    ctx.set_style(style);
}
