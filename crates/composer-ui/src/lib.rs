//! egui panels for the composer. Rendering only: every user action comes
//! back as a `PanelAction` for the app to forward to the controller.

pub mod panels;
pub mod state;
pub mod theme;
