//! Core of the composer panel: ports, flows, generation and persistence.
//!
//! Nothing here touches the browser. `composer-platform` supplies the port
//! implementations and `composer-ui` renders the events this crate emits.

pub mod ports;
pub mod event_bus;
pub mod lenient;
pub mod generation;
pub mod persistence;
pub mod tag_prompt;
pub mod session;
pub mod flows;
pub mod panel;
pub mod commands;

#[cfg(test)]
mod tests;
