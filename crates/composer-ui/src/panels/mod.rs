pub mod chat;
pub mod saved;
pub mod profile;
pub mod settings;
