pub mod message;
pub mod event;
pub mod template;
pub mod generation;
pub mod store;
pub mod config;
pub mod error;


pub use error::ComposerError;
pub type Result<T> = std::result::Result<T, ComposerError>;
