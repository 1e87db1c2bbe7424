//! Persona catalog and system prompt composition.

pub mod catalog;
pub mod prompt;

pub use catalog::PersonaCatalog;
pub use prompt::compose_system_prompt;
