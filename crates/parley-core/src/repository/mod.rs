//! Repository trait definitions (ports).
//!
//! These traits define the storage interface that the infrastructure layer
//! (parley-infra) implements. The core crate never depends on any specific
//! storage technology.

pub mod account;
pub mod conversation;
pub mod message;
pub mod persona;

pub use account::AccountRepository;
pub use conversation::ConversationRepository;
pub use message::MessageRepository;
pub use persona::PersonaRepository;
