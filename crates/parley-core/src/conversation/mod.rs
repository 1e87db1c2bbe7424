//! Conversation lifecycle: find-or-create, groups, access-checked reads.

pub mod store;

pub use store::ConversationStore;
