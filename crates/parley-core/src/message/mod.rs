//! Message history: append, listing, context windows, sender-only delete.

pub mod store;

pub use store::MessageStore;
