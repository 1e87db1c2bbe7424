//! Shared domain types for Parley.
//!
//! This crate contains the core domain types used across the Parley chat
//! engine: accounts, personas, participant references, conversations,
//! messages, generation requests, turn events, configuration, and the error
//! taxonomy.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod account;
pub mod config;
pub mod conversation;
pub mod error;
pub mod event;
pub mod generation;
pub mod id;
pub mod message;
pub mod participant;
pub mod persona;
