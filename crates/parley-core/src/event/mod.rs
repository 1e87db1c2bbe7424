//! Realtime fan-out of finalized messages.
//!
//! `RealtimePublisher` is the port the Turn Orchestrator publishes through;
//! `EventBus` is the in-process implementation backed by a
//! `tokio::sync::broadcast` channel.

pub mod bus;

pub use bus::{EventBus, RealtimePublisher};
