//! Generation backend port.
//!
//! The Turn Orchestrator depends only on this trait; the HTTP adapter lives
//! in parley-infra.

pub mod backend;

pub use backend::GenerationBackend;
