//! Conversation and turn-orchestration logic for Parley.
//!
//! This crate defines the "ports" (repository, generation backend and
//! realtime publisher traits) that the infrastructure layer implements, plus
//! the services built on them. It depends only on `parley-types` -- never on
//! `parley-infra` or any database/IO crate.

pub mod conversation;
pub mod event;
pub mod generation;
pub mod identity;
pub mod message;
pub mod persona;
pub mod repository;
pub mod turn;

#[cfg(test)]
pub(crate) mod testing;
