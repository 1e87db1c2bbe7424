//! Infrastructure implementations for Parley.
//!
//! Implements the repository traits from `parley-core` on SQLite, provides
//! the OpenAI-compatible generation backend, bearer token helpers, and the
//! `config.toml` loader.

pub mod config;
pub mod crypto;
pub mod generation;
pub mod sqlite;
