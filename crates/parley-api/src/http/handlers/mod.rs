//! HTTP request handlers for the REST API.

pub mod conversation;
pub mod events;
pub mod message;
pub mod persona;
