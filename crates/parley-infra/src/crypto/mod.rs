//! Bearer token generation and hashing.

pub mod token;
