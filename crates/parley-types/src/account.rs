//! Account types.
//!
//! An account is the message-sender identity. Humans register one; every
//! persona gets exactly one "shadow" account at provisioning time so that
//! humans and personas share a single reference shape in conversations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use crate::id::AccountId;

/// A human account or a persona's shadow identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    /// Unique login-style handle.
    pub handle: String,
    /// Name shown in conversation lists.
    pub display_name: String,
    /// Avatar reference (storage key or URL), managed outside this engine.
    pub avatar_ref: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Create a new account with a fresh id.
    pub fn new(handle: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: AccountId::new(),
            handle: handle.into(),
            display_name: display_name.into(),
            avatar_ref: None,
            created_at: Utc::now(),
        }
    }
}

/// Derive a handle from a display name ("March 7th" -> "march_7th").
///
/// Only used to name new shadow accounts; lookups never go through handles.
pub fn handle_from_name(name: &str) -> String {
    let mut handle = String::with_capacity(name.len());
    let mut last_underscore = true;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            handle.push(c.to_ascii_lowercase());
            last_underscore = false;
        } else if !last_underscore {
            handle.push('_');
            last_underscore = true;
        }
    }
    handle.trim_end_matches('_').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_from_name() {
        assert_eq!(handle_from_name("Itsuki Nakano"), "itsuki_nakano");
        assert_eq!(handle_from_name("  March 7th!! "), "march_7th");
        assert_eq!(handle_from_name("Hatsune---Miku"), "hatsune_miku");
    }

    #[test]
    fn test_handle_from_name_without_alphanumerics() {
        assert_eq!(handle_from_name("!!!"), "");
    }
}
