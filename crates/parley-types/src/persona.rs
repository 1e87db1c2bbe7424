//! Persona profile types.
//!
//! A persona is an AI character's authored profile. It never sends messages
//! itself: its shadow account does, and the Identity Bridge maps between the
//! two.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

pub use crate::id::PersonaId;
use crate::account::AccountId;

/// How a persona phrases its replies.
///
/// Maps to the CHECK constraint in the SQLite schema:
/// `CHECK (response_style IN ('formal', 'casual', 'energetic', 'calm', 'humorous', 'serious'))`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStyle {
    Formal,
    #[default]
    Casual,
    Energetic,
    Calm,
    Humorous,
    Serious,
}

impl ResponseStyle {
    /// One-line style instruction injected into the profile prompt.
    pub fn instruction(&self) -> &'static str {
        match self {
            ResponseStyle::Formal => "Speak in a formal, professional manner.",
            ResponseStyle::Casual => "Speak in a casual, friendly manner.",
            ResponseStyle::Energetic => "Speak with enthusiasm and energy.",
            ResponseStyle::Calm => "Speak in a calm, peaceful manner.",
            ResponseStyle::Humorous => "Be witty and humorous in your responses.",
            ResponseStyle::Serious => "Maintain a serious, thoughtful tone.",
        }
    }
}

impl fmt::Display for ResponseStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseStyle::Formal => write!(f, "formal"),
            ResponseStyle::Casual => write!(f, "casual"),
            ResponseStyle::Energetic => write!(f, "energetic"),
            ResponseStyle::Calm => write!(f, "calm"),
            ResponseStyle::Humorous => write!(f, "humorous"),
            ResponseStyle::Serious => write!(f, "serious"),
        }
    }
}

impl FromStr for ResponseStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "formal" => Ok(ResponseStyle::Formal),
            "casual" => Ok(ResponseStyle::Casual),
            "energetic" => Ok(ResponseStyle::Energetic),
            "calm" => Ok(ResponseStyle::Calm),
            "humorous" => Ok(ResponseStyle::Humorous),
            "serious" => Ok(ResponseStyle::Serious),
            other => Err(format!("invalid response style: '{other}'")),
        }
    }
}

/// An AI character's authored profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Persona {
    pub id: PersonaId,
    pub display_name: String,
    /// Short description (1-2 sentences for listings).
    pub description: String,
    pub personality: String,
    pub background: String,
    pub response_style: ResponseStyle,
    /// Full system prompt that replaces any template when present.
    pub system_prompt_override: Option<String>,
    /// Key into the persona catalog for built-in characters ("itsuki").
    pub builtin_key: Option<String>,
    /// Account that authored the persona.
    pub owner_account_id: AccountId,
    pub is_official: bool,
    pub is_public: bool,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Request to author a new persona.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewPersona {
    pub display_name: String,
    pub description: String,
    pub personality: String,
    #[serde(default)]
    pub background: String,
    #[serde(default)]
    pub response_style: ResponseStyle,
    #[serde(default)]
    pub system_prompt_override: Option<String>,
    #[serde(default)]
    pub builtin_key: Option<String>,
    #[serde(default)]
    pub is_official: bool,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_style_roundtrip() {
        for style in [
            ResponseStyle::Formal,
            ResponseStyle::Casual,
            ResponseStyle::Energetic,
            ResponseStyle::Calm,
            ResponseStyle::Humorous,
            ResponseStyle::Serious,
        ] {
            let parsed: ResponseStyle = style.to_string().parse().unwrap();
            assert_eq!(style, parsed);
        }
    }

    #[test]
    fn test_response_style_default_is_casual() {
        assert_eq!(ResponseStyle::default(), ResponseStyle::Casual);
        assert!(ResponseStyle::default().instruction().contains("casual"));
    }

    #[test]
    fn test_new_persona_deserialize_defaults() {
        let json = r#"{"display_name":"Nova","description":"A star","personality":"Bright"}"#;
        let req: NewPersona = serde_json::from_str(json).unwrap();
        assert_eq!(req.response_style, ResponseStyle::Casual);
        assert!(req.builtin_key.is_none());
        assert!(req.background.is_empty());
    }
}
