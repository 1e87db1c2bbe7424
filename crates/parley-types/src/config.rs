//! Global configuration types for Parley.
//!
//! `GlobalConfig` represents the top-level `config.toml` that controls turn
//! context sizes, generation backend settings, and extra persona catalog
//! entries. Every field has a default so an empty file is valid.

use serde::{Deserialize, Serialize};

use crate::persona::ResponseStyle;

/// Top-level configuration.
///
/// Loaded from `~/.parley/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalConfig {
    #[serde(default)]
    pub turn: TurnConfig,

    #[serde(default)]
    pub generation: GenerationConfig,

    /// Catalog entries added to (or replacing) the built-in personas.
    #[serde(default)]
    pub personas: Vec<CatalogEntry>,
}

/// Context window sizing for a turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnConfig {
    /// Most recent messages read from history (audit window).
    #[serde(default = "default_history_cap")]
    pub history_cap: usize,

    /// Most recent entries actually sent to the backend.
    #[serde(default = "default_model_cap")]
    pub model_cap: usize,
}

fn default_history_cap() -> usize {
    10
}

fn default_model_cap() -> usize {
    8
}

impl Default for TurnConfig {
    fn default() -> Self {
        Self {
            history_cap: default_history_cap(),
            model_cap: default_model_cap(),
        }
    }
}

/// Settings for the OpenAI-compatible generation backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f64,

    /// Upper bound on one generation round trip, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://api.groq.com/openai/v1".to_string()
}

fn default_model() -> String {
    "llama3-8b-8192".to_string()
}

fn default_max_tokens() -> u32 {
    500
}

fn default_temperature() -> f64 {
    0.8
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// One persona catalog row: prompt template plus fallback lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Built-in key ("itsuki").
    pub key: String,
    /// Display name used when provisioning the persona.
    pub display_name: String,
    /// Short description shown in listings.
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub personality: String,
    #[serde(default)]
    pub background: String,
    #[serde(default)]
    pub response_style: ResponseStyle,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Full system prompt for this persona.
    pub template: String,
    pub fallback: FallbackLines,
}

/// Persona-flavored replies used when generation fails.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FallbackLines {
    /// The backend answered with an error status.
    pub rejected: String,
    /// The backend answered with an unusable payload.
    pub malformed: String,
    /// The backend timed out or could not be reached.
    pub unavailable: String,
}
