//! Generation backend request/response types.
//!
//! These types model the contract between the Turn Orchestrator and the
//! external text-generation backend: a system prompt, a role-tagged history,
//! the new user message, and a typed failure.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Role of an entry in a generation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::System => write!(f, "system"),
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
        }
    }
}

impl FromStr for MessageRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "system" => Ok(MessageRole::System),
            "user" => Ok(MessageRole::User),
            "assistant" => Ok(MessageRole::Assistant),
            other => Err(format!("invalid message role: '{other}'")),
        }
    }
}

/// One role-tagged entry of a context window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextEntry {
    pub role: MessageRole,
    pub content: String,
}

impl ContextEntry {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// Everything the backend needs to produce one persona reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Composed persona system prompt.
    pub system: String,
    /// Prior context, oldest first, excluding `new_message`.
    pub history: Vec<ContextEntry>,
    /// The human message this turn answers.
    pub new_message: String,
}

/// Typed failure from the generation backend.
///
/// Always absorbed by the Turn Orchestrator into a fallback reply.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GenerationError {
    #[error("generation timed out")]
    Timeout,

    #[error("generation rejected (status {status:?}): {message}")]
    Rejected {
        status: Option<u16>,
        message: String,
    },

    #[error("malformed generation response: {0}")]
    Malformed(String),
}

/// Coarse failure classes used to pick a fallback line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The backend answered with an error status.
    Rejected,
    /// The backend answered with an unusable payload.
    Malformed,
    /// The backend did not answer in time or could not be reached.
    Unavailable,
}

impl GenerationError {
    pub fn kind(&self) -> FailureKind {
        match self {
            GenerationError::Timeout => FailureKind::Unavailable,
            GenerationError::Rejected { status: None, .. } => FailureKind::Unavailable,
            GenerationError::Rejected { .. } => FailureKind::Rejected,
            GenerationError::Malformed(_) => FailureKind::Malformed,
        }
    }
}
