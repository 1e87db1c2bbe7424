use thiserror::Error;

/// Caller-facing failures of the chat engine.
///
/// Each variant has a stable machine-readable code (see [`ChatError::code`]).
/// Generation-backend failures and duplicate-create conflicts never appear
/// here: both are recovered inside the engine.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("access denied")]
    AccessDenied,

    #[error("conversation not found")]
    ConversationNotFound,

    #[error("message not found")]
    MessageNotFound,

    #[error("account not found")]
    AccountNotFound,

    /// A persona profile or its shadow identity is missing. This is a
    /// provisioning defect and should alert an operator.
    #[error("persona unresolved: {0}")]
    PersonaUnresolved(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ChatError {
    /// Stable error code exposed to API clients.
    pub fn code(&self) -> &'static str {
        match self {
            ChatError::Validation(_) => "VALIDATION_ERROR",
            ChatError::AccessDenied => "ACCESS_DENIED",
            ChatError::ConversationNotFound => "CONVERSATION_NOT_FOUND",
            ChatError::MessageNotFound => "MESSAGE_NOT_FOUND",
            ChatError::AccountNotFound => "ACCOUNT_NOT_FOUND",
            ChatError::PersonaUnresolved(_) => "PERSONA_UNRESOLVED",
            ChatError::Storage(_) => "STORAGE_ERROR",
            ChatError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<RepositoryError> for ChatError {
    fn from(e: RepositoryError) -> Self {
        ChatError::Storage(e.to_string())
    }
}

/// Errors from repository operations (used by trait definitions in parley-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}

/// Errors raised while loading startup configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("required environment variable '{0}' is not set")]
    MissingApiKey(String),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_error_codes_are_stable() {
        assert_eq!(ChatError::AccessDenied.code(), "ACCESS_DENIED");
        assert_eq!(ChatError::ConversationNotFound.code(), "CONVERSATION_NOT_FOUND");
        assert_eq!(
            ChatError::PersonaUnresolved("itsuki".into()).code(),
            "PERSONA_UNRESOLVED"
        );
        assert_eq!(ChatError::Validation("x".into()).code(), "VALIDATION_ERROR");
    }

    #[test]
    fn test_repository_error_converts_to_storage() {
        let err: ChatError = RepositoryError::Query("syntax error".into()).into();
        assert!(matches!(err, ChatError::Storage(ref m) if m == "query error: syntax error"));
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::MissingApiKey("GENERATION_API_KEY".into());
        assert_eq!(
            err.to_string(),
            "required environment variable 'GENERATION_API_KEY' is not set"
        );
    }
}
