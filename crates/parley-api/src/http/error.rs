//! Application error type mapping to HTTP status codes and envelope format.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::error;

use parley_types::error::ChatError;

use crate::http::response::ApiResponse;

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// Errors from the conversation engine.
    Chat(ChatError),
    /// Authentication failure.
    Unauthorized(String),
    /// Malformed request input caught before reaching the engine.
    Validation(String),
}

impl From<ChatError> for AppError {
    fn from(e: ChatError) -> Self {
        AppError::Chat(e)
    }
}

impl AppError {
    /// HTTP status and stable error code.
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            AppError::Chat(e) => {
                let status = match e {
                    ChatError::Validation(_) => StatusCode::BAD_REQUEST,
                    ChatError::AccessDenied => StatusCode::FORBIDDEN,
                    ChatError::ConversationNotFound
                    | ChatError::MessageNotFound
                    | ChatError::AccountNotFound => StatusCode::NOT_FOUND,
                    ChatError::PersonaUnresolved(_)
                    | ChatError::Storage(_)
                    | ChatError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, e.code())
            }
        }
    }

    fn message(&self) -> String {
        match self {
            AppError::Chat(e) => e.to_string(),
            AppError::Unauthorized(msg) | AppError::Validation(msg) => msg.clone(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let message = self.message();

        match &self {
            AppError::Chat(ChatError::PersonaUnresolved(detail)) => {
                error!(error_code = code, detail = %detail, "Persona identity could not be resolved");
            }
            _ if status.is_server_error() => {
                error!(error_code = code, error = %message, "Request failed");
            }
            _ => {}
        }

        (status, Json(ApiResponse::error(code, &message))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn chat_errors_map_to_statuses() {
        assert_eq!(
            status_of(ChatError::Validation("content is required".into()).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(status_of(ChatError::AccessDenied.into()), StatusCode::FORBIDDEN);
        assert_eq!(
            status_of(ChatError::ConversationNotFound.into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(status_of(ChatError::MessageNotFound.into()), StatusCode::NOT_FOUND);
        assert_eq!(
            status_of(ChatError::PersonaUnresolved("no shadow".into()).into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_of(ChatError::Storage("disk".into()).into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn codes_are_stable() {
        assert_eq!(
            AppError::Unauthorized("missing".into()).status_and_code(),
            (StatusCode::UNAUTHORIZED, "UNAUTHORIZED")
        );
        assert_eq!(
            AppError::Chat(ChatError::AccessDenied).status_and_code().1,
            "ACCESS_DENIED"
        );
        assert_eq!(
            AppError::Chat(ChatError::PersonaUnresolved("x".into())).status_and_code().1,
            "PERSONA_UNRESOLVED"
        );
    }
}
