//! Bearer token authentication extractor.
//!
//! Extracts the account token from:
//! - `Authorization: Bearer <token>` header
//! - `X-API-Key: <token>` header
//!
//! Tokens are SHA-256 hashed and looked up in `account_tokens`; a match
//! resolves to the requesting account.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use parley_core::repository::AccountRepository;
use parley_infra::crypto::token::hash_token;
use parley_types::account::Account;
use parley_types::error::ChatError;

use crate::http::error::AppError;
use crate::state::ApiState;

/// The authenticated requester. Extracting this validates the token.
pub struct Authenticated(pub Account);

impl FromRequestParts<ApiState> for Authenticated {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ApiState,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_token(parts)?;

        let account = state
            .app
            .accounts
            .get_by_token_hash(&hash_token(&token))
            .await
            .map_err(|e| AppError::Chat(ChatError::from(e)))?;

        match account {
            Some(account) => Ok(Authenticated(account)),
            None => Err(AppError::Unauthorized(
                "Invalid token. Provide a valid token via 'Authorization: Bearer <token>' or 'X-API-Key: <token>' header.".to_string(),
            )),
        }
    }
}

/// Extract the token from request headers.
fn extract_token(parts: &Parts) -> Result<String, AppError> {
    if let Some(auth) = parts.headers.get("authorization") {
        let auth_str = auth.to_str().map_err(|_| {
            AppError::Unauthorized("Invalid Authorization header encoding".to_string())
        })?;
        if let Some(token) = auth_str.strip_prefix("Bearer ") {
            let token = token.trim();
            if !token.is_empty() {
                return Ok(token.to_string());
            }
        }
    }

    if let Some(key) = parts.headers.get("x-api-key") {
        let key_str = key.to_str().map_err(|_| {
            AppError::Unauthorized("Invalid X-API-Key header encoding".to_string())
        })?;
        let key_str = key_str.trim();
        if !key_str.is_empty() {
            return Ok(key_str.to_string());
        }
    }

    Err(AppError::Unauthorized(
        "Missing token. Provide via 'Authorization: Bearer <token>' or 'X-API-Key: <token>' header.".to_string(),
    ))
}
