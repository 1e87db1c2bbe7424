//! Persona HTTP handlers.
//!
//! Endpoints:
//! - GET /api/v1/personas - Public personas, for the start-chat picker

use axum::Json;
use axum::extract::State;

use parley_core::repository::PersonaRepository;
use parley_types::error::ChatError;

use crate::http::dto::PersonaDto;
use crate::http::error::AppError;
use crate::http::extractors::auth::Authenticated;
use crate::http::response::{ApiResponse, RequestClock};
use crate::state::ApiState;

/// GET /api/v1/personas - List public personas.
pub async fn list_personas(
    State(state): State<ApiState>,
    _auth: Authenticated,
) -> Result<Json<ApiResponse<Vec<PersonaDto>>>, AppError> {
    let clock = RequestClock::start();

    let personas = state
        .app
        .personas
        .list_public()
        .await
        .map_err(ChatError::from)?;

    let resp = clock
        .success(personas.into_iter().map(Into::into).collect())
        .with_link("self", "/api/v1/personas");
    Ok(Json(resp))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_support::{human, seed, test_state};

    #[tokio::test]
    async fn lists_seeded_personas() {
        let state = test_state().await;
        seed(&state).await;
        let (ana, _) = human(&state, "ana").await;

        let Json(resp) = list_personas(State(state.clone()), Authenticated(ana))
            .await
            .unwrap();
        let personas = resp.data.unwrap();

        let mut keys: Vec<String> = personas
            .iter()
            .filter_map(|p| p.builtin_key.clone())
            .collect();
        keys.sort();
        assert_eq!(keys, vec!["itsuki", "march7th", "miku", "ronaldo", "trump"]);
        assert!(personas.iter().all(|p| p.is_official));
    }
}
