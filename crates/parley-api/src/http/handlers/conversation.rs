//! Conversation HTTP handlers.
//!
//! Endpoints:
//! - POST /api/v1/conversations/start        - Open the direct chat with a persona
//! - POST /api/v1/conversations              - Open a conversation with a participant set
//! - POST /api/v1/conversations/group        - Same as above
//! - GET  /api/v1/conversations              - List the requester's conversations
//! - GET  /api/v1/conversations/{id}         - Conversation with participant details
//! - GET  /api/v1/conversations/{id}/messages - Messages, oldest first

use axum::Json;
use axum::extract::{Path, State};

use parley_core::repository::AccountRepository;
use parley_types::conversation::ConversationId;
use parley_types::error::ChatError;
use parley_types::participant::Classification;

use crate::http::dto::{
    ConversationDetail, ConversationDto, ConversationSummaryDto, CreateGroupBody, MessageDto,
    ParticipantDto, StartChatBody, StartChatResponse, parse_id,
};
use crate::http::error::AppError;
use crate::http::extractors::auth::Authenticated;
use crate::http::response::{ApiResponse, RequestClock};
use crate::state::ApiState;

/// POST /api/v1/conversations/start - Open (or reopen) the direct chat with a persona.
pub async fn start_chat(
    State(state): State<ApiState>,
    Authenticated(account): Authenticated,
    Json(body): Json<StartChatBody>,
) -> Result<Json<ApiResponse<StartChatResponse>>, AppError> {
    let clock = RequestClock::start();

    let token = body
        .persona_token
        .ok_or_else(|| AppError::Validation("personaToken is required".to_string()))?;

    let (conversation, persona) = state.orchestrator.start_chat(&account.id, &token).await?;

    let href = format!("/api/v1/conversations/{}", conversation.id);
    let resp = clock
        .success(StartChatResponse {
            conversation: conversation.into(),
            persona: persona.into(),
        })
        .with_link("conversation", &href);

    Ok(Json(resp))
}

/// POST /api/v1/conversations/group - Create a group conversation.
///
/// With a single other participant this opens (or reopens) the direct
/// conversation with them.
pub async fn create_group(
    State(state): State<ApiState>,
    Authenticated(account): Authenticated,
    Json(body): Json<CreateGroupBody>,
) -> Result<Json<ApiResponse<ConversationDto>>, AppError> {
    let clock = RequestClock::start();

    if body.participants.is_empty() {
        return Err(AppError::Validation("participants are required".to_string()));
    }

    let bridge = state.orchestrator.bridge();
    let mut members = Vec::with_capacity(body.participants.len());
    for participant in &body.participants {
        members.push(bridge.resolve_participant(participant).await?);
    }

    let conversation = state
        .orchestrator
        .conversations()
        .create_group(members, body.name, &account.id)
        .await?;

    Ok(Json(clock.success(conversation.into())))
}

/// GET /api/v1/conversations - Every conversation of the requester, most recently active first.
pub async fn list_conversations(
    State(state): State<ApiState>,
    Authenticated(account): Authenticated,
) -> Result<Json<ApiResponse<Vec<ConversationSummaryDto>>>, AppError> {
    let clock = RequestClock::start();

    let summaries = state
        .orchestrator
        .conversations()
        .list_for(&account.id, state.orchestrator.messages().repo())
        .await?;

    let resp = clock
        .success(summaries.into_iter().map(Into::into).collect())
        .with_link("self", "/api/v1/conversations");

    Ok(Json(resp))
}

/// GET /api/v1/conversations/{id} - Conversation with its participants.
pub async fn get_conversation(
    State(state): State<ApiState>,
    Authenticated(account): Authenticated,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<ConversationDetail>>, AppError> {
    let clock = RequestClock::start();
    let conversation_id: ConversationId = parse_id(&id, "conversation id")?;

    let conversation = state
        .orchestrator
        .conversations()
        .get(&conversation_id, &account.id)
        .await?;

    let bridge = state.orchestrator.bridge();
    let mut participants = Vec::with_capacity(conversation.participants.len());
    for participant_id in &conversation.participants {
        let Some(member) = bridge
            .accounts()
            .get_by_id(participant_id)
            .await
            .map_err(ChatError::from)?
        else {
            continue;
        };
        let persona_id = match bridge.classify(participant_id).await? {
            Some(Classification::Persona(persona)) => Some(persona.id),
            _ => None,
        };
        participants.push(ParticipantDto::new(member, persona_id));
    }

    let messages_href = format!("/api/v1/conversations/{conversation_id}/messages");
    let resp = clock
        .success(ConversationDetail {
            conversation: conversation.into(),
            participants,
        })
        .with_link("messages", &messages_href);

    Ok(Json(resp))
}

/// GET /api/v1/conversations/{id}/messages - All messages, oldest first.
pub async fn list_messages(
    State(state): State<ApiState>,
    Authenticated(account): Authenticated,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Vec<MessageDto>>>, AppError> {
    let clock = RequestClock::start();
    let conversation_id: ConversationId = parse_id(&id, "conversation id")?;

    state
        .orchestrator
        .conversations()
        .get(&conversation_id, &account.id)
        .await?;
    let messages = state.orchestrator.messages().list(&conversation_id).await?;

    Ok(Json(clock.success(
        messages.into_iter().map(Into::into).collect(),
    )))
}
