//! Message HTTP handlers.
//!
//! Endpoints:
//! - POST   /api/v1/messages/turn - Send a message and get the persona's reply
//! - POST   /api/v1/messages      - Send a message without a reply
//! - DELETE /api/v1/messages/{id} - Delete one of the requester's messages

use axum::Json;
use axum::extract::{Path, State};

use parley_core::turn::TurnRequest;
use parley_types::conversation::ConversationId;
use parley_types::message::MessageId;

use crate::http::dto::{MessageBody, MessageDto, StatusResponse, TurnResponse, parse_id};
use crate::http::error::AppError;
use crate::http::extractors::auth::Authenticated;
use crate::http::response::{ApiResponse, RequestClock};
use crate::state::ApiState;

fn conversation_id_of(body: &MessageBody) -> Result<Option<ConversationId>, AppError> {
    body.conversation_id
        .as_deref()
        .map(|raw| parse_id(raw, "conversationId"))
        .transpose()
}

/// POST /api/v1/messages/turn - Run one turn.
///
/// The turn runs on its own task: if the client disconnects, both messages
/// are still stored.
pub async fn take_turn(
    State(state): State<ApiState>,
    Authenticated(account): Authenticated,
    Json(body): Json<MessageBody>,
) -> Result<Json<ApiResponse<TurnResponse>>, AppError> {
    let clock = RequestClock::start();

    let request = TurnRequest {
        conversation_id: conversation_id_of(&body)?,
        content: body.content,
    };
    let outcome = state.orchestrator.submit_turn(account.id, request).await?;

    Ok(Json(clock.success(outcome.into())))
}

/// POST /api/v1/messages - Post a message without asking the persona to reply.
pub async fn send_message(
    State(state): State<ApiState>,
    Authenticated(account): Authenticated,
    Json(body): Json<MessageBody>,
) -> Result<Json<ApiResponse<MessageDto>>, AppError> {
    let clock = RequestClock::start();

    let conversation_id = conversation_id_of(&body)?
        .ok_or_else(|| AppError::Validation("conversationId is required".to_string()))?;
    let content = body.content.unwrap_or_default();

    let message = state
        .orchestrator
        .send_message(&account.id, &conversation_id, &content)
        .await?;

    Ok(Json(clock.success(message.into())))
}

/// DELETE /api/v1/messages/{id} - Delete a message the requester sent.
pub async fn delete_message(
    State(state): State<ApiState>,
    Authenticated(account): Authenticated,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<StatusResponse>>, AppError> {
    let clock = RequestClock::start();
    let message_id: MessageId = parse_id(&id, "message id")?;

    state
        .orchestrator
        .messages()
        .delete(&message_id, &account.id)
        .await?;

    tracing::info!(message_id = %message_id, "Message deleted");
    Ok(Json(clock.success(StatusResponse { status: "deleted" })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_types::account::Account;
    use parley_types::error::ChatError;

    use crate::http::dto::StartChatBody;
    use crate::http::handlers::conversation::{list_messages, start_chat};
    use crate::state::test_support::{human, seed, test_state};

    async fn open_chat(state: &ApiState, account: &Account, token: &str) -> ConversationId {
        let Json(resp) = start_chat(
            State(state.clone()),
            Authenticated(account.clone()),
            Json(StartChatBody {
                persona_token: Some(token.to_string()),
            }),
        )
        .await
        .unwrap();
        resp.data.unwrap().conversation.id
    }

    fn body(conversation_id: Option<&ConversationId>, content: Option<&str>) -> MessageBody {
        MessageBody {
            conversation_id: conversation_id.map(|id| id.to_string()),
            content: content.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn unreachable_backend_yields_fallback_reply() {
        let state = test_state().await;
        seed(&state).await;
        let (ana, _) = human(&state, "ana").await;
        let conversation_id = open_chat(&state, &ana, "miku").await;

        let Json(resp) = take_turn(
            State(state.clone()),
            Authenticated(ana.clone()),
            Json(body(Some(&conversation_id), Some("Hello!"))),
        )
        .await
        .unwrap();
        let turn = resp.data.unwrap();

        assert!(turn.fallback_used);
        assert_eq!(turn.human_message.content, "Hello!");
        assert_eq!(turn.human_message.sender_id, ana.id);
        assert!(!turn.assistant_message.content.trim().is_empty());
        assert_ne!(turn.assistant_message.sender_id, ana.id);

        let Json(resp) = list_messages(
            State(state.clone()),
            Authenticated(ana),
            Path(conversation_id.to_string()),
        )
        .await
        .unwrap();
        let messages = resp.data.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].id, turn.human_message.id);
        assert_eq!(messages[1].id, turn.assistant_message.id);
    }

    #[tokio::test]
    async fn turn_validation_errors() {
        let state = test_state().await;
        seed(&state).await;
        let (ana, _) = human(&state, "ana").await;
        let conversation_id = open_chat(&state, &ana, "itsuki").await;

        let result = take_turn(
            State(state.clone()),
            Authenticated(ana.clone()),
            Json(body(Some(&conversation_id), None)),
        )
        .await;
        assert!(matches!(result, Err(AppError::Chat(ChatError::Validation(_)))));

        let result = take_turn(
            State(state.clone()),
            Authenticated(ana.clone()),
            Json(body(None, Some("Hello!"))),
        )
        .await;
        assert!(matches!(result, Err(AppError::Chat(ChatError::Validation(_)))));

        let result = take_turn(
            State(state.clone()),
            Authenticated(ana),
            Json(MessageBody {
                conversation_id: Some("not-a-uuid".into()),
                content: Some("Hello!".into()),
            }),
        )
        .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn plain_send_and_delete_permissions() {
        let state = test_state().await;
        seed(&state).await;
        let (ana, _) = human(&state, "ana").await;
        let (bo, _) = human(&state, "bo").await;
        let conversation_id = open_chat(&state, &ana, "march7th").await;

        let Json(resp) = send_message(
            State(state.clone()),
            Authenticated(ana.clone()),
            Json(body(Some(&conversation_id), Some("just saying hi"))),
        )
        .await
        .unwrap();
        let message = resp.data.unwrap();

        let result = delete_message(
            State(state.clone()),
            Authenticated(bo),
            Path(message.id.to_string()),
        )
        .await;
        assert!(matches!(result, Err(AppError::Chat(ChatError::AccessDenied))));

        let Json(resp) = delete_message(
            State(state.clone()),
            Authenticated(ana.clone()),
            Path(message.id.to_string()),
        )
        .await
        .unwrap();
        assert_eq!(resp.data.unwrap().status, "deleted");

        let result = delete_message(
            State(state.clone()),
            Authenticated(ana),
            Path(message.id.to_string()),
        )
        .await;
        assert!(matches!(result, Err(AppError::Chat(ChatError::MessageNotFound))));
    }
}
