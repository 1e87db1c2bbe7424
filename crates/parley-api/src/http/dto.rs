//! Wire shapes for the REST API.
//!
//! Request bodies and responses use camelCase field names. Request fields
//! are optional so that missing input surfaces as `VALIDATION_ERROR` rather
//! than a body rejection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use parley_core::turn::TurnOutcome;
use parley_types::account::{Account, AccountId};
use parley_types::conversation::{Conversation, ConversationId, ConversationSummary};
use parley_types::message::{Message, MessageId};
use parley_types::participant::ParticipantRef;
use parley_types::persona::{Persona, PersonaId, ResponseStyle};

use crate::http::error::AppError;

// --- Requests ---

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartChatBody {
    pub persona_token: Option<String>,
}

/// Body of both `POST /messages/turn` and `POST /messages`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageBody {
    pub conversation_id: Option<String>,
    pub content: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGroupBody {
    #[serde(default)]
    pub participants: Vec<ParticipantRef>,
    pub name: Option<String>,
}

/// Parse an identifier from a path segment or body field.
pub fn parse_id<T: std::str::FromStr>(raw: &str, what: &str) -> Result<T, AppError> {
    raw.trim()
        .parse::<T>()
        .map_err(|_| AppError::Validation(format!("invalid {what}: '{raw}'")))
}

// --- Responses ---

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationDto {
    pub id: ConversationId,
    pub participants: Vec<AccountId>,
    pub is_group: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_name: Option<String>,
    pub created_by: AccountId,
    pub created_at: DateTime<Utc>,
}

impl From<Conversation> for ConversationDto {
    fn from(c: Conversation) -> Self {
        Self {
            id: c.id,
            participants: c.participants,
            is_group: c.is_group,
            group_name: c.group_name,
            created_by: c.created_by,
            created_at: c.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageDto {
    pub id: MessageId,
    pub conversation_id: ConversationId,
    pub sender_id: AccountId,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl From<Message> for MessageDto {
    fn from(m: Message) -> Self {
        Self {
            id: m.id,
            conversation_id: m.conversation_id,
            sender_id: m.sender_id,
            content: m.content,
            created_at: m.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonaDto {
    pub id: PersonaId,
    pub display_name: String,
    pub description: String,
    pub personality: String,
    pub background: String,
    pub response_style: ResponseStyle,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub builtin_key: Option<String>,
    pub is_official: bool,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Persona> for PersonaDto {
    fn from(p: Persona) -> Self {
        Self {
            id: p.id,
            display_name: p.display_name,
            description: p.description,
            personality: p.personality,
            background: p.background,
            response_style: p.response_style,
            builtin_key: p.builtin_key,
            is_official: p.is_official,
            tags: p.tags,
            created_at: p.created_at,
        }
    }
}

/// A conversation member: the account, plus `personaId` for shadow identities.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantDto {
    pub id: AccountId,
    pub handle: String,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persona_id: Option<PersonaId>,
}

impl ParticipantDto {
    pub fn new(account: Account, persona_id: Option<PersonaId>) -> Self {
        Self {
            id: account.id,
            handle: account.handle,
            display_name: account.display_name,
            avatar_ref: account.avatar_ref,
            persona_id,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StartChatResponse {
    pub conversation: ConversationDto,
    pub persona: PersonaDto,
}

#[derive(Debug, Serialize)]
pub struct ConversationDetail {
    pub conversation: ConversationDto,
    pub participants: Vec<ParticipantDto>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummaryDto {
    pub conversation: ConversationDto,
    pub last_message: Option<MessageDto>,
}

impl From<ConversationSummary> for ConversationSummaryDto {
    fn from(s: ConversationSummary) -> Self {
        Self {
            conversation: s.conversation.into(),
            last_message: s.last_message.map(Into::into),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnResponse {
    pub human_message: MessageDto,
    pub assistant_message: MessageDto,
    pub fallback_used: bool,
}

impl From<TurnOutcome> for TurnResponse {
    fn from(o: TurnOutcome) -> Self {
        Self {
            human_message: o.human_message.into(),
            assistant_message: o.assistant_message.into(),
            fallback_used: o.fallback_used,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
}
