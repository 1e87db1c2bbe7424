//! Turn orchestrator.
//!
//! A turn validates the request, takes the conversation lock, stores the
//! human message, builds the context window, composes the persona prompt,
//! calls the generation backend, stores the reply, and publishes both
//! messages. Backend failures are replaced by a persona fallback line, so
//! a turn that passes validation always yields two stored messages.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parley_types::account::AccountId;
use parley_types::config::{GenerationConfig, TurnConfig};
use parley_types::conversation::{Conversation, ConversationId};
use parley_types::error::ChatError;
use parley_types::event::TurnEvent;
use parley_types::generation::{GenerationError, GenerationRequest};
use parley_types::message::Message;
use parley_types::persona::Persona;
use serde::{Deserialize, Serialize};
use tracing::{Instrument, debug, info, info_span, warn};

use super::lock::ConversationLocks;
use crate::conversation::ConversationStore;
use crate::event::RealtimePublisher;
use crate::generation::GenerationBackend;
use crate::identity::IdentityBridge;
use crate::message::MessageStore;
use crate::persona::{PersonaCatalog, compose_system_prompt};
use crate::repository::{
    AccountRepository, ConversationRepository, MessageRepository, PersonaRepository,
};

/// Context sizing and generation bound for a turn.
#[derive(Debug, Clone)]
pub struct TurnSettings {
    pub history_cap: usize,
    pub model_cap: usize,
    pub generation_timeout: Duration,
}

impl TurnSettings {
    pub fn from_config(turn: &TurnConfig, generation: &GenerationConfig) -> Self {
        Self {
            history_cap: turn.history_cap,
            model_cap: turn.model_cap,
            generation_timeout: Duration::from_secs(generation.timeout_secs),
        }
    }
}

impl Default for TurnSettings {
    fn default() -> Self {
        Self::from_config(&TurnConfig::default(), &GenerationConfig::default())
    }
}

/// A client's request to take a turn. Both fields are required; they are
/// optional here so that missing input surfaces as a validation error.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TurnRequest {
    pub conversation_id: Option<ConversationId>,
    pub content: Option<String>,
}

/// The two messages a turn stored.
#[derive(Debug, Clone, Serialize)]
pub struct TurnOutcome {
    pub human_message: Message,
    pub assistant_message: Message,
    /// Whether the reply is a fallback line rather than generated text.
    pub fallback_used: bool,
}

pub struct TurnOrchestrator<A, P, C, M, G, R>
where
    A: AccountRepository,
    P: PersonaRepository,
    C: ConversationRepository,
    M: MessageRepository,
    G: GenerationBackend,
    R: RealtimePublisher,
{
    bridge: IdentityBridge<A, P>,
    conversations: ConversationStore<C>,
    messages: MessageStore<M, C>,
    backend: G,
    publisher: R,
    catalog: PersonaCatalog,
    settings: TurnSettings,
    locks: ConversationLocks,
}

impl<A, P, C, M, G, R> TurnOrchestrator<A, P, C, M, G, R>
where
    A: AccountRepository,
    P: PersonaRepository,
    C: ConversationRepository,
    M: MessageRepository,
    G: GenerationBackend,
    R: RealtimePublisher,
{
    pub fn new(
        bridge: IdentityBridge<A, P>,
        conversations: ConversationStore<C>,
        messages: MessageStore<M, C>,
        backend: G,
        publisher: R,
        catalog: PersonaCatalog,
        settings: TurnSettings,
    ) -> Self {
        Self {
            bridge,
            conversations,
            messages,
            backend,
            publisher,
            catalog,
            settings,
            locks: ConversationLocks::new(),
        }
    }

    pub fn bridge(&self) -> &IdentityBridge<A, P> {
        &self.bridge
    }

    pub fn conversations(&self) -> &ConversationStore<C> {
        &self.conversations
    }

    pub fn messages(&self) -> &MessageStore<M, C> {
        &self.messages
    }

    pub fn catalog(&self) -> &PersonaCatalog {
        &self.catalog
    }

    pub fn backend(&self) -> &G {
        &self.backend
    }

    /// Open (or reopen) the direct conversation between `requester` and the
    /// persona named by `persona_token`.
    pub async fn start_chat(
        &self,
        requester: &AccountId,
        persona_token: &str,
    ) -> Result<(Conversation, Persona), ChatError> {
        let persona = self.bridge.resolve_persona_by_token(persona_token).await?;
        let shadow = self.bridge.shadow_identity_of(&persona).await?;
        let conversation = self
            .conversations
            .find_or_create_direct(requester, &shadow, requester)
            .await?;
        Ok((conversation, persona))
    }

    /// Run one turn for `requester`.
    pub async fn run_turn(
        &self,
        requester: &AccountId,
        request: TurnRequest,
    ) -> Result<TurnOutcome, ChatError> {
        let conversation_id = request
            .conversation_id
            .ok_or_else(|| ChatError::Validation("conversation id is required".to_string()))?;
        let content = request
            .content
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| ChatError::Validation("message content is required".to_string()))?;

        let conversation = self.conversations.get(&conversation_id, requester).await?;
        let persona = self.bridge.persona_in(&conversation).await?.ok_or_else(|| {
            ChatError::PersonaUnresolved(format!(
                "conversation {conversation_id} has no persona participant"
            ))
        })?;
        let shadow = self.bridge.shadow_identity_of(&persona).await?;

        let guard = self.locks.acquire(conversation_id).await;
        let result = self
            .locked_turn(&conversation_id, requester, &persona, &shadow, content)
            .await;
        // Published under the lock so subscribers see turns in store order.
        if let Ok(outcome) = &result {
            self.publisher.publish(TurnEvent::TurnCompleted {
                conversation_id,
                human_message: outcome.human_message.clone(),
                assistant_message: outcome.assistant_message.clone(),
            });
        }
        drop(guard);
        self.locks.prune(&conversation_id);

        result
    }

    async fn locked_turn(
        &self,
        conversation_id: &ConversationId,
        requester: &AccountId,
        persona: &Persona,
        shadow: &AccountId,
        content: String,
    ) -> Result<TurnOutcome, ChatError> {
        let human_message = self
            .messages
            .append(conversation_id, requester, &content)
            .await?;

        let mut history = self
            .messages
            .build_context_window(
                conversation_id,
                &self.bridge,
                self.settings.history_cap,
                self.settings.model_cap,
            )
            .await?;
        // The trailing entry is the message just stored; it is sent as
        // `new_message` instead.
        history.pop();

        let request = GenerationRequest {
            system: compose_system_prompt(persona, &self.catalog),
            history,
            new_message: content,
        };

        let (reply, fallback_used) = match self.generate(&request).await {
            Ok(text) => (text, false),
            Err(err) => {
                warn!(
                    conversation_id = %conversation_id,
                    persona = %persona.display_name,
                    error = %err,
                    "Generation failed, using fallback reply"
                );
                let line = self
                    .catalog
                    .fallback_for(persona.builtin_key.as_deref(), &err);
                (line.to_string(), true)
            }
        };

        let assistant_message = self.messages.append(conversation_id, shadow, &reply).await?;

        info!(
            conversation_id = %conversation_id,
            persona = %persona.display_name,
            fallback_used,
            "Turn completed"
        );
        Ok(TurnOutcome {
            human_message,
            assistant_message,
            fallback_used,
        })
    }

    /// Call the backend under the configured timeout. Blank replies count as
    /// malformed.
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let span = info_span!(
            "generate",
            backend = self.backend.name(),
            model = self.backend.model(),
            history_len = request.history.len(),
        );
        let start = Instant::now();

        let result = tokio::time::timeout(
            self.settings.generation_timeout,
            self.backend.generate(request),
        )
        .instrument(span)
        .await;

        let text = match result {
            Ok(inner) => inner?,
            Err(_) => return Err(GenerationError::Timeout),
        };
        let text = text.trim();
        if text.is_empty() {
            return Err(GenerationError::Malformed("empty reply".to_string()));
        }
        debug!(elapsed_ms = start.elapsed().as_millis() as u64, "Generation finished");
        Ok(text.to_string())
    }

    /// Send a plain human message without asking the persona to reply.
    pub async fn send_message(
        &self,
        requester: &AccountId,
        conversation_id: &ConversationId,
        content: &str,
    ) -> Result<Message, ChatError> {
        if content.trim().is_empty() {
            return Err(ChatError::Validation("message content is required".to_string()));
        }
        self.conversations.get(conversation_id, requester).await?;

        let guard = self.locks.acquire(*conversation_id).await;
        let result = self.messages.append(conversation_id, requester, content).await;
        if let Ok(message) = &result {
            self.publisher.publish(TurnEvent::MessagePosted {
                conversation_id: *conversation_id,
                message: message.clone(),
            });
        }
        drop(guard);
        self.locks.prune(conversation_id);

        result
    }
}

impl<A, P, C, M, G, R> TurnOrchestrator<A, P, C, M, G, R>
where
    A: AccountRepository + 'static,
    P: PersonaRepository + 'static,
    C: ConversationRepository + 'static,
    M: MessageRepository + 'static,
    G: GenerationBackend + 'static,
    R: RealtimePublisher + 'static,
{
    /// Run a turn on its own task so that it completes (and both messages
    /// are stored) even if the caller stops waiting.
    pub async fn submit_turn(
        self: &Arc<Self>,
        requester: AccountId,
        request: TurnRequest,
    ) -> Result<TurnOutcome, ChatError> {
        let this = Arc::clone(self);
        tokio::spawn(async move { this.run_turn(&requester, request).await })
            .await
            .map_err(|e| ChatError::Internal(format!("turn task failed: {e}")))?
    }
}
