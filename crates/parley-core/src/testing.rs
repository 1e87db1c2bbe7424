//! In-memory fakes shared by the unit tests of this crate.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use parley_types::account::{Account, AccountId};
use parley_types::conversation::{Conversation, ConversationId};
use parley_types::error::RepositoryError;
use parley_types::event::TurnEvent;
use parley_types::generation::{GenerationError, GenerationRequest};
use parley_types::message::{Message, MessageId, NewMessage};
use parley_types::persona::{Persona, PersonaId};

use crate::event::RealtimePublisher;
use crate::generation::GenerationBackend;
use crate::repository::{
    AccountRepository, ConversationRepository, MessageRepository, PersonaRepository,
};

#[derive(Default)]
struct State {
    accounts: Vec<Account>,
    tokens: HashMap<String, AccountId>,
    personas: Vec<Persona>,
    links: HashMap<PersonaId, AccountId>,
    conversations: Vec<Conversation>,
    messages: Vec<Message>,
    next_seq: i64,
    /// When set, the next direct-conversation insert loses a race against a
    /// concurrent creator of the same pair.
    lose_next_pair_race: bool,
}

/// One shared in-memory store implementing every repository trait.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lose_next_pair_race(&self) {
        self.state.lock().unwrap().lose_next_pair_race = true;
    }

    /// Simulate a provisioning defect by dropping a persona's shadow link.
    pub fn unlink_shadow(&self, persona_id: &PersonaId) {
        self.state.lock().unwrap().links.remove(persona_id);
    }

    pub fn conversation_count(&self) -> usize {
        self.state.lock().unwrap().conversations.len()
    }

    pub fn insert_account(&self, handle: &str) -> Account {
        let account = Account::new(handle, handle);
        self.state.lock().unwrap().accounts.push(account.clone());
        account
    }
}

impl AccountRepository for MemoryStore {
    async fn create(&self, account: &Account) -> Result<Account, RepositoryError> {
        let mut state = self.state.lock().unwrap();
        if state.accounts.iter().any(|a| a.handle == account.handle) {
            return Err(RepositoryError::Conflict(format!(
                "handle '{}' already exists",
                account.handle
            )));
        }
        state.accounts.push(account.clone());
        Ok(account.clone())
    }

    async fn get_by_id(&self, id: &AccountId) -> Result<Option<Account>, RepositoryError> {
        let state = self.state.lock().unwrap();
        Ok(state.accounts.iter().find(|a| a.id == *id).cloned())
    }

    async fn get_by_handle(&self, handle: &str) -> Result<Option<Account>, RepositoryError> {
        let state = self.state.lock().unwrap();
        Ok(state.accounts.iter().find(|a| a.handle == handle).cloned())
    }

    async fn add_token(&self, account_id: &AccountId, token_hash: &str) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().unwrap();
        state.tokens.insert(token_hash.to_string(), *account_id);
        Ok(())
    }

    async fn get_by_token_hash(&self, token_hash: &str) -> Result<Option<Account>, RepositoryError> {
        let state = self.state.lock().unwrap();
        let Some(id) = state.tokens.get(token_hash) else {
            return Ok(None);
        };
        Ok(state.accounts.iter().find(|a| a.id == *id).cloned())
    }
}

impl PersonaRepository for MemoryStore {
    async fn provision(&self, persona: &Persona, shadow: &Account) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().unwrap();
        if let Some(key) = &persona.builtin_key {
            if state.personas.iter().any(|p| p.builtin_key.as_ref() == Some(key)) {
                return Err(RepositoryError::Conflict(format!("builtin key '{key}' exists")));
            }
        }
        if state.accounts.iter().any(|a| a.handle == shadow.handle) {
            return Err(RepositoryError::Conflict(format!(
                "handle '{}' already exists",
                shadow.handle
            )));
        }
        state.accounts.push(shadow.clone());
        state.personas.push(persona.clone());
        state.links.insert(persona.id, shadow.id);
        Ok(())
    }

    async fn get_by_id(&self, id: &PersonaId) -> Result<Option<Persona>, RepositoryError> {
        let state = self.state.lock().unwrap();
        Ok(state.personas.iter().find(|p| p.id == *id).cloned())
    }

    async fn get_by_builtin_key(&self, key: &str) -> Result<Option<Persona>, RepositoryError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .personas
            .iter()
            .find(|p| p.builtin_key.as_deref() == Some(key))
            .cloned())
    }

    async fn list_public(&self) -> Result<Vec<Persona>, RepositoryError> {
        let state = self.state.lock().unwrap();
        Ok(state.personas.iter().filter(|p| p.is_public).cloned().collect())
    }

    async fn shadow_account_of(&self, persona_id: &PersonaId) -> Result<Option<AccountId>, RepositoryError> {
        let state = self.state.lock().unwrap();
        Ok(state.links.get(persona_id).copied())
    }

    async fn get_by_shadow_account(&self, account_id: &AccountId) -> Result<Option<Persona>, RepositoryError> {
        let state = self.state.lock().unwrap();
        let persona_id = state
            .links
            .iter()
            .find(|(_, a)| *a == account_id)
            .map(|(p, _)| *p);
        Ok(persona_id.and_then(|id| state.personas.iter().find(|p| p.id == id).cloned()))
    }
}

impl ConversationRepository for MemoryStore {
    async fn create(&self, conversation: &Conversation) -> Result<Conversation, RepositoryError> {
        let mut state = self.state.lock().unwrap();
        if let Some(key) = conversation.pair_key() {
            if state.lose_next_pair_race {
                state.lose_next_pair_race = false;
                let mut winner = conversation.clone();
                winner.id = ConversationId::new();
                state.conversations.push(winner);
                return Err(RepositoryError::Conflict("pair_key".to_string()));
            }
            if state.conversations.iter().any(|c| c.pair_key().as_ref() == Some(&key)) {
                return Err(RepositoryError::Conflict("pair_key".to_string()));
            }
        }
        state.conversations.push(conversation.clone());
        Ok(conversation.clone())
    }

    async fn get_by_id(&self, id: &ConversationId) -> Result<Option<Conversation>, RepositoryError> {
        let state = self.state.lock().unwrap();
        Ok(state.conversations.iter().find(|c| c.id == *id).cloned())
    }

    async fn get_by_pair_key(&self, pair_key: &str) -> Result<Option<Conversation>, RepositoryError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .conversations
            .iter()
            .find(|c| c.pair_key().as_deref() == Some(pair_key))
            .cloned())
    }

    async fn list_for_participant(&self, participant: &AccountId) -> Result<Vec<Conversation>, RepositoryError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .conversations
            .iter()
            .filter(|c| c.has_participant(participant))
            .cloned()
            .collect())
    }
}

impl MessageRepository for MemoryStore {
    async fn append(&self, message: NewMessage) -> Result<Message, RepositoryError> {
        let mut state = self.state.lock().unwrap();
        let latest = state
            .messages
            .iter()
            .filter(|m| m.conversation_id == message.conversation_id)
            .map(|m| m.created_at)
            .max();
        let created_at = match latest {
            Some(latest) if latest > message.created_at => latest,
            _ => message.created_at,
        };
        state.next_seq += 1;
        let stored = message.into_message(state.next_seq, created_at);
        state.messages.push(stored.clone());
        Ok(stored)
    }

    async fn get_by_id(&self, id: &MessageId) -> Result<Option<Message>, RepositoryError> {
        let state = self.state.lock().unwrap();
        Ok(state.messages.iter().find(|m| m.id == *id).cloned())
    }

    async fn recent(&self, conversation_id: &ConversationId, limit: usize) -> Result<Vec<Message>, RepositoryError> {
        let mut messages = self.list(conversation_id).await?;
        messages.reverse();
        messages.truncate(limit);
        Ok(messages)
    }

    async fn list(&self, conversation_id: &ConversationId) -> Result<Vec<Message>, RepositoryError> {
        let state = self.state.lock().unwrap();
        let mut messages: Vec<Message> = state
            .messages
            .iter()
            .filter(|m| m.conversation_id == *conversation_id)
            .cloned()
            .collect();
        messages.sort_by(|a, b| (a.created_at, a.seq).cmp(&(b.created_at, b.seq)));
        Ok(messages)
    }

    async fn delete(&self, id: &MessageId) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().unwrap();
        let before = state.messages.len();
        state.messages.retain(|m| m.id != *id);
        if state.messages.len() == before {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

/// Generation backend returning a fixed reply (or error) after an optional
/// delay, recording every request it receives.
#[derive(Clone)]
pub struct ScriptedBackend {
    reply: Result<String, GenerationError>,
    delay: Option<Duration>,
    echo: bool,
    requests: Arc<Mutex<Vec<GenerationRequest>>>,
}

impl ScriptedBackend {
    pub fn replying(text: &str) -> Self {
        Self {
            reply: Ok(text.to_string()),
            delay: None,
            echo: false,
            requests: Arc::default(),
        }
    }

    pub fn failing(error: GenerationError) -> Self {
        Self {
            reply: Err(error),
            ..Self::replying("")
        }
    }

    /// Reply with `re: {new_message}`.
    pub fn echoing() -> Self {
        Self {
            echo: true,
            ..Self::replying("")
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl GenerationBackend for ScriptedBackend {
    fn name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted-model"
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.echo {
            return Ok(format!("re: {}", request.new_message));
        }
        self.reply.clone()
    }
}

/// Publisher that keeps every event it is handed.
#[derive(Clone, Default)]
pub struct RecordingPublisher {
    events: Arc<Mutex<Vec<TurnEvent>>>,
    stall_first: Option<Duration>,
    stalled: Arc<AtomicBool>,
}

impl RecordingPublisher {
    /// Block the thread for `delay` before recording the first event.
    pub fn stalling_first(delay: Duration) -> Self {
        Self {
            stall_first: Some(delay),
            ..Self::default()
        }
    }

    pub fn events(&self) -> Vec<TurnEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl RealtimePublisher for RecordingPublisher {
    fn publish(&self, event: TurnEvent) {
        if let Some(delay) = self.stall_first {
            if !self.stalled.swap(true, Ordering::SeqCst) {
                std::thread::sleep(delay);
            }
        }
        self.events.lock().unwrap().push(event);
    }
}
