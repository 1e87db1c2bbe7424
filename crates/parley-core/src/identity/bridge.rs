//! Persona token/profile and shadow identity lookups.
//!
//! Every lookup goes through stored identities. Handles and display names
//! are never used to decide whether an account belongs to a persona.

use parley_types::account::AccountId;
use parley_types::conversation::Conversation;
use parley_types::error::ChatError;
use parley_types::participant::{Classification, ParticipantRef};
use parley_types::persona::{Persona, PersonaId};
use tracing::error;
use uuid::Uuid;

use crate::repository::{AccountRepository, PersonaRepository};

/// Read-only mapping between personas and the accounts that speak for them.
pub struct IdentityBridge<A: AccountRepository, P: PersonaRepository> {
    accounts: A,
    personas: P,
}

impl<A: AccountRepository, P: PersonaRepository> IdentityBridge<A, P> {
    pub fn new(accounts: A, personas: P) -> Self {
        Self { accounts, personas }
    }

    pub fn accounts(&self) -> &A {
        &self.accounts
    }

    pub fn personas(&self) -> &P {
        &self.personas
    }

    /// Resolve a client-supplied persona token.
    ///
    /// A token that parses as a UUID is a profile id; anything else is a
    /// built-in key, matched case-insensitively. The persona must also have
    /// a provisioned shadow identity.
    pub async fn resolve_persona_by_token(&self, token: &str) -> Result<Persona, ChatError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(ChatError::Validation("persona token is required".to_string()));
        }

        let persona = match Uuid::parse_str(token) {
            Ok(uuid) => {
                self.personas
                    .get_by_id(&PersonaId::from_uuid(uuid))
                    .await?
            }
            Err(_) => {
                self.personas
                    .get_by_builtin_key(&token.to_lowercase())
                    .await?
            }
        };

        let Some(persona) = persona else {
            return Err(ChatError::PersonaUnresolved(format!(
                "no persona matches token '{token}'"
            )));
        };

        self.shadow_identity_of(&persona).await?;
        Ok(persona)
    }

    /// The account that sends messages on behalf of `persona`.
    pub async fn shadow_identity_of(&self, persona: &Persona) -> Result<AccountId, ChatError> {
        let Some(account_id) = self.personas.shadow_account_of(&persona.id).await? else {
            error!(
                persona_id = %persona.id,
                persona = %persona.display_name,
                "Persona has no shadow identity; provisioning is incomplete"
            );
            return Err(ChatError::PersonaUnresolved(format!(
                "persona '{}' has no shadow identity",
                persona.display_name
            )));
        };

        if self.accounts.get_by_id(&account_id).await?.is_none() {
            error!(
                persona_id = %persona.id,
                account_id = %account_id,
                "Shadow identity account is missing"
            );
            return Err(ChatError::PersonaUnresolved(format!(
                "shadow identity of persona '{}' does not exist",
                persona.display_name
            )));
        }

        Ok(account_id)
    }

    /// Classify an identity as Human or Persona.
    ///
    /// Returns `None` for an id that is neither an account nor a shadow
    /// identity (an orphaned sender).
    pub async fn classify(&self, id: &AccountId) -> Result<Option<Classification>, ChatError> {
        if let Some(persona) = self.personas.get_by_shadow_account(id).await? {
            return Ok(Some(Classification::Persona(persona)));
        }
        match self.accounts.get_by_id(id).await? {
            Some(_) => Ok(Some(Classification::Human)),
            None => Ok(None),
        }
    }

    /// Resolve a tagged participant reference to the identity stored in
    /// conversations.
    pub async fn resolve_participant(&self, participant: &ParticipantRef) -> Result<AccountId, ChatError> {
        match participant {
            ParticipantRef::Account(id) => match self.accounts.get_by_id(id).await? {
                Some(account) => Ok(account.id),
                None => Err(ChatError::AccountNotFound),
            },
            ParticipantRef::Persona(id) => {
                let Some(persona) = self.personas.get_by_id(id).await? else {
                    return Err(ChatError::PersonaUnresolved(format!("persona {id} does not exist")));
                };
                self.shadow_identity_of(&persona).await
            }
        }
    }

    /// The first participant of `conversation` that is a persona.
    pub async fn persona_in(&self, conversation: &Conversation) -> Result<Option<Persona>, ChatError> {
        for participant in &conversation.participants {
            if let Some(persona) = self.personas.get_by_shadow_account(participant).await? {
                return Ok(Some(persona));
            }
        }
        Ok(None)
    }
}
