//! Persona provisioning: creates a persona together with its shadow account.
//!
//! This runs once per persona, at creation time. The bridge assumes every
//! persona it sees went through here.

use chrono::Utc;
use parley_types::account::{Account, AccountId, handle_from_name};
use parley_types::error::{ChatError, RepositoryError};
use parley_types::persona::{NewPersona, Persona, PersonaId};
use tracing::info;

use crate::persona::PersonaCatalog;
use crate::repository::{AccountRepository, PersonaRepository};

/// Handle of the account that owns the built-in personas.
pub const SYSTEM_HANDLE: &str = "system";

/// Check a handle requested for a human account.
///
/// `system` belongs to the built-in persona owner and dotted handles are
/// shadow identities, so neither can be claimed by a person.
pub fn check_human_handle(handle: &str) -> Result<(), ChatError> {
    if handle.is_empty() {
        return Err(ChatError::Validation("handle must not be empty".to_string()));
    }
    if handle == SYSTEM_HANDLE || handle.contains('.') {
        return Err(ChatError::Validation(format!("handle '{handle}' is reserved")));
    }
    Ok(())
}

/// Creates persona profiles, their shadow accounts, and the link between them.
pub struct PersonaProvisioner<A: AccountRepository, P: PersonaRepository> {
    accounts: A,
    personas: P,
}

impl<A: AccountRepository, P: PersonaRepository> PersonaProvisioner<A, P> {
    pub fn new(accounts: A, personas: P) -> Self {
        Self { accounts, personas }
    }

    /// Provision a new persona owned by `owner`.
    pub async fn provision(
        &self,
        owner: &AccountId,
        request: NewPersona,
    ) -> Result<(Persona, Account), ChatError> {
        let display_name = request.display_name.trim().to_string();
        if display_name.is_empty() {
            return Err(ChatError::Validation("persona name is required".to_string()));
        }
        if handle_from_name(&display_name).is_empty() {
            return Err(ChatError::Validation(format!(
                "persona name '{display_name}' has no usable characters"
            )));
        }

        let persona = Persona {
            id: PersonaId::new(),
            display_name: display_name.clone(),
            description: request.description,
            personality: request.personality,
            background: request.background,
            response_style: request.response_style,
            system_prompt_override: request.system_prompt_override,
            builtin_key: request.builtin_key.map(|k| k.to_lowercase()),
            owner_account_id: *owner,
            is_official: request.is_official,
            is_public: true,
            tags: request.tags,
            created_at: Utc::now(),
        };

        let shadow = Account::new(shadow_handle(&persona), display_name);

        self.personas
            .provision(&persona, &shadow)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(msg) => {
                    ChatError::Validation(format!("persona already exists: {msg}"))
                }
                other => other.into(),
            })?;

        info!(
            persona_id = %persona.id,
            account_id = %shadow.id,
            persona = %persona.display_name,
            "Persona provisioned"
        );
        Ok((persona, shadow))
    }

    /// Get or create the account that owns the built-in personas.
    pub async fn ensure_system_account(&self) -> Result<Account, ChatError> {
        if let Some(account) = self.accounts.get_by_handle(SYSTEM_HANDLE).await? {
            return Ok(account);
        }
        let account = Account::new(SYSTEM_HANDLE, "Parley");
        Ok(self.accounts.create(&account).await?)
    }

    /// Provision every catalog entry that is not already present.
    ///
    /// Returns only the personas created by this call.
    pub async fn seed_builtins(
        &self,
        catalog: &PersonaCatalog,
        owner: &AccountId,
    ) -> Result<Vec<Persona>, ChatError> {
        let mut created = Vec::new();
        for entry in catalog.entries() {
            if self
                .personas
                .get_by_builtin_key(&entry.key.to_lowercase())
                .await?
                .is_some()
            {
                continue;
            }

            let request = NewPersona {
                display_name: entry.display_name.clone(),
                description: entry.description.clone(),
                personality: entry.personality.clone(),
                background: entry.background.clone(),
                response_style: entry.response_style,
                system_prompt_override: None,
                builtin_key: Some(entry.key.clone()),
                is_official: true,
                tags: entry.tags.clone(),
            };
            let (persona, _) = self.provision(owner, request).await?;
            created.push(persona);
        }
        Ok(created)
    }
}

/// Shadow handle: the name-derived handle plus a suffix of the persona id, so
/// two personas with the same name never collide.
fn shadow_handle(persona: &Persona) -> String {
    let id = persona.id.to_string();
    let suffix = &id[id.len() - 8..];
    format!("{}.{suffix}", handle_from_name(&persona.display_name))
}
