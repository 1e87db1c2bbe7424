//! Persona repository trait definition.

use parley_types::account::{Account, AccountId};
use parley_types::error::RepositoryError;
use parley_types::persona::{Persona, PersonaId};

/// Repository trait for persona profiles and their shadow identity links.
pub trait PersonaRepository: Send + Sync {
    /// Store a persona, its shadow account, and the link between them in a
    /// single unit of work.
    ///
    /// Fails with `Conflict` if the built-in key or the shadow handle is
    /// already in use.
    fn provision(
        &self,
        persona: &Persona,
        shadow: &Account,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    fn get_by_id(
        &self,
        id: &PersonaId,
    ) -> impl std::future::Future<Output = Result<Option<Persona>, RepositoryError>> + Send;

    /// Look up a built-in persona. Keys are stored lowercase.
    fn get_by_builtin_key(
        &self,
        key: &str,
    ) -> impl std::future::Future<Output = Result<Option<Persona>, RepositoryError>> + Send;

    /// Public personas, oldest first.
    fn list_public(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<Persona>, RepositoryError>> + Send;

    /// The shadow account linked to a persona, if one was provisioned.
    fn shadow_account_of(
        &self,
        persona_id: &PersonaId,
    ) -> impl std::future::Future<Output = Result<Option<AccountId>, RepositoryError>> + Send;

    /// The persona whose shadow account is `account_id`, if any.
    fn get_by_shadow_account(
        &self,
        account_id: &AccountId,
    ) -> impl std::future::Future<Output = Result<Option<Persona>, RepositoryError>> + Send;
}
