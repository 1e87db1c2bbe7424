//! Account repository trait definition.

use parley_types::account::{Account, AccountId};
use parley_types::error::RepositoryError;

/// Repository trait for account persistence.
///
/// Covers human accounts and persona shadow identities alike; nothing in an
/// account row says which one it is.
pub trait AccountRepository: Send + Sync {
    /// Create a new account. Fails with `Conflict` when the handle is taken.
    fn create(
        &self,
        account: &Account,
    ) -> impl std::future::Future<Output = Result<Account, RepositoryError>> + Send;

    fn get_by_id(
        &self,
        id: &AccountId,
    ) -> impl std::future::Future<Output = Result<Option<Account>, RepositoryError>> + Send;

    fn get_by_handle(
        &self,
        handle: &str,
    ) -> impl std::future::Future<Output = Result<Option<Account>, RepositoryError>> + Send;

    /// Store the SHA-256 hex hash of a bearer token for an account.
    fn add_token(
        &self,
        account_id: &AccountId,
        token_hash: &str,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Look up the account owning a bearer token hash.
    fn get_by_token_hash(
        &self,
        token_hash: &str,
    ) -> impl std::future::Future<Output = Result<Option<Account>, RepositoryError>> + Send;
}
