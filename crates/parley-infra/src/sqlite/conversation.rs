//! SQLite conversation repository implementation.
//!
//! Participants are stored in `conversation_participants` with their join
//! position. Direct conversations carry a `pair_key` with a UNIQUE
//! constraint; a duplicate insert surfaces as `RepositoryError::Conflict`.

use parley_core::repository::ConversationRepository;
use parley_types::account::AccountId;
use parley_types::conversation::{Conversation, ConversationId};
use parley_types::error::RepositoryError;
use sqlx::Row;

use super::pool::DatabasePool;
use super::{format_datetime, map_insert_error, parse_datetime, query_error};

/// SQLite-backed implementation of `ConversationRepository`.
#[derive(Clone)]
pub struct SqliteConversationRepository {
    pool: DatabasePool,
}

impl SqliteConversationRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    async fn participants_of(&self, id: &str) -> Result<Vec<AccountId>, RepositoryError> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT account_id FROM conversation_participants
             WHERE conversation_id = ? ORDER BY position ASC",
        )
        .bind(id)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(query_error)?;

        rows.into_iter()
            .map(|(account_id,)| {
                account_id
                    .parse::<AccountId>()
                    .map_err(|e| RepositoryError::Query(format!("invalid account id: {e}")))
            })
            .collect()
    }

    async fn hydrate(&self, row: ConversationRow) -> Result<Conversation, RepositoryError> {
        let participants = self.participants_of(&row.id).await?;
        row.into_conversation(participants)
    }
}

struct ConversationRow {
    id: String,
    is_group: bool,
    group_name: Option<String>,
    created_by: String,
    created_at: String,
}

impl ConversationRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            is_group: row.try_get("is_group")?,
            group_name: row.try_get("group_name")?,
            created_by: row.try_get("created_by")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_conversation(self, participants: Vec<AccountId>) -> Result<Conversation, RepositoryError> {
        let id = self
            .id
            .parse::<ConversationId>()
            .map_err(|e| RepositoryError::Query(format!("invalid conversation id: {e}")))?;
        let created_by = self
            .created_by
            .parse::<AccountId>()
            .map_err(|e| RepositoryError::Query(format!("invalid account id: {e}")))?;

        Ok(Conversation {
            id,
            participants,
            is_group: self.is_group,
            group_name: self.group_name,
            created_by,
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

impl ConversationRepository for SqliteConversationRepository {
    async fn create(&self, conversation: &Conversation) -> Result<Conversation, RepositoryError> {
        let mut tx = self.pool.writer.begin().await.map_err(query_error)?;

        sqlx::query(
            "INSERT INTO conversations (id, is_group, group_name, pair_key, created_by, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(conversation.id.to_string())
        .bind(conversation.is_group)
        .bind(&conversation.group_name)
        .bind(conversation.pair_key())
        .bind(conversation.created_by.to_string())
        .bind(format_datetime(&conversation.created_at))
        .execute(&mut *tx)
        .await
        .map_err(|e| map_insert_error(e, || "conversation for this pair already exists".to_string()))?;

        for (position, participant) in conversation.participants.iter().enumerate() {
            sqlx::query(
                "INSERT INTO conversation_participants (conversation_id, account_id, position)
                 VALUES (?, ?, ?)",
            )
            .bind(conversation.id.to_string())
            .bind(participant.to_string())
            .bind(position as i64)
            .execute(&mut *tx)
            .await
            .map_err(query_error)?;
        }

        tx.commit().await.map_err(query_error)?;
        Ok(conversation.clone())
    }

    async fn get_by_id(&self, id: &ConversationId) -> Result<Option<Conversation>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM conversations WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_error)?;

        match row {
            Some(row) => {
                let conv_row = ConversationRow::from_row(&row).map_err(query_error)?;
                Ok(Some(self.hydrate(conv_row).await?))
            }
            None => Ok(None),
        }
    }

    async fn get_by_pair_key(&self, pair_key: &str) -> Result<Option<Conversation>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM conversations WHERE pair_key = ?")
            .bind(pair_key)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_error)?;

        match row {
            Some(row) => {
                let conv_row = ConversationRow::from_row(&row).map_err(query_error)?;
                Ok(Some(self.hydrate(conv_row).await?))
            }
            None => Ok(None),
        }
    }

    async fn list_for_participant(&self, participant: &AccountId) -> Result<Vec<Conversation>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT c.* FROM conversations c
             JOIN conversation_participants p ON p.conversation_id = c.id
             WHERE p.account_id = ?
             ORDER BY c.created_at DESC",
        )
        .bind(participant.to_string())
        .fetch_all(&self.pool.reader)
        .await
        .map_err(query_error)?;

        let mut conversations = Vec::with_capacity(rows.len());
        for row in &rows {
            let conv_row = ConversationRow::from_row(row).map_err(query_error)?;
            conversations.push(self.hydrate(conv_row).await?);
        }
        Ok(conversations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::account::SqliteAccountRepository;
    use crate::sqlite::test_support::test_pool;
    use parley_core::conversation::ConversationStore;
    use parley_core::repository::AccountRepository;
    use parley_types::account::Account;
    use parley_types::conversation::pair_key;

    async fn setup(handles: &[&str]) -> (SqliteConversationRepository, Vec<AccountId>) {
        let pool = test_pool().await;
        let accounts = SqliteAccountRepository::new(pool.clone());
        let mut ids = Vec::new();
        for handle in handles {
            let account = Account::new(*handle, *handle);
            accounts.create(&account).await.unwrap();
            ids.push(account.id);
        }
        (SqliteConversationRepository::new(pool), ids)
    }

    #[tokio::test]
    async fn test_create_and_get_direct() {
        let (repo, ids) = setup(&["a", "b"]).await;
        let conv = Conversation::direct(ids[0], ids[1], ids[0]);
        repo.create(&conv).await.unwrap();

        let found = repo.get_by_id(&conv.id).await.unwrap().unwrap();
        assert_eq!(found.participants, vec![ids[0], ids[1]]);
        assert!(!found.is_group);

        let key = conv.pair_key().unwrap();
        let by_key = repo.get_by_pair_key(&key).await.unwrap().unwrap();
        assert_eq!(by_key.id, conv.id);
    }

    #[tokio::test]
    async fn test_duplicate_pair_conflicts() {
        let (repo, ids) = setup(&["a", "b"]).await;
        repo.create(&Conversation::direct(ids[0], ids[1], ids[0]))
            .await
            .unwrap();

        let err = repo
            .create(&Conversation::direct(ids[1], ids[0], ids[1]))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_groups_do_not_share_pair_key() {
        let (repo, ids) = setup(&["a", "b"]).await;
        repo.create(&Conversation::group(ids.clone(), Some("one".into()), ids[0]))
            .await
            .unwrap();
        repo.create(&Conversation::group(ids.clone(), Some("two".into()), ids[0]))
            .await
            .unwrap();

        let listed = repo.list_for_participant(&ids[1]).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert!(listed.iter().all(|c| c.is_group));
    }

    #[tokio::test]
    async fn test_concurrent_find_or_create_direct_yields_one_row() {
        let pool = test_pool().await;
        let accounts = SqliteAccountRepository::new(pool.clone());
        let store = ConversationStore::new(SqliteConversationRepository::new(pool.clone()));

        for round in 0..5 {
            let a = Account::new(format!("a{round}"), "A");
            let b = Account::new(format!("b{round}"), "B");
            accounts.create(&a).await.unwrap();
            accounts.create(&b).await.unwrap();

            let (first, second) = tokio::join!(
                store.find_or_create_direct(&a.id, &b.id, &a.id),
                store.find_or_create_direct(&b.id, &a.id, &b.id),
            );
            assert_eq!(first.unwrap().id, second.unwrap().id);

            let (rows,): (i64,) =
                sqlx::query_as("SELECT COUNT(*) FROM conversations WHERE pair_key = ?")
                    .bind(pair_key(&a.id, &b.id))
                    .fetch_one(&pool.reader)
                    .await
                    .unwrap();
            assert_eq!(rows, 1);
        }
    }

    #[tokio::test]
    async fn test_list_for_participant_filters() {
        let (repo, ids) = setup(&["a", "b", "c"]).await;
        repo.create(&Conversation::direct(ids[0], ids[1], ids[0]))
            .await
            .unwrap();
        repo.create(&Conversation::direct(ids[1], ids[2], ids[1]))
            .await
            .unwrap();

        assert_eq!(repo.list_for_participant(&ids[0]).await.unwrap().len(), 1);
        assert_eq!(repo.list_for_participant(&ids[1]).await.unwrap().len(), 2);
    }
}
