//! SQLite message repository implementation.
//!
//! `seq` is the table's AUTOINCREMENT rowid, so it grows with every insert.
//! Appends run in a writer transaction that reads the conversation's latest
//! timestamp first and clamps the new message to it, which keeps
//! `(created_at, seq)` non-decreasing within a conversation.

use parley_core::repository::MessageRepository;
use parley_types::account::AccountId;
use parley_types::conversation::ConversationId;
use parley_types::error::RepositoryError;
use parley_types::message::{Message, MessageId, NewMessage};
use sqlx::Row;

use super::pool::DatabasePool;
use super::{format_datetime, map_insert_error, parse_datetime, query_error};

/// SQLite-backed implementation of `MessageRepository`.
#[derive(Clone)]
pub struct SqliteMessageRepository {
    pool: DatabasePool,
}

impl SqliteMessageRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

struct MessageRow {
    seq: i64,
    id: String,
    conversation_id: String,
    sender_id: String,
    content: String,
    created_at: String,
}

impl MessageRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            seq: row.try_get("seq")?,
            id: row.try_get("id")?,
            conversation_id: row.try_get("conversation_id")?,
            sender_id: row.try_get("sender_id")?,
            content: row.try_get("content")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_message(self) -> Result<Message, RepositoryError> {
        Ok(Message {
            id: self
                .id
                .parse::<MessageId>()
                .map_err(|e| RepositoryError::Query(format!("invalid message id: {e}")))?,
            conversation_id: self
                .conversation_id
                .parse::<ConversationId>()
                .map_err(|e| RepositoryError::Query(format!("invalid conversation id: {e}")))?,
            sender_id: self
                .sender_id
                .parse::<AccountId>()
                .map_err(|e| RepositoryError::Query(format!("invalid sender id: {e}")))?,
            content: self.content,
            created_at: parse_datetime(&self.created_at)?,
            seq: self.seq,
        })
    }
}

fn map_messages(rows: &[sqlx::sqlite::SqliteRow]) -> Result<Vec<Message>, RepositoryError> {
    rows.iter()
        .map(|row| {
            MessageRow::from_row(row)
                .map_err(query_error)
                .and_then(MessageRow::into_message)
        })
        .collect()
}

impl MessageRepository for SqliteMessageRepository {
    async fn append(&self, message: NewMessage) -> Result<Message, RepositoryError> {
        let mut tx = self.pool.writer.begin().await.map_err(query_error)?;

        let latest: Option<(String,)> = sqlx::query_as(
            "SELECT created_at FROM messages WHERE conversation_id = ?
             ORDER BY created_at DESC, seq DESC LIMIT 1",
        )
        .bind(message.conversation_id.to_string())
        .fetch_optional(&mut *tx)
        .await
        .map_err(query_error)?;

        let mut created_at = message.created_at;
        if let Some((latest,)) = latest {
            let latest = parse_datetime(&latest)?;
            if latest > created_at {
                created_at = latest;
            }
        }

        let result = sqlx::query(
            "INSERT INTO messages (id, conversation_id, sender_id, content, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(message.id.to_string())
        .bind(message.conversation_id.to_string())
        .bind(message.sender_id.to_string())
        .bind(&message.content)
        .bind(format_datetime(&created_at))
        .execute(&mut *tx)
        .await
        .map_err(|e| map_insert_error(e, || format!("message {} already exists", message.id)))?;

        tx.commit().await.map_err(query_error)?;

        // Stored timestamps have microsecond precision; return what was stored.
        let created_at = parse_datetime(&format_datetime(&created_at))?;
        Ok(message.into_message(result.last_insert_rowid(), created_at))
    }

    async fn get_by_id(&self, id: &MessageId) -> Result<Option<Message>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM messages WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_error)?;

        match row {
            Some(row) => {
                let message_row = MessageRow::from_row(&row).map_err(query_error)?;
                Ok(Some(message_row.into_message()?))
            }
            None => Ok(None),
        }
    }

    async fn recent(&self, conversation_id: &ConversationId, limit: usize) -> Result<Vec<Message>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT * FROM messages WHERE conversation_id = ?
             ORDER BY created_at DESC, seq DESC LIMIT ?",
        )
        .bind(conversation_id.to_string())
        .bind(limit as i64)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(query_error)?;
        map_messages(&rows)
    }

    async fn list(&self, conversation_id: &ConversationId) -> Result<Vec<Message>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT * FROM messages WHERE conversation_id = ?
             ORDER BY created_at ASC, seq ASC",
        )
        .bind(conversation_id.to_string())
        .fetch_all(&self.pool.reader)
        .await
        .map_err(query_error)?;
        map_messages(&rows)
    }

    async fn delete(&self, id: &MessageId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM messages WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool.writer)
            .await
            .map_err(query_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::account::SqliteAccountRepository;
    use crate::sqlite::conversation::SqliteConversationRepository;
    use crate::sqlite::test_support::test_pool;
    use chrono::Duration;
    use parley_core::repository::{AccountRepository, ConversationRepository};
    use parley_types::account::Account;
    use parley_types::conversation::Conversation;

    async fn setup() -> (SqliteMessageRepository, Conversation) {
        let pool = test_pool().await;
        let accounts = SqliteAccountRepository::new(pool.clone());
        let a = Account::new("a", "A");
        let b = Account::new("b", "B");
        accounts.create(&a).await.unwrap();
        accounts.create(&b).await.unwrap();

        let conv = Conversation::direct(a.id, b.id, a.id);
        SqliteConversationRepository::new(pool.clone())
            .create(&conv)
            .await
            .unwrap();
        (SqliteMessageRepository::new(pool), conv)
    }

    #[tokio::test]
    async fn test_append_assigns_increasing_seq() {
        let (repo, conv) = setup().await;
        let sender = conv.participants[0];

        let first = repo
            .append(NewMessage::new(conv.id, sender, "one".into()))
            .await
            .unwrap();
        let second = repo
            .append(NewMessage::new(conv.id, sender, "two".into()))
            .await
            .unwrap();

        assert!(second.seq > first.seq);
        let stored = repo.get_by_id(&second.id).await.unwrap().unwrap();
        assert_eq!(stored, second);
    }

    #[tokio::test]
    async fn test_append_clamps_backdated_timestamp() {
        let (repo, conv) = setup().await;
        let sender = conv.participants[0];

        let first = repo
            .append(NewMessage::new(conv.id, sender, "now".into()))
            .await
            .unwrap();

        let mut backdated = NewMessage::new(conv.id, sender, "from the past".into());
        backdated.created_at = first.created_at - Duration::seconds(30);
        let second = repo.append(backdated).await.unwrap();

        assert_eq!(second.created_at, first.created_at);
        let listed = repo.list(&conv.id).await.unwrap();
        assert_eq!(listed.last().unwrap().id, second.id);
    }

    #[tokio::test]
    async fn test_recent_and_list_ordering() {
        let (repo, conv) = setup().await;
        for i in 0..5 {
            repo.append(NewMessage::new(conv.id, conv.participants[i % 2], format!("m{i}")))
                .await
                .unwrap();
        }

        let recent = repo.recent(&conv.id, 3).await.unwrap();
        let contents: Vec<&str> = recent.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["m4", "m3", "m2"]);

        let listed = repo.list(&conv.id).await.unwrap();
        assert_eq!(listed.len(), 5);
        assert_eq!(listed[0].content, "m0");
    }

    #[tokio::test]
    async fn test_delete() {
        let (repo, conv) = setup().await;
        let keep = repo
            .append(NewMessage::new(conv.id, conv.participants[0], "keep".into()))
            .await
            .unwrap();
        let gone = repo
            .append(NewMessage::new(conv.id, conv.participants[0], "gone".into()))
            .await
            .unwrap();

        repo.delete(&gone.id).await.unwrap();
        assert!(matches!(repo.delete(&gone.id).await, Err(RepositoryError::NotFound)));

        let listed = repo.list(&conv.id).await.unwrap();
        assert_eq!(listed, vec![keep]);
    }
}
