//! SQLite persona repository implementation.
//!
//! Persona profiles live in `personas`; the shadow identity mapping lives in
//! `persona_identities`. Provisioning writes the shadow account, the profile
//! and the mapping in one transaction.

use parley_core::repository::PersonaRepository;
use parley_types::account::{Account, AccountId};
use parley_types::error::RepositoryError;
use parley_types::persona::{Persona, PersonaId, ResponseStyle};
use sqlx::Row;

use super::account::insert_account;
use super::pool::DatabasePool;
use super::{format_datetime, map_insert_error, parse_datetime, query_error};

/// SQLite-backed implementation of `PersonaRepository`.
#[derive(Clone)]
pub struct SqlitePersonaRepository {
    pool: DatabasePool,
}

impl SqlitePersonaRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

struct PersonaRow {
    id: String,
    display_name: String,
    description: String,
    personality: String,
    background: String,
    response_style: String,
    system_prompt_override: Option<String>,
    builtin_key: Option<String>,
    owner_account_id: String,
    is_official: bool,
    is_public: bool,
    tags: String,
    created_at: String,
}

impl PersonaRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            display_name: row.try_get("display_name")?,
            description: row.try_get("description")?,
            personality: row.try_get("personality")?,
            background: row.try_get("background")?,
            response_style: row.try_get("response_style")?,
            system_prompt_override: row.try_get("system_prompt_override")?,
            builtin_key: row.try_get("builtin_key")?,
            owner_account_id: row.try_get("owner_account_id")?,
            is_official: row.try_get("is_official")?,
            is_public: row.try_get("is_public")?,
            tags: row.try_get("tags")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_persona(self) -> Result<Persona, RepositoryError> {
        let id = self
            .id
            .parse::<PersonaId>()
            .map_err(|e| RepositoryError::Query(format!("invalid persona id: {e}")))?;
        let owner_account_id = self
            .owner_account_id
            .parse::<AccountId>()
            .map_err(|e| RepositoryError::Query(format!("invalid owner id: {e}")))?;
        let response_style: ResponseStyle = self
            .response_style
            .parse()
            .map_err(|e: String| RepositoryError::Query(e))?;
        let tags: Vec<String> = serde_json::from_str(&self.tags)
            .map_err(|e| RepositoryError::Query(format!("invalid tags JSON: {e}")))?;

        Ok(Persona {
            id,
            display_name: self.display_name,
            description: self.description,
            personality: self.personality,
            background: self.background,
            response_style,
            system_prompt_override: self.system_prompt_override,
            builtin_key: self.builtin_key,
            owner_account_id,
            is_official: self.is_official,
            is_public: self.is_public,
            tags,
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

fn map_persona(row: Option<sqlx::sqlite::SqliteRow>) -> Result<Option<Persona>, RepositoryError> {
    match row {
        Some(row) => {
            let persona_row = PersonaRow::from_row(&row).map_err(query_error)?;
            Ok(Some(persona_row.into_persona()?))
        }
        None => Ok(None),
    }
}

impl PersonaRepository for SqlitePersonaRepository {
    async fn provision(&self, persona: &Persona, shadow: &Account) -> Result<(), RepositoryError> {
        let tags_json =
            serde_json::to_string(&persona.tags).map_err(|e| RepositoryError::Query(e.to_string()))?;

        let mut tx = self.pool.writer.begin().await.map_err(query_error)?;

        insert_account(&mut *tx, shadow).await?;

        sqlx::query(
            "INSERT INTO personas (id, display_name, description, personality, background, response_style, system_prompt_override, builtin_key, owner_account_id, is_official, is_public, tags, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(persona.id.to_string())
        .bind(&persona.display_name)
        .bind(&persona.description)
        .bind(&persona.personality)
        .bind(&persona.background)
        .bind(persona.response_style.to_string())
        .bind(&persona.system_prompt_override)
        .bind(&persona.builtin_key)
        .bind(persona.owner_account_id.to_string())
        .bind(persona.is_official)
        .bind(persona.is_public)
        .bind(&tags_json)
        .bind(format_datetime(&persona.created_at))
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            map_insert_error(e, || {
                format!(
                    "persona with builtin key '{}' already exists",
                    persona.builtin_key.as_deref().unwrap_or_default()
                )
            })
        })?;

        sqlx::query("INSERT INTO persona_identities (persona_id, account_id) VALUES (?, ?)")
            .bind(persona.id.to_string())
            .bind(shadow.id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_insert_error(e, || "shadow identity already linked".to_string()))?;

        tx.commit().await.map_err(query_error)?;
        Ok(())
    }

    async fn get_by_id(&self, id: &PersonaId) -> Result<Option<Persona>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM personas WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_error)?;
        map_persona(row)
    }

    async fn get_by_builtin_key(&self, key: &str) -> Result<Option<Persona>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM personas WHERE builtin_key = ?")
            .bind(key.to_lowercase())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_error)?;
        map_persona(row)
    }

    async fn list_public(&self) -> Result<Vec<Persona>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM personas WHERE is_public = 1 ORDER BY created_at ASC")
            .fetch_all(&self.pool.reader)
            .await
            .map_err(query_error)?;

        rows.iter()
            .map(|row| {
                PersonaRow::from_row(row)
                    .map_err(query_error)
                    .and_then(PersonaRow::into_persona)
            })
            .collect()
    }

    async fn shadow_account_of(&self, persona_id: &PersonaId) -> Result<Option<AccountId>, RepositoryError> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT account_id FROM persona_identities WHERE persona_id = ?")
                .bind(persona_id.to_string())
                .fetch_optional(&self.pool.reader)
                .await
                .map_err(query_error)?;

        row.map(|(id,)| {
            id.parse::<AccountId>()
                .map_err(|e| RepositoryError::Query(format!("invalid account id: {e}")))
        })
        .transpose()
    }

    async fn get_by_shadow_account(&self, account_id: &AccountId) -> Result<Option<Persona>, RepositoryError> {
        let row = sqlx::query(
            "SELECT p.* FROM personas p
             JOIN persona_identities i ON i.persona_id = p.id
             WHERE i.account_id = ?",
        )
        .bind(account_id.to_string())
        .fetch_optional(&self.pool.reader)
        .await
        .map_err(query_error)?;
        map_persona(row)
    }
}
