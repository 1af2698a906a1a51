//! Suggestion repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres, Row};
use tracing::info;
use uuid::Uuid;

use sift_core::{
    Error, Result, Suggestion, SuggestionRepository, SuggestionStatus, SuggestionType,
};

/// PostgreSQL implementation of SuggestionRepository.
#[derive(Clone)]
pub struct PgSuggestionRepository {
    pool: Pool<Postgres>,
}

impl PgSuggestionRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    fn parse_row(row: sqlx::postgres::PgRow) -> Suggestion {
        Suggestion {
            id: row.get("id"),
            extraction_id: row.get("extraction_id"),
            suggestion_type: SuggestionType::parse(row.get("type")),
            payload: row.get("payload"),
            status: SuggestionStatus::parse(row.get("status")),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }
    }

    /// Set a suggestion's status unconditionally. Accept and reject share
    /// this; resolving an already-resolved suggestion overwrites the status
    /// rather than erroring.
    async fn set_status(&self, id: Uuid, status: SuggestionStatus) -> Result<Suggestion> {
        let row = sqlx::query(&format!(
            "UPDATE suggestions SET status = $1, updated_at = $2
             WHERE id = $3
             RETURNING {SUGGESTION_COLUMNS}"
        ))
        .bind(status.as_str())
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        let suggestion = row
            .map(Self::parse_row)
            .ok_or(Error::SuggestionNotFound(id))?;

        info!(
            subsystem = "db",
            component = "suggestions",
            op = "resolve",
            suggestion_id = %id,
            status = status.as_str(),
            "Suggestion resolved"
        );

        Ok(suggestion)
    }
}

const SUGGESTION_COLUMNS: &str =
    "id, extraction_id, type, payload, status, created_at, updated_at";

#[async_trait]
impl SuggestionRepository for PgSuggestionRepository {
    async fn get(&self, id: Uuid) -> Result<Option<Suggestion>> {
        let row = sqlx::query(&format!(
            "SELECT {SUGGESTION_COLUMNS} FROM suggestions WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(Self::parse_row))
    }

    async fn list_for_extraction(&self, extraction_id: Uuid) -> Result<Vec<Suggestion>> {
        // UUIDv7 ids are time-ordered, so id ASC is creation order even when
        // rows share a created_at timestamp.
        let rows = sqlx::query(&format!(
            "SELECT {SUGGESTION_COLUMNS} FROM suggestions
             WHERE extraction_id = $1
             ORDER BY id ASC"
        ))
        .bind(extraction_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.into_iter().map(Self::parse_row).collect())
    }

    async fn list_for_workspace(
        &self,
        workspace_id: Uuid,
        status: Option<SuggestionStatus>,
        suggestion_type: Option<SuggestionType>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Suggestion>> {
        let mut conditions = vec!["i.workspace_id = $1".to_string()];
        let mut param_idx = 2;

        if status.is_some() {
            conditions.push(format!("s.status = ${param_idx}"));
            param_idx += 1;
        }
        if suggestion_type.is_some() {
            conditions.push(format!("s.type = ${param_idx}"));
            param_idx += 1;
        }

        let query = format!(
            "SELECT s.id, s.extraction_id, s.type, s.payload, s.status, s.created_at, s.updated_at
             FROM suggestions s
             JOIN extractions e ON e.id = s.extraction_id
             JOIN inbox_items i ON i.id = e.inbox_item_id
             WHERE {}
             ORDER BY s.created_at DESC, s.id DESC
             LIMIT ${} OFFSET ${}",
            conditions.join(" AND "),
            param_idx,
            param_idx + 1
        );

        let mut q = sqlx::query(&query).bind(workspace_id);
        if let Some(s) = status {
            q = q.bind(s.as_str());
        }
        if let Some(t) = suggestion_type {
            q = q.bind(t.as_str());
        }
        q = q.bind(limit).bind(offset);

        let rows = q.fetch_all(&self.pool).await.map_err(Error::Database)?;
        Ok(rows.into_iter().map(Self::parse_row).collect())
    }

    async fn accept(&self, id: Uuid) -> Result<Suggestion> {
        self.set_status(id, SuggestionStatus::Accepted).await
    }

    async fn reject(&self, id: Uuid) -> Result<Suggestion> {
        self.set_status(id, SuggestionStatus::Rejected).await
    }
}
