//! Extraction repository implementation.
//!
//! The write path here is the pipeline's single atomicity boundary: one
//! extraction row, its suggestions, and the inbox item's move to Parsed
//! commit together or not at all.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value as JsonValue;
use sqlx::{Pool, Postgres, Row};
use tracing::info;
use uuid::Uuid;

use sift_core::{
    Error, Extraction, ExtractionRepository, NewSuggestion, Result,
};

/// PostgreSQL implementation of ExtractionRepository.
#[derive(Clone)]
pub struct PgExtractionRepository {
    pool: Pool<Postgres>,
}

impl PgExtractionRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    fn parse_row(row: sqlx::postgres::PgRow) -> Extraction {
        Extraction {
            id: row.get("id"),
            inbox_item_id: row.get("inbox_item_id"),
            model_version: row.get("model_version"),
            prompt_version: row.get("prompt_version"),
            raw_response: row.get("raw_response"),
            created_at: row.get("created_at"),
        }
    }
}

const EXTRACTION_COLUMNS: &str =
    "id, inbox_item_id, model_version, prompt_version, raw_response, created_at";

#[async_trait]
impl ExtractionRepository for PgExtractionRepository {
    async fn record_run(
        &self,
        inbox_item_id: Uuid,
        model_version: &str,
        prompt_version: &str,
        raw_response: JsonValue,
        suggestions: Vec<NewSuggestion>,
    ) -> Result<Extraction> {
        let extraction_id = Uuid::now_v7();
        let now = Utc::now();

        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        // Lock the item row so concurrent runs serialize on it.
        let exists: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM inbox_items WHERE id = $1 FOR UPDATE")
                .bind(inbox_item_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(Error::Database)?;
        if exists.is_none() {
            return Err(Error::InboxItemNotFound(inbox_item_id));
        }

        let row = sqlx::query(&format!(
            "INSERT INTO extractions
                 (id, inbox_item_id, model_version, prompt_version, raw_response, created_at)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {EXTRACTION_COLUMNS}"
        ))
        .bind(extraction_id)
        .bind(inbox_item_id)
        .bind(model_version)
        .bind(prompt_version)
        .bind(&raw_response)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(Error::Database)?;

        // Insert suggestions in materialization order. UUIDv7 ids preserve
        // that order under the default index scan.
        let suggestion_count = suggestions.len();
        for suggestion in &suggestions {
            sqlx::query(
                "INSERT INTO suggestions
                     (id, extraction_id, type, payload, status, created_at, updated_at)
                 VALUES ($1, $2, $3, $4, 'proposed', $5, $5)",
            )
            .bind(Uuid::now_v7())
            .bind(extraction_id)
            .bind(suggestion.suggestion_type.as_str())
            .bind(&suggestion.payload)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;
        }

        // New -> Parsed. A re-run over an already-parsed or archived item
        // records the extraction but leaves the status untouched; item status
        // never moves backwards.
        sqlx::query(
            "UPDATE inbox_items SET status = 'parsed', updated_at = $1
             WHERE id = $2 AND status = 'new'",
        )
        .bind(now)
        .bind(inbox_item_id)
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;

        tx.commit().await.map_err(Error::Database)?;

        info!(
            subsystem = "db",
            component = "extractions",
            op = "record_run",
            inbox_item_id = %inbox_item_id,
            extraction_id = %extraction_id,
            suggestion_count = suggestion_count,
            model = model_version,
            "Extraction run recorded"
        );

        Ok(Self::parse_row(row))
    }

    async fn get(&self, id: Uuid) -> Result<Option<Extraction>> {
        let row = sqlx::query(&format!(
            "SELECT {EXTRACTION_COLUMNS} FROM extractions WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(Self::parse_row))
    }

    async fn list_for_item(&self, inbox_item_id: Uuid) -> Result<Vec<Extraction>> {
        let rows = sqlx::query(&format!(
            "SELECT {EXTRACTION_COLUMNS} FROM extractions
             WHERE inbox_item_id = $1
             ORDER BY created_at DESC"
        ))
        .bind(inbox_item_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.into_iter().map(Self::parse_row).collect())
    }

    async fn latest_for_item(&self, inbox_item_id: Uuid) -> Result<Option<Extraction>> {
        let row = sqlx::query(&format!(
            "SELECT {EXTRACTION_COLUMNS} FROM extractions
             WHERE inbox_item_id = $1
             ORDER BY created_at DESC, id DESC
             LIMIT 1"
        ))
        .bind(inbox_item_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(Self::parse_row))
    }
}
