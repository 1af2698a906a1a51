//! Inbox item repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres, Row};
use tracing::info;
use uuid::Uuid;

use sift_core::{
    CreateInboxItemRequest, Error, InboxItem, InboxItemRepository, InboxItemSource,
    InboxItemStatus, Result,
};

/// PostgreSQL implementation of InboxItemRepository.
#[derive(Clone)]
pub struct PgInboxItemRepository {
    pool: Pool<Postgres>,
}

impl PgInboxItemRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    fn parse_row(row: sqlx::postgres::PgRow) -> InboxItem {
        InboxItem {
            id: row.get("id"),
            workspace_id: row.get("workspace_id"),
            source: InboxItemSource::parse(row.get("source")),
            raw_subject: row.get("raw_subject"),
            raw_content: row.get("raw_content"),
            received_at: row.get("received_at"),
            status: InboxItemStatus::parse(row.get("status")),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }
    }
}

const ITEM_COLUMNS: &str = "id, workspace_id, source, raw_subject, raw_content, received_at, \
                            status, created_at, updated_at";

#[async_trait]
impl InboxItemRepository for PgInboxItemRepository {
    async fn insert(&self, req: CreateInboxItemRequest) -> Result<Uuid> {
        req.validate()?;

        let id = Uuid::now_v7();
        let now = Utc::now();

        sqlx::query(
            "INSERT INTO inbox_items
                 (id, workspace_id, source, raw_subject, raw_content, received_at, status,
                  created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, 'new', $7, $7)",
        )
        .bind(id)
        .bind(req.workspace_id)
        .bind(req.source.as_str())
        .bind(&req.raw_subject)
        .bind(&req.raw_content)
        .bind(req.received_at)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            // FK violation on workspace_id means the workspace does not exist.
            sqlx::Error::Database(ref db) if db.is_foreign_key_violation() => {
                Error::WorkspaceNotFound(req.workspace_id)
            }
            other => Error::Database(other),
        })?;

        info!(
            subsystem = "db",
            component = "inbox_items",
            op = "insert",
            workspace_id = %req.workspace_id,
            inbox_item_id = %id,
            source = req.source.as_str(),
            "Inbox item created"
        );

        Ok(id)
    }

    async fn fetch(&self, id: Uuid) -> Result<InboxItem> {
        let row = sqlx::query(&format!(
            "SELECT {ITEM_COLUMNS} FROM inbox_items WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        row.map(Self::parse_row).ok_or(Error::InboxItemNotFound(id))
    }

    async fn list_for_workspace(
        &self,
        workspace_id: Uuid,
        status: Option<InboxItemStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<InboxItem>> {
        let rows = match status {
            Some(status) => {
                sqlx::query(&format!(
                    "SELECT {ITEM_COLUMNS} FROM inbox_items
                     WHERE workspace_id = $1 AND status = $2
                     ORDER BY received_at DESC
                     LIMIT $3 OFFSET $4"
                ))
                .bind(workspace_id)
                .bind(status.as_str())
                .bind(limit)
                .bind(offset)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query(&format!(
                    "SELECT {ITEM_COLUMNS} FROM inbox_items
                     WHERE workspace_id = $1
                     ORDER BY received_at DESC
                     LIMIT $2 OFFSET $3"
                ))
                .bind(workspace_id)
                .bind(limit)
                .bind(offset)
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(Error::Database)?;

        Ok(rows.into_iter().map(Self::parse_row).collect())
    }

    async fn archive(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query(
            "UPDATE inbox_items SET status = 'archived', updated_at = $1 WHERE id = $2",
        )
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::InboxItemNotFound(id));
        }

        info!(
            subsystem = "db",
            component = "inbox_items",
            op = "archive",
            inbox_item_id = %id,
            "Inbox item archived"
        );

        Ok(())
    }
}
