//! Workspace repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use sift_core::{Error, Result, Workspace, WorkspaceRepository};

/// PostgreSQL implementation of WorkspaceRepository.
#[derive(Clone)]
pub struct PgWorkspaceRepository {
    pool: Pool<Postgres>,
}

impl PgWorkspaceRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    fn parse_row(row: sqlx::postgres::PgRow) -> Workspace {
        Workspace {
            id: row.get("id"),
            name: row.get("name"),
            timezone: row.get("timezone"),
            locale: row.get("locale"),
            created_at: row.get("created_at"),
        }
    }
}

#[async_trait]
impl WorkspaceRepository for PgWorkspaceRepository {
    async fn create(&self, name: &str, timezone: &str, locale: &str) -> Result<Workspace> {
        let id = Uuid::now_v7();
        let now = Utc::now();

        let row = sqlx::query(
            "INSERT INTO workspaces (id, name, timezone, locale, created_at)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING id, name, timezone, locale, created_at",
        )
        .bind(id)
        .bind(name)
        .bind(timezone)
        .bind(locale)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(Self::parse_row(row))
    }

    async fn get(&self, id: Uuid) -> Result<Option<Workspace>> {
        let row = sqlx::query(
            "SELECT id, name, timezone, locale, created_at FROM workspaces WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(Self::parse_row))
    }
}
