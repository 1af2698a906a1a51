//! Job queue repository implementation.
//!
//! Claims use `FOR UPDATE SKIP LOCKED` so multiple workers can poll the same
//! queue without contending on the head row. Retry scheduling is a fixed
//! backoff: a transiently failed job goes back to pending with `run_after`
//! pushed into the future, until its attempt bound is exhausted.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde_json::Value as JsonValue;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use sift_core::{
    defaults, Error, FailureDisposition, Job, JobRepository, JobStatus, JobType, QueueStats,
    Result,
};

/// PostgreSQL implementation of JobRepository.
#[derive(Clone)]
pub struct PgJobRepository {
    pool: Pool<Postgres>,
    /// Delay before a transiently failed job becomes claimable again.
    retry_backoff: Duration,
}

impl PgJobRepository {
    /// Create a new PgJobRepository with the default retry backoff.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            pool,
            retry_backoff: Duration::seconds(defaults::JOB_RETRY_BACKOFF_SECS),
        }
    }

    /// Override the retry backoff (tests use a short one).
    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    /// Convert JobType to string for database.
    fn job_type_to_str(job_type: JobType) -> &'static str {
        job_type.as_str()
    }

    /// Convert string from database to JobType.
    fn str_to_job_type(s: &str) -> JobType {
        match s {
            "extraction" => JobType::Extraction,
            _ => JobType::Extraction, // fallback
        }
    }

    /// Convert string from database to JobStatus.
    fn str_to_job_status(s: &str) -> JobStatus {
        match s {
            "running" => JobStatus::Running,
            "completed" => JobStatus::Completed,
            "failed" => JobStatus::Failed,
            _ => JobStatus::Pending, // fallback
        }
    }

    /// Parse a job row into a Job struct.
    fn parse_job_row(row: sqlx::postgres::PgRow) -> Job {
        Job {
            id: row.get("id"),
            inbox_item_id: row.get("inbox_item_id"),
            job_type: Self::str_to_job_type(row.get("job_type")),
            status: Self::str_to_job_status(row.get("status")),
            attempts: row.get("attempts"),
            max_attempts: row.get("max_attempts"),
            run_after: row.get("run_after"),
            payload: row.get("payload"),
            error_message: row.get("error_message"),
            created_at: row.get("created_at"),
            started_at: row.get("started_at"),
            completed_at: row.get("completed_at"),
        }
    }
}

const JOB_COLUMNS: &str = "id, inbox_item_id, job_type, status, attempts, max_attempts, \
                           run_after, payload, error_message, created_at, started_at, \
                           completed_at";

#[async_trait]
impl JobRepository for PgJobRepository {
    async fn enqueue(
        &self,
        inbox_item_id: Option<Uuid>,
        job_type: JobType,
        payload: Option<JsonValue>,
    ) -> Result<Uuid> {
        let job_id = Uuid::now_v7();
        let now = Utc::now();

        sqlx::query(
            "INSERT INTO job_queue
                 (id, inbox_item_id, job_type, status, attempts, max_attempts, run_after,
                  payload, created_at)
             VALUES ($1, $2, $3, 'pending', 0, $4, $5, $6, $5)",
        )
        .bind(job_id)
        .bind(inbox_item_id)
        .bind(Self::job_type_to_str(job_type))
        .bind(defaults::JOB_MAX_ATTEMPTS)
        .bind(now)
        .bind(&payload)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(job_id)
    }

    async fn claim_next(&self, job_types: &[JobType]) -> Result<Option<Job>> {
        let now = Utc::now();
        let type_strings: Vec<String> = job_types
            .iter()
            .map(|jt| Self::job_type_to_str(*jt).to_string())
            .collect();

        // Filter by type and run_after before locking; empty array claims
        // any type. Claiming counts as an attempt.
        let row = sqlx::query(&format!(
            "UPDATE job_queue
             SET status = 'running', started_at = $1, attempts = attempts + 1
             WHERE id = (
                 SELECT id FROM job_queue
                 WHERE status = 'pending'
                   AND run_after <= $1
                   AND (cardinality($2::text[]) = 0 OR job_type = ANY($2))
                 ORDER BY created_at ASC
                 LIMIT 1
                 FOR UPDATE SKIP LOCKED
             )
             RETURNING {JOB_COLUMNS}"
        ))
        .bind(now)
        .bind(&type_strings)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(Self::parse_job_row))
    }

    async fn complete(&self, job_id: Uuid) -> Result<()> {
        let result = sqlx::query(
            "UPDATE job_queue
             SET status = 'completed', completed_at = $1, error_message = NULL
             WHERE id = $2",
        )
        .bind(Utc::now())
        .bind(job_id)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::Job(format!("no such job: {job_id}")));
        }
        Ok(())
    }

    async fn fail(&self, job_id: Uuid, error: &str) -> Result<FailureDisposition> {
        let now = Utc::now();

        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let (attempts, max_attempts): (i32, i32) =
            sqlx::query_as("SELECT attempts, max_attempts FROM job_queue WHERE id = $1 FOR UPDATE")
                .bind(job_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(Error::Database)?
                .ok_or_else(|| Error::Job(format!("no such job: {job_id}")))?;

        let disposition = if attempts < max_attempts {
            // Attempts remain: back to pending, claimable after the backoff.
            let run_after = now + self.retry_backoff;
            sqlx::query(
                "UPDATE job_queue
                 SET status = 'pending', run_after = $1, error_message = $2, started_at = NULL
                 WHERE id = $3",
            )
            .bind(run_after)
            .bind(error)
            .bind(job_id)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;

            FailureDisposition::Retried { attempt: attempts }
        } else {
            sqlx::query(
                "UPDATE job_queue
                 SET status = 'failed', completed_at = $1, error_message = $2
                 WHERE id = $3",
            )
            .bind(now)
            .bind(error)
            .bind(job_id)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;

            FailureDisposition::Exhausted
        };

        tx.commit().await.map_err(Error::Database)?;
        Ok(disposition)
    }

    async fn fail_permanent(&self, job_id: Uuid, error: &str) -> Result<()> {
        let result = sqlx::query(
            "UPDATE job_queue
             SET status = 'failed', completed_at = $1, error_message = $2
             WHERE id = $3",
        )
        .bind(Utc::now())
        .bind(error)
        .bind(job_id)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::Job(format!("no such job: {job_id}")));
        }
        Ok(())
    }

    async fn get(&self, job_id: Uuid) -> Result<Option<Job>> {
        let row = sqlx::query(&format!("SELECT {JOB_COLUMNS} FROM job_queue WHERE id = $1"))
            .bind(job_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(row.map(Self::parse_job_row))
    }

    async fn jobs_for_item(&self, inbox_item_id: Uuid) -> Result<Vec<Job>> {
        let rows = sqlx::query(&format!(
            "SELECT {JOB_COLUMNS} FROM job_queue
             WHERE inbox_item_id = $1
             ORDER BY created_at DESC"
        ))
        .bind(inbox_item_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.into_iter().map(Self::parse_job_row).collect())
    }

    async fn pending_count(&self) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM job_queue WHERE status = 'pending'")
                .fetch_one(&self.pool)
                .await
                .map_err(Error::Database)?;
        Ok(count)
    }

    async fn queue_stats(&self) -> Result<QueueStats> {
        let row = sqlx::query(
            "SELECT
                COUNT(*) FILTER (WHERE status = 'pending') as pending,
                COUNT(*) FILTER (WHERE status = 'running') as running,
                COUNT(*) FILTER (WHERE status = 'completed') as completed,
                COUNT(*) FILTER (WHERE status = 'failed') as failed,
                COUNT(*) as total
             FROM job_queue",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(QueueStats {
            pending: row.get::<i64, _>("pending"),
            running: row.get::<i64, _>("running"),
            completed: row.get::<i64, _>("completed"),
            failed: row.get::<i64, _>("failed"),
            total: row.get::<i64, _>("total"),
        })
    }
}
