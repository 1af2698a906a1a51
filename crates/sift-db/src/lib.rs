//! # sift-db
//!
//! PostgreSQL database layer for sift.
//!
//! This crate provides:
//! - Connection pool management
//! - Repository implementations for workspaces, inbox items, extractions,
//!   and suggestions
//! - The background job queue (claim with `FOR UPDATE SKIP LOCKED`,
//!   fixed-backoff retry scheduling)
//!
//! ## Example
//!
//! ```rust,ignore
//! use sift_db::Database;
//! use sift_core::{CreateInboxItemRequest, InboxItemRepository, InboxItemSource};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("postgres://localhost/sift").await?;
//!
//!     let item_id = db.inbox_items.insert(CreateInboxItemRequest {
//!         workspace_id,
//!         source: InboxItemSource::Manual,
//!         raw_subject: None,
//!         raw_content: "Dentist on Tuesday at 3pm".to_string(),
//!         received_at: chrono::Utc::now(),
//!     }).await?;
//!
//!     println!("Created inbox item: {}", item_id);
//!     Ok(())
//! }
//! ```

pub mod extractions;
pub mod inbox_items;
pub mod jobs;
pub mod pool;
pub mod suggestions;
pub mod workspaces;

// Re-export core types
pub use sift_core::*;

// Re-export repository implementations
pub use extractions::PgExtractionRepository;
pub use inbox_items::PgInboxItemRepository;
pub use jobs::PgJobRepository;
pub use pool::{create_pool, create_pool_with_config, PoolConfig};
pub use suggestions::PgSuggestionRepository;
pub use workspaces::PgWorkspaceRepository;

/// Combined database context with all repositories.
#[derive(Clone)]
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    /// Workspace repository.
    pub workspaces: PgWorkspaceRepository,
    /// Inbox item repository.
    pub inbox_items: PgInboxItemRepository,
    /// Extraction repository.
    pub extractions: PgExtractionRepository,
    /// Suggestion repository.
    pub suggestions: PgSuggestionRepository,
    /// Job repository for background processing.
    pub jobs: PgJobRepository,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            workspaces: PgWorkspaceRepository::new(pool.clone()),
            inbox_items: PgInboxItemRepository::new(pool.clone()),
            extractions: PgExtractionRepository::new(pool.clone()),
            suggestions: PgSuggestionRepository::new(pool.clone()),
            jobs: PgJobRepository::new(pool.clone()),
            pool,
        }
    }

    /// Create a new Database instance by connecting to the given URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = create_pool(url).await?;
        Ok(Self::new(pool))
    }

    /// Create with custom pool configuration.
    pub async fn connect_with_config(url: &str, config: PoolConfig) -> Result<Self> {
        let pool = create_pool_with_config(url, config).await?;
        Ok(Self::new(pool))
    }

    /// Run pending migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &sqlx::Pool<sqlx::Postgres> {
        &self.pool
    }
}
