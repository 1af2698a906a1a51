//! sift-worker - background extraction worker for sift
//!
//! Connects to PostgreSQL, runs pending migrations, and processes
//! extraction jobs until interrupted.

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sift_db::{Database, PoolConfig};
use sift_inference::OllamaBackend;
use sift_jobs::{ExtractionJobHandler, ExtractionService, JobWorker, WorkerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // RUST_LOG controls filtering (default: "sift_jobs=debug,sift_db=info,sift_inference=info")
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "sift_jobs=debug,sift_db=info,sift_inference=info".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "postgres://localhost/sift".to_string());

    let db = Database::connect_with_config(&database_url, PoolConfig::from_env()).await?;
    db.migrate().await?;
    info!("Database connected and migrated");

    let backend = OllamaBackend::from_env();
    let service = ExtractionService::for_database(&db, backend);

    let worker = JobWorker::new(db, WorkerConfig::from_env());
    worker
        .register_handler(ExtractionJobHandler::new(Arc::new(service)))
        .await;

    let handle = worker.start();
    info!("Worker running; press Ctrl-C to stop");

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");
    handle.shutdown().await?;

    Ok(())
}
