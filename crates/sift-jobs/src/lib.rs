//! # sift-jobs
//!
//! Background job worker and extraction pipeline for sift.
//!
//! This crate provides:
//! - The job worker (claim loop, bounded concurrency, graceful shutdown)
//! - The extraction service (prompt, model call, suggestion materialization,
//!   atomic persistence)
//! - The extraction job handler mapping pipeline errors onto the queue's
//!   retry semantics

pub mod extraction;
pub mod extraction_handler;
pub mod handler;
pub mod worker;

#[cfg(test)]
mod testing;

// Re-export core types
pub use sift_core::*;

pub use extraction::{materialize_suggestions, ExtractionService};
pub use extraction_handler::ExtractionJobHandler;
pub use handler::{JobContext, JobHandler, JobResult, NoOpHandler};
pub use worker::{
    JobWorker, WorkerConfig, WorkerEvent, WorkerHandle, DEFAULT_POLL_INTERVAL_MS,
};
