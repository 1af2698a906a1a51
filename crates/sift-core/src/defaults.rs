//! Centralized defaults for sift.
//!
//! Every value here can be overridden by the environment variable named in
//! its doc comment; the constants are the fallback when the variable is
//! unset or unparseable.

/// Default Ollama endpoint. Override: `SIFT_OLLAMA_URL`.
pub const OLLAMA_URL: &str = "http://localhost:11434";

/// Default generation model for extraction. Override: `SIFT_GEN_MODEL`.
///
/// Recorded verbatim as `model_version` on every extraction row.
pub const GEN_MODEL: &str = "llama3.1:8b";

/// Timeout for a single model call in seconds. Override: `SIFT_GEN_TIMEOUT_SECS`.
pub const GEN_TIMEOUT_SECS: u64 = 120;

/// Total attempt bound for extraction jobs, including the first attempt.
pub const JOB_MAX_ATTEMPTS: i32 = 3;

/// Fixed delay between extraction attempts in seconds. No exponential growth.
pub const JOB_RETRY_BACKOFF_SECS: i64 = 60;

/// Polling interval when the job queue is empty (milliseconds).
/// Override: `JOB_POLL_INTERVAL_MS`.
pub const JOB_POLL_INTERVAL_MS: u64 = 500;

/// Maximum concurrent jobs per worker. Override: `JOB_MAX_CONCURRENT`.
pub const JOB_MAX_CONCURRENT: usize = 4;

/// Hard timeout for a single job execution in seconds.
pub const JOB_TIMEOUT_SECS: u64 = 300;

/// Capacity of the worker event broadcast channel.
pub const EVENT_BUS_CAPACITY: usize = 256;

/// Workspace defaults applied when no explicit settings exist.
pub const WORKSPACE_TIMEZONE: &str = "UTC";
pub const WORKSPACE_LOCALE: &str = "en";
