//! Domain models for sift: workspaces, inbox items, extractions, suggestions,
//! and the background job queue.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

// =============================================================================
// ENUMS
// =============================================================================

/// Where an inbox item came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InboxItemSource {
    Email,
    Manual,
    Share,
}

impl InboxItemSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            InboxItemSource::Email => "email",
            InboxItemSource::Manual => "manual",
            InboxItemSource::Share => "share",
        }
    }

    /// Parse from the database representation. Unknown values fall back to
    /// `Manual`, matching how the db layer treats unrecognized enum strings.
    pub fn parse(s: &str) -> Self {
        match s {
            "email" => InboxItemSource::Email,
            "share" => InboxItemSource::Share,
            _ => InboxItemSource::Manual,
        }
    }
}

/// Lifecycle status of an inbox item.
///
/// Transitions: `New -> Parsed` (successful extraction only) and
/// `any -> Archived` (explicit user action). Archived is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InboxItemStatus {
    New,
    Parsed,
    Archived,
}

impl InboxItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InboxItemStatus::New => "new",
            InboxItemStatus::Parsed => "parsed",
            InboxItemStatus::Archived => "archived",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "parsed" => InboxItemStatus::Parsed,
            "archived" => InboxItemStatus::Archived,
            _ => InboxItemStatus::New,
        }
    }

    /// Whether the state machine permits moving to `next`.
    ///
    /// Extraction on an archived item is not refused here; that is a caller
    /// policy concern, not a state-machine invariant.
    pub fn can_transition_to(&self, next: InboxItemStatus) -> bool {
        match (self, next) {
            (InboxItemStatus::New, InboxItemStatus::Parsed) => true,
            (_, InboxItemStatus::Archived) => true,
            _ => false,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, InboxItemStatus::Archived)
    }
}

/// Kind of actionable item a suggestion proposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionType {
    Event,
    Reminder,
    Task,
}

impl SuggestionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SuggestionType::Event => "event",
            SuggestionType::Reminder => "reminder",
            SuggestionType::Task => "task",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "event" => SuggestionType::Event,
            "reminder" => SuggestionType::Reminder,
            _ => SuggestionType::Task,
        }
    }
}

/// Review status of a suggestion.
///
/// Suggestions are only ever created Proposed; accept and reject are both
/// terminal. Re-resolving an already-resolved suggestion is not guarded at
/// this layer and silently overwrites the status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionStatus {
    Proposed,
    Accepted,
    Rejected,
}

impl SuggestionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SuggestionStatus::Proposed => "proposed",
            SuggestionStatus::Accepted => "accepted",
            SuggestionStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "accepted" => SuggestionStatus::Accepted,
            "rejected" => SuggestionStatus::Rejected,
            _ => SuggestionStatus::Proposed,
        }
    }

    pub fn can_transition_to(&self, next: SuggestionStatus) -> bool {
        matches!(
            (self, next),
            (SuggestionStatus::Proposed, SuggestionStatus::Accepted)
                | (SuggestionStatus::Proposed, SuggestionStatus::Rejected)
        )
    }

    pub fn is_resolved(&self) -> bool {
        !matches!(self, SuggestionStatus::Proposed)
    }
}

// =============================================================================
// ENTITIES
// =============================================================================

/// Tenancy boundary. Every inbox item belongs to exactly one workspace, and
/// every suggestion belongs to one transitively via extraction -> inbox item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workspace {
    pub id: Uuid,
    pub name: String,
    /// IANA timezone identifier passed into the extraction prompt.
    pub timezone: String,
    /// BCP 47 locale passed into the extraction prompt.
    pub locale: String,
    pub created_at: DateTime<Utc>,
}

/// One ingested piece of raw content awaiting or having undergone extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboxItem {
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub source: InboxItemSource,
    pub raw_subject: Option<String>,
    pub raw_content: String,
    pub received_at: DateTime<Utc>,
    pub status: InboxItemStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One completed AI extraction run over an inbox item.
///
/// Immutable once created; a re-run produces a new row rather than updating
/// an existing one. The raw structured payload is stored verbatim for
/// auditability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Extraction {
    pub id: Uuid,
    pub inbox_item_id: Uuid,
    pub model_version: String,
    pub prompt_version: String,
    pub raw_response: JsonValue,
    pub created_at: DateTime<Utc>,
}

/// One proposed actionable item derived from an extraction, pending review.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Suggestion {
    pub id: Uuid,
    pub extraction_id: Uuid,
    pub suggestion_type: SuggestionType,
    /// The corresponding entry from the extraction response, verbatim.
    pub payload: JsonValue,
    pub status: SuggestionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// REQUEST TYPES
// =============================================================================

/// Request to create an inbox item. Produced by the ingestion adapters
/// (manual entry, email webhook, share) after their own verification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateInboxItemRequest {
    pub workspace_id: Uuid,
    pub source: InboxItemSource,
    pub raw_subject: Option<String>,
    pub raw_content: String,
    pub received_at: DateTime<Utc>,
}

impl CreateInboxItemRequest {
    /// Raw content must be non-empty (whitespace-only counts as empty).
    pub fn validate(&self) -> crate::Result<()> {
        if self.raw_content.trim().is_empty() {
            return Err(crate::Error::InvalidInput(
                "raw_content must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// A suggestion to be created by the materializer, always Proposed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSuggestion {
    pub suggestion_type: SuggestionType,
    pub payload: JsonValue,
}

// =============================================================================
// JOB QUEUE
// =============================================================================

/// Type of background job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    Extraction,
}

impl JobType {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobType::Extraction => "extraction",
        }
    }
}

/// Status of a queued job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

/// A queued unit of background work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub inbox_item_id: Option<Uuid>,
    pub job_type: JobType,
    pub status: JobStatus,
    /// Number of times this job has been claimed for execution.
    pub attempts: i32,
    /// Total attempt bound, including the first attempt.
    pub max_attempts: i32,
    /// Earliest time the job may be claimed (fixed-backoff scheduling).
    pub run_after: DateTime<Utc>,
    pub payload: Option<JsonValue>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Outcome of recording a job failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureDisposition {
    /// The job was rescheduled for another attempt.
    Retried { attempt: i32 },
    /// The attempt bound is exhausted (or the failure was permanent); the
    /// job is terminally failed and will not run again.
    Exhausted,
}

/// Queue statistics summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueStats {
    pub pending: i64,
    pub running: i64,
    pub completed: i64,
    pub failed: i64,
    pub total: i64,
}
