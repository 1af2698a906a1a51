//! Repository and backend traits.
//!
//! Trait-per-entity repositories keep the persistence mechanism swappable and
//! let the orchestrator be tested against fakes; `GenerationBackend` is the
//! seam between the extraction client and the model provider.

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::{
    CreateInboxItemRequest, Extraction, FailureDisposition, InboxItem, InboxItemStatus, Job,
    JobType, NewSuggestion, QueueStats, Result, Suggestion, SuggestionStatus, SuggestionType,
    Workspace,
};

/// Repository for workspaces.
#[async_trait]
pub trait WorkspaceRepository: Send + Sync {
    /// Create a workspace with the given settings.
    async fn create(&self, name: &str, timezone: &str, locale: &str) -> Result<Workspace>;

    /// Get a workspace by id.
    async fn get(&self, id: Uuid) -> Result<Option<Workspace>>;
}

/// Repository for inbox items.
#[async_trait]
pub trait InboxItemRepository: Send + Sync {
    /// Insert a new inbox item (status always starts as New).
    async fn insert(&self, req: CreateInboxItemRequest) -> Result<Uuid>;

    /// Fetch an inbox item; errors if it does not exist.
    async fn fetch(&self, id: Uuid) -> Result<InboxItem>;

    /// List a workspace's inbox items, newest received first, optionally
    /// filtered by status.
    async fn list_for_workspace(
        &self,
        workspace_id: Uuid,
        status: Option<InboxItemStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<InboxItem>>;

    /// Archive an inbox item (terminal, allowed from any state).
    async fn archive(&self, id: Uuid) -> Result<()>;
}

/// Repository for extractions.
#[async_trait]
pub trait ExtractionRepository: Send + Sync {
    /// Persist one successful extraction run: the extraction row, its
    /// suggestions (all Proposed), and the item's transition to Parsed, in
    /// one transaction. No partial state is ever observable.
    async fn record_run(
        &self,
        inbox_item_id: Uuid,
        model_version: &str,
        prompt_version: &str,
        raw_response: JsonValue,
        suggestions: Vec<NewSuggestion>,
    ) -> Result<Extraction>;

    /// Get an extraction by id.
    async fn get(&self, id: Uuid) -> Result<Option<Extraction>>;

    /// All extractions for an inbox item, newest first.
    async fn list_for_item(&self, inbox_item_id: Uuid) -> Result<Vec<Extraction>>;

    /// The most recently created extraction for an inbox item, if any.
    async fn latest_for_item(&self, inbox_item_id: Uuid) -> Result<Option<Extraction>>;
}

/// Repository for suggestions.
#[async_trait]
pub trait SuggestionRepository: Send + Sync {
    /// Get a suggestion by id.
    async fn get(&self, id: Uuid) -> Result<Option<Suggestion>>;

    /// Suggestions belonging to one extraction, in creation order.
    async fn list_for_extraction(&self, extraction_id: Uuid) -> Result<Vec<Suggestion>>;

    /// Workspace-scoped listing (via the extraction -> inbox item chain),
    /// newest first, with optional status/type filters.
    async fn list_for_workspace(
        &self,
        workspace_id: Uuid,
        status: Option<SuggestionStatus>,
        suggestion_type: Option<SuggestionType>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Suggestion>>;

    /// Accept a suggestion. Overwrites the status even if already resolved.
    async fn accept(&self, id: Uuid) -> Result<Suggestion>;

    /// Reject a suggestion. Overwrites the status even if already resolved.
    async fn reject(&self, id: Uuid) -> Result<Suggestion>;
}

/// Repository for the background job queue.
#[async_trait]
pub trait JobRepository: Send + Sync {
    /// Enqueue a job; returns immediately with the job id.
    async fn enqueue(
        &self,
        inbox_item_id: Option<Uuid>,
        job_type: JobType,
        payload: Option<JsonValue>,
    ) -> Result<Uuid>;

    /// Claim the next runnable pending job for the given types, marking it
    /// Running. Honors each job's `run_after`. Returns None when the queue
    /// is empty.
    async fn claim_next(&self, job_types: &[JobType]) -> Result<Option<Job>>;

    /// Mark a job completed.
    async fn complete(&self, job_id: Uuid) -> Result<()>;

    /// Record a transient attempt failure. Reschedules the job with the
    /// fixed backoff while attempts remain, otherwise terminally fails it.
    async fn fail(&self, job_id: Uuid, error: &str) -> Result<FailureDisposition>;

    /// Terminally fail a job regardless of remaining attempts (permanent
    /// failures that another attempt cannot fix).
    async fn fail_permanent(&self, job_id: Uuid, error: &str) -> Result<()>;

    /// Get a job by id.
    async fn get(&self, job_id: Uuid) -> Result<Option<Job>>;

    /// All jobs referencing an inbox item, newest first.
    async fn jobs_for_item(&self, inbox_item_id: Uuid) -> Result<Vec<Job>>;

    /// Number of pending jobs.
    async fn pending_count(&self) -> Result<i64>;

    /// Queue statistics by status.
    async fn queue_stats(&self) -> Result<QueueStats>;
}

/// A structured-output-capable generation backend.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Invoke the model with a system prompt, a user prompt, and a JSON
    /// schema constraining the output. Returns the raw response text.
    ///
    /// Implementations must map transport/provider failures to
    /// [`Error::Model`](crate::Error::Model) and deadline overruns to
    /// [`Error::Timeout`](crate::Error::Timeout) so the job wrapper can
    /// tell transient failures from permanent ones.
    async fn generate_structured(
        &self,
        system: &str,
        prompt: &str,
        schema: &JsonValue,
    ) -> Result<String>;

    /// Identifier of the model this backend invokes, recorded on every
    /// successful extraction for reproducibility.
    fn model_version(&self) -> &str;
}
