//! Job handler bridging the queue to the extraction service.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use sift_core::{GenerationBackend, JobType};

use crate::extraction::ExtractionService;
use crate::handler::{JobContext, JobHandler, JobResult};

/// Handler for [`JobType::Extraction`] jobs.
///
/// Classification is the whole job of this layer: a transient failure
/// (provider outage, timeout, transport) becomes [`JobResult::Retry`] so the
/// queue reschedules it; everything else is permanent and fails the job on
/// the first occurrence.
pub struct ExtractionJobHandler<B: GenerationBackend> {
    service: Arc<ExtractionService<B>>,
}

impl<B: GenerationBackend> ExtractionJobHandler<B> {
    pub fn new(service: Arc<ExtractionService<B>>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl<B: GenerationBackend + 'static> JobHandler for ExtractionJobHandler<B> {
    fn job_type(&self) -> JobType {
        JobType::Extraction
    }

    async fn execute(&self, ctx: JobContext) -> JobResult {
        let Some(inbox_item_id) = ctx.inbox_item_id() else {
            return JobResult::Failed("extraction job has no inbox item".to_string());
        };

        match self.service.run(inbox_item_id).await {
            Ok(_) => JobResult::Success,
            Err(e) if e.is_transient() => {
                warn!(
                    subsystem = "jobs",
                    component = "extraction",
                    inbox_item_id = %inbox_item_id,
                    attempt = ctx.attempt(),
                    error = %e,
                    "Extraction attempt failed; will retry"
                );
                JobResult::Retry(e.to_string())
            }
            Err(e) => JobResult::Failed(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeStore;
    use chrono::Utc;
    use sift_core::{
        CreateInboxItemRequest, Error, InboxItemRepository, InboxItemSource, Job, JobStatus,
    };
    use sift_inference::MockGenerationBackend;
    use uuid::Uuid;

    async fn seeded_handler(
        backend: MockGenerationBackend,
    ) -> (Uuid, ExtractionJobHandler<MockGenerationBackend>) {
        let store = FakeStore::new();
        let workspace = store.create_workspace("Inbox", "UTC", "en").await;
        let item_id = store
            .insert(CreateInboxItemRequest {
                workspace_id: workspace.id,
                source: InboxItemSource::Manual,
                raw_subject: None,
                raw_content: "Call the bank on Friday".to_string(),
                received_at: Utc::now(),
            })
            .await
            .unwrap();

        let service = ExtractionService::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(store),
            backend,
        );
        (item_id, ExtractionJobHandler::new(Arc::new(service)))
    }

    fn extraction_job(inbox_item_id: Option<Uuid>) -> Job {
        Job {
            id: Uuid::now_v7(),
            inbox_item_id,
            job_type: JobType::Extraction,
            status: JobStatus::Running,
            attempts: 1,
            max_attempts: 3,
            run_after: Utc::now(),
            payload: None,
            error_message: None,
            created_at: Utc::now(),
            started_at: Some(Utc::now()),
            completed_at: None,
        }
    }

    #[tokio::test]
    async fn test_successful_run_is_success() {
        let backend = MockGenerationBackend::new()
            .with_response(r#"{"events": [], "reminders": [{"message": "Call the bank"}], "tasks": []}"#);
        let (item_id, handler) = seeded_handler(backend).await;

        let result = handler
            .execute(JobContext::new(extraction_job(Some(item_id))))
            .await;
        assert!(matches!(result, JobResult::Success));
    }

    #[tokio::test]
    async fn test_transient_error_is_retry() {
        let backend =
            MockGenerationBackend::new().with_failure(|| Error::Model("503".to_string()));
        let (item_id, handler) = seeded_handler(backend).await;

        let result = handler
            .execute(JobContext::new(extraction_job(Some(item_id))))
            .await;
        assert!(matches!(result, JobResult::Retry(_)));
    }

    #[tokio::test]
    async fn test_validation_error_is_permanent_failure() {
        let backend = MockGenerationBackend::new().with_response("definitely not json");
        let (item_id, handler) = seeded_handler(backend).await;

        let result = handler
            .execute(JobContext::new(extraction_job(Some(item_id))))
            .await;
        assert!(matches!(result, JobResult::Failed(_)));
    }

    #[tokio::test]
    async fn test_missing_item_is_permanent_failure() {
        let backend = MockGenerationBackend::new();
        let (_, handler) = seeded_handler(backend).await;

        let result = handler
            .execute(JobContext::new(extraction_job(Some(Uuid::now_v7()))))
            .await;
        assert!(matches!(result, JobResult::Failed(_)));
    }

    #[tokio::test]
    async fn test_job_without_item_is_permanent_failure() {
        let backend = MockGenerationBackend::new();
        let (_, handler) = seeded_handler(backend).await;

        let result = handler
            .execute(JobContext::new(extraction_job(None)))
            .await;
        assert!(matches!(result, JobResult::Failed(_)));
    }
}
