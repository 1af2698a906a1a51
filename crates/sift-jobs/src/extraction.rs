//! Extraction pipeline orchestration.
//!
//! One run: load the inbox item and its workspace, build the prompt, make
//! the model call, materialize suggestions from the validated response, and
//! persist everything atomically. The model call happens outside any
//! database transaction; only the write phase is transactional.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use serde_json::Value as JsonValue;
use tracing::info;

use sift_core::{
    build_user_prompt, Error, Extraction, ExtractionRepository, GenerationBackend,
    InboxItemRepository, NewSuggestion, PromptContext, Result, SuggestionType, WorkspaceRepository,
    SYSTEM_PROMPT,
};
use sift_db::Database;
use sift_inference::ExtractionClient;
use uuid::Uuid;

/// Turn a validated raw response into suggestion rows.
///
/// Payloads are the response's array entries verbatim; creation order is
/// events, then reminders, then tasks, preserving array order within each.
/// A `null` response materializes nothing.
pub fn materialize_suggestions(raw: &JsonValue) -> Vec<NewSuggestion> {
    let mut suggestions = Vec::new();

    let sections = [
        ("events", SuggestionType::Event),
        ("reminders", SuggestionType::Reminder),
        ("tasks", SuggestionType::Task),
    ];

    for (key, suggestion_type) in sections {
        if let Some(entries) = raw.get(key).and_then(JsonValue::as_array) {
            for entry in entries {
                suggestions.push(NewSuggestion {
                    suggestion_type,
                    payload: entry.clone(),
                });
            }
        }
    }

    suggestions
}

/// Service running extraction passes over inbox items.
pub struct ExtractionService<B: GenerationBackend> {
    inbox_items: Arc<dyn InboxItemRepository>,
    workspaces: Arc<dyn WorkspaceRepository>,
    extractions: Arc<dyn ExtractionRepository>,
    client: ExtractionClient<B>,
}

impl<B: GenerationBackend> ExtractionService<B> {
    /// Create a service over explicit repositories.
    pub fn new(
        inbox_items: Arc<dyn InboxItemRepository>,
        workspaces: Arc<dyn WorkspaceRepository>,
        extractions: Arc<dyn ExtractionRepository>,
        backend: B,
    ) -> Self {
        Self {
            inbox_items,
            workspaces,
            extractions,
            client: ExtractionClient::new(backend),
        }
    }

    /// Create a service over a database context.
    pub fn for_database(db: &Database, backend: B) -> Self {
        Self::new(
            Arc::new(db.inbox_items.clone()),
            Arc::new(db.workspaces.clone()),
            Arc::new(db.extractions.clone()),
            backend,
        )
    }

    /// Run one extraction pass over the given inbox item.
    ///
    /// Errors surface unwrapped so the job layer can classify them: a
    /// transient model failure is worth retrying, a validation failure or a
    /// missing item is not.
    pub async fn run(&self, inbox_item_id: Uuid) -> Result<Extraction> {
        let start = Instant::now();

        let item = self.inbox_items.fetch(inbox_item_id).await?;
        let workspace = self
            .workspaces
            .get(item.workspace_id)
            .await?
            .ok_or(Error::WorkspaceNotFound(item.workspace_id))?;

        let ctx = PromptContext::new(
            workspace.timezone.clone(),
            workspace.locale.clone(),
            Utc::now().date_naive(),
        );
        let prompt = build_user_prompt(item.raw_subject.as_deref(), &item.raw_content, &ctx);

        let validated = self.client.extract(SYSTEM_PROMPT, &prompt).await?;

        let suggestions = materialize_suggestions(&validated.raw);
        let suggestion_count = suggestions.len();

        let extraction = self
            .extractions
            .record_run(
                item.id,
                &validated.model_version,
                &validated.prompt_version,
                validated.raw,
                suggestions,
            )
            .await?;

        info!(
            subsystem = "jobs",
            component = "extraction",
            op = "run",
            workspace_id = %workspace.id,
            inbox_item_id = %item.id,
            extraction_id = %extraction.id,
            suggestion_count = suggestion_count,
            duration_ms = start.elapsed().as_millis() as u64,
            "Extraction run complete"
        );

        Ok(extraction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeStore;
    use sift_core::{
        CreateInboxItemRequest, InboxItemSource, InboxItemStatus, SuggestionStatus,
    };
    use sift_inference::MockGenerationBackend;

    fn scripted(response: &str) -> (FakeStore, ExtractionService<MockGenerationBackend>) {
        let backend = MockGenerationBackend::new().with_response(response);
        scripted_with_backend(backend)
    }

    fn scripted_with_backend(
        backend: MockGenerationBackend,
    ) -> (FakeStore, ExtractionService<MockGenerationBackend>) {
        let store = FakeStore::new();
        let service = ExtractionService::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            backend,
        );
        (store, service)
    }

    async fn seed_item(store: &FakeStore) -> Uuid {
        let workspace = store
            .create_workspace("Personal", "Europe/Berlin", "de")
            .await;
        store
            .insert(CreateInboxItemRequest {
                workspace_id: workspace.id,
                source: InboxItemSource::Email,
                raw_subject: Some("Dentist".to_string()),
                raw_content: "Appointment on 2026-09-03 at 14:30".to_string(),
                received_at: Utc::now(),
            })
            .await
            .unwrap()
    }

    #[test]
    fn test_materialize_order_events_reminders_tasks() {
        let raw = serde_json::json!({
            "events": [{"title": "A", "date": "2026-09-03"}],
            "reminders": [{"message": "B"}],
            "tasks": [{"title": "C"}, {"title": "D"}]
        });

        let suggestions = materialize_suggestions(&raw);
        assert_eq!(suggestions.len(), 4);
        assert_eq!(suggestions[0].suggestion_type, SuggestionType::Event);
        assert_eq!(suggestions[1].suggestion_type, SuggestionType::Reminder);
        assert_eq!(suggestions[2].suggestion_type, SuggestionType::Task);
        assert_eq!(suggestions[2].payload["title"], "C");
        assert_eq!(suggestions[3].payload["title"], "D");
    }

    #[test]
    fn test_materialize_keeps_payload_verbatim() {
        // Extra fields the typed view ignores must survive into payloads.
        let raw = serde_json::json!({
            "events": [{"title": "A", "date": "2026-09-03", "organizer": "jamie@example.com"}],
            "reminders": [],
            "tasks": []
        });

        let suggestions = materialize_suggestions(&raw);
        assert_eq!(suggestions[0].payload["organizer"], "jamie@example.com");
    }

    #[test]
    fn test_materialize_null_is_empty() {
        assert!(materialize_suggestions(&JsonValue::Null).is_empty());
    }

    #[tokio::test]
    async fn test_run_persists_extraction_and_marks_parsed() {
        let response = serde_json::json!({
            "events": [{"title": "Dentist", "date": "2026-09-03", "time": "14:30"}],
            "reminders": [],
            "tasks": [{"title": "Bring insurance card"}]
        })
        .to_string();
        let (store, service) = scripted(&response);
        let item_id = seed_item(&store).await;

        let extraction = service.run(item_id).await.unwrap();

        assert_eq!(extraction.inbox_item_id, item_id);
        assert_eq!(extraction.model_version, "mock-model");
        assert_eq!(extraction.prompt_version, "v1.0.0");
        assert_eq!(extraction.raw_response["events"][0]["title"], "Dentist");

        let item = store.fetch(item_id).await.unwrap();
        assert_eq!(item.status, InboxItemStatus::Parsed);

        let suggestions = store.suggestions_for_extraction(extraction.id);
        assert_eq!(suggestions.len(), 2);
        assert_eq!(suggestions[0].suggestion_type, SuggestionType::Event);
        assert_eq!(suggestions[1].suggestion_type, SuggestionType::Task);
        assert!(suggestions
            .iter()
            .all(|s| s.status == SuggestionStatus::Proposed));
    }

    #[tokio::test]
    async fn test_run_null_response_records_empty_extraction() {
        let (store, service) = scripted("null");
        let item_id = seed_item(&store).await;

        let extraction = service.run(item_id).await.unwrap();

        assert!(extraction.raw_response.is_null());
        assert!(store.suggestions_for_extraction(extraction.id).is_empty());
        // The run still counts as a successful parse.
        let item = store.fetch(item_id).await.unwrap();
        assert_eq!(item.status, InboxItemStatus::Parsed);
    }

    #[tokio::test]
    async fn test_run_missing_item_fails_without_model_call() {
        let backend = MockGenerationBackend::new();
        let handle = backend.clone();
        let (_, service) = scripted_with_backend(backend);

        let err = service.run(Uuid::now_v7()).await.unwrap_err();
        assert!(matches!(err, Error::InboxItemNotFound(_)));
        assert_eq!(handle.call_count(), 0);
    }

    #[tokio::test]
    async fn test_run_transient_failure_leaves_item_untouched() {
        let backend =
            MockGenerationBackend::new().with_failure(|| Error::Timeout("deadline".to_string()));
        let (store, service) = scripted_with_backend(backend);
        let item_id = seed_item(&store).await;

        let err = service.run(item_id).await.unwrap_err();
        assert!(err.is_transient());

        let item = store.fetch(item_id).await.unwrap();
        assert_eq!(item.status, InboxItemStatus::New);
        assert!(store.extraction_count() == 0);
    }

    #[tokio::test]
    async fn test_run_invalid_response_is_validation_error() {
        let (store, service) = scripted(r#"{"events": "not an array"}"#);
        let item_id = seed_item(&store).await;

        let err = service.run(item_id).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(store.extraction_count() == 0);

        // The item stays New so a later re-run can still parse it.
        let item = store.fetch(item_id).await.unwrap();
        assert_eq!(item.status, InboxItemStatus::New);
    }

    #[tokio::test]
    async fn test_run_prompt_carries_workspace_context() {
        let (store, service) = scripted("null");
        let item_id = seed_item(&store).await;
        let handle = service.client.backend().clone();

        service.run(item_id).await.unwrap();

        let calls = handle.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].prompt.contains("Subject: Dentist"));
        assert!(calls[0].prompt.contains("Timezone: Europe/Berlin"));
        assert!(calls[0].prompt.contains("Locale: de"));
        assert_eq!(calls[0].system, SYSTEM_PROMPT);
    }
}
