//! Integration tests for the inbox extraction lifecycle.
//!
//! This test suite validates:
//! - Inbox item status transitions (new -> parsed -> archived)
//! - Atomic extraction recording with ordered suggestions
//! - Suggestion resolution (accept / reject)
//! - Job queue claim, retry, and exhaustion semantics
//!
//! **IMPORTANT**: These tests require a migrated PostgreSQL database and are
//! marked `#[ignore]`. The queue tests claim from a shared table, so run them
//! serially: `cargo test -- --ignored --test-threads=1` with `DATABASE_URL` set.

use chrono::{Duration, Utc};
use serde_json::json;
use sift_db::{
    CreateInboxItemRequest, Database, ExtractionRepository, FailureDisposition,
    InboxItemRepository, InboxItemSource, InboxItemStatus, JobRepository, JobStatus, JobType,
    NewSuggestion, SuggestionRepository, SuggestionStatus, SuggestionType, WorkspaceRepository,
};
use uuid::Uuid;

const DEFAULT_TEST_DATABASE_URL: &str = "postgres://localhost/sift_test";

/// Helper to create a test database connection with migrations applied.
async fn setup_test_db() -> Database {
    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_TEST_DATABASE_URL.to_string());

    let db = Database::connect(&database_url)
        .await
        .expect("Failed to connect to test database");
    db.migrate().await.expect("Failed to run migrations");
    db
}

/// Create a workspace and one fresh inbox item for it.
async fn seed_item(db: &Database) -> (Uuid, Uuid) {
    let workspace = db
        .workspaces
        .create(&format!("test-ws-{}", Uuid::now_v7()), "UTC", "en")
        .await
        .expect("Failed to create workspace");

    let item_id = db
        .inbox_items
        .insert(CreateInboxItemRequest {
            workspace_id: workspace.id,
            source: InboxItemSource::Email,
            raw_subject: Some("Dentist appointment".to_string()),
            raw_content: "Dentist on Tuesday at 3pm, and remember to pay rent.".to_string(),
            received_at: Utc::now(),
        })
        .await
        .expect("Failed to insert inbox item");

    (workspace.id, item_id)
}

#[tokio::test]
#[ignore]
async fn test_record_run_marks_item_parsed_with_ordered_suggestions() {
    let db = setup_test_db().await;
    let (_, item_id) = seed_item(&db).await;

    let item = db.inbox_items.fetch(item_id).await.unwrap();
    assert_eq!(item.status, InboxItemStatus::New);

    let extraction = db
        .extractions
        .record_run(
            item_id,
            "test-model",
            "v1",
            json!({"events": [], "reminders": [], "tasks": []}),
            vec![
                NewSuggestion {
                    suggestion_type: SuggestionType::Event,
                    payload: json!({"title": "Dentist", "start": "2026-09-01T15:00:00Z"}),
                },
                NewSuggestion {
                    suggestion_type: SuggestionType::Reminder,
                    payload: json!({"message": "Pay rent"}),
                },
            ],
        )
        .await
        .expect("Failed to record extraction");

    let item = db.inbox_items.fetch(item_id).await.unwrap();
    assert_eq!(item.status, InboxItemStatus::Parsed);

    let suggestions = db
        .suggestions
        .list_for_extraction(extraction.id)
        .await
        .unwrap();
    assert_eq!(suggestions.len(), 2);
    assert_eq!(suggestions[0].suggestion_type, SuggestionType::Event);
    assert_eq!(suggestions[1].suggestion_type, SuggestionType::Reminder);
    assert!(suggestions
        .iter()
        .all(|s| s.status == SuggestionStatus::Proposed));

    let latest = db.extractions.latest_for_item(item_id).await.unwrap();
    assert_eq!(latest.map(|e| e.id), Some(extraction.id));
}

#[tokio::test]
#[ignore]
async fn test_rerun_keeps_status_and_archive_is_terminal() {
    let db = setup_test_db().await;
    let (_, item_id) = seed_item(&db).await;

    db.extractions
        .record_run(item_id, "test-model", "v1", json!(null), vec![])
        .await
        .unwrap();

    // Second run on a parsed item records another extraction but the
    // status stays where it is.
    db.extractions
        .record_run(item_id, "test-model", "v1", json!(null), vec![])
        .await
        .unwrap();
    let item = db.inbox_items.fetch(item_id).await.unwrap();
    assert_eq!(item.status, InboxItemStatus::Parsed);

    db.inbox_items.archive(item_id).await.unwrap();
    let item = db.inbox_items.fetch(item_id).await.unwrap();
    assert_eq!(item.status, InboxItemStatus::Archived);

    // A run against an archived item never revives it.
    db.extractions
        .record_run(item_id, "test-model", "v1", json!(null), vec![])
        .await
        .unwrap();
    let item = db.inbox_items.fetch(item_id).await.unwrap();
    assert_eq!(item.status, InboxItemStatus::Archived);

    let extractions = db.extractions.list_for_item(item_id).await.unwrap();
    assert_eq!(extractions.len(), 3);
}

#[tokio::test]
#[ignore]
async fn test_suggestion_accept_and_reject() {
    let db = setup_test_db().await;
    let (workspace_id, item_id) = seed_item(&db).await;

    let extraction = db
        .extractions
        .record_run(
            item_id,
            "test-model",
            "v1",
            json!(null),
            vec![
                NewSuggestion {
                    suggestion_type: SuggestionType::Task,
                    payload: json!({"title": "Buy stamps"}),
                },
                NewSuggestion {
                    suggestion_type: SuggestionType::Task,
                    payload: json!({"title": "Return library books"}),
                },
            ],
        )
        .await
        .unwrap();

    let suggestions = db
        .suggestions
        .list_for_extraction(extraction.id)
        .await
        .unwrap();

    let accepted = db.suggestions.accept(suggestions[0].id).await.unwrap();
    assert_eq!(accepted.status, SuggestionStatus::Accepted);

    let rejected = db.suggestions.reject(suggestions[1].id).await.unwrap();
    assert_eq!(rejected.status, SuggestionStatus::Rejected);

    // Resolution is an overwrite, not a one-way gate.
    let flipped = db.suggestions.reject(suggestions[0].id).await.unwrap();
    assert_eq!(flipped.status, SuggestionStatus::Rejected);

    let pending = db
        .suggestions
        .list_for_workspace(workspace_id, Some(SuggestionStatus::Proposed), None, 50, 0)
        .await
        .unwrap();
    assert!(pending.is_empty());
}

#[tokio::test]
#[ignore]
async fn test_job_retry_until_exhausted() {
    let db = setup_test_db().await;
    let (_, item_id) = seed_item(&db).await;

    // Zero backoff so failed jobs are immediately claimable again.
    let jobs = db.jobs.clone().with_retry_backoff(Duration::zero());

    let job_id = jobs
        .enqueue(Some(item_id), JobType::Extraction, None)
        .await
        .unwrap();

    for attempt in 1..3 {
        let job = jobs
            .claim_next(&[JobType::Extraction])
            .await
            .unwrap()
            .expect("job should be claimable");
        assert_eq!(job.id, job_id);
        assert_eq!(job.attempts, attempt);

        let disposition = jobs.fail(job_id, "model unavailable").await.unwrap();
        assert_eq!(disposition, FailureDisposition::Retried { attempt });
    }

    let job = jobs
        .claim_next(&[JobType::Extraction])
        .await
        .unwrap()
        .expect("final attempt should be claimable");
    assert_eq!(job.attempts, 3);

    let disposition = jobs.fail(job_id, "model unavailable").await.unwrap();
    assert_eq!(disposition, FailureDisposition::Exhausted);

    // Failed is terminal; the job is no longer pending and cannot be
    // claimed again.
    let job = jobs.get(job_id).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    assert_eq!(job.error_message.as_deref(), Some("model unavailable"));
}

#[tokio::test]
#[ignore]
async fn test_retry_backoff_defers_reclaim() {
    let db = setup_test_db().await;
    let (_, item_id) = seed_item(&db).await;

    let job_id = db
        .jobs
        .enqueue(Some(item_id), JobType::Extraction, None)
        .await
        .unwrap();

    let claimed = db
        .jobs
        .claim_next(&[JobType::Extraction])
        .await
        .unwrap()
        .map(|j| j.id);
    assert_eq!(claimed, Some(job_id));

    // Default backoff pushes run_after into the future, so the job is
    // pending but not yet runnable.
    db.jobs.fail(job_id, "timeout").await.unwrap();

    let job = db.jobs.get(job_id).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Pending);
    assert!(job.run_after > Utc::now());
    assert!(job.started_at.is_none());
}

#[tokio::test]
#[ignore]
async fn test_permanent_failure_skips_remaining_attempts() {
    let db = setup_test_db().await;
    let (_, item_id) = seed_item(&db).await;

    let job_id = db
        .jobs
        .enqueue(Some(item_id), JobType::Extraction, None)
        .await
        .unwrap();
    db.jobs.claim_next(&[JobType::Extraction]).await.unwrap();

    db.jobs
        .fail_permanent(job_id, "response failed schema validation")
        .await
        .unwrap();

    let job = db.jobs.get(job_id).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    assert!(job.attempts < job.max_attempts);

    let history = db.jobs.jobs_for_item(item_id).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id, job_id);
}
