//! In-memory repository fakes for pipeline tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value as JsonValue;
use uuid::Uuid;

use sift_core::{
    CreateInboxItemRequest, Error, Extraction, ExtractionRepository, InboxItem, InboxItemRepository,
    InboxItemStatus, NewSuggestion, Result, Suggestion, SuggestionStatus, Workspace,
    WorkspaceRepository,
};

#[derive(Default)]
struct StoreInner {
    workspaces: HashMap<Uuid, Workspace>,
    items: HashMap<Uuid, InboxItem>,
    extractions: HashMap<Uuid, Extraction>,
    suggestions: Vec<Suggestion>,
}

/// In-memory store implementing the repository traits the extraction
/// pipeline needs. Clones share state.
#[derive(Clone, Default)]
pub struct FakeStore {
    inner: Arc<Mutex<StoreInner>>,
}

impl FakeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Test helper: create a workspace, panicking on error.
    pub async fn create_workspace(&self, name: &str, timezone: &str, locale: &str) -> Workspace {
        WorkspaceRepository::create(self, name, timezone, locale)
            .await
            .unwrap()
    }

    /// Suggestions recorded for one extraction, in creation order.
    pub fn suggestions_for_extraction(&self, extraction_id: Uuid) -> Vec<Suggestion> {
        self.inner
            .lock()
            .unwrap()
            .suggestions
            .iter()
            .filter(|s| s.extraction_id == extraction_id)
            .cloned()
            .collect()
    }

    /// Total number of recorded extractions.
    pub fn extraction_count(&self) -> usize {
        self.inner.lock().unwrap().extractions.len()
    }
}

#[async_trait]
impl WorkspaceRepository for FakeStore {
    async fn create(&self, name: &str, timezone: &str, locale: &str) -> Result<Workspace> {
        let workspace = Workspace {
            id: Uuid::now_v7(),
            name: name.to_string(),
            timezone: timezone.to_string(),
            locale: locale.to_string(),
            created_at: Utc::now(),
        };
        self.inner
            .lock()
            .unwrap()
            .workspaces
            .insert(workspace.id, workspace.clone());
        Ok(workspace)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Workspace>> {
        Ok(self.inner.lock().unwrap().workspaces.get(&id).cloned())
    }
}

#[async_trait]
impl InboxItemRepository for FakeStore {
    async fn insert(&self, req: CreateInboxItemRequest) -> Result<Uuid> {
        req.validate()?;
        let now = Utc::now();
        let item = InboxItem {
            id: Uuid::now_v7(),
            workspace_id: req.workspace_id,
            source: req.source,
            raw_subject: req.raw_subject,
            raw_content: req.raw_content,
            received_at: req.received_at,
            status: InboxItemStatus::New,
            created_at: now,
            updated_at: now,
        };
        let id = item.id;
        self.inner.lock().unwrap().items.insert(id, item);
        Ok(id)
    }

    async fn fetch(&self, id: Uuid) -> Result<InboxItem> {
        self.inner
            .lock()
            .unwrap()
            .items
            .get(&id)
            .cloned()
            .ok_or(Error::InboxItemNotFound(id))
    }

    async fn list_for_workspace(
        &self,
        workspace_id: Uuid,
        status: Option<InboxItemStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<InboxItem>> {
        let inner = self.inner.lock().unwrap();
        let mut items: Vec<InboxItem> = inner
            .items
            .values()
            .filter(|i| i.workspace_id == workspace_id)
            .filter(|i| status.map_or(true, |s| i.status == s))
            .cloned()
            .collect();
        items.sort_by(|a, b| b.received_at.cmp(&a.received_at));
        Ok(items
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn archive(&self, id: Uuid) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        let item = inner
            .items
            .get_mut(&id)
            .ok_or(Error::InboxItemNotFound(id))?;
        item.status = InboxItemStatus::Archived;
        item.updated_at = Utc::now();
        Ok(())
    }
}

#[async_trait]
impl ExtractionRepository for FakeStore {
    async fn record_run(
        &self,
        inbox_item_id: Uuid,
        model_version: &str,
        prompt_version: &str,
        raw_response: JsonValue,
        suggestions: Vec<NewSuggestion>,
    ) -> Result<Extraction> {
        let mut inner = self.inner.lock().unwrap();
        if !inner.items.contains_key(&inbox_item_id) {
            return Err(Error::InboxItemNotFound(inbox_item_id));
        }

        let now = Utc::now();
        let extraction = Extraction {
            id: Uuid::now_v7(),
            inbox_item_id,
            model_version: model_version.to_string(),
            prompt_version: prompt_version.to_string(),
            raw_response,
            created_at: now,
        };

        for new_suggestion in suggestions {
            inner.suggestions.push(Suggestion {
                id: Uuid::now_v7(),
                extraction_id: extraction.id,
                suggestion_type: new_suggestion.suggestion_type,
                payload: new_suggestion.payload,
                status: SuggestionStatus::Proposed,
                created_at: now,
                updated_at: now,
            });
        }

        if let Some(item) = inner.items.get_mut(&inbox_item_id) {
            if item.status == InboxItemStatus::New {
                item.status = InboxItemStatus::Parsed;
                item.updated_at = now;
            }
        }

        inner.extractions.insert(extraction.id, extraction.clone());
        Ok(extraction)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Extraction>> {
        Ok(self.inner.lock().unwrap().extractions.get(&id).cloned())
    }

    async fn list_for_item(&self, inbox_item_id: Uuid) -> Result<Vec<Extraction>> {
        let inner = self.inner.lock().unwrap();
        let mut extractions: Vec<Extraction> = inner
            .extractions
            .values()
            .filter(|e| e.inbox_item_id == inbox_item_id)
            .cloned()
            .collect();
        extractions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(extractions)
    }

    async fn latest_for_item(&self, inbox_item_id: Uuid) -> Result<Option<Extraction>> {
        Ok(self.list_for_item(inbox_item_id).await?.into_iter().next())
    }
}
