//! Mock generation backend for deterministic testing.
//!
//! Scripts responses and failures for the extraction pipeline without a
//! live model server. Clones share the same script and call log, so tests
//! can keep a handle after moving the backend into a client or service.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sift_inference::mock::MockGenerationBackend;
//!
//! let backend = MockGenerationBackend::new()
//!     .with_response(r#"{"events": [], "reminders": [], "tasks": []}"#);
//! ```

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use sift_core::{Error, GenerationBackend, Result};

type FailureFactory = Arc<dyn Fn() -> Error + Send + Sync>;

enum ScriptEntry {
    Response(String),
    Failure(FailureFactory),
}

/// One recorded call to the mock backend.
#[derive(Debug, Clone)]
pub struct MockCall {
    pub system: String,
    pub prompt: String,
    pub schema: JsonValue,
}

/// Mock generation backend for testing.
#[derive(Clone)]
pub struct MockGenerationBackend {
    script: Arc<Mutex<VecDeque<ScriptEntry>>>,
    default_response: Arc<Mutex<String>>,
    model: String,
    call_log: Arc<Mutex<Vec<MockCall>>>,
}

impl MockGenerationBackend {
    /// Create a new mock backend. With no script, every call returns an
    /// empty extraction response.
    pub fn new() -> Self {
        Self {
            script: Arc::new(Mutex::new(VecDeque::new())),
            default_response: Arc::new(Mutex::new(
                r#"{"events": [], "reminders": [], "tasks": []}"#.to_string(),
            )),
            model: "mock-model".to_string(),
            call_log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Queue a response. Scripted entries are consumed in order; once the
    /// script is exhausted, calls fall back to the default response.
    pub fn with_response(self, response: impl Into<String>) -> Self {
        self.script
            .lock()
            .unwrap()
            .push_back(ScriptEntry::Response(response.into()));
        self
    }

    /// Queue a failure built by the given factory.
    pub fn with_failure(self, factory: impl Fn() -> Error + Send + Sync + 'static) -> Self {
        self.script
            .lock()
            .unwrap()
            .push_back(ScriptEntry::Failure(Arc::new(factory)));
        self
    }

    /// Set the fallback response used when the script is exhausted.
    pub fn with_default_response(self, response: impl Into<String>) -> Self {
        *self.default_response.lock().unwrap() = response.into();
        self
    }

    /// Set the reported model identifier.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// All recorded calls, in order.
    pub fn calls(&self) -> Vec<MockCall> {
        self.call_log.lock().unwrap().clone()
    }

    /// Number of calls made so far.
    pub fn call_count(&self) -> usize {
        self.call_log.lock().unwrap().len()
    }

    /// Clear the call log.
    pub fn clear_calls(&self) {
        self.call_log.lock().unwrap().clear()
    }
}

impl Default for MockGenerationBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GenerationBackend for MockGenerationBackend {
    async fn generate_structured(
        &self,
        system: &str,
        prompt: &str,
        schema: &JsonValue,
    ) -> Result<String> {
        self.call_log.lock().unwrap().push(MockCall {
            system: system.to_string(),
            prompt: prompt.to_string(),
            schema: schema.clone(),
        });

        let entry = self.script.lock().unwrap().pop_front();
        match entry {
            Some(ScriptEntry::Response(response)) => Ok(response),
            Some(ScriptEntry::Failure(factory)) => Err(factory()),
            None => Ok(self.default_response.lock().unwrap().clone()),
        }
    }

    fn model_version(&self) -> &str {
        &self.model
    }
}
