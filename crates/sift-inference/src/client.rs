//! Extraction client: one structured model call, parsed and validated.
//!
//! The client owns the model-facing half of an extraction run. It does no
//! persistence and no retries; the job layer decides what happens when a
//! call fails.

use std::time::Instant;

use serde_json::Value as JsonValue;
use tracing::{debug, info};

use sift_core::{
    prompt::PROMPT_VERSION, response_schema, validate_response, Error, ExtractionResponse,
    GenerationBackend, Result,
};

/// Outcome of a successful extraction call.
#[derive(Debug, Clone)]
pub struct ValidatedExtraction {
    /// The model's response, verbatim. This is what gets persisted.
    pub raw: JsonValue,
    /// The schema-validated view of the same response.
    pub parsed: ExtractionResponse,
    /// Model identifier recorded for reproducibility.
    pub model_version: String,
    /// Prompt template version recorded for reproducibility.
    pub prompt_version: String,
}

/// Client wrapping a [`GenerationBackend`] with the extraction contract.
pub struct ExtractionClient<B: GenerationBackend> {
    backend: B,
    schema: JsonValue,
}

impl<B: GenerationBackend> ExtractionClient<B> {
    /// Create a client over the given backend. The response schema is built
    /// once here; it is the same for every call.
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            schema: response_schema(),
        }
    }

    /// Access the wrapped backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Run one extraction call.
    ///
    /// A model response of JSON `null` is treated as "nothing to extract":
    /// the parsed view is empty and the raw `null` is kept verbatim. Any
    /// response that is not valid JSON, or that violates the schema, is a
    /// [`Error::Validation`] — re-sending the same prompt will not fix it.
    pub async fn extract(&self, system: &str, prompt: &str) -> Result<ValidatedExtraction> {
        let start = Instant::now();

        let response = self
            .backend
            .generate_structured(system, prompt, &self.schema)
            .await?;

        let raw: JsonValue = serde_json::from_str(&response)
            .map_err(|e| Error::Validation(format!("response is not valid JSON: {}", e)))?;

        let parsed = if raw.is_null() {
            debug!(
                subsystem = "inference",
                component = "client",
                op = "extract",
                "Model returned null; nothing to extract"
            );
            ExtractionResponse::empty()
        } else {
            validate_response(&raw)?
        };

        info!(
            subsystem = "inference",
            component = "client",
            op = "extract",
            model = self.backend.model_version(),
            duration_ms = start.elapsed().as_millis() as u64,
            item_count = parsed.total_items(),
            "Extraction call validated"
        );

        Ok(ValidatedExtraction {
            raw,
            parsed,
            model_version: self.backend.model_version().to_string(),
            prompt_version: PROMPT_VERSION.to_string(),
        })
    }
}
