//! # sift-inference
//!
//! LLM generation backend abstraction for sift.
//!
//! This crate provides:
//! - The Ollama backend (structured output via `/api/chat` with a JSON
//!   schema `format` constraint)
//! - The extraction client, which validates model responses against the
//!   extraction contract
//! - A scripted mock backend for tests

pub mod client;
pub mod mock;
pub mod ollama;

// Re-export core types
pub use sift_core::*;

pub use client::{ExtractionClient, ValidatedExtraction};
pub use mock::MockGenerationBackend;
pub use ollama::OllamaBackend;
