//! # sift-core
//!
//! Core types, traits, and abstractions for sift.
//!
//! This crate provides the domain model (workspaces, inbox items,
//! extractions, suggestions), the structured-output extraction contract,
//! the prompt builder, and the trait definitions the other sift crates
//! depend on.

pub mod defaults;
pub mod error;
pub mod logging;
pub mod models;
pub mod prompt;
pub mod schema;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use models::*;
pub use prompt::{build_user_prompt, PromptContext, NO_SUBJECT, PROMPT_VERSION, SYSTEM_PROMPT};
pub use schema::{
    response_schema, validate_response, EventItem, ExtractionResponse, ReminderItem, TaskItem,
    TaskPriority,
};
pub use traits::*;
