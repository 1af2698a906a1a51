//! The structured-output contract for extraction.
//!
//! Defines the typed shape a model response must conform to, the JSON schema
//! handed to the model to constrain generation, and the validation pass that
//! turns a raw response into a typed result. Shape violations are
//! [`Error::Validation`](crate::Error::Validation), never coerced.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::{Error, Result};

/// A calendar event extracted from the content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EventItem {
    /// The title of the event.
    pub title: String,
    /// The date of the event in YYYY-MM-DD format.
    pub date: String,
    /// The time of the event in HH:MM format (24-hour).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    /// The end time of the event in HH:MM format (24-hour).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    /// The location of the event.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

/// A reminder extracted from the content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ReminderItem {
    /// The reminder message.
    pub message: String,
    /// When to remind, in ISO 8601 datetime format.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remind_at: Option<String>,
    /// Relative time offset like "1 day before" or "2 hours before".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<String>,
}

/// Task priority levels the model may assign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
}

/// A task or to-do item extracted from the content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TaskItem {
    /// The title of the task.
    pub title: String,
    /// The due date in YYYY-MM-DD format.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    /// The priority: low, medium, or high.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<TaskPriority>,
}

/// The full extraction result the model must return.
///
/// All three arrays are required at the top level, even when empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ExtractionResponse {
    /// Calendar events extracted from the content.
    pub events: Vec<EventItem>,
    /// Reminders extracted from the content.
    pub reminders: Vec<ReminderItem>,
    /// Tasks or to-dos extracted from the content.
    pub tasks: Vec<TaskItem>,
}

impl ExtractionResponse {
    /// An empty result with all three arrays present.
    pub fn empty() -> Self {
        Self {
            events: Vec::new(),
            reminders: Vec::new(),
            tasks: Vec::new(),
        }
    }

    /// Total number of extracted entries across all three arrays.
    pub fn total_items(&self) -> usize {
        self.events.len() + self.reminders.len() + self.tasks.len()
    }
}

/// JSON schema for the extraction result, passed to the model as the
/// structured-output format constraint.
pub fn response_schema() -> JsonValue {
    let schema = schemars::schema_for!(ExtractionResponse);
    serde_json::to_value(schema).unwrap_or(JsonValue::Null)
}

fn require_non_empty(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::Validation(format!("{field} must be non-empty")));
    }
    Ok(())
}

fn require_date(field: &str, value: &str) -> Result<()> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(|_| ())
        .map_err(|_| Error::Validation(format!("{field} is not a YYYY-MM-DD date: {value:?}")))
}

fn require_time(field: &str, value: &str) -> Result<()> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .map(|_| ())
        .map_err(|_| Error::Validation(format!("{field} is not an HH:MM time: {value:?}")))
}

fn require_datetime(field: &str, value: &str) -> Result<()> {
    if DateTime::parse_from_rfc3339(value).is_ok()
        || NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S").is_ok()
    {
        return Ok(());
    }
    Err(Error::Validation(format!(
        "{field} is not an ISO 8601 datetime: {value:?}"
    )))
}

/// Validate a raw model response against the extraction contract.
///
/// Checks the top-level shape (all three arrays present, entries correctly
/// typed) and the per-field contracts: required strings non-empty, dates in
/// YYYY-MM-DD, times in HH:MM, remind_at in ISO 8601. Returns the typed
/// result on success.
pub fn validate_response(raw: &JsonValue) -> Result<ExtractionResponse> {
    let parsed: ExtractionResponse = serde_json::from_value(raw.clone())
        .map_err(|e| Error::Validation(format!("response does not match schema: {e}")))?;

    for (i, event) in parsed.events.iter().enumerate() {
        require_non_empty(&format!("events[{i}].title"), &event.title)?;
        require_date(&format!("events[{i}].date"), &event.date)?;
        if let Some(time) = &event.time {
            require_time(&format!("events[{i}].time"), time)?;
        }
        if let Some(end_time) = &event.end_time {
            require_time(&format!("events[{i}].end_time"), end_time)?;
        }
    }

    for (i, reminder) in parsed.reminders.iter().enumerate() {
        require_non_empty(&format!("reminders[{i}].message"), &reminder.message)?;
        if let Some(remind_at) = &reminder.remind_at {
            require_datetime(&format!("reminders[{i}].remind_at"), remind_at)?;
        }
    }

    for (i, task) in parsed.tasks.iter().enumerate() {
        require_non_empty(&format!("tasks[{i}].title"), &task.title)?;
        if let Some(due_date) = &task.due_date {
            require_date(&format!("tasks[{i}].due_date"), due_date)?;
        }
    }

    Ok(parsed)
}
