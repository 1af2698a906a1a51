//! Error types for sift.

use thiserror::Error;

/// Result type alias using sift's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for sift operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Inbox item not found
    #[error("Inbox item not found: {0}")]
    InboxItemNotFound(uuid::Uuid),

    /// Suggestion not found
    #[error("Suggestion not found: {0}")]
    SuggestionNotFound(uuid::Uuid),

    /// Workspace not found
    #[error("Workspace not found: {0}")]
    WorkspaceNotFound(uuid::Uuid),

    /// Model response does not conform to the extraction schema
    #[error("Validation error: {0}")]
    Validation(String),

    /// The model provider call failed (network, auth, rate-limit, 5xx)
    #[error("Model error: {0}")]
    Model(String),

    /// The model call exceeded its allotted time
    #[error("Timeout error: {0}")]
    Timeout(String),

    /// Job queue error
    #[error("Job error: {0}")]
    Job(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// HTTP/network request failed
    #[error("Request error: {0}")]
    Request(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether the job wrapper should retry after this failure.
    ///
    /// Transient failures (provider outage, rate limit, timeout, transport)
    /// are worth another attempt; a schema-invalid response will not improve
    /// by re-sending the same prompt.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Error::Model(_) | Error::Timeout(_) | Error::Request(_)
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Error::Timeout(e.to_string())
        } else {
            Error::Request(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_error_display_not_found() {
        let err = Error::NotFound("test resource".to_string());
        assert_eq!(err.to_string(), "Not found: test resource");
    }

    #[test]
    fn test_error_display_inbox_item_not_found() {
        let id = Uuid::nil();
        let err = Error::InboxItemNotFound(id);
        assert_eq!(err.to_string(), format!("Inbox item not found: {}", id));
    }

    #[test]
    fn test_error_display_suggestion_not_found() {
        let id = Uuid::new_v4();
        let err = Error::SuggestionNotFound(id);
        assert!(err.to_string().contains(&id.to_string()));
    }

    #[test]
    fn test_error_display_validation() {
        let err = Error::Validation("missing field `events`".to_string());
        assert_eq!(err.to_string(), "Validation error: missing field `events`");
    }

    #[test]
    fn test_error_display_model() {
        let err = Error::Model("rate limited".to_string());
        assert_eq!(err.to_string(), "Model error: rate limited");
    }

    #[test]
    fn test_error_display_timeout() {
        let err = Error::Timeout("deadline exceeded".to_string());
        assert_eq!(err.to_string(), "Timeout error: deadline exceeded");
    }

    #[test]
    fn test_error_display_job() {
        let err = Error::Job("queue full".to_string());
        assert_eq!(err.to_string(), "Job error: queue full");
    }

    #[test]
    fn test_transient_errors_are_retryable() {
        assert!(Error::Model("503".into()).is_transient());
        assert!(Error::Timeout("slow".into()).is_transient());
        assert!(Error::Request("connection reset".into()).is_transient());
    }

    #[test]
    fn test_permanent_errors_are_not_retryable() {
        assert!(!Error::Validation("bad shape".into()).is_transient());
        assert!(!Error::InvalidInput("empty content".into()).is_transient());
        assert!(!Error::Internal("bug".into()).is_transient());
        assert!(!Error::NotFound("gone".into()).is_transient());
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<i32>("not a number").unwrap_err();
        let err: Error = json_err.into();
        match err {
            Error::Serialization(msg) => assert!(!msg.is_empty()),
            _ => panic!("Expected Serialization error"),
        }
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
    }

    #[test]
    fn test_result_type_ok() {
        fn get_result() -> Result<i32> {
            Ok(42)
        }
        assert_eq!(get_result().unwrap(), 42);
    }
}
