use thiserror::Error;

/// Core error type for the Sluice runtime
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Workflow instance not found
    #[error("Workflow instance not found: {0}")]
    WorkflowNotFound(String),

    /// Event not found
    #[error("Event not found: {0}")]
    EventNotFound(String),

    /// Event subscription not found
    #[error("Event subscription not found: {0}")]
    SubscriptionNotFound(String),

    /// A record with the same identity already exists
    #[error("Conflicting record: {0}")]
    Conflict(String),

    /// State store error
    #[error("State store error: {0}")]
    StateStore(String),

    /// Mapping between domain and persisted state failed
    #[error("Mapping error: {0}")]
    Mapping(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::Serialization(err.to_string())
    }
}

impl From<String> for CoreError {
    fn from(err: String) -> Self {
        CoreError::Other(err)
    }
}

impl From<&str> for CoreError {
    fn from(err: &str) -> Self {
        CoreError::Other(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let errors = vec![
            (
                CoreError::WorkflowNotFound("instance1".to_string()),
                "Workflow instance not found: instance1",
            ),
            (
                CoreError::EventNotFound("event1".to_string()),
                "Event not found: event1",
            ),
            (
                CoreError::SubscriptionNotFound("sub1".to_string()),
                "Event subscription not found: sub1",
            ),
            (
                CoreError::Conflict("instance1".to_string()),
                "Conflicting record: instance1",
            ),
            (
                CoreError::StateStore("db_err".to_string()),
                "State store error: db_err",
            ),
            (
                CoreError::Mapping("bad id".to_string()),
                "Mapping error: bad id",
            ),
            (
                CoreError::Serialization("ser_err".to_string()),
                "Serialization error: ser_err",
            ),
            (CoreError::Other("other_err".to_string()), "other_err"),
        ];

        for (error, expected_msg) in errors {
            assert_eq!(error.to_string(), expected_msg);
        }
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_error = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let error: CoreError = json_error.into();

        match error {
            CoreError::Serialization(msg) => {
                assert!(msg.contains("expected value"));
            }
            _ => panic!("Expected Serialization variant"),
        }
    }

    #[test]
    fn test_from_string() {
        let error: CoreError = "test error message".to_string().into();

        match error {
            CoreError::Other(msg) => {
                assert_eq!(msg, "test error message");
            }
            _ => panic!("Expected Other variant"),
        }
    }

    #[test]
    fn test_error_clone_and_eq() {
        let original = CoreError::Conflict("test".to_string());
        let cloned = original.clone();

        assert_eq!(original, cloned);
    }
}
