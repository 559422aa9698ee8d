use thiserror::Error;

/// Errors raised while mapping between domain and persisted state
///
/// None of these are retried internally, and there is no partial-success
/// mode: when a conversion fails the caller gets no record at all and must
/// not persist anything for that entity.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PersistenceError {
    /// A supplied identifier is not a valid storage identifier
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// A persisted payload blob could not be rebuilt into a live value
    #[error("Payload decode failure: {0}")]
    PayloadDecode(String),

    /// A payload value could not be represented in persisted form
    #[error("Payload encode failure: {0}")]
    PayloadEncode(String),
}
