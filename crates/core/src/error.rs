use crate::types::DbId;

/// Domain-level error taxonomy shared by all satseg crates.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// A referenced entity does not exist. Always fatal to the current
    /// operation.
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    /// Input failed validation (image limits, bad dimensions,
    /// undeterminable format, malformed request payloads).
    #[error("Validation failed: {0}")]
    Validation(String),

    /// An update targeted a document that no longer exists.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// An external collaborator (object store, document store, control
    /// plane) failed for a reason other than "not found".
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
