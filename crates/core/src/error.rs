/// Domain-level failures shared by every layer above the core.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: String },

    /// Input rejected locally, before any request is made.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The story is not in a state that allows the operation.
    #[error("Conflict: {0}")]
    Conflict(String),
}
