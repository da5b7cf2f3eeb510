use reelboard_client::ApiError;
use reelboard_core::error::CoreError;

/// Errors surfaced by the synchronization views.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Core(#[from] CoreError),

    /// The operator declined a destructive action.
    #[error("Action cancelled: not confirmed")]
    NotConfirmed,

    /// The view is not watching any story.
    #[error("No story is active")]
    Inactive,
}

impl SyncError {
    /// Whether the backend reported the story (or a referenced option) as
    /// missing.
    pub fn is_not_found(&self) -> bool {
        match self {
            SyncError::Api(e) => e.is_not_found(),
            SyncError::Core(CoreError::NotFound { .. }) => true,
            _ => false,
        }
    }
}
