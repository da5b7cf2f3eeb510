/// Stories and their child rows are keyed by UUID.
pub type StoryId = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
