//! Story-level events produced from raw row changes.

use reelboard_core::story::Story;
use reelboard_core::types::StoryId;
use serde::Deserialize;

use crate::messages::{ChangeKind, PostgresChange};

/// A change to the story collection.
#[derive(Debug, Clone, PartialEq)]
pub enum StoryChange {
    /// A row was inserted or updated; carries the full new row.
    Upsert(Story),
    /// A row was deleted.
    Delete { id: StoryId },
}

/// What a [`Subscription`](crate::Subscription) yields.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent {
    Change(StoryChange),
    /// The channel was joined on the first attempt. Changes are delivered
    /// from here on; anything committed earlier is not.
    Joined,
    /// The channel was joined after a failed first attempt or a dropped
    /// socket; changes in between may have been missed.
    Reconnected,
}

#[derive(Deserialize)]
struct KeyOnly {
    id: StoryId,
}

impl StoryChange {
    /// Convert a row change into a story change.
    ///
    /// Returns a description of the problem when the row does not carry
    /// what the change kind requires.
    pub fn from_postgres_change(change: &PostgresChange) -> Result<Self, String> {
        match change.kind {
            ChangeKind::Insert | ChangeKind::Update => {
                let record = change
                    .record
                    .clone()
                    .ok_or_else(|| "insert/update without record".to_string())?;
                serde_json::from_value::<Story>(record)
                    .map(StoryChange::Upsert)
                    .map_err(|e| format!("invalid story row: {e}"))
            }
            ChangeKind::Delete => {
                let old = change
                    .old_record
                    .clone()
                    .ok_or_else(|| "delete without old_record".to_string())?;
                serde_json::from_value::<KeyOnly>(old)
                    .map(|k| StoryChange::Delete { id: k.id })
                    .map_err(|e| format!("invalid deleted key: {e}"))
            }
        }
    }

    /// Identifier of the affected story.
    pub fn story_id(&self) -> StoryId {
        match self {
            StoryChange::Upsert(story) => story.id,
            StoryChange::Delete { id } => *id,
        }
    }
}

#[cfg(test)]
mod tests {
    use reelboard_core::status::StoryStatus;
    use serde_json::json;

    use super::*;

    fn change(kind: ChangeKind, record: Option<serde_json::Value>, old: Option<serde_json::Value>) -> PostgresChange {
        PostgresChange {
            kind,
            schema: "public".into(),
            table: "stories".into(),
            record,
            old_record: old,
            commit_timestamp: None,
        }
    }

    fn row(status: &str) -> serde_json::Value {
        json!({
            "id": "6f1c1d9e-2b1a-4a57-9d0e-1b8d3e1f0a01",
            "topic": "Library of Alexandria",
            "status": status,
            "style": "cinematic",
            "aspect_ratio": "16:9",
            "languages": null,
            "metadata": {},
            "created_at": "2026-01-05T10:00:00+00:00",
            "updated_at": "2026-01-05T10:00:00+00:00"
        })
    }

    #[test]
    fn update_becomes_upsert() {
        let c = StoryChange::from_postgres_change(&change(ChangeKind::Update, Some(row("rendering")), None)).unwrap();
        match c {
            StoryChange::Upsert(story) => assert_eq!(story.status, StoryStatus::Rendering),
            other => panic!("Expected Upsert, got {other:?}"),
        }
    }

    #[test]
    fn delete_reads_old_key() {
        let c = StoryChange::from_postgres_change(&change(
            ChangeKind::Delete,
            None,
            Some(json!({"id": "6f1c1d9e-2b1a-4a57-9d0e-1b8d3e1f0a01"})),
        ))
        .unwrap();
        assert_eq!(
            c.story_id().to_string(),
            "6f1c1d9e-2b1a-4a57-9d0e-1b8d3e1f0a01"
        );
    }

    #[test]
    fn insert_without_record_is_rejected() {
        assert!(StoryChange::from_postgres_change(&change(ChangeKind::Insert, None, None)).is_err());
    }

    #[test]
    fn row_with_unknown_status_is_rejected() {
        let result =
            StoryChange::from_postgres_change(&change(ChangeKind::Insert, Some(row("queued")), None));
        assert!(result.unwrap_err().contains("invalid story row"));
    }

    #[test]
    fn delete_without_id_is_rejected() {
        assert!(StoryChange::from_postgres_change(&change(ChangeKind::Delete, None, Some(json!({})))).is_err());
    }
}
