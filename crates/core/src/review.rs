//! Publish update assembled by the review flow.
//!
//! Selecting a title or thumbnail writes a reference (the title text and the
//! thumbnail URL) onto the story, together with the edited description,
//! tags, and the single status transition a client is allowed to make:
//! `ready_for_review` -> `publishing`.

use serde::Serialize;

use crate::error::CoreError;
use crate::status::StoryStatus;
use crate::story::StoryDetail;

/// Row update sent when the operator publishes a reviewed story.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublishUpdate {
    pub selected_title: String,
    pub selected_thumbnail_url: String,
    pub description: String,
    pub tags: Vec<String>,
    pub status: StoryStatus,
}

/// Split a comma-separated tag string, trimming entries and dropping
/// empty ones.
pub fn parse_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Validate a review selection against the loaded story and build the
/// publish update.
///
/// Both a title and a thumbnail must be selected, each must belong to the
/// story, and the story must be waiting on review.
pub fn build_publish_update(
    detail: &StoryDetail,
    title_option_id: Option<uuid::Uuid>,
    thumbnail_option_id: Option<uuid::Uuid>,
    description: &str,
    tags: &str,
) -> Result<PublishUpdate, CoreError> {
    let (title_id, thumbnail_id) = match (title_option_id, thumbnail_option_id) {
        (Some(title), Some(thumb)) => (title, thumb),
        (None, Some(_)) => {
            return Err(CoreError::Validation(
                "A title must be selected before publishing".to_string(),
            ))
        }
        (Some(_), None) => {
            return Err(CoreError::Validation(
                "A thumbnail must be selected before publishing".to_string(),
            ))
        }
        (None, None) => {
            return Err(CoreError::Validation(
                "Title and thumbnail must be selected before publishing".to_string(),
            ))
        }
    };

    if detail.status() != StoryStatus::ReadyForReview {
        return Err(CoreError::Conflict(format!(
            "Story not in publishable state. Current status: {}",
            detail.status()
        )));
    }

    let title = detail
        .title_option(title_id)
        .ok_or_else(|| CoreError::NotFound {
            entity: "title_option",
            id: title_id.to_string(),
        })?;
    let thumbnail = detail
        .thumbnail_option(thumbnail_id)
        .ok_or_else(|| CoreError::NotFound {
            entity: "thumbnail_option",
            id: thumbnail_id.to_string(),
        })?;

    Ok(PublishUpdate {
        selected_title: title.title_text.clone(),
        selected_thumbnail_url: thumbnail.image_url.clone(),
        description: description.to_string(),
        tags: parse_tags(tags),
        status: StoryStatus::Publishing,
    })
}
