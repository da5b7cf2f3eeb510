//! Story, scene and review-option models plus the create-story request.
//!
//! Rows arrive from two places: the pipeline REST API and the backend change
//! feed. Both deliver the same column names, but the change feed sends raw
//! rows where list/map columns may be `null`, so those fields deserialize
//! `null` as empty.

use serde::{Deserialize, Deserializer, Serialize};
use validator::{Validate, ValidationError};

use crate::error::CoreError;
use crate::status::StoryStatus;
use crate::types::{StoryId, Timestamp};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const DEFAULT_TARGET_DURATION_MINUTES: u32 = 8;
pub const DEFAULT_LANGUAGE: &str = "en-US";
pub const DEFAULT_STYLE: &str = "cinematic";
pub const DEFAULT_ASPECT_RATIO: &str = "16:9";

/// Accepted visual styles.
pub const VALID_STYLES: &[&str] = &["cinematic", "anime", "realistic", "3d"];

/// Accepted output aspect ratios.
pub const VALID_ASPECT_RATIOS: &[&str] = &["16:9", "9:16"];

/// Deserialize `null` as the type's default value.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// ---------------------------------------------------------------------------
// Story
// ---------------------------------------------------------------------------

/// A story summary, as listed by `GET /stories` and carried by change-feed
/// rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Story {
    pub id: StoryId,
    pub topic: String,
    pub status: StoryStatus,
    pub style: String,
    pub aspect_ratio: String,
    /// Not every list endpoint revision returns this; the detail endpoint
    /// always does.
    #[serde(default)]
    pub target_duration_minutes: Option<u32>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub languages: Vec<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    #[serde(default)]
    pub description: Option<String>,
    /// Only populated when `status` is `failed`.
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub video_url: Option<String>,
    /// Public URL on the video platform once published.
    #[serde(default, rename = "youtube_url")]
    pub publish_url: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl Story {
    /// List violations of the story data invariants.
    ///
    /// The backend is authoritative, so callers log these rather than
    /// rejecting the row.
    pub fn consistency_issues(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if self.error_message.is_some() && self.status != StoryStatus::Failed {
            issues.push(format!(
                "error_message present while status is '{}'",
                self.status
            ));
        }

        // A failed story may have failed after its artifacts were produced.
        if self.status != StoryStatus::Failed {
            if self.video_url.is_some() && !self.status.has_reached(StoryStatus::PostProduction) {
                issues.push(format!("video_url present while status is '{}'", self.status));
            }
            if self.publish_url.is_some() && self.status != StoryStatus::Published {
                issues.push(format!(
                    "publish URL present while status is '{}'",
                    self.status
                ));
            }
        }

        issues
    }
}

// ---------------------------------------------------------------------------
// Scene
// ---------------------------------------------------------------------------

/// A timed sub-unit of a story's produced content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub id: uuid::Uuid,
    #[serde(default)]
    pub story_id: Option<StoryId>,
    /// Display position, unique within a story.
    pub scene_order: i32,
    pub text_content: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub audio_url: Option<String>,
    #[serde(default)]
    pub duration_seconds: Option<f64>,
}

// ---------------------------------------------------------------------------
// Review options
// ---------------------------------------------------------------------------

/// A generated title candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TitleOption {
    pub id: uuid::Uuid,
    #[serde(default)]
    pub story_id: Option<StoryId>,
    pub title_text: String,
}

/// A generated thumbnail candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThumbnailOption {
    pub id: uuid::Uuid,
    #[serde(default)]
    pub story_id: Option<StoryId>,
    pub image_url: String,
    #[serde(default)]
    pub prompt: Option<String>,
    /// Regeneration counter; the newest thumbnail has the highest version.
    #[serde(default = "default_thumbnail_version")]
    pub version: i32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub feedback_history: Vec<serde_json::Value>,
}

fn default_thumbnail_version() -> i32 {
    1
}

// ---------------------------------------------------------------------------
// StoryDetail
// ---------------------------------------------------------------------------

/// Full story detail returned by `GET /stories/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryDetail {
    #[serde(flatten)]
    pub story: Story,
    #[serde(default)]
    pub script_text: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub scenes: Vec<Scene>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title_options: Vec<TitleOption>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub thumbnail_options: Vec<ThumbnailOption>,
    #[serde(default)]
    pub selected_title: Option<String>,
    #[serde(default)]
    pub selected_thumbnail_url: Option<String>,
}

impl StoryDetail {
    pub fn id(&self) -> StoryId {
        self.story.id
    }

    pub fn status(&self) -> StoryStatus {
        self.story.status
    }

    /// Scenes in display order.
    pub fn ordered_scenes(&self) -> Vec<&Scene> {
        let mut scenes: Vec<&Scene> = self.scenes.iter().collect();
        scenes.sort_by_key(|s| s.scene_order);
        scenes
    }

    /// Sum of known scene durations, in seconds.
    pub fn total_duration_seconds(&self) -> f64 {
        self.scenes.iter().filter_map(|s| s.duration_seconds).sum()
    }

    pub fn title_option(&self, id: uuid::Uuid) -> Option<&TitleOption> {
        self.title_options.iter().find(|t| t.id == id)
    }

    pub fn thumbnail_option(&self, id: uuid::Uuid) -> Option<&ThumbnailOption> {
        self.thumbnail_options.iter().find(|t| t.id == id)
    }

    /// Thumbnails ordered newest version first.
    pub fn thumbnails_newest_first(&self) -> Vec<&ThumbnailOption> {
        let mut thumbs: Vec<&ThumbnailOption> = self.thumbnail_options.iter().collect();
        thumbs.sort_by(|a, b| b.version.cmp(&a.version));
        thumbs
    }
}

// ---------------------------------------------------------------------------
// CreateStoryRequest
// ---------------------------------------------------------------------------

/// Body of `POST /stories`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct CreateStoryRequest {
    #[validate(length(min = 1, message = "topic must not be empty"))]
    pub topic: String,
    #[serde(default)]
    pub description: String,
    #[validate(range(min = 1, message = "target duration must be positive"))]
    pub target_duration_minutes: u32,
    #[validate(length(min = 1, message = "at least one language is required"))]
    pub languages: Vec<String>,
    #[validate(custom(function = "validate_style"))]
    pub style: String,
    #[validate(custom(function = "validate_aspect_ratio"))]
    pub aspect_ratio: String,
}

impl CreateStoryRequest {
    /// A request for `topic` with every other field at its default.
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            description: String::new(),
            target_duration_minutes: DEFAULT_TARGET_DURATION_MINUTES,
            languages: vec![DEFAULT_LANGUAGE.to_string()],
            style: DEFAULT_STYLE.to_string(),
            aspect_ratio: DEFAULT_ASPECT_RATIO.to_string(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_target_duration(mut self, minutes: u32) -> Self {
        self.target_duration_minutes = minutes;
        self
    }

    pub fn with_languages(mut self, languages: Vec<String>) -> Self {
        self.languages = languages;
        self
    }

    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.style = style.into();
        self
    }

    pub fn with_aspect_ratio(mut self, aspect_ratio: impl Into<String>) -> Self {
        self.aspect_ratio = aspect_ratio.into();
        self
    }

    /// Run field validation, mapping failures to [`CoreError::Validation`].
    pub fn check(&self) -> Result<(), CoreError> {
        self.validate()
            .map_err(|e| CoreError::Validation(e.to_string()))
    }
}

fn validate_style(style: &str) -> Result<(), ValidationError> {
    if VALID_STYLES.contains(&style) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_style").with_message(
            format!("style must be one of: {}", VALID_STYLES.join(", ")).into(),
        ))
    }
}

fn validate_aspect_ratio(aspect_ratio: &str) -> Result<(), ValidationError> {
    if VALID_ASPECT_RATIOS.contains(&aspect_ratio) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_aspect_ratio").with_message(
            format!(
                "aspect ratio must be one of: {}",
                VALID_ASPECT_RATIOS.join(", ")
            )
            .into(),
        ))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
