//! Review submission flow.
//!
//! Loads what the operator reviews (detail, options, a playable video URL),
//! tracks their selection and edits, and submits the single publish update.

use reelboard_core::error::CoreError;
use reelboard_core::review::{build_publish_update, PublishUpdate};
use reelboard_core::storage::StorageObject;
use reelboard_core::story::{StoryDetail, ThumbnailOption, TitleOption};
use reelboard_core::types::StoryId;
use uuid::Uuid;

use crate::confirm::Confirm;
use crate::error::SyncError;
use crate::source::{AssetSigner, PublishSink, StorySource};

/// Review state for one story.
#[derive(Debug, Clone)]
pub struct ReviewFlow {
    detail: StoryDetail,
    video_url: Option<String>,
    title_id: Option<Uuid>,
    thumbnail_id: Option<Uuid>,
    description: String,
    tags: String,
}

impl ReviewFlow {
    /// Load review data for `id`.
    ///
    /// A video URL that cannot be signed is logged and left unset; the
    /// review can proceed without a preview.
    pub async fn load(
        source: &dyn StorySource,
        signer: &dyn AssetSigner,
        id: StoryId,
    ) -> Result<Self, SyncError> {
        let detail = source.fetch_story(id).await?;

        let video_url = match signer.signed_url(&StorageObject::final_video(id)).await {
            Ok(url) => Some(url),
            Err(e) => {
                tracing::warn!(story_id = %id, error = %e, "Video preview unavailable");
                None
            }
        };

        Ok(Self::from_detail(detail, video_url))
    }

    /// Start a review from already-loaded data.
    pub fn from_detail(detail: StoryDetail, video_url: Option<String>) -> Self {
        let description = detail.story.description.clone().unwrap_or_default();
        Self {
            detail,
            video_url,
            title_id: None,
            thumbnail_id: None,
            description,
            tags: String::new(),
        }
    }

    pub fn detail(&self) -> &StoryDetail {
        &self.detail
    }

    pub fn story_id(&self) -> StoryId {
        self.detail.id()
    }

    pub fn video_url(&self) -> Option<&str> {
        self.video_url.as_deref()
    }

    pub fn title_options(&self) -> &[TitleOption] {
        &self.detail.title_options
    }

    /// Thumbnail candidates, newest version first.
    pub fn thumbnails(&self) -> Vec<&ThumbnailOption> {
        self.detail.thumbnails_newest_first()
    }

    pub fn selected_title(&self) -> Option<&TitleOption> {
        self.title_id.and_then(|id| self.detail.title_option(id))
    }

    pub fn selected_thumbnail(&self) -> Option<&ThumbnailOption> {
        self.thumbnail_id.and_then(|id| self.detail.thumbnail_option(id))
    }

    pub fn select_title(&mut self, id: Uuid) -> Result<(), SyncError> {
        if self.detail.title_option(id).is_none() {
            return Err(CoreError::NotFound {
                entity: "title_option",
                id: id.to_string(),
            }
            .into());
        }
        self.title_id = Some(id);
        Ok(())
    }

    pub fn select_thumbnail(&mut self, id: Uuid) -> Result<(), SyncError> {
        if self.detail.thumbnail_option(id).is_none() {
            return Err(CoreError::NotFound {
                entity: "thumbnail_option",
                id: id.to_string(),
            }
            .into());
        }
        self.thumbnail_id = Some(id);
        Ok(())
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    /// Comma-separated tags as typed.
    pub fn tags(&self) -> &str {
        &self.tags
    }

    pub fn set_tags(&mut self, tags: impl Into<String>) {
        self.tags = tags.into();
    }

    /// Whether both a title and a thumbnail are selected.
    pub fn can_publish(&self) -> bool {
        self.title_id.is_some() && self.thumbnail_id.is_some()
    }

    /// Build the update that [`submit`](Self::submit) would send.
    pub fn publish_update(&self) -> Result<PublishUpdate, CoreError> {
        build_publish_update(
            &self.detail,
            self.title_id,
            self.thumbnail_id,
            &self.description,
            &self.tags,
        )
    }

    /// Validate, confirm, and submit the publish update.
    ///
    /// Nothing is sent unless the selection is complete and the operator
    /// confirms. A failed submission is not retried.
    pub async fn submit(
        &self,
        sink: &dyn PublishSink,
        confirm: &impl Confirm,
    ) -> Result<PublishUpdate, SyncError> {
        let update = self.publish_update()?;
        let id = self.story_id();

        let prompt = format!(
            "Publish \"{}\" as \"{}\"?",
            self.detail.story.topic, update.selected_title
        );
        if !confirm.confirm(&prompt) {
            return Err(SyncError::NotConfirmed);
        }

        sink.submit_publish(id, &update).await.map_err(|e| {
            tracing::error!(story_id = %id, error = %e, "Publish failed");
            SyncError::from(e)
        })?;

        tracing::info!(story_id = %id, title = %update.selected_title, "Publish submitted");
        Ok(update)
    }
}
