//! Typed story endpoints on top of [`ApiClient`].
//!
//! | Method | Path            | Response        |
//! |--------|-----------------|-----------------|
//! | GET    | `/stories`      | `Vec<Story>`    |
//! | POST   | `/stories`      | `Story`         |
//! | GET    | `/stories/{id}` | `StoryDetail`   |
//! | DELETE | `/stories/{id}` | empty           |

use reelboard_core::story::{CreateStoryRequest, Story, StoryDetail};
use reelboard_core::types::StoryId;

use crate::api::{ApiClient, ApiError};

fn story_path(id: StoryId) -> String {
    format!("/stories/{id}")
}

impl ApiClient {
    /// List story summaries.
    pub async fn list_stories(&self) -> Result<Vec<Story>, ApiError> {
        self.get("/stories").await
    }

    /// Create a story. The request is validated before anything is sent.
    pub async fn create_story(&self, request: &CreateStoryRequest) -> Result<Story, ApiError> {
        request.check()?;
        let story: Story = self.post("/stories", Some(request)).await?;
        tracing::info!(story_id = %story.id, topic = %story.topic, "Story created");
        Ok(story)
    }

    /// Fetch one story with scenes and review options.
    pub async fn get_story(&self, id: StoryId) -> Result<StoryDetail, ApiError> {
        self.get(&story_path(id)).await
    }

    /// Delete a story and its stored assets.
    pub async fn delete_story(&self, id: StoryId) -> Result<(), ApiError> {
        self.delete(&story_path(id)).await?;
        tracing::info!(story_id = %id, "Story deleted");
        Ok(())
    }
}
