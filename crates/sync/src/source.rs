//! Seams between the views and the backends they read from and write to.
//!
//! Production implementations wrap the HTTP and realtime clients; tests
//! substitute in-memory fakes.

use async_trait::async_trait;
use reelboard_client::{ApiClient, ApiError, BaasClient};
use reelboard_core::review::PublishUpdate;
use reelboard_core::storage::StorageObject;
use reelboard_core::story::{Story, StoryDetail};
use reelboard_core::types::StoryId;
use reelboard_realtime::{RealtimeClient, Subscription};

/// Read and delete access to stories.
#[async_trait]
pub trait StorySource: Send + Sync {
    async fn list_stories(&self) -> Result<Vec<Story>, ApiError>;

    async fn fetch_story(&self, id: StoryId) -> Result<StoryDetail, ApiError>;

    async fn delete_story(&self, id: StoryId) -> Result<(), ApiError>;
}

/// Destination of the single publish update.
#[async_trait]
pub trait PublishSink: Send + Sync {
    async fn submit_publish(&self, id: StoryId, update: &PublishUpdate) -> Result<(), ApiError>;
}

/// Produces time-limited URLs for stored assets.
#[async_trait]
pub trait AssetSigner: Send + Sync {
    async fn signed_url(&self, object: &StorageObject) -> Result<String, ApiError>;
}

/// Opens a change-feed subscription on the stories table.
pub trait ChangeFeed: Send + Sync {
    fn subscribe(&self) -> Subscription;
}

#[async_trait]
impl StorySource for ApiClient {
    async fn list_stories(&self) -> Result<Vec<Story>, ApiError> {
        ApiClient::list_stories(self).await
    }

    async fn fetch_story(&self, id: StoryId) -> Result<StoryDetail, ApiError> {
        self.get_story(id).await
    }

    async fn delete_story(&self, id: StoryId) -> Result<(), ApiError> {
        ApiClient::delete_story(self, id).await
    }
}

#[async_trait]
impl PublishSink for BaasClient {
    async fn submit_publish(&self, id: StoryId, update: &PublishUpdate) -> Result<(), ApiError> {
        self.publish_story(id, update).await
    }
}

#[async_trait]
impl AssetSigner for BaasClient {
    async fn signed_url(&self, object: &StorageObject) -> Result<String, ApiError> {
        BaasClient::signed_url(self, object).await
    }
}

impl ChangeFeed for RealtimeClient {
    fn subscribe(&self) -> Subscription {
        Subscription::open(self.clone())
    }
}
