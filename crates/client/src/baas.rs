//! Client for the backend-as-a-service REST and storage surfaces.
//!
//! Requests authenticate with the anon key in both the `apikey` header and
//! a bearer `Authorization` header. Row updates go through the PostgREST
//! surface (`/rest/v1`); signed asset URLs through the storage surface
//! (`/storage/v1`).

use std::time::Duration;

use reelboard_core::review::PublishUpdate;
use reelboard_core::storage::StorageObject;
use reelboard_core::types::StoryId;
use serde::Deserialize;

use crate::api::{ApiClient, ApiError};
use crate::config::{ClientConfig, ConfigError};

/// Table holding story rows.
pub const STORIES_TABLE: &str = "stories";

#[derive(Debug, Clone)]
pub struct BaasClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    signed_url_ttl: Duration,
}

#[derive(Debug, Deserialize)]
struct SignedUrlResponse {
    #[serde(rename = "signedURL")]
    signed_url: String,
}

/// Errors while building a [`BaasClient`] from configuration.
#[derive(Debug, thiserror::Error)]
pub enum BaasSetupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl BaasClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        signed_url_ttl: Duration,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            signed_url_ttl,
        }
    }

    /// Build a client from configuration. Fails when no backend key is set.
    pub fn from_config(config: &ClientConfig) -> Result<Self, BaasSetupError> {
        let key = config.require_baas_key()?;
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(ApiError::from)?;
        Ok(Self {
            client,
            base_url: config.baas_url.clone(),
            api_key: key.to_string(),
            signed_url_ttl: config.signed_url_ttl,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Apply the publish update to a story row in a single request.
    ///
    /// The updated row is echoed back; an empty result means no row
    /// matched `id` and is reported as a 404.
    pub async fn publish_story(&self, id: StoryId, update: &PublishUpdate) -> Result<(), ApiError> {
        let response = self
            .authed(self.client.patch(self.row_url(STORIES_TABLE, id)))
            .header("Prefer", "return=representation")
            .json(update)
            .send()
            .await?;
        let rows: Vec<serde_json::Value> = ApiClient::parse_response(response).await?;
        if rows.is_empty() {
            tracing::warn!(story_id = %id, "Publish matched no story row");
            return Err(ApiError::Http {
                status: 404,
                status_text: "Not Found".to_string(),
            });
        }

        tracing::info!(
            story_id = %id,
            title = %update.selected_title,
            "Story queued for publishing",
        );
        Ok(())
    }

    /// Request a time-limited signed URL for a stored object.
    pub async fn signed_url(&self, object: &StorageObject) -> Result<String, ApiError> {
        let body = serde_json::json!({ "expiresIn": self.signed_url_ttl.as_secs() });
        let response = self
            .authed(self.client.post(self.sign_url(object)))
            .json(&body)
            .send()
            .await?;
        let signed: SignedUrlResponse = ApiClient::parse_response(response).await?;
        Ok(self.absolute_storage_url(&signed.signed_url))
    }

    // ---- private helpers ----

    fn authed(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    fn row_url(&self, table: &str, id: StoryId) -> String {
        format!("{}/rest/v1/{table}?id=eq.{id}", self.base_url)
    }

    fn sign_url(&self, object: &StorageObject) -> String {
        format!(
            "{}/storage/v1/object/sign/{}/{}",
            self.base_url, object.bucket, object.path
        )
    }

    /// The storage service answers with a path relative to `/storage/v1`.
    fn absolute_storage_url(&self, signed: &str) -> String {
        if signed.starts_with("http://") || signed.starts_with("https://") {
            signed.to_string()
        } else {
            format!(
                "{}/storage/v1/{}",
                self.base_url,
                signed.trim_start_matches('/')
            )
        }
    }
}
