//! In-memory backends for driving the views in tests.
#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use reelboard_client::ApiError;
use reelboard_core::review::PublishUpdate;
use reelboard_core::storage::StorageObject;
use reelboard_core::story::{Story, StoryDetail};
use reelboard_core::types::StoryId;
use reelboard_realtime::{FeedEvent, Subscription};
use reelboard_sync::{AssetSigner, ChangeFeed, PublishSink, StorySource};
use serde_json::json;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

pub fn id(n: u128) -> StoryId {
    uuid::Uuid::from_u128(n)
}

pub fn story(n: u128, status: &str) -> Story {
    serde_json::from_value(json!({
        "id": id(n),
        "topic": format!("Story {n}"),
        "status": status,
        "style": "cinematic",
        "aspect_ratio": "16:9",
        "target_duration_minutes": 8,
        "languages": ["en-US"],
        "created_at": "2026-01-05T10:00:00Z",
        "updated_at": "2026-01-05T10:00:00Z"
    }))
    .unwrap()
}

pub const TITLE_A: u128 = 0xa1;
pub const TITLE_B: u128 = 0xa2;
pub const THUMB_V1: u128 = 0xb1;
pub const THUMB_V2: u128 = 0xb2;

/// Detail with two title options and two thumbnail versions.
pub fn detail(n: u128, status: &str) -> StoryDetail {
    serde_json::from_value(json!({
        "id": id(n),
        "topic": format!("Story {n}"),
        "status": status,
        "style": "cinematic",
        "aspect_ratio": "16:9",
        "target_duration_minutes": 8,
        "languages": ["en-US"],
        "description": "Rise and fall of the great library.",
        "created_at": "2026-01-05T10:00:00Z",
        "updated_at": "2026-01-05T10:00:00Z",
        "title_options": [
            {"id": uuid::Uuid::from_u128(TITLE_A), "story_id": id(n), "title_text": "The Lost Library"},
            {"id": uuid::Uuid::from_u128(TITLE_B), "story_id": id(n), "title_text": "Scrolls on Fire"}
        ],
        "thumbnail_options": [
            {"id": uuid::Uuid::from_u128(THUMB_V1), "story_id": id(n), "image_url": "https://cdn.test/v1.png", "version": 1},
            {"id": uuid::Uuid::from_u128(THUMB_V2), "story_id": id(n), "image_url": "https://cdn.test/v2.png", "version": 2}
        ]
    }))
    .unwrap()
}

fn http_error(status: u16, text: &str) -> ApiError {
    ApiError::Http {
        status,
        status_text: text.to_string(),
    }
}

/// Scripted detail response.
#[derive(Debug, Clone)]
pub enum Reply {
    Detail(StoryDetail),
    NotFound,
    ServerError,
}

impl Reply {
    fn into_result(self) -> Result<StoryDetail, ApiError> {
        match self {
            Reply::Detail(d) => Ok(d),
            Reply::NotFound => Err(http_error(404, "Not Found")),
            Reply::ServerError => Err(http_error(500, "Internal Server Error")),
        }
    }
}

/// Pops scripted responses in order; the last one repeats.
fn next_sticky<T: Clone>(queue: &mut VecDeque<T>) -> Option<T> {
    if queue.len() > 1 {
        queue.pop_front()
    } else {
        queue.front().cloned()
    }
}

#[derive(Default)]
pub struct FakeSource {
    lists: Mutex<VecDeque<Result<Vec<Story>, u16>>>,
    details: Mutex<HashMap<StoryId, VecDeque<Reply>>>,
    fetches: Mutex<HashMap<StoryId, usize>>,
    list_calls: AtomicUsize,
    deleted: Mutex<Vec<StoryId>>,
    fail_delete: AtomicBool,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_lists(self, lists: Vec<Vec<Story>>) -> Self {
        *self.lists.lock().unwrap() = lists.into_iter().map(Ok).collect();
        self
    }

    pub fn with_failing_list(self, status: u16) -> Self {
        self.lists.lock().unwrap().push_back(Err(status));
        self
    }

    pub fn push_list(&self, stories: Vec<Story>) {
        self.lists.lock().unwrap().push_back(Ok(stories));
    }

    pub fn with_replies(self, id: StoryId, replies: Vec<Reply>) -> Self {
        self.details.lock().unwrap().insert(id, replies.into());
        self
    }

    pub fn fail_deletes(&self) {
        self.fail_delete.store(true, Ordering::SeqCst);
    }

    pub fn fetch_count(&self, id: StoryId) -> usize {
        self.fetches.lock().unwrap().get(&id).copied().unwrap_or(0)
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn deleted(&self) -> Vec<StoryId> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait]
impl StorySource for FakeSource {
    async fn list_stories(&self) -> Result<Vec<Story>, ApiError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let next = next_sticky(&mut self.lists.lock().unwrap()).unwrap_or(Ok(Vec::new()));
        next.map_err(|status| http_error(status, "Service Unavailable"))
    }

    async fn fetch_story(&self, id: StoryId) -> Result<StoryDetail, ApiError> {
        *self.fetches.lock().unwrap().entry(id).or_default() += 1;
        let reply = self
            .details
            .lock()
            .unwrap()
            .get_mut(&id)
            .and_then(|queue| next_sticky(queue))
            .unwrap_or(Reply::NotFound);
        reply.into_result()
    }

    async fn delete_story(&self, id: StoryId) -> Result<(), ApiError> {
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(http_error(500, "Internal Server Error"));
        }
        self.deleted.lock().unwrap().push(id);
        Ok(())
    }
}

/// Change feed backed by a channel the test writes to.
pub struct FakeFeed {
    rx: Mutex<Option<mpsc::Receiver<FeedEvent>>>,
    cancel: CancellationToken,
}

impl FakeFeed {
    pub fn new() -> (Self, mpsc::Sender<FeedEvent>) {
        let (tx, rx) = mpsc::channel(64);
        let feed = Self {
            rx: Mutex::new(Some(rx)),
            cancel: CancellationToken::new(),
        };
        (feed, tx)
    }

    /// Whether the subscription handed out has been released.
    pub fn released(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl ChangeFeed for FakeFeed {
    fn subscribe(&self) -> Subscription {
        let rx = self
            .rx
            .lock()
            .unwrap()
            .take()
            .expect("FakeFeed supports one subscription");
        Subscription::new(rx, self.cancel.clone(), None)
    }
}

/// Records publish updates.
#[derive(Default)]
pub struct FakeSink {
    calls: Mutex<Vec<(StoryId, PublishUpdate)>>,
    fail: AtomicBool,
}

impl FakeSink {
    pub fn failing() -> Self {
        let sink = Self::default();
        sink.fail.store(true, Ordering::SeqCst);
        sink
    }

    pub fn calls(&self) -> Vec<(StoryId, PublishUpdate)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PublishSink for FakeSink {
    async fn submit_publish(&self, id: StoryId, update: &PublishUpdate) -> Result<(), ApiError> {
        self.calls.lock().unwrap().push((id, update.clone()));
        if self.fail.load(Ordering::SeqCst) {
            return Err(http_error(409, "Conflict"));
        }
        Ok(())
    }
}

/// Signs under a fixed host, or fails every request.
pub struct FakeSigner {
    pub available: bool,
}

#[async_trait]
impl AssetSigner for FakeSigner {
    async fn signed_url(&self, object: &StorageObject) -> Result<String, ApiError> {
        if !self.available {
            return Err(http_error(400, "Bad Request"));
        }
        Ok(format!(
            "https://storage.test/{}/{}?token=abc",
            object.bucket, object.path
        ))
    }
}
