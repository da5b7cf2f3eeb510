//! Detail synchronization view.
//!
//! Activating the view for a story fetches its detail once. While the
//! stored status is in progress the view re-fetches on a fixed interval,
//! re-evaluating [`should_poll`] after every stored update and stopping for
//! good once it is false. Polling ticks for one story are strictly
//! sequential, and the poll task is cancelled and awaited before the view
//! moves to another story, so no stale response can land.

use std::sync::Arc;
use std::time::Duration;

use reelboard_core::story::StoryDetail;
use reelboard_core::types::StoryId;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::confirm::Confirm;
use crate::error::SyncError;
use crate::source::StorySource;

/// Default interval between polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Where the view is in a story's lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DetailPhase {
    /// No story is active.
    #[default]
    Idle,
    /// The initial fetch is in flight.
    Loading,
    Ready,
    /// The backend has no such story.
    NotFound,
    /// The initial fetch failed for another reason.
    Failed,
    /// The story was deleted from this view.
    Deleted,
}

/// Observable state of a [`DetailView`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetailState {
    pub story_id: Option<StoryId>,
    pub phase: DetailPhase,
    pub detail: Option<StoryDetail>,
    /// Message from the most recent failed request.
    pub error: Option<String>,
    /// Whether a re-fetch is scheduled.
    pub polling: bool,
}

/// Whether the stored detail warrants another fetch.
pub fn should_poll(detail: Option<&StoryDetail>) -> bool {
    detail.is_some_and(|d| d.status().is_in_progress())
}

struct ActiveWatch {
    story_id: StoryId,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// Watches one story at a time.
pub struct DetailView {
    source: Arc<dyn StorySource>,
    poll_interval: Duration,
    state: Arc<watch::Sender<DetailState>>,
    active: Option<ActiveWatch>,
}

impl DetailView {
    pub fn new(source: Arc<dyn StorySource>) -> Self {
        Self::with_poll_interval(source, DEFAULT_POLL_INTERVAL)
    }

    pub fn with_poll_interval(source: Arc<dyn StorySource>, poll_interval: Duration) -> Self {
        let (tx, _rx) = watch::channel(DetailState::default());
        Self {
            source,
            poll_interval,
            state: Arc::new(tx),
            active: None,
        }
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> DetailState {
        self.state.borrow().clone()
    }

    /// Receiver notified on every state change.
    pub fn watch(&self) -> watch::Receiver<DetailState> {
        self.state.subscribe()
    }

    /// Story currently watched, if any.
    pub fn story_id(&self) -> Option<StoryId> {
        self.state.borrow().story_id
    }

    /// Start watching `id`, stopping any previous watch first.
    pub async fn activate(&mut self, id: StoryId) {
        self.stop_watch().await;

        self.state.send_replace(DetailState {
            story_id: Some(id),
            phase: DetailPhase::Loading,
            ..Default::default()
        });

        let cancel = CancellationToken::new();
        let task = tokio::spawn(run_watch(
            Arc::clone(&self.source),
            id,
            self.poll_interval,
            Arc::clone(&self.state),
            cancel.clone(),
        ));

        tracing::debug!(story_id = %id, "Detail view activated");
        self.active = Some(ActiveWatch {
            story_id: id,
            cancel,
            task,
        });
    }

    /// Stop watching and reset to idle.
    pub async fn deactivate(&mut self) {
        self.stop_watch().await;
        self.state.send_replace(DetailState::default());
    }

    /// Delete the watched story after confirmation.
    ///
    /// Polling stops once the backend has accepted the delete. A failed
    /// delete leaves the view as it was, with the error recorded.
    pub async fn delete(&mut self, confirm: &impl Confirm) -> Result<(), SyncError> {
        let (id, topic) = {
            let state = self.state.borrow();
            let id = state.story_id.ok_or(SyncError::Inactive)?;
            let topic = state.detail.as_ref().map(|d| d.story.topic.clone());
            (id, topic)
        };

        let prompt = match topic {
            Some(topic) => format!("Delete story \"{topic}\"? This cannot be undone."),
            None => format!("Delete story {id}? This cannot be undone."),
        };
        if !confirm.confirm(&prompt) {
            return Err(SyncError::NotConfirmed);
        }

        if let Err(e) = self.source.delete_story(id).await {
            tracing::error!(story_id = %id, error = %e, "Failed to delete story");
            let message = e.to_string();
            update_for(&self.state, id, |s| s.error = Some(message));
            return Err(e.into());
        }

        self.stop_watch().await;
        tracing::info!(story_id = %id, "Story deleted");
        self.state.send_replace(DetailState {
            story_id: Some(id),
            phase: DetailPhase::Deleted,
            ..Default::default()
        });
        Ok(())
    }

    async fn stop_watch(&mut self) {
        let Some(active) = self.active.take() else {
            return;
        };
        active.cancel.cancel();
        if let Err(e) = active.task.await {
            tracing::error!(story_id = %active.story_id, error = %e, "Detail poll task failed");
        }
        update_for(&self.state, active.story_id, |s| s.polling = false);
    }
}

impl Drop for DetailView {
    fn drop(&mut self) {
        if let Some(active) = &self.active {
            active.cancel.cancel();
        }
    }
}

/// Apply `f` only while the view still watches `id`.
fn update_for(
    state: &watch::Sender<DetailState>,
    id: StoryId,
    f: impl FnOnce(&mut DetailState),
) {
    state.send_if_modified(|s| {
        if s.story_id != Some(id) {
            return false;
        }
        f(s);
        true
    });
}

/// Initial fetch, then the poll loop.
async fn run_watch(
    source: Arc<dyn StorySource>,
    id: StoryId,
    interval: Duration,
    state: Arc<watch::Sender<DetailState>>,
    cancel: CancellationToken,
) {
    let first = tokio::select! {
        _ = cancel.cancelled() => return,
        result = source.fetch_story(id) => result,
    };

    match first {
        Ok(detail) => store(&state, id, detail),
        Err(e) if e.is_not_found() => {
            tracing::info!(story_id = %id, "Story not found");
            update_for(&state, id, |s| {
                s.phase = DetailPhase::NotFound;
                s.error = Some(e.to_string());
            });
            return;
        }
        Err(e) => {
            tracing::error!(story_id = %id, error = %e, "Failed to load story");
            update_for(&state, id, |s| {
                s.phase = DetailPhase::Failed;
                s.error = Some(e.to_string());
            });
            return;
        }
    }

    loop {
        if !should_poll(state.borrow().detail.as_ref()) {
            tracing::debug!(story_id = %id, "Polling stopped");
            return;
        }

        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(interval) => {}
        }

        let result = tokio::select! {
            _ = cancel.cancelled() => return,
            result = source.fetch_story(id) => result,
        };

        match result {
            Ok(detail) => store(&state, id, detail),
            Err(e) if e.is_not_found() => {
                tracing::info!(story_id = %id, "Story disappeared while polling");
                update_for(&state, id, |s| {
                    s.phase = DetailPhase::NotFound;
                    s.detail = None;
                    s.polling = false;
                    s.error = Some(e.to_string());
                });
                return;
            }
            Err(e) => {
                // Keep the last good detail and try again next tick.
                tracing::warn!(story_id = %id, error = %e, "Poll failed");
                update_for(&state, id, |s| s.error = Some(e.to_string()));
            }
        }
    }
}

fn store(state: &watch::Sender<DetailState>, id: StoryId, detail: StoryDetail) {
    for issue in detail.story.consistency_issues() {
        tracing::warn!(story_id = %id, issue = %issue, "Inconsistent story detail");
    }
    tracing::debug!(story_id = %id, status = %detail.status(), "Story detail updated");
    let polling = should_poll(Some(&detail));
    update_for(state, id, |s| {
        s.phase = DetailPhase::Ready;
        s.detail = Some(detail);
        s.error = None;
        s.polling = polling;
    });
}
