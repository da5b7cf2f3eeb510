//! List synchronization view.
//!
//! [`StoryList`] is the pure state and its update rules. [`ListView`] seeds
//! it from one full fetch and keeps it current from the change feed:
//!
//! 1. Open the subscription, then fetch the full list and seed the state.
//!    The fetch may finish before the channel is joined, so a change
//!    committed in that window reaches neither.
//! 2. When the feed reports its join, refetch and reseed. That snapshot is
//!    taken after the join, so every later change is delivered as an event.
//! 3. Apply change events in arrival order. Upserts carry whole rows, so
//!    replaying an event a fetch already reflected converges.
//! 4. After a reconnect, or a join that only succeeded on retry, refetch
//!    and reseed the same way, since events may have been missed.

use std::sync::Arc;

use reelboard_core::story::Story;
use reelboard_core::types::StoryId;
use reelboard_realtime::{FeedEvent, StoryChange, Subscription};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::source::{ChangeFeed, StorySource};

/// Ordered story summaries, newest first.
///
/// New stories are prepended; the list is never re-sorted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoryList {
    stories: Vec<Story>,
}

impl StoryList {
    pub fn new(stories: Vec<Story>) -> Self {
        Self { stories }
    }

    pub fn stories(&self) -> &[Story] {
        &self.stories
    }

    pub fn len(&self) -> usize {
        self.stories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stories.is_empty()
    }

    pub fn get(&self, id: StoryId) -> Option<&Story> {
        self.stories.iter().find(|s| s.id == id)
    }

    /// Replace the story with the same id in place, or prepend it.
    pub fn upsert(&mut self, story: Story) {
        match self.stories.iter_mut().find(|s| s.id == story.id) {
            Some(existing) => *existing = story,
            None => self.stories.insert(0, story),
        }
    }

    /// Remove by id. Returns whether anything was removed.
    pub fn remove(&mut self, id: StoryId) -> bool {
        let before = self.stories.len();
        self.stories.retain(|s| s.id != id);
        self.stories.len() != before
    }

    pub fn apply(&mut self, change: &StoryChange) {
        match change {
            StoryChange::Upsert(story) => self.upsert(story.clone()),
            StoryChange::Delete { id } => {
                if !self.remove(*id) {
                    tracing::debug!(story_id = %id, "Delete for story not in list");
                }
            }
        }
    }

    /// Replace the contents with a fresh fetch.
    ///
    /// The fetch is authoritative: stories it omits were deleted while the
    /// feed was down.
    pub fn reseed(&mut self, fetched: Vec<Story>) {
        self.stories = fetched;
    }
}

/// Observable state of a [`ListView`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListState {
    pub stories: StoryList,
    /// True until the initial fetch has completed or failed.
    pub loading: bool,
    /// Message from the most recent failed fetch.
    pub error: Option<String>,
    /// Whether the change feed is still attached.
    pub live: bool,
}

/// A running list view. Dropping it stops the background task.
pub struct ListView {
    state: watch::Receiver<ListState>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl ListView {
    /// Subscribe to `feed`, fetch from `source`, and keep the list current
    /// until closed.
    pub fn start(source: Arc<dyn StorySource>, feed: &dyn ChangeFeed) -> Self {
        let subscription = feed.subscribe();
        let (tx, rx) = watch::channel(ListState {
            loading: true,
            live: true,
            ..Default::default()
        });
        let cancel = CancellationToken::new();
        let task = tokio::spawn(run_list(source, subscription, tx, cancel.clone()));

        Self {
            state: rx,
            cancel,
            task: Some(task),
        }
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> ListState {
        self.state.borrow().clone()
    }

    /// Receiver notified on every state change.
    pub fn watch(&self) -> watch::Receiver<ListState> {
        self.state.clone()
    }

    /// Stop the view and release its subscription.
    pub async fn close(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::error!(error = %e, "List view task failed");
            }
        }
    }
}

impl Drop for ListView {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn run_list(
    source: Arc<dyn StorySource>,
    mut subscription: Subscription,
    state: watch::Sender<ListState>,
    cancel: CancellationToken,
) {
    let initial = tokio::select! {
        _ = cancel.cancelled() => {
            subscription.close().await;
            return;
        }
        result = source.list_stories() => result,
    };

    match initial {
        Ok(stories) => {
            tracing::info!(count = stories.len(), "Story list loaded");
            warn_inconsistent(&stories);
            state.send_modify(|s| {
                s.stories = StoryList::new(stories);
                s.loading = false;
                s.error = None;
            });
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to load story list");
            state.send_modify(|s| {
                s.loading = false;
                s.error = Some(e.to_string());
            });
        }
    }

    loop {
        let event = tokio::select! {
            _ = cancel.cancelled() => break,
            event = subscription.recv() => event,
        };

        match event {
            Some(FeedEvent::Change(change)) => {
                if let StoryChange::Upsert(story) = &change {
                    warn_inconsistent(std::slice::from_ref(story));
                }
                state.send_modify(|s| s.stories.apply(&change));
            }
            Some(FeedEvent::Joined) => {
                tracing::debug!("Change feed joined, refetching story list");
                if !resync(source.as_ref(), &state, &cancel).await {
                    break;
                }
            }
            Some(FeedEvent::Reconnected) => {
                tracing::info!("Change feed reconnected, refetching story list");
                if !resync(source.as_ref(), &state, &cancel).await {
                    break;
                }
            }
            None => {
                tracing::warn!("Change feed ended");
                break;
            }
        }
    }

    state.send_modify(|s| s.live = false);
    subscription.close().await;
}

/// Refetch the full list and reseed. Returns `false` if cancelled first.
async fn resync(
    source: &dyn StorySource,
    state: &watch::Sender<ListState>,
    cancel: &CancellationToken,
) -> bool {
    let result = tokio::select! {
        _ = cancel.cancelled() => return false,
        result = source.list_stories() => result,
    };
    match result {
        Ok(stories) => {
            warn_inconsistent(&stories);
            state.send_modify(|s| {
                s.stories.reseed(stories);
                s.error = None;
            });
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to refetch story list");
            state.send_modify(|s| s.error = Some(e.to_string()));
        }
    }
    true
}

fn warn_inconsistent(stories: &[Story]) {
    for story in stories {
        for issue in story.consistency_issues() {
            tracing::warn!(story_id = %story.id, issue = %issue, "Inconsistent story row");
        }
    }
}
