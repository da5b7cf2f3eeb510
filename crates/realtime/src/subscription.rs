//! Scoped change-feed subscription.
//!
//! [`Subscription::open`] spawns a task that keeps the realtime socket
//! joined (connect -> process -> reconnect) and forwards [`FeedEvent`]s to
//! the subscriber. The task is tied to the handle: [`Subscription::close`]
//! cancels and awaits it, and dropping the handle cancels it.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::client::RealtimeClient;
use crate::events::FeedEvent;
use crate::processor::{process_frames, ProcessOutcome};
use crate::reconnect::{reconnect_loop, ReconnectConfig};

/// Buffered feed events per subscription.
const FEED_CHANNEL_CAPACITY: usize = 256;

/// Upper bound on waiting for the feed task during [`Subscription::close`].
const CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

/// A live change-feed subscription.
pub struct Subscription {
    rx: mpsc::Receiver<FeedEvent>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    /// Wrap an existing event channel.
    ///
    /// `task`, when given, is the producer and is awaited on close.
    pub fn new(
        rx: mpsc::Receiver<FeedEvent>,
        cancel: CancellationToken,
        task: Option<JoinHandle<()>>,
    ) -> Self {
        Self { rx, cancel, task }
    }

    /// Spawn the feed task for `client` and return its handle.
    pub fn open(client: RealtimeClient) -> Self {
        Self::open_with(client, ReconnectConfig::default())
    }

    pub fn open_with(client: RealtimeClient, reconnect: ReconnectConfig) -> Self {
        let (tx, rx) = mpsc::channel(FEED_CHANNEL_CAPACITY);
        let cancel = CancellationToken::new();
        let task_cancel = cancel.clone();

        let task = tokio::spawn(async move {
            tracing::info!(topic = %client.channel().topic(), "Starting change feed");
            run_feed(&client, &reconnect, &tx, &task_cancel).await;
            tracing::info!(topic = %client.channel().topic(), "Change feed stopped");
        });

        Self::new(rx, cancel, Some(task))
    }

    /// Next feed event, or `None` once the feed has stopped.
    pub async fn recv(&mut self) -> Option<FeedEvent> {
        self.rx.recv().await
    }

    /// Events already buffered, without waiting.
    pub fn try_recv(&mut self) -> Option<FeedEvent> {
        self.rx.try_recv().ok()
    }

    /// Token that stops the feed when cancelled.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Stop the feed and wait for its task to release the socket.
    pub async fn close(mut self) {
        self.cancel.cancel();
        self.rx.close();
        if let Some(task) = self.task.take() {
            if tokio::time::timeout(CLOSE_TIMEOUT, task).await.is_err() {
                tracing::warn!("Change feed task did not stop in time");
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Connect -> process -> reconnect until cancelled or abandoned.
///
/// Every successful join is announced: [`FeedEvent::Joined`] when the first
/// attempt succeeds, [`FeedEvent::Reconnected`] for any join that follows a
/// failure. Subscribers resync on either.
async fn run_feed(
    client: &RealtimeClient,
    reconnect: &ReconnectConfig,
    tx: &mpsc::Sender<FeedEvent>,
    cancel: &CancellationToken,
) {
    let first = tokio::select! {
        _ = cancel.cancelled() => return,
        result = client.connect() => result,
    };

    let (mut conn, joined) = match first {
        Ok(conn) => (conn, FeedEvent::Joined),
        Err(e) => {
            tracing::warn!(error = %e, "Change feed connect failed, entering reconnect loop");
            match reconnect_loop(client, reconnect, cancel).await {
                Some(conn) => (conn, FeedEvent::Reconnected),
                None => return,
            }
        }
    };
    if tx.send(joined).await.is_err() {
        return;
    }

    loop {
        match process_frames(&mut conn, tx, cancel).await {
            ProcessOutcome::Cancelled | ProcessOutcome::ReceiverDropped => return,
            ProcessOutcome::Disconnected => {}
        }

        if cancel.is_cancelled() {
            return;
        }

        tracing::info!("Change feed disconnected, entering reconnect loop");
        conn = match reconnect_loop(client, reconnect, cancel).await {
            Some(conn) => conn,
            None => return,
        };

        if tx.send(FeedEvent::Reconnected).await.is_err() {
            return;
        }
    }
}
