//! Frame processing loop for a joined realtime channel.
//!
//! Reads frames from the socket, turns row changes into [`FeedEvent`]s on
//! the subscriber channel, and sends a heartbeat on a fixed interval. Frames
//! with an unrecognized shape are logged and skipped.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

use crate::client::RealtimeConnection;
use crate::events::{FeedEvent, StoryChange};
use crate::messages::{classify, parse_frame, Frame, ReplyStatus, ServerMessage};

/// Interval between socket heartbeats.
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// Why [`process_frames`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// The socket closed or failed; the caller may reconnect.
    Disconnected,
    /// The cancellation token fired.
    Cancelled,
    /// Nobody is listening any more.
    ReceiverDropped,
}

/// Process frames until the socket drops, the token is cancelled, or the
/// subscriber goes away.
pub async fn process_frames(
    conn: &mut RealtimeConnection,
    tx: &mpsc::Sender<FeedEvent>,
    cancel: &CancellationToken,
) -> ProcessOutcome {
    let start = tokio::time::Instant::now() + HEARTBEAT_INTERVAL;
    let mut heartbeat = tokio::time::interval_at(start, HEARTBEAT_INTERVAL);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                let leave_ref = conn.take_ref();
                let leave = Frame::leave(&conn.topic, leave_ref);
                let _ = conn.ws_stream.send(Message::Text(leave.to_text())).await;
                let _ = conn.ws_stream.close(None).await;
                return ProcessOutcome::Cancelled;
            }
            _ = heartbeat.tick() => {
                let frame = Frame::heartbeat(conn.take_ref());
                if let Err(e) = conn.ws_stream.send(Message::Text(frame.to_text())).await {
                    tracing::warn!(error = %e, "Heartbeat send failed");
                    return ProcessOutcome::Disconnected;
                }
            }
            msg = conn.ws_stream.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        if let Some(event) = handle_text_frame(&text, &conn.topic) {
                            if tx.send(event).await.is_err() {
                                return ProcessOutcome::ReceiverDropped;
                            }
                        }
                    }
                    Some(Ok(Message::Close(frame))) => {
                        tracing::info!(?frame, "Realtime socket closed");
                        return ProcessOutcome::Disconnected;
                    }
                    Some(Ok(_)) => {
                        // Ping/pong are answered by tungstenite; binary frames are unused.
                    }
                    Some(Err(e)) => {
                        tracing::error!(error = %e, "Realtime receive error");
                        return ProcessOutcome::Disconnected;
                    }
                    None => return ProcessOutcome::Disconnected,
                }
            }
        }
    }
}

/// Turn one text frame into a feed event, if it carries a story change.
///
/// Everything else is logged and dropped.
pub fn handle_text_frame(text: &str, topic: &str) -> Option<FeedEvent> {
    let frame = match parse_frame(text) {
        Ok(frame) => frame,
        Err(e) => {
            tracing::warn!(error = %e, raw_message = %text, "Failed to parse realtime frame");
            return None;
        }
    };

    match classify(frame) {
        ServerMessage::Change {
            topic: frame_topic,
            change,
        } => {
            if frame_topic != topic {
                tracing::debug!(topic = %frame_topic, "Change for another channel ignored");
                return None;
            }
            match StoryChange::from_postgres_change(&change) {
                Ok(story_change) => {
                    tracing::debug!(
                        story_id = %story_change.story_id(),
                        kind = ?change.kind,
                        "Story change received",
                    );
                    Some(FeedEvent::Change(story_change))
                }
                Err(reason) => {
                    tracing::warn!(reason = %reason, "Ignoring malformed story change");
                    None
                }
            }
        }
        ServerMessage::Reply {
            status: ReplyStatus::Error(resp),
            ..
        } => {
            tracing::warn!(response = %resp, "Realtime error reply");
            None
        }
        ServerMessage::Reply { .. } => None,
        ServerMessage::ChannelError { topic } => {
            tracing::warn!(topic = %topic, "Realtime channel error");
            None
        }
        ServerMessage::ChannelClosed { topic } => {
            tracing::info!(topic = %topic, "Realtime channel closed by server");
            None
        }
        ServerMessage::System { payload, .. } => {
            tracing::debug!(payload = %payload, "Realtime system message");
            None
        }
        ServerMessage::Unrecognized { event, reason } => {
            tracing::debug!(event = %event, reason = %reason, "Unrecognized realtime frame");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    const TOPIC: &str = "realtime:stories-changes";

    #[test]
    fn insert_frame_becomes_change_event() {
        let text = r#"{"topic":"realtime:stories-changes","event":"postgres_changes","payload":{"data":{"type":"INSERT","schema":"public","table":"stories","record":{"id":"6f1c1d9e-2b1a-4a57-9d0e-1b8d3e1f0a01","topic":"t","status":"draft","style":"anime","aspect_ratio":"9:16","created_at":"2026-01-05T10:00:00Z","updated_at":"2026-01-05T10:00:00Z"}}},"ref":null}"#;
        assert_matches!(
            handle_text_frame(text, TOPIC),
            Some(FeedEvent::Change(StoryChange::Upsert(_)))
        );
    }

    #[test]
    fn other_topic_is_ignored() {
        let text = r#"{"topic":"realtime:other","event":"postgres_changes","payload":{"data":{"type":"DELETE","schema":"public","table":"stories","old_record":{"id":"6f1c1d9e-2b1a-4a57-9d0e-1b8d3e1f0a01"}}}}"#;
        assert!(handle_text_frame(text, TOPIC).is_none());
    }

    #[test]
    fn garbage_is_a_noop() {
        assert!(handle_text_frame("{{{", TOPIC).is_none());
        assert!(handle_text_frame(r#"{"topic":"x","event":"presence_diff","payload":{}}"#, TOPIC).is_none());
    }

    #[test]
    fn malformed_row_is_a_noop() {
        let text = r#"{"topic":"realtime:stories-changes","event":"postgres_changes","payload":{"data":{"type":"UPDATE","schema":"public","table":"stories","record":{"id":"not-a-uuid"}}}}"#;
        assert!(handle_text_frame(text, TOPIC).is_none());
    }
}
