//! Phoenix channel frames and their classification.
//!
//! The realtime socket exchanges JSON frames of the shape
//! `{"topic": "...", "event": "...", "payload": {...}, "ref": "..."}`.
//! Outgoing frames are built with the constructors on [`Frame`]; incoming
//! frames are parsed with [`parse_frame`] and sorted into a
//! [`ServerMessage`] by [`classify`].

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub const EVENT_JOIN: &str = "phx_join";
pub const EVENT_LEAVE: &str = "phx_leave";
pub const EVENT_REPLY: &str = "phx_reply";
pub const EVENT_ERROR: &str = "phx_error";
pub const EVENT_CLOSE: &str = "phx_close";
pub const EVENT_HEARTBEAT: &str = "heartbeat";
pub const EVENT_POSTGRES_CHANGES: &str = "postgres_changes";
pub const EVENT_SYSTEM: &str = "system";

/// Topic used for socket-level heartbeats.
pub const PHOENIX_TOPIC: &str = "phoenix";

/// One frame on the socket, in either direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub topic: String,
    pub event: String,
    #[serde(default)]
    pub payload: Value,
    #[serde(rename = "ref", default)]
    pub reference: Option<String>,
}

impl Frame {
    /// Join `topic`, listening for row changes on `schema.table`.
    pub fn join(topic: &str, schema: &str, table: &str, access_token: &str, reference: u64) -> Self {
        Self {
            topic: topic.to_string(),
            event: EVENT_JOIN.to_string(),
            payload: json!({
                "config": {
                    "broadcast": { "self": false },
                    "presence": { "key": "" },
                    "postgres_changes": [
                        { "event": "*", "schema": schema, "table": table }
                    ]
                },
                "access_token": access_token,
            }),
            reference: Some(reference.to_string()),
        }
    }

    /// Leave `topic`.
    pub fn leave(topic: &str, reference: u64) -> Self {
        Self {
            topic: topic.to_string(),
            event: EVENT_LEAVE.to_string(),
            payload: json!({}),
            reference: Some(reference.to_string()),
        }
    }

    /// Socket keep-alive.
    pub fn heartbeat(reference: u64) -> Self {
        Self {
            topic: PHOENIX_TOPIC.to_string(),
            event: EVENT_HEARTBEAT.to_string(),
            payload: json!({}),
            reference: Some(reference.to_string()),
        }
    }

    pub fn to_text(&self) -> String {
        // Serializing a struct of strings and a Value cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Kind of row change reported by the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// The `data` object of a `postgres_changes` payload.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PostgresChange {
    #[serde(rename = "type")]
    pub kind: ChangeKind,
    pub schema: String,
    pub table: String,
    /// New row for inserts and updates.
    #[serde(default)]
    pub record: Option<Value>,
    /// Previous row (primary key only unless replica identity is full).
    #[serde(default)]
    pub old_record: Option<Value>,
    #[serde(default)]
    pub commit_timestamp: Option<String>,
}

/// Status carried by a `phx_reply`.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplyStatus {
    Ok,
    Error(Value),
}

/// An incoming frame sorted by what the client needs to do with it.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerMessage {
    /// Reply to a frame we sent (join, heartbeat, leave).
    Reply {
        topic: String,
        reference: Option<String>,
        status: ReplyStatus,
    },
    /// A row change on a joined channel.
    Change { topic: String, change: PostgresChange },
    /// The channel crashed on the server side.
    ChannelError { topic: String },
    /// The server closed the channel.
    ChannelClosed { topic: String },
    /// Informational system message.
    System { topic: String, payload: Value },
    /// A frame whose shape this client does not understand.
    Unrecognized { event: String, reason: String },
}

/// Parse one text frame.
pub fn parse_frame(text: &str) -> Result<Frame, serde_json::Error> {
    serde_json::from_str(text)
}

/// Sort a frame into a [`ServerMessage`].
///
/// Never fails: frames with an unexpected shape become
/// [`ServerMessage::Unrecognized`] so callers can log and continue.
pub fn classify(frame: Frame) -> ServerMessage {
    match frame.event.as_str() {
        EVENT_REPLY => {
            let status = match frame.payload.get("status").and_then(Value::as_str) {
                Some("ok") => ReplyStatus::Ok,
                _ => ReplyStatus::Error(
                    frame.payload.get("response").cloned().unwrap_or(Value::Null),
                ),
            };
            ServerMessage::Reply {
                topic: frame.topic,
                reference: frame.reference,
                status,
            }
        }
        EVENT_POSTGRES_CHANGES => {
            let data = frame.payload.get("data").cloned().unwrap_or(Value::Null);
            match serde_json::from_value::<PostgresChange>(data) {
                Ok(change) => ServerMessage::Change {
                    topic: frame.topic,
                    change,
                },
                Err(e) => ServerMessage::Unrecognized {
                    event: frame.event,
                    reason: e.to_string(),
                },
            }
        }
        EVENT_ERROR => ServerMessage::ChannelError { topic: frame.topic },
        EVENT_CLOSE => ServerMessage::ChannelClosed { topic: frame.topic },
        EVENT_SYSTEM => ServerMessage::System {
            topic: frame.topic,
            payload: frame.payload,
        },
        other => ServerMessage::Unrecognized {
            event: other.to_string(),
            reason: "unhandled event".to_string(),
        },
    }
}
