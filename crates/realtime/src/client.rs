//! WebSocket client for the backend realtime socket.
//!
//! [`RealtimeClient`] holds the socket URL, credential and channel
//! configuration. Call [`RealtimeClient::connect`] to open the socket and
//! join the channel, producing a live [`RealtimeConnection`].

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream};

use crate::messages::{classify, parse_frame, Frame, ReplyStatus, ServerMessage};

/// How long to wait for the server to acknowledge a channel join.
const JOIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Protocol version requested in the socket URL.
const SOCKET_VSN: &str = "1.0.0";

/// Raw socket stream type.
pub type WsStream = tokio_tungstenite::WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// Which row changes a channel listens to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelConfig {
    /// Channel name; the topic is `realtime:<name>`.
    pub name: String,
    pub schema: String,
    pub table: String,
}

impl ChannelConfig {
    /// All changes on `public.stories`.
    pub fn stories() -> Self {
        Self {
            name: "stories-changes".to_string(),
            schema: "public".to_string(),
            table: "stories".to_string(),
        }
    }

    pub fn topic(&self) -> String {
        format!("realtime:{}", self.name)
    }
}

/// Configuration handle for the realtime socket.
#[derive(Debug, Clone)]
pub struct RealtimeClient {
    socket_url: String,
    access_token: String,
    channel: ChannelConfig,
}

/// An open socket with the channel joined.
pub struct RealtimeConnection {
    /// Joined channel topic.
    pub topic: String,
    /// Next frame reference to use.
    pub next_ref: u64,
    pub ws_stream: WsStream,
}

impl RealtimeConnection {
    /// Allocate the next frame reference.
    pub fn take_ref(&mut self) -> u64 {
        let r = self.next_ref;
        self.next_ref += 1;
        r
    }
}

/// Errors that can occur when working with the realtime socket.
#[derive(Debug, thiserror::Error)]
pub enum RealtimeError {
    /// Failed to establish the socket.
    #[error("Connection error: {0}")]
    Connection(String),

    /// The server rejected or never acknowledged the channel join, or sent
    /// something unexpected.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The socket closed before the operation finished.
    #[error("Socket closed")]
    Closed,
}

/// Build the socket URL from the backend base URL.
///
/// `http` becomes `ws` and `https` becomes `wss`.
pub fn socket_url(base_url: &str, api_key: &str) -> String {
    let base = base_url.trim_end_matches('/');
    let ws_base = if let Some(rest) = base.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = base.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        base.to_string()
    };
    format!("{ws_base}/realtime/v1/websocket?apikey={api_key}&vsn={SOCKET_VSN}")
}

impl RealtimeClient {
    /// Create a client for the backend at `base_url`.
    pub fn new(base_url: &str, api_key: &str, channel: ChannelConfig) -> Self {
        Self {
            socket_url: socket_url(base_url, api_key),
            access_token: api_key.to_string(),
            channel,
        }
    }

    pub fn socket_url(&self) -> &str {
        &self.socket_url
    }

    pub fn channel(&self) -> &ChannelConfig {
        &self.channel
    }

    /// Open the socket and join the configured channel.
    ///
    /// Waits for the join reply; an error reply or no reply within the join
    /// timeout is a [`RealtimeError::Protocol`].
    pub async fn connect(&self) -> Result<RealtimeConnection, RealtimeError> {
        let (ws_stream, _response) = connect_async(self.socket_url.as_str())
            .await
            .map_err(|e| RealtimeError::Connection(format!("Failed to open realtime socket: {e}")))?;

        let mut conn = RealtimeConnection {
            topic: self.channel.topic(),
            next_ref: 1,
            ws_stream,
        };

        let join_ref = conn.take_ref();
        let join = Frame::join(
            &conn.topic,
            &self.channel.schema,
            &self.channel.table,
            &self.access_token,
            join_ref,
        );
        conn.ws_stream
            .send(Message::Text(join.to_text()))
            .await
            .map_err(|e| RealtimeError::Connection(e.to_string()))?;

        tokio::time::timeout(JOIN_TIMEOUT, wait_for_join(&mut conn.ws_stream, join_ref))
            .await
            .map_err(|_| RealtimeError::Protocol("channel join timed out".to_string()))??;

        tracing::info!(topic = %conn.topic, "Joined realtime channel");
        Ok(conn)
    }
}

/// Read frames until the reply to `join_ref` arrives.
async fn wait_for_join(ws: &mut WsStream, join_ref: u64) -> Result<(), RealtimeError> {
    let expected = join_ref.to_string();
    while let Some(msg) = ws.next().await {
        let text = match msg {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) => return Err(RealtimeError::Closed),
            Ok(_) => continue,
            Err(e) => return Err(RealtimeError::Connection(e.to_string())),
        };
        let Ok(frame) = parse_frame(&text) else {
            tracing::warn!(raw_message = %text, "Unparseable frame while joining");
            continue;
        };
        match classify(frame) {
            ServerMessage::Reply {
                reference: Some(r),
                status,
                ..
            } if r == expected => {
                return match status {
                    ReplyStatus::Ok => Ok(()),
                    ReplyStatus::Error(resp) => Err(RealtimeError::Protocol(format!(
                        "channel join rejected: {resp}"
                    ))),
                };
            }
            other => {
                tracing::debug!(message = ?other, "Frame received before join reply");
            }
        }
    }
    Err(RealtimeError::Closed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn socket_url_switches_scheme() {
        assert_eq!(
            socket_url("https://proj.example.co/", "anon"),
            "wss://proj.example.co/realtime/v1/websocket?apikey=anon&vsn=1.0.0"
        );
        assert_eq!(
            socket_url("http://localhost:54321", "k"),
            "ws://localhost:54321/realtime/v1/websocket?apikey=k&vsn=1.0.0"
        );
    }

    #[test]
    fn stories_channel_topic() {
        assert_eq!(ChannelConfig::stories().topic(), "realtime:stories-changes");
    }

    #[tokio::test]
    async fn connect_to_closed_port_fails() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = RealtimeClient::new(&format!("http://{addr}"), "k", ChannelConfig::stories());
        let result = client.connect().await;
        assert!(matches!(result, Err(RealtimeError::Connection(_))));
    }
}
