//! Realtime change-feed client for the backend's Phoenix-channel socket.
//!
//! Provides the JSON frame codec, socket connection and channel join,
//! a frame processing loop with heartbeats, reconnection with backoff,
//! and a scoped [`Subscription`] handle that releases the connection when
//! closed or dropped.

pub mod client;
pub mod events;
pub mod messages;
pub mod processor;
pub mod reconnect;
pub mod subscription;

pub use client::{ChannelConfig, RealtimeClient, RealtimeError};
pub use events::{FeedEvent, StoryChange};
pub use subscription::Subscription;
