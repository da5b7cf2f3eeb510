//! Synchronization views over the pipeline backend.
//!
//! The views hold observable state (`tokio::sync::watch`) that a front end
//! renders from:
//!
//! - [`list::ListView`]: story summaries seeded from one fetch and kept
//!   current by the realtime change feed.
//! - [`detail::DetailView`]: one story's detail, polled while its status is
//!   in progress.
//! - [`review::ReviewFlow`]: title/thumbnail selection and the publish
//!   submission.
//!
//! Backends are reached through the traits in [`source`], so views can be
//! driven by in-memory fakes in tests.

pub mod confirm;
pub mod detail;
pub mod error;
pub mod list;
pub mod review;
pub mod source;

pub use confirm::Confirm;
pub use detail::{DetailPhase, DetailState, DetailView};
pub use error::SyncError;
pub use list::{ListState, ListView, StoryList};
pub use review::ReviewFlow;
pub use source::{AssetSigner, ChangeFeed, PublishSink, StorySource};
