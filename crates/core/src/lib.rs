//! Domain types shared by every Reelboard crate.
//!
//! - [`status`]: the story status enum and its display/progress table.
//! - [`story`]: story, scene and review-option models plus the
//!   create-story request.
//! - [`review`]: the publish update assembled by the review flow.
//! - [`storage`]: object storage path convention for story assets.

pub mod error;
pub mod review;
pub mod status;
pub mod storage;
pub mod story;
pub mod types;
