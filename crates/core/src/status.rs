//! Story status enum and its display table.
//!
//! Status transitions are driven by the external pipeline; this module only
//! describes how each status is presented: a label, a progress percentage,
//! color tokens for the badge and progress bar, and a classification. The
//! [`StoryStatus::is_in_progress`] predicate is what the detail view polls on.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// StoryStatus enum
// ---------------------------------------------------------------------------

/// Pipeline status of a story.
///
/// Variants are declared in pipeline order; `Failed` is last and sits
/// outside that order (see [`StoryStatus::stage`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoryStatus {
    Draft,
    Scripting,
    Producing,
    Rendering,
    PostProduction,
    ReadyForReview,
    Publishing,
    Published,
    Failed,
}

/// Every status, in pipeline order with `Failed` last.
pub const ALL_STATUSES: [StoryStatus; 9] = [
    StoryStatus::Draft,
    StoryStatus::Scripting,
    StoryStatus::Producing,
    StoryStatus::Rendering,
    StoryStatus::PostProduction,
    StoryStatus::ReadyForReview,
    StoryStatus::Publishing,
    StoryStatus::Published,
    StoryStatus::Failed,
];

/// Statuses during which the pipeline is actively working on a story.
pub const IN_PROGRESS_STATUSES: [StoryStatus; 5] = [
    StoryStatus::Scripting,
    StoryStatus::Producing,
    StoryStatus::Rendering,
    StoryStatus::PostProduction,
    StoryStatus::Publishing,
];

/// Coarse grouping of a status for display and polling decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusClass {
    /// Created but not yet picked up by the pipeline.
    Pending,
    /// The pipeline is working on it; clients should poll.
    InProgress,
    /// Pipeline output is waiting for a human decision.
    AwaitingReview,
    /// Nothing further will happen.
    Terminal,
    /// Absorbing failure state.
    Failed,
}

/// One row of the status display table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusInfo {
    pub status: StoryStatus,
    /// Human label: the wire name with underscores replaced by spaces.
    pub label: &'static str,
    /// Completion percentage in `0..=100`.
    pub progress: u8,
    /// Color token for the status badge.
    pub badge_color: &'static str,
    /// Color token for the progress bar.
    pub progress_color: &'static str,
    pub class: StatusClass,
}

impl StoryStatus {
    /// Wire name, as stored in the `stories.status` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Scripting => "scripting",
            Self::Producing => "producing",
            Self::Rendering => "rendering",
            Self::PostProduction => "post_production",
            Self::ReadyForReview => "ready_for_review",
            Self::Publishing => "publishing",
            Self::Published => "published",
            Self::Failed => "failed",
        }
    }

    /// Display label (underscores become spaces).
    pub fn label(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Scripting => "scripting",
            Self::Producing => "producing",
            Self::Rendering => "rendering",
            Self::PostProduction => "post production",
            Self::ReadyForReview => "ready for review",
            Self::Publishing => "publishing",
            Self::Published => "published",
            Self::Failed => "failed",
        }
    }

    /// Completion percentage shown for this status.
    ///
    /// `Failed` reports 0: the failing stage is not known here, so partial
    /// progress is discarded.
    pub fn progress(&self) -> u8 {
        match self {
            Self::Draft => 0,
            Self::Scripting => 15,
            Self::Producing => 40,
            Self::Rendering => 60,
            Self::PostProduction => 80,
            Self::ReadyForReview | Self::Publishing | Self::Published => 100,
            Self::Failed => 0,
        }
    }

    pub fn badge_color(&self) -> &'static str {
        match self {
            Self::Draft => "zinc-500",
            Self::Scripting => "blue-500",
            Self::Producing => "yellow-500",
            Self::Rendering => "orange-500",
            Self::PostProduction => "purple-500",
            Self::ReadyForReview => "green-500",
            Self::Publishing => "blue-500",
            Self::Published => "green-700",
            Self::Failed => "red-500",
        }
    }

    /// Progress bar color. Differs from the badge only for `Publishing`,
    /// whose bar is already full.
    pub fn progress_color(&self) -> &'static str {
        match self {
            Self::Publishing => "green-500",
            other => other.badge_color(),
        }
    }

    pub fn class(&self) -> StatusClass {
        match self {
            Self::Draft => StatusClass::Pending,
            Self::Scripting
            | Self::Producing
            | Self::Rendering
            | Self::PostProduction
            | Self::Publishing => StatusClass::InProgress,
            Self::ReadyForReview => StatusClass::AwaitingReview,
            Self::Published => StatusClass::Terminal,
            Self::Failed => StatusClass::Failed,
        }
    }

    /// Whether the pipeline is actively working on the story.
    ///
    /// The detail view polls if and only if this returns `true`.
    pub fn is_in_progress(&self) -> bool {
        self.class() == StatusClass::InProgress
    }

    /// Whether the badge should pulse (in progress or waiting on review).
    pub fn is_pulsing(&self) -> bool {
        matches!(
            self.class(),
            StatusClass::InProgress | StatusClass::AwaitingReview
        )
    }

    /// Position in the pipeline order, or `None` for `Failed`.
    pub fn stage(&self) -> Option<u8> {
        match self {
            Self::Failed => None,
            other => Some(*other as u8),
        }
    }

    /// Whether this status is at or past `other` in pipeline order.
    ///
    /// Always `false` when either side is `Failed`.
    pub fn has_reached(&self, other: StoryStatus) -> bool {
        match (self.stage(), other.stage()) {
            (Some(a), Some(b)) => a >= b,
            _ => false,
        }
    }

    /// Full display row for this status.
    pub fn info(&self) -> StatusInfo {
        StatusInfo {
            status: *self,
            label: self.label(),
            progress: self.progress(),
            badge_color: self.badge_color(),
            progress_color: self.progress_color(),
            class: self.class(),
        }
    }
}

impl fmt::Display for StoryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StoryStatus {
    type Err = CoreError;

    /// Parse a wire name. Unknown names are an error, never a silent 0%.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ALL_STATUSES
            .iter()
            .copied()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| {
                CoreError::Validation(format!(
                    "Unknown story status '{s}'. Must be one of: {}",
                    ALL_STATUSES
                        .iter()
                        .map(StoryStatus::as_str)
                        .collect::<Vec<_>>()
                        .join(", ")
                ))
            })
    }
}

/// Look up the display row for a wire status name.
pub fn status_info(name: &str) -> Result<StatusInfo, CoreError> {
    name.parse::<StoryStatus>().map(|s| s.info())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
