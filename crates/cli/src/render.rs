//! Plain-text rendering of views for the terminal.

use std::fmt::Write;

use reelboard_core::status::{StoryStatus, ALL_STATUSES};
use reelboard_core::story::{Story, StoryDetail};
use reelboard_sync::ReviewFlow;

const BAR_WIDTH: usize = 20;

/// `[########............]` for a percentage.
pub fn progress_bar(progress: u8) -> String {
    let filled = usize::from(progress.min(100)) * BAR_WIDTH / 100;
    format!("[{}{}]", "#".repeat(filled), ".".repeat(BAR_WIDTH - filled))
}

fn status_cell(status: StoryStatus) -> String {
    let marker = if status.is_pulsing() { "*" } else { " " };
    format!("{:<16}{marker}{:>4}%", status.label(), status.progress())
}

pub fn story_table(stories: &[Story]) -> String {
    if stories.is_empty() {
        return "No stories yet.\n".to_string();
    }

    let mut out = String::new();
    let _ = writeln!(out, "{:<36}  {:<22}  TOPIC", "ID", "STATUS");
    for story in stories {
        let _ = writeln!(
            out,
            "{}  {}  {}",
            story.id,
            status_cell(story.status),
            story.topic
        );
    }
    out
}

/// One-line progress update used while following a story.
pub fn status_line(detail: &StoryDetail) -> String {
    let status = detail.status();
    format!(
        "{} {} {:>3}%  {}",
        progress_bar(status.progress()),
        status.label(),
        status.progress(),
        detail.story.updated_at.format("%H:%M:%S")
    )
}

pub fn story_detail(detail: &StoryDetail) -> String {
    let story = &detail.story;
    let status = story.status;
    let mut out = String::new();

    let _ = writeln!(out, "{}", story.topic);
    let _ = writeln!(out, "  id:        {}", story.id);
    let _ = writeln!(
        out,
        "  status:    {} {} {}%",
        status.label(),
        progress_bar(status.progress()),
        status.progress()
    );
    let _ = writeln!(out, "  style:     {} ({})", story.style, story.aspect_ratio);
    if let Some(minutes) = story.target_duration_minutes {
        let _ = writeln!(out, "  duration:  {minutes} min target");
    }
    if !story.languages.is_empty() {
        let _ = writeln!(out, "  languages: {}", story.languages.join(", "));
    }
    let _ = writeln!(out, "  created:   {}", story.created_at.to_rfc3339());
    let _ = writeln!(out, "  updated:   {}", story.updated_at.to_rfc3339());
    if let Some(error) = &story.error_message {
        let _ = writeln!(out, "  error:     {error}");
    }
    if let Some(url) = &story.video_url {
        let _ = writeln!(out, "  video:     {url}");
    }
    if let Some(url) = &story.publish_url {
        let _ = writeln!(out, "  published: {url}");
    }
    if let Some(title) = &detail.selected_title {
        let _ = writeln!(out, "  title:     {title}");
    }

    let scenes = detail.ordered_scenes();
    if !scenes.is_empty() {
        let _ = writeln!(
            out,
            "\nScenes ({}, {:.0}s):",
            scenes.len(),
            detail.total_duration_seconds()
        );
        for scene in scenes {
            let duration = scene
                .duration_seconds
                .map(|d| format!("{d:.1}s"))
                .unwrap_or_else(|| "-".to_string());
            let _ = writeln!(
                out,
                "  {:>3}. [{duration:>6}] {}",
                scene.scene_order,
                scene.text_content
            );
        }
    }
    out
}

pub fn review_summary(flow: &ReviewFlow) -> String {
    let mut out = story_detail(flow.detail());

    let _ = writeln!(out, "\nVideo preview: {}", flow.video_url().unwrap_or("not available"));

    let _ = writeln!(out, "\nTitle options:");
    if flow.title_options().is_empty() {
        let _ = writeln!(out, "  (none)");
    }
    for title in flow.title_options() {
        let _ = writeln!(out, "  {}  {}", title.id, title.title_text);
    }

    let _ = writeln!(out, "\nThumbnail options (newest first):");
    let thumbnails = flow.thumbnails();
    if thumbnails.is_empty() {
        let _ = writeln!(out, "  (none)");
    }
    for thumb in thumbnails {
        let _ = writeln!(out, "  {}  v{}  {}", thumb.id, thumb.version, thumb.image_url);
    }

    if !flow.description().is_empty() {
        let _ = writeln!(out, "\nDescription:\n  {}", flow.description());
    }
    out
}

pub fn status_table() -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<17} {:<17} {:>4}  {:<22}  {:<12} {:<12} POLL",
        "STATUS", "LABEL", "PCT", "PROGRESS", "BADGE", "BAR"
    );
    for status in ALL_STATUSES {
        let info = status.info();
        let _ = writeln!(
            out,
            "{:<17} {:<17} {:>3}%  {}  {:<12} {:<12} {}",
            status.as_str(),
            info.label,
            info.progress,
            progress_bar(info.progress),
            info.badge_color,
            info.progress_color,
            if status.is_in_progress() { "yes" } else { "no" }
        );
    }
    out
}
