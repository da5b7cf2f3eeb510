//! Object storage path convention for story assets.
//!
//! Every asset lives under a folder named after the story id inside one of
//! the fixed buckets, e.g. `videos/<story_id>/final_video.mp4`.

use crate::types::StoryId;

pub const BUCKET_IMAGES: &str = "images";
pub const BUCKET_AUDIO: &str = "audio";
pub const BUCKET_VIDEOS: &str = "videos";
pub const BUCKET_THUMBNAILS: &str = "thumbnails";

/// All buckets that may hold files for a story.
pub const STORY_BUCKETS: &[&str] = &[
    BUCKET_IMAGES,
    BUCKET_AUDIO,
    BUCKET_VIDEOS,
    BUCKET_THUMBNAILS,
];

/// File name of the rendered video inside the story folder.
pub const FINAL_VIDEO_FILE: &str = "final_video.mp4";

/// A bucket plus an object path within it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageObject {
    pub bucket: &'static str,
    pub path: String,
}

impl StorageObject {
    /// The rendered video for a story.
    pub fn final_video(story_id: StoryId) -> Self {
        Self {
            bucket: BUCKET_VIDEOS,
            path: format!("{story_id}/{FINAL_VIDEO_FILE}"),
        }
    }

    /// A generated scene image.
    pub fn scene_image(story_id: StoryId, scene_id: uuid::Uuid) -> Self {
        Self {
            bucket: BUCKET_IMAGES,
            path: format!("{story_id}/{scene_id}.png"),
        }
    }

    /// A generated scene narration track.
    pub fn scene_audio(story_id: StoryId, scene_id: uuid::Uuid) -> Self {
        Self {
            bucket: BUCKET_AUDIO,
            path: format!("{story_id}/{scene_id}.mp3"),
        }
    }

    /// A thumbnail file inside the story's thumbnail folder.
    pub fn thumbnail(story_id: StoryId, file_name: &str) -> Self {
        Self {
            bucket: BUCKET_THUMBNAILS,
            path: format!("{story_id}/{file_name}"),
        }
    }
}
