//! Command-line arguments.
use clap::{Args, Parser, Subcommand};
use reelboard_core::story::{
    DEFAULT_ASPECT_RATIO, DEFAULT_LANGUAGE, DEFAULT_STYLE, DEFAULT_TARGET_DURATION_MINUTES,
};
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(
    name = "reelboard",
    version,
    about = "Operator console for the video-generation pipeline",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List stories, optionally following live changes
    List(ListArgs),
    /// Show one story, optionally polling until it settles
    Show(ShowArgs),
    /// Create a new story
    Create(CreateArgs),
    /// Delete a story
    Delete(DeleteArgs),
    /// Show review options (titles, thumbnails, video preview)
    Review(ReviewArgs),
    /// Publish a reviewed story
    Publish(PublishArgs),
    /// Print the status progress table
    StatusTable,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Keep running and print the list whenever it changes
    #[arg(long)]
    pub watch: bool,
}

#[derive(Args, Debug)]
pub struct ShowArgs {
    pub id: Uuid,

    /// Poll while the story is in progress
    #[arg(long)]
    pub watch: bool,
}

#[derive(Args, Debug)]
pub struct CreateArgs {
    #[arg(long)]
    pub topic: String,

    #[arg(long, default_value = "")]
    pub description: String,

    /// Target duration in minutes
    #[arg(long, default_value_t = DEFAULT_TARGET_DURATION_MINUTES)]
    pub duration: u32,

    /// Narration language; repeat for several
    #[arg(long = "language", value_name = "LANG", default_values_t = [DEFAULT_LANGUAGE.to_string()])]
    pub languages: Vec<String>,

    /// cinematic, anime, realistic or 3d
    #[arg(long, default_value = DEFAULT_STYLE)]
    pub style: String,

    /// 16:9 or 9:16
    #[arg(long, default_value = DEFAULT_ASPECT_RATIO)]
    pub aspect_ratio: String,
}

#[derive(Args, Debug)]
pub struct DeleteArgs {
    pub id: Uuid,

    /// Skip the confirmation prompt
    #[arg(long)]
    pub yes: bool,
}

#[derive(Args, Debug)]
pub struct ReviewArgs {
    pub id: Uuid,
}

#[derive(Args, Debug)]
pub struct PublishArgs {
    pub id: Uuid,

    /// Title option id
    #[arg(long, value_name = "OPTION_ID")]
    pub title: Option<Uuid>,

    /// Thumbnail option id
    #[arg(long, value_name = "OPTION_ID")]
    pub thumbnail: Option<Uuid>,

    /// Replace the prefilled description
    #[arg(long)]
    pub description: Option<String>,

    /// Comma separated tags
    #[arg(long, default_value = "")]
    pub tags: String,

    /// Skip the confirmation prompt
    #[arg(long)]
    pub yes: bool,

    /// Follow the story after submitting
    #[arg(long)]
    pub watch: bool,
}
