//! Subcommand implementations.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use reelboard_client::{ApiClient, BaasClient, ClientConfig};
use reelboard_core::story::CreateStoryRequest;
use reelboard_core::types::StoryId;
use reelboard_realtime::{ChannelConfig, RealtimeClient};
use reelboard_sync::{DetailPhase, DetailView, ListView, ReviewFlow, StorySource};

use crate::cli::{Command, CreateArgs, DeleteArgs, PublishArgs};
use crate::prompt::Prompt;
use crate::render;

pub async fn run(command: Command, config: &ClientConfig) -> Result<()> {
    match command {
        Command::List(args) if args.watch => watch_list(config).await,
        Command::List(_) => list(config).await,
        Command::Show(args) if args.watch => watch_story(config, args.id).await,
        Command::Show(args) => show(config, args.id).await,
        Command::Create(args) => create(config, args).await,
        Command::Delete(args) => delete(config, args).await,
        Command::Review(args) => review(config, args.id).await,
        Command::Publish(args) => publish(config, args).await,
        Command::StatusTable => {
            print!("{}", render::status_table());
            Ok(())
        }
    }
}

fn api_client(config: &ClientConfig) -> Result<ApiClient> {
    ApiClient::from_config(config).context("Failed to build API client")
}

fn baas_client(config: &ClientConfig) -> Result<BaasClient> {
    BaasClient::from_config(config).context("Backend client unavailable")
}

async fn list(config: &ClientConfig) -> Result<()> {
    let stories = api_client(config)?.list_stories().await.context("Failed to list stories")?;
    print!("{}", render::story_table(&stories));
    Ok(())
}

async fn watch_list(config: &ClientConfig) -> Result<()> {
    let source: Arc<dyn StorySource> = Arc::new(api_client(config)?);
    let key = config.require_baas_key()?;
    let feed = RealtimeClient::new(&config.baas_url, key, ChannelConfig::stories());

    let view = ListView::start(source, &feed);
    let mut rx = view.watch();
    tracing::info!("Watching story list, Ctrl-C to stop");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = rx.borrow_and_update().clone();
                if state.loading {
                    continue;
                }
                if let Some(error) = &state.error {
                    eprintln!("error: {error}");
                }
                println!("--");
                print!("{}", render::story_table(state.stories.stories()));
                if !state.live {
                    eprintln!("Change feed closed");
                    break;
                }
            }
        }
    }

    view.close().await;
    Ok(())
}

async fn show(config: &ClientConfig, id: StoryId) -> Result<()> {
    let detail = api_client(config)?.get_story(id).await.map_err(|e| {
        if e.is_not_found() {
            anyhow::anyhow!("Story {id} not found")
        } else {
            anyhow::Error::new(e).context("Failed to load story")
        }
    })?;
    print!("{}", render::story_detail(&detail));
    Ok(())
}

/// Follow a story until polling stops, printing each status change.
async fn watch_story(config: &ClientConfig, id: StoryId) -> Result<()> {
    let source: Arc<dyn StorySource> = Arc::new(api_client(config)?);
    let mut view = DetailView::with_poll_interval(source, config.poll_interval);
    let mut rx = view.watch();
    view.activate(id).await;

    let mut last_printed = None;
    let outcome = loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break Ok(()),
            changed = rx.changed() => {
                if changed.is_err() {
                    break Ok(());
                }
                let state = rx.borrow_and_update().clone();
                match state.phase {
                    DetailPhase::Idle | DetailPhase::Loading => {}
                    DetailPhase::NotFound => break Err(anyhow::anyhow!("Story {id} not found")),
                    DetailPhase::Failed => {
                        break Err(anyhow::anyhow!(
                            "Failed to load story: {}",
                            state.error.unwrap_or_default()
                        ));
                    }
                    DetailPhase::Deleted => break Ok(()),
                    DetailPhase::Ready => {
                        if let Some(error) = &state.error {
                            eprintln!("poll failed: {error}");
                        }
                        if let Some(detail) = &state.detail {
                            let key = (detail.status(), detail.story.updated_at);
                            if last_printed != Some(key) {
                                println!("{}", render::status_line(detail));
                                last_printed = Some(key);
                            }
                            if !state.polling {
                                print!("\n{}", render::story_detail(detail));
                                break Ok(());
                            }
                        }
                    }
                }
            }
        }
    };

    view.deactivate().await;
    outcome
}

async fn create(config: &ClientConfig, args: CreateArgs) -> Result<()> {
    let request = CreateStoryRequest::new(args.topic)
        .with_description(args.description)
        .with_target_duration(args.duration)
        .with_languages(args.languages)
        .with_style(args.style)
        .with_aspect_ratio(args.aspect_ratio);

    let story = api_client(config)?
        .create_story(&request)
        .await
        .context("Failed to create story")?;

    tracing::info!(story_id = %story.id, "Story created");
    println!("{}  {}  {}", story.id, story.status.label(), story.topic);
    Ok(())
}

async fn delete(config: &ClientConfig, args: DeleteArgs) -> Result<()> {
    let source: Arc<dyn StorySource> = Arc::new(api_client(config)?);
    let mut view = DetailView::with_poll_interval(source, config.poll_interval);
    let mut rx = view.watch();
    view.activate(args.id).await;

    let phase = rx
        .wait_for(|s| s.phase != DetailPhase::Loading)
        .await
        .map(|s| s.phase)
        .unwrap_or(DetailPhase::Idle);
    if phase == DetailPhase::NotFound {
        view.deactivate().await;
        bail!("Story {} not found", args.id);
    }

    let result = view.delete(&Prompt { assume_yes: args.yes }).await;
    view.deactivate().await;
    result?;

    println!("Deleted {}", args.id);
    Ok(())
}

async fn review(config: &ClientConfig, id: StoryId) -> Result<()> {
    let api = api_client(config)?;
    let baas = baas_client(config)?;
    let flow = ReviewFlow::load(&api, &baas, id).await?;
    print!("{}", render::review_summary(&flow));
    Ok(())
}

async fn publish(config: &ClientConfig, args: PublishArgs) -> Result<()> {
    let api = api_client(config)?;
    let baas = baas_client(config)?;
    let mut flow = ReviewFlow::load(&api, &baas, args.id).await?;

    if let Some(title) = args.title {
        flow.select_title(title)?;
    }
    if let Some(thumbnail) = args.thumbnail {
        flow.select_thumbnail(thumbnail)?;
    }
    if let Some(description) = args.description {
        flow.set_description(description);
    }
    flow.set_tags(args.tags);

    let update = flow.submit(&baas, &Prompt { assume_yes: args.yes }).await?;
    println!(
        "Publishing {} as \"{}\" ({} tags)",
        args.id,
        update.selected_title,
        update.tags.len()
    );

    if args.watch {
        watch_story(config, args.id).await?;
    }
    Ok(())
}
