//! Detail view: initial fetch, polling lifecycle and cancellation.
//!
//! Runs on a paused clock; sleeping in the test advances time for the
//! poll task as well.

mod common;

use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use common::{detail, id, FakeSource, Reply};
use reelboard_core::status::StoryStatus;
use reelboard_sync::{DetailPhase, DetailState, DetailView, SyncError};
use tokio::sync::watch;
use tokio::time::sleep;

async fn wait_until(
    rx: &mut watch::Receiver<DetailState>,
    f: impl FnMut(&DetailState) -> bool,
) -> DetailState {
    rx.wait_for(f).await.expect("detail view dropped").clone()
}

fn status_of(state: &DetailState) -> Option<StoryStatus> {
    state.detail.as_ref().map(|d| d.status())
}

#[tokio::test(start_paused = true)]
async fn producing_schedules_one_refetch_then_published_stops() {
    let source = Arc::new(FakeSource::new().with_replies(
        id(1),
        vec![
            Reply::Detail(detail(1, "producing")),
            Reply::Detail(detail(1, "published")),
        ],
    ));
    let mut view = DetailView::new(source.clone());
    let mut rx = view.watch();

    view.activate(id(1)).await;
    let state = wait_until(&mut rx, |s| s.phase == DetailPhase::Ready).await;
    assert_eq!(status_of(&state), Some(StoryStatus::Producing));

    sleep(Duration::from_secs(4)).await;
    assert_eq!(source.fetch_count(id(1)), 1);
    assert!(view.state().polling);

    sleep(Duration::from_secs(2)).await;
    assert_eq!(source.fetch_count(id(1)), 2);
    let state = view.state();
    assert_eq!(status_of(&state), Some(StoryStatus::Published));
    assert!(!state.polling);

    sleep(Duration::from_secs(60)).await;
    assert_eq!(source.fetch_count(id(1)), 2);
}

#[tokio::test(start_paused = true)]
async fn settled_status_never_polls() {
    let source = Arc::new(
        FakeSource::new().with_replies(id(1), vec![Reply::Detail(detail(1, "ready_for_review"))]),
    );
    let mut view = DetailView::new(source.clone());
    let mut rx = view.watch();

    view.activate(id(1)).await;
    let state = wait_until(&mut rx, |s| s.phase == DetailPhase::Ready).await;
    assert!(!state.polling);

    sleep(Duration::from_secs(30)).await;
    assert_eq!(source.fetch_count(id(1)), 1);
}

#[tokio::test(start_paused = true)]
async fn missing_story_is_not_found_not_loading() {
    let source = Arc::new(FakeSource::new().with_replies(id(1), vec![Reply::NotFound]));
    let mut view = DetailView::new(source.clone());
    let mut rx = view.watch();

    view.activate(id(1)).await;
    let state = wait_until(&mut rx, |s| s.phase != DetailPhase::Loading).await;

    assert_eq!(state.phase, DetailPhase::NotFound);
    assert!(state.detail.is_none());
    assert!(!state.polling);
}

#[tokio::test(start_paused = true)]
async fn failed_initial_fetch_exposes_error_without_polling() {
    let source = Arc::new(FakeSource::new().with_replies(id(1), vec![Reply::ServerError]));
    let mut view = DetailView::new(source.clone());
    let mut rx = view.watch();

    view.activate(id(1)).await;
    let state = wait_until(&mut rx, |s| s.phase != DetailPhase::Loading).await;

    assert_eq!(state.phase, DetailPhase::Failed);
    assert_eq!(state.error.as_deref(), Some("500 Internal Server Error"));
    assert!(state.detail.is_none());

    sleep(Duration::from_secs(30)).await;
    assert_eq!(source.fetch_count(id(1)), 1);
}

#[tokio::test(start_paused = true)]
async fn poll_failure_keeps_last_detail_and_retries() {
    let source = Arc::new(FakeSource::new().with_replies(
        id(1),
        vec![
            Reply::Detail(detail(1, "producing")),
            Reply::ServerError,
            Reply::Detail(detail(1, "rendering")),
            Reply::Detail(detail(1, "failed")),
        ],
    ));
    let mut view = DetailView::new(source.clone());
    let mut rx = view.watch();
    view.activate(id(1)).await;
    wait_until(&mut rx, |s| s.phase == DetailPhase::Ready).await;

    sleep(Duration::from_secs(6)).await;
    let state = view.state();
    assert!(state.error.is_some());
    assert_eq!(status_of(&state), Some(StoryStatus::Producing));
    assert!(state.polling);

    sleep(Duration::from_secs(5)).await;
    let state = view.state();
    assert!(state.error.is_none());
    assert_eq!(status_of(&state), Some(StoryStatus::Rendering));

    sleep(Duration::from_secs(5)).await;
    let state = view.state();
    assert_eq!(status_of(&state), Some(StoryStatus::Failed));
    assert!(!state.polling);
    assert_eq!(source.fetch_count(id(1)), 4);
}

#[tokio::test(start_paused = true)]
async fn switching_story_cancels_previous_polling() {
    let source = Arc::new(
        FakeSource::new()
            .with_replies(id(1), vec![Reply::Detail(detail(1, "rendering"))])
            .with_replies(id(2), vec![Reply::Detail(detail(2, "published"))]),
    );
    let mut view = DetailView::new(source.clone());
    let mut rx = view.watch();

    view.activate(id(1)).await;
    wait_until(&mut rx, |s| s.phase == DetailPhase::Ready).await;
    sleep(Duration::from_secs(2)).await;

    view.activate(id(2)).await;
    let state = wait_until(&mut rx, |s| {
        s.story_id == Some(id(2)) && s.phase == DetailPhase::Ready
    })
    .await;
    assert_eq!(state.detail.unwrap().id(), id(2));

    sleep(Duration::from_secs(60)).await;
    assert_eq!(source.fetch_count(id(1)), 1);
    assert_eq!(view.state().story_id, Some(id(2)));
}

#[tokio::test(start_paused = true)]
async fn deactivate_stops_polling() {
    let source = Arc::new(
        FakeSource::new().with_replies(id(1), vec![Reply::Detail(detail(1, "scripting"))]),
    );
    let mut view = DetailView::new(source.clone());
    let mut rx = view.watch();
    view.activate(id(1)).await;
    wait_until(&mut rx, |s| s.polling).await;

    view.deactivate().await;
    assert_eq!(view.state(), DetailState::default());

    sleep(Duration::from_secs(60)).await;
    assert_eq!(source.fetch_count(id(1)), 1);
}

#[tokio::test(start_paused = true)]
async fn custom_interval_is_honoured() {
    let source = Arc::new(
        FakeSource::new().with_replies(id(1), vec![Reply::Detail(detail(1, "post_production"))]),
    );
    let mut view = DetailView::with_poll_interval(source.clone(), Duration::from_secs(2));
    let mut rx = view.watch();
    view.activate(id(1)).await;
    wait_until(&mut rx, |s| s.phase == DetailPhase::Ready).await;

    sleep(Duration::from_secs(7)).await;
    assert_eq!(source.fetch_count(id(1)), 4);

    view.deactivate().await;
}

#[tokio::test(start_paused = true)]
async fn confirmed_delete_removes_story_and_stops_polling() {
    let source = Arc::new(
        FakeSource::new().with_replies(id(1), vec![Reply::Detail(detail(1, "producing"))]),
    );
    let mut view = DetailView::new(source.clone());
    let mut rx = view.watch();
    view.activate(id(1)).await;
    wait_until(&mut rx, |s| s.polling).await;

    let asked = std::cell::RefCell::new(String::new());
    view.delete(&|p: &str| {
        *asked.borrow_mut() = p.to_string();
        true
    })
    .await
    .unwrap();

    assert!(asked.borrow().contains("Story 1"));
    assert_eq!(source.deleted(), vec![id(1)]);
    let state = view.state();
    assert_eq!(state.phase, DetailPhase::Deleted);
    assert!(!state.polling);
    assert!(state.detail.is_none());

    sleep(Duration::from_secs(60)).await;
    assert_eq!(source.fetch_count(id(1)), 1);
}

#[tokio::test(start_paused = true)]
async fn declined_delete_sends_nothing() {
    let source = Arc::new(
        FakeSource::new().with_replies(id(1), vec![Reply::Detail(detail(1, "producing"))]),
    );
    let mut view = DetailView::new(source.clone());
    let mut rx = view.watch();
    view.activate(id(1)).await;
    wait_until(&mut rx, |s| s.polling).await;

    let result = view.delete(&|_: &str| false).await;

    assert_matches!(result, Err(SyncError::NotConfirmed));
    assert!(source.deleted().is_empty());
    assert!(view.state().polling);

    view.deactivate().await;
}

#[tokio::test(start_paused = true)]
async fn failed_delete_keeps_watching() {
    let source = Arc::new(
        FakeSource::new().with_replies(id(1), vec![Reply::Detail(detail(1, "producing"))]),
    );
    source.fail_deletes();
    let mut view = DetailView::new(source.clone());
    let mut rx = view.watch();
    view.activate(id(1)).await;
    wait_until(&mut rx, |s| s.polling).await;

    let result = view.delete(&|_: &str| true).await;

    assert_matches!(result, Err(SyncError::Api(_)));
    let state = view.state();
    assert_eq!(state.phase, DetailPhase::Ready);
    assert!(state.error.is_some());
    assert!(state.polling);

    view.deactivate().await;
}

#[tokio::test]
async fn delete_without_active_story_is_rejected() {
    let mut view = DetailView::new(Arc::new(FakeSource::new()));
    let result = view.delete(&|_: &str| true).await;
    assert_matches!(result, Err(SyncError::Inactive));
}
