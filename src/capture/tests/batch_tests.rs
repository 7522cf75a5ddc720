use crate::CaptureMode;
use crate::capture::batch::run_batch;
use crate::capture::tests::mock::MockBrowser;
use crate::config::{CaptureOptions, FilenameConvention, Settings};
use crate::download::Downloader;
use crate::stamp::Stamper;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

fn index_settings() -> Settings {
    Settings {
        filename_convention: FilenameConvention::Index,
        ..Settings::default()
    }
}

fn downloader_in(dir: &tempfile::TempDir, settings: &Settings) -> Arc<Downloader> {
    let resolved = CaptureOptions::default().resolve(settings);
    Arc::new(Downloader::new(
        dir.path().to_path_buf(),
        Arc::new(settings.clone()),
        resolved.format,
        resolved.quality,
        Stamper::spawn(),
    ))
}

fn urls(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("http://site-{}.test", i)).collect()
}

#[tokio::test(start_paused = true)]
async fn test_every_input_url_yields_exactly_one_result() {
    let dir = tempfile::tempdir().unwrap();
    let settings = index_settings();
    let browser = MockBrowser::new().with_failing_urls(["http://site-2.test"]);

    let results = run_batch(
        Arc::new(browser),
        urls(5),
        CaptureMode::Visible,
        CaptureOptions::default().resolve(&settings),
        downloader_in(&dir, &settings),
    )
    .await;

    assert_eq!(results.len(), 5);
    for (i, result) in results.iter().enumerate() {
        // Sorted back into input order
        assert_eq!(result.index, i);
        // Exactly one of image/error, never both, never neither
        assert_ne!(result.image.is_some(), result.error.is_some());
        assert_eq!(result.success, result.image.is_some());
    }
    assert!(!results[2].success);
    assert!(results[2].error.as_ref().unwrap().contains("site-2"));
}

#[tokio::test(start_paused = true)]
async fn test_all_failures_still_produce_full_result_list() {
    let dir = tempfile::tempdir().unwrap();
    let settings = index_settings();
    let browser = MockBrowser::new().with_failing_urls([
        "http://site-0.test",
        "http://site-1.test",
        "http://site-2.test",
    ]);

    let results = run_batch(
        Arc::new(browser),
        urls(3),
        CaptureMode::Visible,
        CaptureOptions::default().resolve(&settings),
        downloader_in(&dir, &settings),
    )
    .await;

    assert_eq!(results.len(), 3);
    assert!(results.iter().all(|r| !r.success && r.error.is_some()));
}

#[tokio::test(start_paused = true)]
async fn test_open_tabs_never_exceed_max_concurrency() {
    let dir = tempfile::tempdir().unwrap();
    let settings = index_settings();
    let browser = MockBrowser::new().with_navigate_delay(Duration::from_millis(50));
    let state = browser.state();

    let options = CaptureOptions {
        max_concurrency: Some(2),
        ..CaptureOptions::default()
    };
    let results = run_batch(
        Arc::new(browser),
        urls(6),
        CaptureMode::Visible,
        options.resolve(&settings),
        downloader_in(&dir, &settings),
    )
    .await;

    assert_eq!(results.len(), 6);
    assert!(state.max_open.load(Ordering::SeqCst) <= 2);
    assert_eq!(state.opened.load(Ordering::SeqCst), 6);
    assert_eq!(state.closed.load(Ordering::SeqCst), 6);
}

#[tokio::test(start_paused = true)]
async fn test_chunk_members_actually_overlap() {
    let dir = tempfile::tempdir().unwrap();
    let settings = index_settings();
    let browser = MockBrowser::new().with_navigate_delay(Duration::from_millis(50));
    let state = browser.state();

    let options = CaptureOptions {
        max_concurrency: Some(3),
        ..CaptureOptions::default()
    };
    run_batch(
        Arc::new(browser),
        urls(3),
        CaptureMode::Visible,
        options.resolve(&settings),
        downloader_in(&dir, &settings),
    )
    .await;

    // All three chunk members were in flight at once
    assert_eq!(state.max_open.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn test_rate_limited_capture_is_retried_until_success() {
    let dir = tempfile::tempdir().unwrap();
    let settings = index_settings();
    let browser = MockBrowser::new().with_rate_limited_captures(2);
    let state = browser.state();

    let results = run_batch(
        Arc::new(browser),
        urls(1),
        CaptureMode::Visible,
        CaptureOptions::default().resolve(&settings),
        downloader_in(&dir, &settings),
    )
    .await;

    assert!(results[0].success);
    // Two rate-limited attempts plus the successful one
    assert_eq!(state.capture_calls.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn test_rate_limited_capture_fails_after_retry_budget() {
    let dir = tempfile::tempdir().unwrap();
    let settings = index_settings();
    let browser = MockBrowser::new().with_rate_limited_captures(100);
    let state = browser.state();

    let results = run_batch(
        Arc::new(browser),
        urls(1),
        CaptureMode::Visible,
        CaptureOptions::default().resolve(&settings),
        downloader_in(&dir, &settings),
    )
    .await;

    assert!(!results[0].success);
    assert!(results[0].error.as_ref().unwrap().contains("rate limit"));
    // Initial attempt plus three retries
    assert_eq!(state.capture_calls.load(Ordering::SeqCst), 4);
}

#[tokio::test(start_paused = true)]
async fn test_deadline_bounds_a_stuck_tab() {
    let dir = tempfile::tempdir().unwrap();
    let settings = index_settings();
    let browser = MockBrowser::new().with_navigate_delay(Duration::from_secs(600));
    let state = browser.state();

    let options = CaptureOptions {
        timeout_ms: Some(1_000),
        ..CaptureOptions::default()
    };
    let results = run_batch(
        Arc::new(browser),
        urls(2),
        CaptureMode::Visible,
        options.resolve(&settings),
        downloader_in(&dir, &settings),
    )
    .await;

    assert_eq!(results.len(), 2);
    for result in &results {
        assert!(!result.success);
        assert!(result.error.as_ref().unwrap().contains("deadline"));
    }
    // Stuck tabs are still closed
    assert_eq!(state.closed.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn test_empty_titles_fall_back_to_generated_labels() {
    let dir = tempfile::tempdir().unwrap();
    let settings = index_settings();
    let browser = MockBrowser::new().with_empty_titles();

    let results = run_batch(
        Arc::new(browser),
        urls(2),
        CaptureMode::Visible,
        CaptureOptions::default().resolve(&settings),
        downloader_in(&dir, &settings),
    )
    .await;

    assert_eq!(results[0].title, "tab-1");
    assert_eq!(results[1].title, "tab-2");
}

#[tokio::test(start_paused = true)]
async fn test_successful_captures_are_downloaded_with_index_names() {
    let dir = tempfile::tempdir().unwrap();
    let settings = index_settings();
    let browser = MockBrowser::new();

    let options = CaptureOptions {
        max_concurrency: Some(2),
        ..CaptureOptions::default()
    };
    let results = run_batch(
        Arc::new(browser),
        vec!["http://a.test".to_string(), "http://b.test".to_string()],
        CaptureMode::Visible,
        options.resolve(&settings),
        downloader_in(&dir, &settings),
    )
    .await;

    assert!(results.iter().all(|r| r.success));
    assert!(dir.path().join("img-1.png").exists());
    assert!(dir.path().join("img-2.png").exists());
}

#[tokio::test(start_paused = true)]
async fn test_full_page_mode_captures_without_retry_path() {
    let dir = tempfile::tempdir().unwrap();
    let settings = index_settings();
    let browser = MockBrowser::new();
    let state = browser.state();

    let results = run_batch(
        Arc::new(browser),
        urls(2),
        CaptureMode::FullPage,
        CaptureOptions::default().resolve(&settings),
        downloader_in(&dir, &settings),
    )
    .await;

    assert!(results.iter().all(|r| r.success));
    assert_eq!(state.capture_calls.load(Ordering::SeqCst), 2);
}
