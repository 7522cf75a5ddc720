//! Batch orchestration: chunked, bounded-concurrency capture of a URL list.

use crate::CaptureMode;
use crate::capture::{Browser, CaptureError, Tab};
use crate::config::ResolvedOptions;
use crate::download::Downloader;
use crate::results::{CaptureRequest, CaptureResult};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, timeout};

/// Settle time after activating a tab, before reading title and pixels
const ACTIVATE_SETTLE: Duration = Duration::from_millis(200);

/// Pause between chunks, letting the browser settle before the next wave
const CHUNK_QUIESCENCE: Duration = Duration::from_millis(500);

/// Backoff before retrying a rate-limited capture
const RATE_LIMIT_BACKOFF: Duration = Duration::from_secs(1);

/// Retries granted to a rate-limited capture before recording the failure
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Capture every URL in the list, at most `max_concurrency` tabs at a time
///
/// URLs are processed in contiguous chunks; a chunk is fully drained before
/// the next one starts. Every input URL yields exactly one [`CaptureResult`]
/// (failures are recorded, never dropped), and the returned sequence is
/// sorted back into input order.
pub async fn run_batch(
    browser: Arc<dyn Browser>,
    urls: Vec<String>,
    mode: CaptureMode,
    options: ResolvedOptions,
    downloader: Arc<Downloader>,
) -> Vec<CaptureResult> {
    ::log::info!(
        "starting {:?} batch of {} urls, {} at a time",
        mode,
        urls.len(),
        options.max_concurrency
    );

    let requests: Vec<CaptureRequest> = urls
        .into_iter()
        .enumerate()
        .map(|(index, url)| CaptureRequest::new(url, index))
        .collect();
    let options = Arc::new(options);

    let mut results = Vec::with_capacity(requests.len());
    let chunk_count = requests.len().div_ceil(options.max_concurrency);

    for (chunk_index, chunk) in requests.chunks(options.max_concurrency).enumerate() {
        ::log::debug!("processing chunk {} of {}", chunk_index + 1, chunk_count);

        let mut handles = Vec::with_capacity(chunk.len());
        for request in chunk {
            let browser = Arc::clone(&browser);
            let options = Arc::clone(&options);
            let downloader = Arc::clone(&downloader);
            let request = request.clone();
            handles.push((
                request.clone(),
                tokio::spawn(async move {
                    capture_one(browser, request, mode, &options, &downloader).await
                }),
            ));
        }

        // Join the whole chunk before moving on
        for (request, handle) in handles {
            match handle.await {
                Ok(result) => results.push(result),
                Err(e) => {
                    ::log::error!("capture task for {} died: {}", request.url, e);
                    results.push(CaptureResult::failed(
                        &request,
                        placeholder_title(&request),
                        format!("capture task failed: {}", e),
                    ));
                }
            }
        }

        if chunk_index + 1 < chunk_count {
            sleep(CHUNK_QUIESCENCE).await;
        }
    }

    results.sort_by_key(|result| result.index);

    let captured = results.iter().filter(|r| r.success).count();
    ::log::info!(
        "batch complete: {} captured, {} failed",
        captured,
        results.len() - captured
    );
    results
}

/// Run one URL's pipeline: open, drive under a deadline, close, download
async fn capture_one(
    browser: Arc<dyn Browser>,
    request: CaptureRequest,
    mode: CaptureMode,
    options: &ResolvedOptions,
    downloader: &Downloader,
) -> CaptureResult {
    let mut tab = match browser.open_tab().await {
        Ok(tab) => tab,
        Err(e) => {
            return CaptureResult::failed(&request, placeholder_title(&request), e.to_string());
        }
    };

    let result = match timeout(
        options.deadline,
        drive_tab(&mut tab, &request, mode, options),
    )
    .await
    {
        Ok(result) => result,
        Err(_) => {
            ::log::error!("deadline exceeded for {}", request.url);
            CaptureResult::failed(
                &request,
                placeholder_title(&request),
                CaptureError::DeadlineExceeded.to_string(),
            )
        }
    };

    // The tab is closed whatever happened above
    tab.close().await;

    if result.success {
        if let Err(e) = downloader.save(&result).await {
            ::log::error!("failed to save image for {}: {}", result.url, e);
        }
    }

    result
}

/// Navigate, wait, activate, read the title, capture
async fn drive_tab(
    tab: &mut Box<dyn Tab>,
    request: &CaptureRequest,
    mode: CaptureMode,
    options: &ResolvedOptions,
) -> CaptureResult {
    if let Err(e) = tab.navigate(&request.url).await {
        return CaptureResult::failed(request, placeholder_title(request), e.to_string());
    }

    if options.delay > Duration::ZERO {
        sleep(options.delay).await;
    }

    if let Err(e) = tab.activate().await {
        return CaptureResult::failed(request, placeholder_title(request), e.to_string());
    }
    sleep(ACTIVATE_SETTLE).await;

    let title = match tab.title().await {
        Ok(title) if !title.is_empty() => title,
        _ => placeholder_title(request),
    };

    let capture = match mode {
        CaptureMode::Visible => capture_visible_with_retry(tab.as_mut(), options).await,
        CaptureMode::FullPage => {
            tab.capture_full_page(options.format, options.quality).await
        }
    };

    match capture {
        Ok(image) => {
            ::log::debug!("captured {} ({} bytes)", request.url, image.len());
            CaptureResult::captured(request, title, image)
        }
        Err(e) => CaptureResult::failed(request, title, e.to_string()),
    }
}

/// Visible capture with a bounded retry budget for rate-limit errors
async fn capture_visible_with_retry(
    tab: &mut dyn Tab,
    options: &ResolvedOptions,
) -> Result<Vec<u8>, CaptureError> {
    let mut retries = 0;
    loop {
        match tab.capture_visible(options.format, options.quality).await {
            Err(CaptureError::RateLimited) if retries < MAX_RATE_LIMIT_RETRIES => {
                retries += 1;
                ::log::info!(
                    "capture rate limited, retrying in {:?} (attempt {})",
                    RATE_LIMIT_BACKOFF,
                    retries
                );
                sleep(RATE_LIMIT_BACKOFF).await;
            }
            other => return other,
        }
    }
}

/// Generated title for a tab whose real title is unavailable
fn placeholder_title(request: &CaptureRequest) -> String {
    format!("tab-{}", request.index + 1)
}
