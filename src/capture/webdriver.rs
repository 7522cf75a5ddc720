use crate::capture::{Browser, CaptureError, Tab};
use crate::config::ImageFormat;
use crate::imaging;
use async_trait::async_trait;
use fantoccini::{Client, ClientBuilder};
use std::time::Duration;

/// Settle time after resizing the window for a full-page capture
const RENDER_SETTLE: Duration = Duration::from_millis(400);

/// Error fragments that indicate the capture endpoint is throttling us
const RATE_LIMIT_MARKERS: [&str; 3] = ["rate limit", "too many requests", "quota"];

/// Script evaluated in the page to size a full-document capture.
/// Returns [document width, document height, window width, window height].
const MEASURE_DOCUMENT: &str = "return [document.documentElement.scrollWidth, \
     document.documentElement.scrollHeight, window.outerWidth, window.outerHeight];";

/// Tab provider backed by a WebDriver server
///
/// Every tab is its own WebDriver session, so concurrent tabs never share
/// browser state and closing one cannot disturb its siblings.
pub struct WebDriverBrowser {
    webdriver_url: String,
}

impl WebDriverBrowser {
    /// Create a provider that connects to the given WebDriver URL
    pub fn new(webdriver_url: impl Into<String>) -> Self {
        Self {
            webdriver_url: webdriver_url.into(),
        }
    }
}

#[async_trait]
impl Browser for WebDriverBrowser {
    async fn open_tab(&self) -> Result<Box<dyn Tab>, CaptureError> {
        match connect_to_webdriver(&self.webdriver_url).await {
            Some(client) => Ok(Box::new(WebDriverTab { client })),
            None => Err(CaptureError::OpenTab(format!(
                "no WebDriver server reachable at {}",
                self.webdriver_url
            ))),
        }
    }
}

/// Connects to the WebDriver instance
async fn connect_to_webdriver(webdriver_url: &str) -> Option<Client> {
    match ClientBuilder::native().connect(webdriver_url).await {
        Ok(client) => {
            ::log::debug!("connected to WebDriver at {}", webdriver_url);
            return Some(client);
        }
        Err(e) => {
            ::log::error!("failed to connect to WebDriver at {}: {}", webdriver_url, e);
        }
    }

    // If we couldn't connect, try with common alternative URLs
    let fallback_urls = [
        "http://localhost:9515", // ChromeDriver default
        "http://localhost:4444", // Selenium / geckodriver default
        "http://127.0.0.1:4444", // Try with IP instead of localhost
    ];

    for url in fallback_urls.iter() {
        if *url == webdriver_url {
            continue; // Skip if it's the same as the one we already tried
        }

        ::log::info!("trying fallback WebDriver URL: {}", url);
        match ClientBuilder::native().connect(url).await {
            Ok(client) => {
                ::log::debug!("connected to fallback WebDriver at {}", url);
                return Some(client);
            }
            Err(_) => {
                // Don't log error for fallbacks to avoid log spam
            }
        }
    }

    ::log::error!("failed to connect to any WebDriver server");
    ::log::error!(
        "Make sure a WebDriver server is running or set the WEBDRIVER_URL environment variable"
    );
    None
}

struct WebDriverTab {
    client: Client,
}

#[async_trait]
impl Tab for WebDriverTab {
    async fn navigate(&mut self, url: &str) -> Result<(), CaptureError> {
        self.client
            .goto(url)
            .await
            .map_err(|e| navigation_error(e, url))
    }

    async fn activate(&mut self) -> Result<(), CaptureError> {
        let handles = self
            .client
            .windows()
            .await
            .map_err(|e| CaptureError::Command(e.to_string()))?;
        if let Some(handle) = handles.into_iter().next() {
            self.client
                .switch_to_window(handle)
                .await
                .map_err(|e| CaptureError::Command(e.to_string()))?;
        }
        Ok(())
    }

    async fn title(&mut self) -> Result<String, CaptureError> {
        self.client
            .title()
            .await
            .map_err(|e| CaptureError::Command(e.to_string()))
    }

    async fn capture_visible(
        &mut self,
        format: ImageFormat,
        quality: u8,
    ) -> Result<Vec<u8>, CaptureError> {
        let png = self.client.screenshot().await.map_err(capture_error)?;
        imaging::transcode(png, format, quality).map_err(|e| CaptureError::Encode(e.to_string()))
    }

    async fn capture_full_page(
        &mut self,
        format: ImageFormat,
        quality: u8,
    ) -> Result<Vec<u8>, CaptureError> {
        // Ask the page for its full dimensions; a page where this script
        // cannot run cannot be rendered full-size
        let value = self
            .client
            .execute(MEASURE_DOCUMENT, vec![])
            .await
            .map_err(|e| CaptureError::FullPageUnsupported(e.to_string()))?;
        let dims: Vec<f64> = serde_json::from_value(value)
            .map_err(|e| CaptureError::FullPageUnsupported(format!("bad page metrics: {}", e)))?;
        let &[doc_width, doc_height, window_width, window_height] = dims.as_slice() else {
            return Err(CaptureError::FullPageUnsupported(
                "page metrics incomplete".to_string(),
            ));
        };

        let _ = self
            .client
            .execute("window.scrollTo(0, 0);", vec![])
            .await
            .map_err(|e| CaptureError::Command(e.to_string()))?;

        // Grow the window to the full document, capture, restore
        self.client
            .set_window_rect(
                0,
                0,
                doc_width.max(window_width).round() as u32,
                doc_height.max(window_height).round() as u32,
            )
            .await
            .map_err(|e| CaptureError::Command(e.to_string()))?;
        tokio::time::sleep(RENDER_SETTLE).await;

        let shot = self.client.screenshot().await.map_err(capture_error);

        if let Err(e) = self
            .client
            .set_window_rect(0, 0, window_width as u32, window_height as u32)
            .await
        {
            ::log::warn!("failed to restore window size: {}", e);
        }

        imaging::transcode(shot?, format, quality)
            .map_err(|e| CaptureError::Encode(e.to_string()))
    }

    async fn close(self: Box<Self>) {
        if let Err(e) = self.client.close().await {
            ::log::warn!("failed to close tab: {}", e);
        }
    }
}

/// Map a navigation failure, keeping lost-session noise at warn level
fn navigation_error(error: fantoccini::error::CmdError, url: &str) -> CaptureError {
    let message = error.to_string();
    if message.contains("Unable to find session") {
        ::log::warn!("lost session while accessing {}", url);
    } else {
        ::log::error!("failed to access {}: {}", url, message);
    }
    CaptureError::Navigation(message)
}

/// Map a screenshot failure, classifying throttling separately so the
/// orchestrator can retry it
fn capture_error(error: fantoccini::error::CmdError) -> CaptureError {
    let message = error.to_string();
    let lowered = message.to_lowercase();
    if RATE_LIMIT_MARKERS
        .iter()
        .any(|marker| lowered.contains(marker))
    {
        CaptureError::RateLimited
    } else {
        CaptureError::Command(message)
    }
}
