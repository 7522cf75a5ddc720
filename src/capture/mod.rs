pub mod batch;
pub mod webdriver;

#[cfg(test)]
pub mod tests;

use crate::config::ImageFormat;
use async_trait::async_trait;
use thiserror::Error;

/// Failures that can surface from a tab's capture pipeline
#[derive(Debug, Error)]
pub enum CaptureError {
    /// No tab could be opened (no WebDriver server reachable)
    #[error("failed to open tab: {0}")]
    OpenTab(String),

    /// Navigation to the target URL failed
    #[error("navigation failed: {0}")]
    Navigation(String),

    /// The capture primitive reported a rate-limit condition
    #[error("capture rate limit exceeded")]
    RateLimited,

    /// The page cannot support full-document rendering
    #[error("full-page rendering unavailable: {0}")]
    FullPageUnsupported(String),

    /// Re-encoding the captured pixels failed
    #[error("image encoding failed: {0}")]
    Encode(String),

    /// Any other backend command failure
    #[error("{0}")]
    Command(String),

    /// The per-tab deadline expired before the pipeline finished
    #[error("tab deadline exceeded")]
    DeadlineExceeded,
}

/// A browser that can open tabs for capture
///
/// The orchestrator only ever talks to this trait; the WebDriver
/// implementation lives in [`webdriver`], and tests substitute their own.
#[async_trait]
pub trait Browser: Send + Sync {
    /// Open a fresh tab, not yet pointed anywhere
    async fn open_tab(&self) -> Result<Box<dyn Tab>, CaptureError>;
}

/// One open tab, owned exclusively by a single capture pipeline
#[async_trait]
pub trait Tab: Send {
    /// Navigate to a URL and wait for the load-complete transition
    async fn navigate(&mut self, url: &str) -> Result<(), CaptureError>;

    /// Bring the tab to the foreground so the capture primitive can see it
    async fn activate(&mut self) -> Result<(), CaptureError>;

    /// The tab's displayed title (may be empty)
    async fn title(&mut self) -> Result<String, CaptureError>;

    /// Capture the visible viewport
    async fn capture_visible(
        &mut self,
        format: ImageFormat,
        quality: u8,
    ) -> Result<Vec<u8>, CaptureError>;

    /// Capture the full scrollable document
    async fn capture_full_page(
        &mut self,
        format: ImageFormat,
        quality: u8,
    ) -> Result<Vec<u8>, CaptureError>;

    /// Close the tab; always called, regardless of pipeline outcome
    async fn close(self: Box<Self>);
}
