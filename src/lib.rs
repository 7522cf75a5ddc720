//! Batch website screenshot capture.
//!
//! Drives a browser through a WebDriver server, capturing a list of URLs in
//! bounded-concurrency chunks, timestamping and saving each image, and
//! packaging the results into an archive (HTML index + images) with an
//! optional spreadsheet summary.

// Re-export modules
pub mod capture;
pub mod config;
pub mod download;
pub mod imaging;
pub mod input;
pub mod naming;
pub mod report;
pub mod results;
pub mod service;
pub mod stamp;

// Re-export commonly used types for convenience
pub use config::{CaptureOptions, Settings};
pub use results::{CaptureRequest, CaptureResult};
pub use service::{Notification, Request, Response, Service};

/// Screenshot strategies supported by the capture provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureMode {
    /// Only the currently rendered viewport
    Visible,
    /// The entire scrollable document
    FullPage,
}
