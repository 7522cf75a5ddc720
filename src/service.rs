//! The control surface between UI callers and the batch orchestrator.
//!
//! Requests and notifications keep the action-tagged wire vocabulary
//! (`batchScreenshot`, `taskCompleted`, ...) so any front end that speaks
//! JSON can drive the service; in-process callers just use the enums.

use crate::CaptureMode;
use crate::capture::Browser;
use crate::capture::batch::run_batch;
use crate::config::{CaptureOptions, Settings};
use crate::download::Downloader;
use crate::report;
use crate::results::CaptureResult;
use crate::stamp::Stamper;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Folder the standalone export action writes into
const EXPORTS_FOLDER: &str = "exports";

/// Inbound control messages
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Request {
    /// Capture the visible viewport of every URL
    BatchScreenshot {
        urls: Vec<String>,
        #[serde(default)]
        options: CaptureOptions,
    },

    /// Capture the full scrollable document of every URL
    BatchFullPageScreenshot {
        urls: Vec<String>,
        #[serde(default)]
        options: CaptureOptions,
    },

    /// Export a spreadsheet for previously produced results
    #[serde(rename = "exportXLSX")]
    ExportXlsx { results: Vec<CaptureResult> },
}

/// Replies to control messages
#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Response {
    Results { results: Vec<CaptureResult> },
    Completed { success: bool },
}

/// Outbound notifications, sent as work finishes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Notification {
    TaskCompleted,
    XlsxExported,
}

/// Handles control messages by driving the orchestrator and report builder
pub struct Service {
    browser: Arc<dyn Browser>,
    settings: Arc<Settings>,
    output_dir: PathBuf,
    stamper: Stamper,
    notifications: mpsc::Sender<Notification>,
}

impl Service {
    /// Create a service and the receiver its notifications arrive on
    pub fn new(
        browser: Arc<dyn Browser>,
        settings: Settings,
        output_dir: PathBuf,
    ) -> (Self, mpsc::Receiver<Notification>) {
        let (notifications, receiver) = mpsc::channel(16);
        let service = Self {
            browser,
            settings: Arc::new(settings),
            output_dir,
            stamper: Stamper::spawn(),
            notifications,
        };
        (service, receiver)
    }

    /// Handle one control message to completion
    pub async fn handle(&self, request: Request) -> Response {
        match request {
            Request::BatchScreenshot { urls, options } => Response::Results {
                results: self.run(urls, options, CaptureMode::Visible).await,
            },
            Request::BatchFullPageScreenshot { urls, options } => Response::Results {
                results: self.run(urls, options, CaptureMode::FullPage).await,
            },
            Request::ExportXlsx { results } => Response::Completed {
                success: self.export_spreadsheet(&results).await,
            },
        }
    }

    /// Run a batch, then build its report and emit notifications
    async fn run(
        &self,
        urls: Vec<String>,
        options: CaptureOptions,
        mode: CaptureMode,
    ) -> Vec<CaptureResult> {
        let resolved = options.resolve(&self.settings);
        let downloader = Arc::new(Downloader::new(
            self.output_dir.clone(),
            Arc::clone(&self.settings),
            resolved.format,
            resolved.quality,
            self.stamper.clone(),
        ));

        let results = run_batch(
            Arc::clone(&self.browser),
            urls,
            mode,
            resolved.clone(),
            downloader,
        )
        .await;

        let artifacts =
            report::generate(&results, &self.settings, resolved.format, &self.output_dir).await;
        if artifacts.spreadsheet.is_some() {
            self.notify(Notification::XlsxExported).await;
        }
        self.notify(Notification::TaskCompleted).await;

        results
    }

    /// Standalone spreadsheet export for previously produced results
    async fn export_spreadsheet(&self, results: &[CaptureResult]) -> bool {
        let written = report::write_spreadsheet(
            results,
            EXPORTS_FOLDER,
            self.settings.image_format,
            &self.output_dir,
        )
        .await;
        if written.is_some() {
            self.notify(Notification::XlsxExported).await;
            true
        } else {
            false
        }
    }

    async fn notify(&self, notification: Notification) {
        // The listener may be gone; that is not the batch's problem
        if self.notifications.send(notification).await.is_err() {
            ::log::debug!("no listener for {:?}", notification);
        }
    }
}
