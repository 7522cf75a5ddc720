//! Report assembly: a downloadable archive plus an optional spreadsheet.
//!
//! Nothing here is allowed to fail the batch: every error is logged and the
//! affected artifact is simply not produced.

pub mod archive;
pub mod spreadsheet;

use crate::config::{ImageFormat, Settings};
use crate::naming;
use crate::results::CaptureResult;
use std::path::{Path, PathBuf};

/// Name of the archive file
const ARCHIVE_FILE: &str = "webshot-report.zip";

/// Name of the spreadsheet file
const SPREADSHEET_FILE: &str = "report.xlsx";

/// Paths of the artifacts a report run managed to produce
#[derive(Debug, Default)]
pub struct ReportArtifacts {
    pub archive: Option<PathBuf>,
    pub spreadsheet: Option<PathBuf>,
}

/// Build and write the batch report
///
/// The spreadsheet (when enabled) is written before the archive, matching
/// the order artifacts become visible to the user.
pub async fn generate(
    results: &[CaptureResult],
    settings: &Settings,
    format: ImageFormat,
    out_root: &Path,
) -> ReportArtifacts {
    let mut artifacts = ReportArtifacts::default();

    if settings.include_csv {
        artifacts.spreadsheet =
            write_spreadsheet(results, &settings.folder_name, format, out_root).await;
    }

    match archive::build(results, format) {
        Ok(bytes) => {
            let path = artifact_path(out_root, &settings.folder_name, ARCHIVE_FILE);
            artifacts.archive = write_artifact(&path, &bytes).await;
        }
        Err(e) => {
            ::log::error!("failed to build report archive: {}", e);
        }
    }

    artifacts
}

/// Build and write the spreadsheet summary; returns the written path
///
/// Also used directly by the standalone export action.
pub async fn write_spreadsheet(
    results: &[CaptureResult],
    folder_name: &str,
    format: ImageFormat,
    out_root: &Path,
) -> Option<PathBuf> {
    match spreadsheet::build(results, format) {
        Ok(bytes) => {
            let path = artifact_path(out_root, folder_name, SPREADSHEET_FILE);
            write_artifact(&path, &bytes).await
        }
        Err(e) => {
            ::log::error!("failed to build spreadsheet: {}", e);
            None
        }
    }
}

/// Resolve an artifact path beneath the optional folder segment
fn artifact_path(out_root: &Path, folder_name: &str, file: &str) -> PathBuf {
    match naming::folder_segment(folder_name) {
        Some(folder) => out_root.join(folder).join(file),
        None => out_root.join(file),
    }
}

/// Write artifact bytes, logging instead of propagating failures
async fn write_artifact(path: &Path, bytes: &[u8]) -> Option<PathBuf> {
    if let Some(parent) = path.parent() {
        if let Err(e) = tokio::fs::create_dir_all(parent).await {
            ::log::error!("failed to create {}: {}", parent.display(), e);
            return None;
        }
    }
    match tokio::fs::write(path, bytes).await {
        Ok(()) => {
            ::log::info!("wrote {}", path.display());
            Some(path.to_path_buf())
        }
        Err(e) => {
            ::log::error!("failed to write {}: {}", path.display(), e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::CaptureRequest;

    fn results() -> Vec<CaptureResult> {
        vec![CaptureResult::captured(
            &CaptureRequest::new("http://a.test".to_string(), 0),
            "A".to_string(),
            vec![1, 2, 3],
        )]
    }

    #[tokio::test]
    async fn test_generate_writes_archive_and_spreadsheet() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::default();

        let artifacts = generate(&results(), &settings, ImageFormat::Png, dir.path()).await;
        let archive = artifacts.archive.unwrap();
        let spreadsheet = artifacts.spreadsheet.unwrap();
        assert_eq!(archive, dir.path().join("webshot-report.zip"));
        assert_eq!(spreadsheet, dir.path().join("report.xlsx"));
        assert!(archive.exists());
        assert!(spreadsheet.exists());
    }

    #[tokio::test]
    async fn test_generate_honors_include_csv_flag() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings {
            include_csv: false,
            ..Settings::default()
        };

        let artifacts = generate(&results(), &settings, ImageFormat::Png, dir.path()).await;
        assert!(artifacts.archive.is_some());
        assert!(artifacts.spreadsheet.is_none());
        assert!(!dir.path().join("report.xlsx").exists());
    }

    #[tokio::test]
    async fn test_artifacts_land_under_the_configured_folder() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings {
            folder_name: "run one".to_string(),
            ..Settings::default()
        };

        let artifacts = generate(&results(), &settings, ImageFormat::Png, dir.path()).await;
        assert_eq!(
            artifacts.archive.unwrap(),
            dir.path().join("run_one").join("webshot-report.zip")
        );
    }
}
