use crate::config::{ImageFormat, Settings};
use crate::naming;
use crate::results::CaptureResult;
use crate::stamp::Stamper;
use std::path::PathBuf;
use std::sync::Arc;

/// Writes captured images beneath the output directory, honoring the
/// folder and filename-convention settings
///
/// Each image is opportunistically timestamped before saving; when the
/// stamper cannot process it, the unstamped original is written instead so
/// a stamping failure never costs the capture.
pub struct Downloader {
    root: PathBuf,
    settings: Arc<Settings>,
    format: ImageFormat,
    quality: u8,
    stamper: Stamper,
}

impl Downloader {
    /// Create a downloader rooted at the given output directory
    pub fn new(
        root: PathBuf,
        settings: Arc<Settings>,
        format: ImageFormat,
        quality: u8,
        stamper: Stamper,
    ) -> Self {
        Self {
            root,
            settings,
            format,
            quality,
            stamper,
        }
    }

    /// Save a successful capture to disk; returns the written path
    ///
    /// Results without an image are skipped.
    pub async fn save(&self, result: &CaptureResult) -> std::io::Result<Option<PathBuf>> {
        let Some(image) = &result.image else {
            return Ok(None);
        };

        let path = self
            .root
            .join(naming::download_path(&self.settings, self.format, result));

        let bytes = match self
            .stamper
            .stamp(image.clone(), self.format, self.quality)
            .await
        {
            Ok(stamped) => stamped,
            Err(e) => {
                ::log::warn!(
                    "timestamp overlay failed for {}, saving unstamped image: {}",
                    result.url,
                    e
                );
                image.clone()
            }
        };

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, &bytes).await?;
        ::log::info!("saved {}", path.display());
        Ok(Some(path))
    }
}
