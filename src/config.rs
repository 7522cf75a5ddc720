use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Duration;

/// Image encodings supported by the capture pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Png,
    Jpg,
}

impl ImageFormat {
    /// File extension used for downloads and archive entries
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpg => "jpg",
        }
    }
}

/// How downloaded image files are named
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilenameConvention {
    /// Sanitized page title (placeholder when the title is empty)
    Title,
    /// Sanitized URL with the scheme stripped
    Url,
    /// 1-based position in the batch
    Index,
}

/// Persisted settings for the capture pipeline
///
/// Key names match the settings file on disk; every field has a default so
/// a partial (or absent) file still yields a usable configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Subfolder (beneath the output directory) that downloads go into
    #[serde(default)]
    pub folder_name: String,

    /// Naming scheme for downloaded images
    #[serde(default = "default_filename_convention")]
    pub filename_convention: FilenameConvention,

    /// Encoding for captured images
    #[serde(default = "default_image_format")]
    pub image_format: ImageFormat,

    /// Encoder quality (0-100, meaningful for jpg)
    #[serde(default = "default_image_quality")]
    pub image_quality: u8,

    /// Maximum number of tabs open at once
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Whether to export a spreadsheet alongside the archive
    #[serde(default = "default_include_csv", rename = "includeCSV")]
    pub include_csv: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            folder_name: String::new(),
            filename_convention: default_filename_convention(),
            image_format: default_image_format(),
            image_quality: default_image_quality(),
            max_concurrency: default_max_concurrency(),
            include_csv: default_include_csv(),
        }
    }
}

impl Settings {
    /// Load settings from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn Error>> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        let settings: Self = serde_json::from_str(&contents)?;
        Ok(settings)
    }
}

/// Default value for filename_convention
fn default_filename_convention() -> FilenameConvention {
    FilenameConvention::Title
}

/// Default value for image_format
fn default_image_format() -> ImageFormat {
    ImageFormat::Png
}

/// Default value for image_quality
fn default_image_quality() -> u8 {
    92
}

/// Default value for max_concurrency
fn default_max_concurrency() -> usize {
    2
}

/// Default value for include_csv
fn default_include_csv() -> bool {
    true
}

/// Per-batch capture options as supplied by the caller
///
/// Absent fields are filled from [`Settings`] when the batch starts; see
/// [`CaptureOptions::resolve`]. Durations are carried in milliseconds to
/// match the wire format.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureOptions {
    /// Extra wait after a tab finishes loading, in milliseconds
    #[serde(rename = "delay")]
    pub delay_ms: u64,

    /// Image encoding override
    pub format: Option<ImageFormat>,

    /// Encoder quality override (0-100)
    pub quality: Option<u8>,

    /// Concurrency override
    #[serde(rename = "maxConcurrency")]
    pub max_concurrency: Option<usize>,

    /// Deadline for a single tab's pipeline, in milliseconds
    #[serde(rename = "timeout")]
    pub timeout_ms: Option<u64>,
}

/// Deadline applied to a tab pipeline when the caller does not set one
const DEFAULT_TAB_TIMEOUT_MS: u64 = 30_000;

impl CaptureOptions {
    /// Fill absent fields from the persisted settings, producing the
    /// immutable per-batch configuration the orchestrator runs with
    pub fn resolve(&self, settings: &Settings) -> ResolvedOptions {
        ResolvedOptions {
            delay: Duration::from_millis(self.delay_ms),
            format: self.format.unwrap_or(settings.image_format),
            quality: self.quality.unwrap_or(settings.image_quality).min(100),
            max_concurrency: self
                .max_concurrency
                .unwrap_or(settings.max_concurrency)
                .max(1),
            deadline: Duration::from_millis(self.timeout_ms.unwrap_or(DEFAULT_TAB_TIMEOUT_MS)),
        }
    }
}

/// Fully-resolved options for one batch; immutable once the batch starts
#[derive(Debug, Clone)]
pub struct ResolvedOptions {
    pub delay: Duration,
    pub format: ImageFormat,
    pub quality: u8,
    pub max_concurrency: usize,
    pub deadline: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_from_settings() {
        let settings = Settings {
            image_format: ImageFormat::Jpg,
            image_quality: 70,
            max_concurrency: 4,
            ..Settings::default()
        };

        let resolved = CaptureOptions::default().resolve(&settings);
        assert_eq!(resolved.format, ImageFormat::Jpg);
        assert_eq!(resolved.quality, 70);
        assert_eq!(resolved.max_concurrency, 4);
        assert_eq!(resolved.delay, Duration::ZERO);
        assert_eq!(resolved.deadline, Duration::from_millis(30_000));
    }

    #[test]
    fn test_explicit_options_win() {
        let settings = Settings::default();
        let options = CaptureOptions {
            delay_ms: 2_000,
            format: Some(ImageFormat::Jpg),
            quality: Some(55),
            max_concurrency: Some(8),
            timeout_ms: Some(5_000),
        };

        let resolved = options.resolve(&settings);
        assert_eq!(resolved.delay, Duration::from_millis(2_000));
        assert_eq!(resolved.format, ImageFormat::Jpg);
        assert_eq!(resolved.quality, 55);
        assert_eq!(resolved.max_concurrency, 8);
        assert_eq!(resolved.deadline, Duration::from_millis(5_000));
    }

    #[test]
    fn test_concurrency_clamped_to_at_least_one() {
        let settings = Settings::default();
        let options = CaptureOptions {
            max_concurrency: Some(0),
            ..CaptureOptions::default()
        };
        assert_eq!(options.resolve(&settings).max_concurrency, 1);
    }

    #[test]
    fn test_settings_parse_with_partial_file() {
        let settings: Settings =
            serde_json::from_str(r#"{"folderName": "scans", "imageFormat": "jpg"}"#).unwrap();
        assert_eq!(settings.folder_name, "scans");
        assert_eq!(settings.image_format, ImageFormat::Jpg);
        assert_eq!(settings.image_quality, 92);
        assert_eq!(settings.max_concurrency, 2);
        assert!(settings.include_csv);
    }

    #[test]
    fn test_options_wire_names() {
        let options: CaptureOptions = serde_json::from_str(
            r#"{"delay": 5000, "format": "png", "maxConcurrency": 3, "timeout": 10000}"#,
        )
        .unwrap();
        assert_eq!(options.delay_ms, 5_000);
        assert_eq!(options.format, Some(ImageFormat::Png));
        assert_eq!(options.max_concurrency, Some(3));
        assert_eq!(options.timeout_ms, Some(10_000));
    }
}
