use crate::config::{FilenameConvention, ImageFormat, Settings};
use crate::results::CaptureResult;
use regex::Regex;
use std::path::PathBuf;
use std::sync::LazyLock;

/// Longest sanitized name segment we will produce
const MAX_NAME_LEN: usize = 50;

static INVALID_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[/\\?%*:|"<>]"#).expect("valid sanitize pattern"));
static WHITESPACE_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace pattern"));
static URL_SCHEME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^https?://").expect("valid scheme pattern"));

/// Convert a string to a safe filename segment
///
/// Replaces filesystem-hostile characters with underscores, collapses
/// whitespace runs to a single underscore, and truncates to 50 characters.
pub fn sanitize_filename(name: &str) -> String {
    let name = INVALID_CHARS.replace_all(name, "_");
    let name = WHITESPACE_RUNS.replace_all(&name, "_");
    name.chars().take(MAX_NAME_LEN).collect()
}

/// File name (without extension) for a downloaded image, per the configured
/// naming convention
pub fn download_stem(convention: FilenameConvention, result: &CaptureResult) -> String {
    match convention {
        FilenameConvention::Url => sanitize_filename(&URL_SCHEME.replace(&result.url, "")),
        FilenameConvention::Index => format!("img-{}", result.index + 1),
        FilenameConvention::Title => {
            if result.title.is_empty() {
                format!("webshot-img-{}", result.index + 1)
            } else {
                sanitize_filename(&result.title)
            }
        }
    }
}

/// Relative path for a downloaded image, including the optional folder
/// prefix and the format extension
pub fn download_path(settings: &Settings, format: ImageFormat, result: &CaptureResult) -> PathBuf {
    let file = format!(
        "{}.{}",
        download_stem(settings.filename_convention, result),
        format.extension()
    );
    match folder_segment(&settings.folder_name) {
        Some(folder) => PathBuf::from(folder).join(file),
        None => PathBuf::from(file),
    }
}

/// Archive entry name for a result's image, derived from the sanitized
/// title and the 1-based batch position
pub fn archive_image_name(result: &CaptureResult, format: ImageFormat) -> String {
    let title = if result.title.is_empty() {
        "tab"
    } else {
        result.title.as_str()
    };
    format!(
        "{}-{}.{}",
        sanitize_filename(title),
        result.index + 1,
        format.extension()
    )
}

/// Sanitized folder prefix, or None when no folder is configured
pub fn folder_segment(folder_name: &str) -> Option<String> {
    if folder_name.is_empty() {
        None
    } else {
        Some(sanitize_filename(folder_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::CaptureRequest;

    fn result_with(url: &str, index: usize, title: &str) -> CaptureResult {
        let request = CaptureRequest::new(url.to_string(), index);
        CaptureResult::captured(&request, title.to_string(), vec![0])
    }

    #[test]
    fn test_sanitize_replaces_invalid_characters() {
        assert_eq!(sanitize_filename("a/b\\c?d"), "a_b_c_d");
        assert_eq!(sanitize_filename("a%b*c:d|e\"f<g>h"), "a_b_c_d_e_f_g_h");
    }

    #[test]
    fn test_sanitize_collapses_whitespace_runs() {
        assert_eq!(sanitize_filename("Example   Domain\t\npage"), "Example_Domain_page");
    }

    #[test]
    fn test_sanitize_truncates_to_fifty_characters() {
        let long = "x".repeat(200);
        let sanitized = sanitize_filename(&long);
        assert_eq!(sanitized.chars().count(), 50);
    }

    #[test]
    fn test_sanitize_output_never_contains_forbidden_characters() {
        let input = "every/bad\\char?here%now*and:then|plus\"less<more> and space";
        let sanitized = sanitize_filename(input);
        for forbidden in ['/', '\\', '?', '%', '*', ':', '|', '"', '<', '>', ' '] {
            assert!(
                !sanitized.contains(forbidden),
                "found {:?} in {:?}",
                forbidden,
                sanitized
            );
        }
    }

    #[test]
    fn test_download_stem_url_convention_strips_scheme() {
        let result = result_with("https://example.com/page", 0, "Example");
        assert_eq!(
            download_stem(FilenameConvention::Url, &result),
            "example.com_page"
        );
    }

    #[test]
    fn test_download_stem_index_convention() {
        let result = result_with("http://a.test", 2, "A");
        assert_eq!(download_stem(FilenameConvention::Index, &result), "img-3");
    }

    #[test]
    fn test_download_stem_title_convention_with_placeholder() {
        let titled = result_with("http://a.test", 0, "My Page: Home");
        assert_eq!(
            download_stem(FilenameConvention::Title, &titled),
            "My_Page__Home"
        );

        let untitled = result_with("http://a.test", 4, "");
        assert_eq!(
            download_stem(FilenameConvention::Title, &untitled),
            "webshot-img-5"
        );
    }

    #[test]
    fn test_download_path_includes_sanitized_folder() {
        let settings = Settings {
            folder_name: "my scans".to_string(),
            filename_convention: FilenameConvention::Index,
            ..Settings::default()
        };
        let result = result_with("http://a.test", 0, "A");
        assert_eq!(
            download_path(&settings, ImageFormat::Png, &result),
            PathBuf::from("my_scans/img-1.png")
        );
    }

    #[test]
    fn test_archive_image_name_uses_title_and_position() {
        let result = result_with("http://a.test", 1, "Example Domain");
        assert_eq!(
            archive_image_name(&result, ImageFormat::Jpg),
            "Example_Domain-2.jpg"
        );

        let untitled = result_with("http://a.test", 0, "");
        assert_eq!(archive_image_name(&untitled, ImageFormat::Png), "tab-1.png");
    }
}
