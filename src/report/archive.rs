use crate::config::ImageFormat;
use crate::naming;
use crate::results::CaptureResult;
use std::error::Error;
use std::io::{Cursor, Write};
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

/// Build the report archive: one image per successful capture under
/// `images/`, plus an HTML index at the root
pub fn build(results: &[CaptureResult], format: ImageFormat) -> Result<Vec<u8>, Box<dyn Error>> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();

    for result in results {
        if let Some(image) = &result.image {
            writer.start_file(
                format!("images/{}", naming::archive_image_name(result, format)),
                options,
            )?;
            writer.write_all(image)?;
        }
    }

    writer.start_file("report.html", options)?;
    writer.write_all(render_html(results, format).as_bytes())?;

    Ok(writer.finish()?.into_inner())
}

/// Render the HTML index: one table row per result
pub fn render_html(results: &[CaptureResult], format: ImageFormat) -> String {
    let mut html = String::from(
        "<html><head><title>Report</title></head><body><h1>WebShot Report</h1>\
         <table border=\"1\"><tr><th>URL</th><th>Title</th><th>Screenshot</th><th>Error</th></tr>",
    );
    for result in results {
        let thumbnail = if result.image.is_some() {
            format!(
                "<img src=\"images/{}\" width=\"200\">",
                naming::archive_image_name(result, format)
            )
        } else {
            "-".to_string()
        };
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            escape(&result.url),
            escape(&result.title),
            thumbnail,
            escape(result.error.as_deref().unwrap_or("None")),
        ));
    }
    html.push_str("</table></body></html>");
    html
}

/// Minimal HTML escaping for text cells
fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
