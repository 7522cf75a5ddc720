use crate::config::ImageFormat;
use crate::naming;
use crate::results::CaptureResult;
use chrono::SecondsFormat;
use rust_xlsxwriter::{Workbook, XlsxError};

const HEADERS: [&str; 5] = ["url", "title", "imageName", "timestamp", "error"];

/// Build the spreadsheet summary: a header row plus one row per result
pub fn build(results: &[CaptureResult], format: ImageFormat) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name("Report")?;

    for (col, header) in HEADERS.iter().enumerate() {
        worksheet.write_string(0, col as u16, *header)?;
    }

    for (index, result) in results.iter().enumerate() {
        let row = index as u32 + 1;
        let image_name = if result.image.is_some() {
            naming::archive_image_name(result, format)
        } else {
            String::new()
        };

        worksheet.write_string(row, 0, &result.url)?;
        worksheet.write_string(row, 1, &result.title)?;
        worksheet.write_string(row, 2, image_name)?;
        worksheet.write_string(
            row,
            3,
            result.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
        )?;
        worksheet.write_string(row, 4, result.error.as_deref().unwrap_or(""))?;
    }

    workbook.save_to_buffer()
}
