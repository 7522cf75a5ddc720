//! Timestamp overlay worker.
//!
//! All pixel work lives in a dedicated task; the orchestrator side only
//! holds a [`Stamper`] handle and exchanges one request for one response.
//! A stamping failure is reported to the caller, who is expected to fall
//! back to the unstamped image.

use crate::config::ImageFormat;
use crate::imaging;
use chrono::Local;
use font8x8::{BASIC_FONTS, UnicodeFonts};
use image::{Rgba, RgbaImage};
use tokio::sync::{mpsc, oneshot};

/// Glyph scale factor; the 8x8 base font becomes 16 px tall
const GLYPH_SCALE: u32 = 2;
/// Label box left edge
const BOX_X: u32 = 10;
/// Label box height
const BOX_HEIGHT: u32 = 30;
/// Distance from the image bottom to the label box top
const BOX_BOTTOM_OFFSET: u32 = 40;
/// Horizontal padding between box edge and text
const TEXT_PAD: u32 = 5;

struct StampRequest {
    image: Vec<u8>,
    format: ImageFormat,
    quality: u8,
    reply: oneshot::Sender<Result<Vec<u8>, String>>,
}

/// Handle to the stamping worker
#[derive(Clone)]
pub struct Stamper {
    tx: mpsc::Sender<StampRequest>,
}

impl Stamper {
    /// Spawn the worker task and return a handle to it
    pub fn spawn() -> Self {
        let (tx, mut rx) = mpsc::channel::<StampRequest>(32);

        tokio::spawn(async move {
            while let Some(request) = rx.recv().await {
                let outcome = apply_timestamp(&request.image, request.format, request.quality);
                // The requester may have given up; nothing to do then
                let _ = request.reply.send(outcome);
            }
            ::log::debug!("stamp worker shutting down, all handles dropped");
        });

        Self { tx }
    }

    /// Overlay the current wall-clock time onto an image
    ///
    /// Returns the re-encoded image, or an error message when the image
    /// could not be decoded or re-encoded.
    pub async fn stamp(
        &self,
        image: Vec<u8>,
        format: ImageFormat,
        quality: u8,
    ) -> Result<Vec<u8>, String> {
        let (reply, response) = oneshot::channel();
        self.tx
            .send(StampRequest {
                image,
                format,
                quality,
                reply,
            })
            .await
            .map_err(|_| "stamp worker is gone".to_string())?;
        response
            .await
            .map_err(|_| "stamp worker dropped the request".to_string())?
    }
}

/// Decode, overlay the current local time bottom-left, re-encode
fn apply_timestamp(bytes: &[u8], format: ImageFormat, quality: u8) -> Result<Vec<u8>, String> {
    let decoded = imaging::decode(bytes).map_err(|e| format!("decode failed: {}", e))?;
    let mut canvas = decoded.to_rgba8();

    let label = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    draw_label(&mut canvas, &label);

    imaging::encode(&image::DynamicImage::ImageRgba8(canvas), format, quality)
        .map_err(|e| format!("encode failed: {}", e))
}

/// Draw the semi-transparent label box and its text at the fixed
/// bottom-left position
fn draw_label(canvas: &mut RgbaImage, label: &str) {
    let height = canvas.height();
    let text_width = label.chars().count() as u32 * 8 * GLYPH_SCALE;

    let box_y = height.saturating_sub(BOX_BOTTOM_OFFSET);
    fill_rect(
        canvas,
        BOX_X,
        box_y,
        text_width + 2 * TEXT_PAD,
        BOX_HEIGHT,
        Rgba([0, 0, 0, 153]),
    );

    let text_y = box_y.saturating_add(4) as i64;
    draw_text(
        canvas,
        (BOX_X + TEXT_PAD) as i64,
        text_y,
        label,
        Rgba([255, 255, 255, 255]),
    );
}

/// Alpha-blend a source pixel over a destination pixel
fn blend_pixel(dst: Rgba<u8>, src: Rgba<u8>) -> Rgba<u8> {
    let alpha = f64::from(src[3]) / 255.0;
    if alpha <= 0.0 {
        return dst;
    }
    let inverse = 1.0 - alpha;
    let channel = |d: u8, s: u8| -> u8 {
        (f64::from(d) * inverse + f64::from(s) * alpha)
            .round()
            .clamp(0.0, 255.0) as u8
    };
    Rgba([
        channel(dst[0], src[0]),
        channel(dst[1], src[1]),
        channel(dst[2], src[2]),
        (f64::from(dst[3]) + f64::from(src[3]) * inverse)
            .round()
            .clamp(0.0, 255.0) as u8,
    ])
}

/// Blend a filled rectangle onto the canvas, clipped to its bounds
fn fill_rect(canvas: &mut RgbaImage, x: u32, y: u32, width: u32, height: u32, color: Rgba<u8>) {
    let x_end = (x + width).min(canvas.width());
    let y_end = (y + height).min(canvas.height());
    for py in y.min(canvas.height())..y_end {
        for px in x.min(canvas.width())..x_end {
            let dst = *canvas.get_pixel(px, py);
            canvas.put_pixel(px, py, blend_pixel(dst, color));
        }
    }
}

/// Render text with the 8x8 bitmap font, scaled and clipped to the canvas
fn draw_text(canvas: &mut RgbaImage, x: i64, y: i64, text: &str, color: Rgba<u8>) {
    let scale = GLYPH_SCALE as i64;
    let mut cursor_x = x;
    for ch in text.chars() {
        let Some(glyph) = BASIC_FONTS.get(ch).or_else(|| BASIC_FONTS.get('?')) else {
            cursor_x += 8 * scale;
            continue;
        };
        for (row_index, row) in glyph.iter().enumerate() {
            for col_index in 0..8i64 {
                if (*row >> col_index) & 1 == 0 {
                    continue;
                }
                for sy in 0..scale {
                    for sx in 0..scale {
                        let px = cursor_x + col_index * scale + sx;
                        let py = y + row_index as i64 * scale + sy;
                        if px >= 0
                            && py >= 0
                            && (px as u32) < canvas.width()
                            && (py as u32) < canvas.height()
                        {
                            let dst = *canvas.get_pixel(px as u32, py as u32);
                            canvas.put_pixel(px as u32, py as u32, blend_pixel(dst, color));
                        }
                    }
                }
            }
        }
        cursor_x += 8 * scale;
    }
}
