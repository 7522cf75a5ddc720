use crate::config::ImageFormat;
use image::DynamicImage;
use image::codecs::jpeg::JpegEncoder;
use std::io::Cursor;

/// Decode encoded image bytes, guessing the format from the content
pub fn decode(bytes: &[u8]) -> Result<DynamicImage, image::ImageError> {
    image::load_from_memory(bytes)
}

/// Encode an image at the requested format and quality
///
/// Quality only affects jpg; png is lossless. JPEG has no alpha channel, so
/// the image is flattened to RGB first.
pub fn encode(
    image: &DynamicImage,
    format: ImageFormat,
    quality: u8,
) -> Result<Vec<u8>, image::ImageError> {
    let mut buffer = Vec::new();
    match format {
        ImageFormat::Png => {
            image.write_to(&mut Cursor::new(&mut buffer), image::ImageFormat::Png)?;
        }
        ImageFormat::Jpg => {
            let encoder =
                JpegEncoder::new_with_quality(Cursor::new(&mut buffer), quality.clamp(1, 100));
            DynamicImage::ImageRgb8(image.to_rgb8()).write_with_encoder(encoder)?;
        }
    }
    Ok(buffer)
}

/// Re-encode capture output (always PNG off the wire) into the requested
/// format; a PNG request passes the original bytes through untouched
pub fn transcode(
    png_bytes: Vec<u8>,
    format: ImageFormat,
    quality: u8,
) -> Result<Vec<u8>, image::ImageError> {
    match format {
        ImageFormat::Png => Ok(png_bytes),
        ImageFormat::Jpg => encode(&decode(&png_bytes)?, ImageFormat::Jpg, quality),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;

    fn sample_png() -> Vec<u8> {
        let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            8,
            8,
            image::Rgba([10, 20, 30, 255]),
        ));
        encode(&image, ImageFormat::Png, 92).unwrap()
    }

    #[test]
    fn test_png_transcode_is_identity() {
        let png = sample_png();
        let out = transcode(png.clone(), ImageFormat::Png, 92).unwrap();
        assert_eq!(out, png);
    }

    #[test]
    fn test_jpg_transcode_produces_decodable_jpeg() {
        let out = transcode(sample_png(), ImageFormat::Jpg, 80).unwrap();
        // JPEG SOI marker
        assert_eq!(&out[..2], &[0xFF, 0xD8]);
        let decoded = decode(&out).unwrap();
        assert_eq!(decoded.width(), 8);
        assert_eq!(decoded.height(), 8);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode(b"definitely not an image").is_err());
    }
}
