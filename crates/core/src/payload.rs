//! Conversion between raw clipboard image bytes and the self-describing
//! string stored in history entries.
//!
//! Stored images are always PNG, wrapped as `data:image/png;base64,<data>`.
//! Incoming bytes are decoded and re-encoded so that the same picture
//! copied from two applications yields the same stored string.

use anyhow::{anyhow, Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::ImageOutputFormat;
use std::io::Cursor;

pub const PNG_DATA_URL_PREFIX: &str = "data:image/png;base64,";

/// Decode any image format the `image` crate understands and re-encode it as PNG.
pub fn normalize_png(raw: &[u8]) -> Result<Vec<u8>> {
    if raw.is_empty() {
        return Err(anyhow!("Empty image payload"));
    }
    let img = image::load_from_memory(raw).context("Failed to decode image payload")?;
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageOutputFormat::Png)
        .context("Failed to encode PNG")?;
    Ok(buf)
}

pub fn encode_png_data_url(raw: &[u8]) -> Result<String> {
    let png = normalize_png(raw)?;
    Ok(format!("{}{}", PNG_DATA_URL_PREFIX, STANDARD.encode(png)))
}

/// Inverse of [`encode_png_data_url`]. The result is re-encoded PNG, ready for
/// the host clipboard.
pub fn decode_png_data_url(content: &str) -> Result<Vec<u8>> {
    let data = content
        .strip_prefix(PNG_DATA_URL_PREFIX)
        .ok_or_else(|| anyhow!("Stored image is not a PNG data URL"))?;
    let bytes = STANDARD
        .decode(data.trim())
        .context("Invalid base64 in stored image")?;
    normalize_png(&bytes)
}

pub fn image_dimensions(content: &str) -> Option<(u32, u32)> {
    let data = content.strip_prefix(PNG_DATA_URL_PREFIX)?;
    let bytes = STANDARD.decode(data.trim()).ok()?;
    image::io::Reader::new(Cursor::new(bytes))
        .with_guessed_format()
        .ok()?
        .into_dimensions()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageOutputFormat, Rgba, RgbaImage};

    fn sample(format: ImageOutputFormat) -> Vec<u8> {
        let img = RgbaImage::from_pixel(3, 2, Rgba([200, 10, 10, 255]));
        let mut buf = Vec::new();
        DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut buf), format)
            .unwrap();
        buf
    }

    #[test]
    fn data_url_carries_png_tag() {
        let url = encode_png_data_url(&sample(ImageOutputFormat::Png)).unwrap();
        assert!(url.starts_with(PNG_DATA_URL_PREFIX));
        assert_eq!(image_dimensions(&url), Some((3, 2)));
    }

    #[test]
    fn decoded_payload_is_loadable_png() {
        let url = encode_png_data_url(&sample(ImageOutputFormat::Png)).unwrap();
        let png = decode_png_data_url(&url).unwrap();
        let img = image::load_from_memory(&png).unwrap();
        assert_eq!((img.width(), img.height()), (3, 2));
    }

    #[test]
    fn other_formats_are_normalized_to_png() {
        let png = normalize_png(&sample(ImageOutputFormat::Bmp)).unwrap();
        assert_eq!(image::guess_format(&png).unwrap(), image::ImageFormat::Png);
    }

    #[test]
    fn normalizing_is_stable() {
        let once = encode_png_data_url(&sample(ImageOutputFormat::Png)).unwrap();
        let twice = encode_png_data_url(&decode_png_data_url(&once).unwrap()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn garbage_bytes_are_rejected() {
        assert!(encode_png_data_url(b"definitely not an image").is_err());
        assert!(encode_png_data_url(&[]).is_err());
    }

    #[test]
    fn foreign_content_is_rejected() {
        assert!(decode_png_data_url("hello").is_err());
        assert!(decode_png_data_url("data:image/png;base64,!!!").is_err());
    }
}
