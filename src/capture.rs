use failure::Error;
use image::imageops::FilterType;
use image::io::Reader as ImageReader;
use image::{GenericImageView, ImageFormat, ImageOutputFormat};
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use std::io::Cursor;

/// Largest frame side we forward to the vision model. Phone cameras capture
/// at 1920x1080; the plate survives a downscale and the upload gets cheaper.
const MAX_DIMENSION: u32 = 1280;
const JPEG_QUALITY: u8 = 85;

static DATA_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new("^data:([a-zA-Z0-9.+/-]+);base64,(.+)$").unwrap());

/// A camera frame decoded from a data URL and re-encoded for upload.
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedImage {
    mime_type: String,
    base64_data: String,
}

impl CapturedImage {
    /// Parses a `data:image/jpeg;base64,...` URL. The payload must decode as
    /// a JPEG; oversized frames are downscaled before re-encoding.
    pub fn from_data_url(data_url: &str) -> Result<CapturedImage, Error> {
        let caps = DATA_URL
            .captures(data_url)
            .ok_or_else(|| format_err!("not a base64 image data URL"))?;
        let mime_type = &caps[1];
        if mime_type != "image/jpeg" {
            return Err(format_err!("unsupported image type '{}'", mime_type));
        }

        let raw = base64::decode(&caps[2])?;
        let decoded = ImageReader::with_format(Cursor::new(raw), ImageFormat::Jpeg).decode()?;

        let frame = if decoded.width() > MAX_DIMENSION || decoded.height() > MAX_DIMENSION {
            debug!(
                "Downscaling {}x{} frame before upload",
                decoded.width(),
                decoded.height()
            );
            decoded.resize(MAX_DIMENSION, MAX_DIMENSION, FilterType::Triangle)
        } else {
            decoded
        };

        let mut jpeg = Vec::new();
        frame.write_to(&mut jpeg, ImageOutputFormat::Jpeg(JPEG_QUALITY))?;
        Ok(CapturedImage {
            mime_type: "image/jpeg".to_string(),
            base64_data: base64::encode(&jpeg),
        })
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Base64 JPEG payload, ready for the model's inline-data part.
    pub fn base64_data(&self) -> &str {
        &self.base64_data
    }
}

/// Encodes a solid-color frame as a JPEG data URL.
#[cfg(test)]
pub fn test_data_url(width: u32, height: u32) -> String {
    let frame = image::DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
        width,
        height,
        image::Rgb([120, 130, 140]),
    ));
    let mut jpeg = Vec::new();
    frame
        .write_to(&mut jpeg, ImageOutputFormat::Jpeg(90))
        .unwrap();
    format!("data:image/jpeg;base64,{}", base64::encode(&jpeg))
}
