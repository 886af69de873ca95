use base64::{Engine as _, engine::general_purpose::STANDARD};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{ExtendedColorType, GenericImageView, ImageReader};
use sha2::{Digest, Sha256};
use std::io::Cursor;

use crate::config::ImageLimits;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum PreprocessError {
    #[error("Image is {size} bytes, limit is {limit} bytes")]
    PayloadTooLarge { size: usize, limit: usize },
    #[error("Unsupported image: {0}")]
    UnsupportedFormat(String),
    #[error("Failed to encode image: {0}")]
    Encoding(String),
}

/// One upload as received from the client.
#[derive(Debug, Clone)]
pub struct ClassificationRequest {
    pub bytes: Vec<u8>,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
}

impl ClassificationRequest {
    /// Short hash for log lines, so the image itself never needs to be logged.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(&self.bytes);
        hex::encode(hasher.finalize())[..12].to_string()
    }
}

#[derive(Debug, Clone)]
pub struct NormalizedImage {
    pub original_width: u32,
    pub original_height: u32,
    pub width: u32,
    pub height: u32,
    pub jpeg: Vec<u8>,
    pub base64: String,
}

impl NormalizedImage {
    pub fn data_url(&self) -> String {
        format!("data:image/jpeg;base64,{}", self.base64)
    }

    pub fn was_resized(&self) -> bool {
        (self.width, self.height) != (self.original_width, self.original_height)
    }
}

/// Decode, bound and re-encode an upload for transport to the vision model.
///
/// The size check happens before decoding. The declared content type is only
/// advisory; decodability decides.
pub fn preprocess(
    bytes: &[u8],
    declared_content_type: Option<&str>,
    limits: &ImageLimits,
) -> Result<NormalizedImage, PreprocessError> {
    if bytes.len() > limits.max_upload_bytes {
        return Err(PreprocessError::PayloadTooLarge {
            size: bytes.len(),
            limit: limits.max_upload_bytes,
        });
    }
    if bytes.is_empty() {
        return Err(PreprocessError::UnsupportedFormat("empty upload".into()));
    }

    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| PreprocessError::UnsupportedFormat(e.to_string()))?;
    let format = reader.format().ok_or_else(|| {
        PreprocessError::UnsupportedFormat(format!(
            "unrecognised image data (declared {})",
            declared_content_type.unwrap_or("nothing")
        ))
    })?;
    let decoded = reader
        .decode()
        .map_err(|e| PreprocessError::UnsupportedFormat(e.to_string()))?;

    let (original_width, original_height) = decoded.dimensions();
    log::info!(
        "Decoded {:?} image {}x{} ({} bytes)",
        format,
        original_width,
        original_height,
        bytes.len()
    );

    let bound = limits.max_dimension;
    let resized = if original_width.max(original_height) > bound {
        decoded.resize(bound, bound, FilterType::Lanczos3)
    } else {
        decoded
    };
    let (width, height) = resized.dimensions();

    let rgb = resized.to_rgb8();
    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg, limits.jpeg_quality)
        .encode(rgb.as_raw(), width, height, ExtendedColorType::Rgb8)
        .map_err(|e| PreprocessError::Encoding(e.to_string()))?;

    let base64 = STANDARD.encode(&jpeg);

    Ok(NormalizedImage {
        original_width,
        original_height,
        width,
        height,
        jpeg,
        base64,
    })
}
