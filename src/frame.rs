//! Frame capture and encoding
//!
//! The frame producer ships a small fixed-size preview of the current video
//! frame to the external facial-expression classifier. Whatever the source
//! resolution, every sample is resampled to 320×240 and JPEG-encoded at
//! quality 50 before being wrapped in a base64 data URI.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{ImageBuffer, Rgb, RgbImage};

use crate::error::RelayError;

/// Output width of every frame sample
pub const FRAME_WIDTH: u32 = 320;
/// Output height of every frame sample
pub const FRAME_HEIGHT: u32 = 240;
/// JPEG quality factor (0.5 on the canvas scale)
pub const JPEG_QUALITY: u8 = 50;

/// One raw video frame, tightly packed RGB8
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl RawFrame {
    /// Construct a frame, validating the pixel buffer length
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, RelayError> {
        let expected = (width as usize) * (height as usize) * 3;
        if pixels.len() != expected {
            return Err(RelayError::FrameEncoding(format!(
                "pixel buffer has {} bytes, expected {}",
                pixels.len(),
                expected
            )));
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// A uniformly colored frame, useful for simulated sources
    pub fn solid(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let pixels = rgb
            .iter()
            .copied()
            .cycle()
            .take((width as usize) * (height as usize) * 3)
            .collect();
        Self {
            width,
            height,
            pixels,
        }
    }
}

/// Encoder from raw frames to the wire image payload
pub struct FrameEncoder;

impl FrameEncoder {
    /// Resample to 320×240, JPEG-encode at quality 50, and wrap the result
    /// in a `data:image/jpeg;base64,` URI.
    pub fn encode_data_uri(frame: &RawFrame) -> Result<String, RelayError> {
        let source: RgbImage =
            ImageBuffer::<Rgb<u8>, Vec<u8>>::from_raw(frame.width, frame.height, frame.pixels.clone())
                .ok_or_else(|| {
                    RelayError::FrameEncoding("pixel buffer does not match dimensions".to_string())
                })?;

        let resampled = if frame.width == FRAME_WIDTH && frame.height == FRAME_HEIGHT {
            source
        } else {
            image::imageops::resize(&source, FRAME_WIDTH, FRAME_HEIGHT, FilterType::Triangle)
        };

        let mut jpeg = Vec::new();
        let mut encoder = JpegEncoder::new_with_quality(&mut jpeg, JPEG_QUALITY);
        encoder
            .encode(
                resampled.as_raw(),
                FRAME_WIDTH,
                FRAME_HEIGHT,
                image::ColorType::Rgb8,
            )
            .map_err(|e| RelayError::FrameEncoding(e.to_string()))?;

        Ok(format!("data:image/jpeg;base64,{}", BASE64.encode(&jpeg)))
    }
}
