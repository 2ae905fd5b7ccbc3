use anyhow::{Context, Result};
use chrono::Local;
use image::codecs::jpeg::JpegEncoder;
use serde::Serialize;

use crate::event::Severity;
use crate::frame::Frame;

const JPEG_QUALITY: u8 = 80;

/// Wire form of one accident alert.
///
/// Serialized as flat JSON. `location_text` and `image` are omitted
/// entirely when absent rather than sent as null.
#[derive(Clone, Debug, Serialize)]
pub struct AlertPayload {
    pub lat: f64,
    pub lng: f64,
    pub severity: Severity,
    /// Local wall-clock time of the triggering frame, `HH:MM:SS`.
    pub time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_text: Option<String>,
    /// Hex-encoded JPEG of the triggering frame.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl AlertPayload {
    /// Stamp a new payload with the current local time.
    pub fn new(lat: f64, lng: f64, severity: Severity) -> Self {
        Self {
            lat,
            lng,
            severity,
            time: Local::now().format("%H:%M:%S").to_string(),
            location_text: None,
            image: None,
        }
    }

    /// Encode the frame as JPEG and attach it hex-encoded.
    pub fn attach_frame_image(&mut self, frame: &Frame) -> Result<()> {
        self.image = Some(encode_frame_jpeg(frame)?);
        Ok(())
    }
}

fn encode_frame_jpeg(frame: &Frame) -> Result<String> {
    let image = frame.to_rgb_image()?;
    let mut jpeg = Vec::new();
    image
        .write_with_encoder(JpegEncoder::new_with_quality(&mut jpeg, JPEG_QUALITY))
        .context("encode alert frame as jpeg")?;
    Ok(hex::encode(jpeg))
}
