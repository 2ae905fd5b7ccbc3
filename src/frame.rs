//! Decoded video frames.
//!
//! A `Frame` is one RGB24 image plus a monotonically increasing index
//! assigned by the source. Frames are treated as immutable for the
//! duration of one loop iteration: the detector, the tracker, the caption
//! extractor, and the alert encoder all read the same buffer.

use anyhow::{anyhow, Result};
use image::RgbImage;

/// One decoded RGB24 frame.
pub struct Frame {
    /// Interleaved RGB bytes, row-major, no padding.
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// 1-based position in the stream.
    pub index: u64,
}

impl Frame {
    pub fn new(pixels: Vec<u8>, width: u32, height: u32, index: u64) -> Result<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(3))
            .ok_or_else(|| anyhow!("frame dimensions overflow"))?;
        if pixels.len() != expected {
            return Err(anyhow!(
                "expected {} RGB bytes for {}x{}, received {}",
                expected,
                width,
                height,
                pixels.len()
            ));
        }
        Ok(Self {
            pixels,
            width,
            height,
            index,
        })
    }

    /// Copy the pixel buffer into an owned image for cropping or encoding.
    pub fn to_rgb_image(&self) -> Result<RgbImage> {
        RgbImage::from_raw(self.width, self.height, self.pixels.clone())
            .ok_or_else(|| anyhow!("frame buffer does not match its dimensions"))
    }
}
