//! Annotated preview snapshots.
//!
//! When enabled, the pipeline periodically writes the current frame
//! with detection boxes drawn on it to a fixed path, overwriting the
//! previous snapshot. Useful for eyeballing a running daemon without
//! a display attached.

use std::path::PathBuf;

use anyhow::{Context, Result};
use image::{ImageFormat, Rgb};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

use crate::detect::Detection;
use crate::frame::Frame;

const BOX_COLOR: Rgb<u8> = Rgb([255, 64, 64]);

pub struct PreviewWriter {
    path: PathBuf,
    every: u64,
    written: u64,
}

impl PreviewWriter {
    /// `every` is a frame cadence; 0 is treated as 1.
    pub fn new(path: PathBuf, every: u64) -> Self {
        Self {
            path,
            every: every.max(1),
            written: 0,
        }
    }

    pub fn written(&self) -> u64 {
        self.written
    }

    /// Write a snapshot if the frame lands on the cadence.
    pub fn maybe_write(&mut self, frame: &Frame, detections: &[Detection]) -> Result<()> {
        if frame.index % self.every != 0 {
            return Ok(());
        }

        let mut image = frame.to_rgb_image()?;
        for detection in detections {
            let width = detection.bbox.width().max(1.0) as u32;
            let height = detection.bbox.height().max(1.0) as u32;
            let rect = Rect::at(detection.bbox.x1 as i32, detection.bbox.y1 as i32)
                .of_size(width.max(1), height.max(1));
            draw_hollow_rect_mut(&mut image, rect, BOX_COLOR);
        }

        image
            .save_with_format(&self.path, ImageFormat::Jpeg)
            .with_context(|| format!("write preview to {}", self.path.display()))?;
        self.written += 1;
        Ok(())
    }
}
