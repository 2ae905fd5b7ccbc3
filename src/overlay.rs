//! Location caption extraction.
//!
//! Road cameras burn a location caption into a fixed band of the frame,
//! typically the top-right corner. `LocationExtractor` crops that band,
//! preprocesses it (greyscale, light blur), hands it to a
//! `TextRecognizer`, and cleans the result: whitespace runs collapse to
//! single spaces, readings under `min_chars` characters fall back to the
//! placeholder, and anything longer than `max_chars` is truncated on a
//! character boundary.
//!
//! No recognition engine ships with the crate. `StubRecognizer` keeps
//! the default build engine-free; real engines plug in behind the trait.

use anyhow::Result;
use image::{imageops, GrayImage};

use crate::frame::Frame;

const BLUR_SIGMA: f32 = 1.2;

/// Caption band geometry and cleanup rules.
#[derive(Clone, Debug)]
pub struct OverlayConfig {
    /// Extract a location caption at all.
    pub enabled: bool,
    /// Fraction of frame height the band covers, from the top edge.
    pub height_frac: f32,
    /// Fraction of frame width the band covers, from the right edge.
    pub width_frac: f32,
    /// Cleaned readings shorter than this become the placeholder.
    pub min_chars: usize,
    /// Cleaned readings longer than this are truncated.
    pub max_chars: usize,
    pub placeholder: String,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            height_frac: 0.14,
            width_frac: 0.45,
            min_chars: 3,
            max_chars: 40,
            placeholder: "Unknown Location".to_string(),
        }
    }
}

/// Text recognition over a preprocessed caption crop.
///
/// Implementations return their raw reading; cleanup happens in the
/// extractor so every engine gets the same post-processing.
pub trait TextRecognizer: Send {
    fn recognize(&mut self, crop: &GrayImage) -> Result<String>;
}

/// Recognizer that reads nothing.
///
/// Extraction through it always lands on the configured placeholder.
pub struct StubRecognizer;

impl TextRecognizer for StubRecognizer {
    fn recognize(&mut self, _crop: &GrayImage) -> Result<String> {
        Ok(String::new())
    }
}

/// Crops the caption band and turns recognizer output into a location
/// string.
pub struct LocationExtractor {
    config: OverlayConfig,
    recognizer: Box<dyn TextRecognizer>,
}

impl LocationExtractor {
    pub fn new(config: OverlayConfig, recognizer: Box<dyn TextRecognizer>) -> Self {
        Self { config, recognizer }
    }

    pub fn enabled(&self) -> bool {
        self.config.enabled
    }

    pub fn placeholder(&self) -> &str {
        &self.config.placeholder
    }

    /// Read the caption band of a frame. Computed fresh on every call;
    /// nothing is cached between frames.
    pub fn extract(&mut self, frame: &Frame) -> Result<String> {
        let crop = caption_band(frame, &self.config)?;
        let raw = self.recognizer.recognize(&crop)?;
        Ok(clean_caption(&raw, &self.config))
    }
}

fn caption_band(frame: &Frame, config: &OverlayConfig) -> Result<GrayImage> {
    let band_height = ((frame.height as f32) * config.height_frac).round().max(1.0) as u32;
    let band_width = ((frame.width as f32) * config.width_frac).round().max(1.0) as u32;
    let band_height = band_height.min(frame.height);
    let band_width = band_width.min(frame.width);
    let x0 = frame.width - band_width;

    let image = frame.to_rgb_image()?;
    let crop = imageops::crop_imm(&image, x0, 0, band_width, band_height).to_image();
    let grey = imageops::grayscale(&crop);
    Ok(imageops::blur(&grey, BLUR_SIGMA))
}

fn clean_caption(raw: &str, config: &OverlayConfig) -> String {
    let text = squash_whitespace(raw);
    if text.chars().count() < config.min_chars {
        return config.placeholder.clone();
    }
    text.chars().take(config.max_chars).collect()
}

/// Collapse whitespace runs to single spaces and trim the ends.
fn squash_whitespace(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::sync::{Arc, Mutex};

    struct FixedRecognizer(&'static str);

    impl TextRecognizer for FixedRecognizer {
        fn recognize(&mut self, _crop: &GrayImage) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    struct CropProbe {
        dims: Arc<Mutex<Option<(u32, u32)>>>,
    }

    impl TextRecognizer for CropProbe {
        fn recognize(&mut self, crop: &GrayImage) -> Result<String> {
            *self.dims.lock().expect("probe lock") = Some(crop.dimensions());
            Ok("Cam 7".to_string())
        }
    }

    fn test_frame() -> Frame {
        Frame::new(vec![0u8; 640 * 480 * 3], 640, 480, 1).expect("frame")
    }

    fn extract_with(recognizer: impl TextRecognizer + 'static) -> String {
        let mut extractor = LocationExtractor::new(OverlayConfig::default(), Box::new(recognizer));
        extractor.extract(&test_frame()).expect("extract")
    }

    #[test]
    fn whitespace_runs_collapse_to_single_spaces() {
        assert_eq!(
            extract_with(FixedRecognizer("  Cam 12   Main St  ")),
            "Cam 12 Main St"
        );
    }

    #[test]
    fn short_readings_become_the_placeholder() {
        assert_eq!(extract_with(FixedRecognizer("Hi")), "Unknown Location");
        assert_eq!(extract_with(FixedRecognizer("   ")), "Unknown Location");
        assert_eq!(extract_with(FixedRecognizer("C12")), "C12");
    }

    #[test]
    fn long_readings_truncate_to_max_chars() {
        let cleaned = clean_caption(&"x".repeat(55), &OverlayConfig::default());
        assert_eq!(cleaned.len(), 40);
    }

    #[test]
    fn truncation_respects_character_boundaries() {
        let cleaned = clean_caption(&"é".repeat(45), &OverlayConfig::default());
        assert_eq!(cleaned.chars().count(), 40);
    }

    #[test]
    fn stub_recognizer_lands_on_the_placeholder() {
        let mut extractor =
            LocationExtractor::new(OverlayConfig::default(), Box::new(StubRecognizer));
        assert_eq!(
            extractor.extract(&test_frame()).expect("extract"),
            "Unknown Location"
        );
    }

    #[test]
    fn crop_covers_the_top_right_band() {
        let dims = Arc::new(Mutex::new(None));
        let probe = CropProbe { dims: dims.clone() };
        assert_eq!(extract_with(probe), "Cam 7");
        // 45% of 640 wide, 14% of 480 tall
        assert_eq!(*dims.lock().expect("probe lock"), Some((288, 67)));
    }

    #[test]
    fn recognizer_failure_propagates() {
        struct FailingRecognizer;
        impl TextRecognizer for FailingRecognizer {
            fn recognize(&mut self, _crop: &GrayImage) -> Result<String> {
                Err(anyhow!("engine crashed"))
            }
        }
        let mut extractor =
            LocationExtractor::new(OverlayConfig::default(), Box::new(FailingRecognizer));
        assert!(extractor.extract(&test_frame()).is_err());
    }
}
