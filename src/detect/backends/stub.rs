use anyhow::Result;
use sha2::{Digest, Sha256};

use crate::detect::backend::ObjectDetector;
use crate::detect::result::Detection;
use crate::frame::Frame;

/// Hash-based stub detector.
///
/// Emits no detections. It hashes each frame and logs at debug level
/// when the content changes, which is enough to watch the loop run on
/// builds without an inference backend.
pub struct StubDetector {
    last_hash: Option<[u8; 32]>,
}

impl StubDetector {
    pub fn new() -> Self {
        Self { last_hash: None }
    }
}

impl Default for StubDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectDetector for StubDetector {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>> {
        let current_hash: [u8; 32] = Sha256::digest(&frame.pixels).into();

        let changed = match self.last_hash {
            Some(prev) => prev != current_hash,
            None => false,
        };
        if changed {
            log::debug!("stub detector: frame {} content changed", frame.index);
        }

        self.last_hash = Some(current_hash);
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(fill: u8, index: u64) -> Frame {
        Frame::new(vec![fill; 4 * 4 * 3], 4, 4, index).expect("frame")
    }

    #[test]
    fn never_emits_detections() {
        let mut detector = StubDetector::new();
        assert_eq!(detector.name(), "stub");
        assert!(detector.detect(&frame(0, 1)).expect("detect").is_empty());
        assert!(detector.detect(&frame(7, 2)).expect("detect").is_empty());
        assert!(detector.detect(&frame(7, 3)).expect("detect").is_empty());
    }
}
