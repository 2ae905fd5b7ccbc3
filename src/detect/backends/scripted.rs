use std::collections::VecDeque;

use anyhow::Result;

use crate::detect::backend::ObjectDetector;
use crate::detect::result::Detection;
use crate::frame::Frame;

/// Replays a fixed per-frame script of detections.
///
/// The test double for pipeline scenarios: each `detect` call pops the
/// next scripted frame and returns nothing once the script runs out.
pub struct ScriptedDetector {
    script: VecDeque<Vec<Detection>>,
}

impl ScriptedDetector {
    pub fn new(script: Vec<Vec<Detection>>) -> Self {
        Self {
            script: script.into(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl ObjectDetector for ScriptedDetector {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn detect(&mut self, _frame: &Frame) -> Result<Vec<Detection>> {
        Ok(self.script.pop_front().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::result::BoundingBox;

    #[test]
    fn replays_script_then_goes_quiet() {
        let detection = Detection::new("car", BoundingBox::new(0.0, 0.0, 10.0, 10.0), 0.9);
        let mut detector = ScriptedDetector::new(vec![vec![detection], vec![]]);
        let frame = Frame::new(vec![0u8; 4 * 4 * 3], 4, 4, 1).expect("frame");

        assert_eq!(detector.remaining(), 2);
        assert_eq!(detector.detect(&frame).expect("detect").len(), 1);
        assert!(detector.detect(&frame).expect("detect").is_empty());
        assert!(detector.detect(&frame).expect("detect").is_empty());
        assert_eq!(detector.remaining(), 0);
    }
}
