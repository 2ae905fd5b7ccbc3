use anyhow::Result;

use crate::detect::result::Detection;
use crate::frame::Frame;

/// Object detector backend trait.
///
/// One frame in, zero or more labelled boxes out. Implementations may
/// keep inference state between calls (loaded models, previous-frame
/// hashes) but must not assume anything about frame cadence.
///
/// A failed `detect` call is not fatal to the run: the frame loop logs
/// it and skips the frame.
pub trait ObjectDetector: Send {
    /// Backend identifier for logs.
    fn name(&self) -> &'static str;

    /// Run detection on one frame.
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>>;

    /// Optional warm-up hook, called once before the first frame.
    fn warm_up(&mut self) -> Result<()> {
        Ok(())
    }
}
