//! Frame ingestion sources.
//!
//! Frames come from a local video file decoded with FFmpeg (feature:
//! ingest-file-ffmpeg) or from the built-in synthetic source (`stub://`
//! paths), which needs no native dependencies and exists for tests and
//! smoke runs.
//!
//! Sources yield decoded RGB frames one at a time and report
//! `Ok(None)` at end of stream. Remote URLs are rejected up front;
//! ingestion never touches the network.

pub mod file;
#[cfg(feature = "ingest-file-ffmpeg")]
pub(crate) mod file_ffmpeg;

pub use file::{FileConfig, FileSource, FileStats};
