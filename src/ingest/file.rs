//! Local file frame source.
//!
//! `FileSource` decodes frames from a local video file, or synthesizes
//! them for `stub://` paths. Frames carry a 1-based index assigned in
//! decode order. `next_frame` returns `Ok(None)` once the file (or the
//! configured frame limit) is exhausted; callers treat that as a clean
//! end of stream, not an error.

use anyhow::{anyhow, Result};

#[cfg(feature = "ingest-file-ffmpeg")]
use super::file_ffmpeg::FfmpegFileSource;
use crate::frame::Frame;

/// Configuration for a local file source.
#[derive(Clone, Debug, Default)]
pub struct FileConfig {
    /// Local file path, or `stub://<name>` for the synthetic source.
    pub path: String,
    /// Stop yielding frames after this many. `None` runs to the end of
    /// the file.
    pub limit: Option<u64>,
}

/// Local file frame source.
pub struct FileSource {
    backend: FileBackend,
}

enum FileBackend {
    Synthetic(SyntheticFileSource),
    #[cfg(feature = "ingest-file-ffmpeg")]
    Ffmpeg(FfmpegFileSource),
}

impl FileSource {
    pub fn new(config: FileConfig) -> Result<Self> {
        if !is_local_file_path(&config.path) {
            return Err(anyhow!(
                "file ingestion only supports local paths (no URL schemes)"
            ));
        }
        if config.path.starts_with("stub://") {
            Ok(Self {
                backend: FileBackend::Synthetic(SyntheticFileSource::new(config)),
            })
        } else {
            #[cfg(feature = "ingest-file-ffmpeg")]
            {
                Ok(Self {
                    backend: FileBackend::Ffmpeg(FfmpegFileSource::new(config)?),
                })
            }
            #[cfg(not(feature = "ingest-file-ffmpeg"))]
            {
                Err(anyhow!(
                    "file ingestion requires the ingest-file-ffmpeg feature"
                ))
            }
        }
    }

    /// Open the source.
    pub fn connect(&mut self) -> Result<()> {
        match &mut self.backend {
            FileBackend::Synthetic(source) => source.connect(),
            #[cfg(feature = "ingest-file-ffmpeg")]
            FileBackend::Ffmpeg(source) => source.connect(),
        }
    }

    /// Decode the next frame. `Ok(None)` means end of stream.
    pub fn next_frame(&mut self) -> Result<Option<Frame>> {
        match &mut self.backend {
            FileBackend::Synthetic(source) => source.next_frame(),
            #[cfg(feature = "ingest-file-ffmpeg")]
            FileBackend::Ffmpeg(source) => source.next_frame(),
        }
    }

    /// Whether the source can still produce frames.
    pub fn is_healthy(&self) -> bool {
        match &self.backend {
            FileBackend::Synthetic(source) => source.is_healthy(),
            #[cfg(feature = "ingest-file-ffmpeg")]
            FileBackend::Ffmpeg(source) => source.is_healthy(),
        }
    }

    /// Get frame statistics.
    pub fn stats(&self) -> FileStats {
        match &self.backend {
            FileBackend::Synthetic(source) => source.stats(),
            #[cfg(feature = "ingest-file-ffmpeg")]
            FileBackend::Ffmpeg(source) => source.stats(),
        }
    }
}

/// Statistics for a file source.
#[derive(Clone, Debug)]
pub struct FileStats {
    pub frames_decoded: u64,
    pub path: String,
}

// ----------------------------------------------------------------------------
// Synthetic source (stub://) for tests and smoke runs
// ----------------------------------------------------------------------------

const SYNTH_WIDTH: u32 = 640;
const SYNTH_HEIGHT: u32 = 480;

struct SyntheticFileSource {
    config: FileConfig,
    frame_count: u64,
}

impl SyntheticFileSource {
    fn new(config: FileConfig) -> Self {
        Self {
            config,
            frame_count: 0,
        }
    }

    fn connect(&mut self) -> Result<()> {
        log::info!("FileSource: connected to {} (synthetic)", self.config.path);
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        if let Some(limit) = self.config.limit {
            if self.frame_count >= limit {
                return Ok(None);
            }
        }
        self.frame_count += 1;
        let pixels = self.generate_pixels();
        let frame = Frame::new(pixels, SYNTH_WIDTH, SYNTH_HEIGHT, self.frame_count)?;
        Ok(Some(frame))
    }

    /// Shifting gradient, so consecutive frames differ.
    fn generate_pixels(&self) -> Vec<u8> {
        let pixel_count = (SYNTH_WIDTH * SYNTH_HEIGHT * 3) as usize;
        let mut pixels = vec![0u8; pixel_count];
        for (i, pixel) in pixels.iter_mut().enumerate() {
            *pixel = ((i as u64 + self.frame_count * 7) % 256) as u8;
        }
        pixels
    }

    fn is_healthy(&self) -> bool {
        true
    }

    fn stats(&self) -> FileStats {
        FileStats {
            frames_decoded: self.frame_count,
            path: self.config.path.clone(),
        }
    }
}

fn is_local_file_path(path: &str) -> bool {
    if path.trim().is_empty() {
        return false;
    }
    if path.starts_with("stub://") {
        return true;
    }
    !path.contains("://")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthetic_source_honors_the_frame_limit() {
        let mut source = FileSource::new(FileConfig {
            path: "stub://traffic".to_string(),
            limit: Some(3),
        })
        .expect("source");
        source.connect().expect("connect");

        for expected_index in 1..=3 {
            let frame = source.next_frame().expect("frame").expect("some");
            assert_eq!(frame.index, expected_index);
            assert_eq!((frame.width, frame.height), (SYNTH_WIDTH, SYNTH_HEIGHT));
        }
        assert!(source.next_frame().expect("eos").is_none());
        assert!(source.next_frame().expect("still eos").is_none());
        assert_eq!(source.stats().frames_decoded, 3);
    }

    #[test]
    fn consecutive_synthetic_frames_differ() {
        let mut source = FileSource::new(FileConfig {
            path: "stub://traffic".to_string(),
            limit: None,
        })
        .expect("source");
        let first = source.next_frame().expect("frame").expect("some");
        let second = source.next_frame().expect("frame").expect("some");
        assert_ne!(first.pixels, second.pixels);
    }

    #[test]
    fn url_schemes_are_rejected() {
        let result = FileSource::new(FileConfig {
            path: "rtsp://camera.local/stream".to_string(),
            limit: None,
        });
        assert!(result.is_err());
    }

    #[test]
    fn empty_paths_are_rejected() {
        assert!(FileSource::new(FileConfig::default()).is_err());
    }
}
