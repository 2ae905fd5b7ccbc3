//! Roadwatch
//!
//! Roadside accident alerting from a fixed traffic camera. The daemon
//! decodes a local video file, finds vehicles in each frame, follows
//! each vehicle by its bounding-box centroid, and treats a sudden
//! centroid jump as a likely collision. When a vehicle's per-frame
//! displacement clears the alert trigger, an alert is POSTed to a
//! configured HTTP endpoint with severity, camera coordinates, the
//! location caption read off the frame, and a JPEG of the frame.
//! Each track alerts at most once per run.
//!
//! # Module Structure
//!
//! - `ingest`: frame sources (local file via FFmpeg, synthetic stub)
//! - `frame`: decoded RGB frames
//! - `detect`: object detector seam and backends (stub, tract ONNX)
//! - `track`: greedy nearest-centroid tracker
//! - `event`: severity thresholds and classification
//! - `overlay`: location caption extraction
//! - `alert`: payloads and delivery (HTTP, in-memory)
//! - `preview`: annotated snapshot writer
//! - `pipeline`: per-run state and the frame loop
//! - `config`: file/env/flag configuration

pub mod alert;
pub mod config;
pub mod detect;
pub mod error;
pub mod event;
pub mod frame;
pub mod ingest;
pub mod overlay;
pub mod pipeline;
pub mod preview;
pub mod track;

pub use alert::{AlertPayload, AlertSink, HttpAlertSink, MemorySink};
pub use config::RoadwatchConfig;
pub use detect::{BoundingBox, Detection, ObjectDetector, ScriptedDetector, StubDetector};
pub use error::PipelineError;
pub use event::{Severity, SeverityThresholds};
pub use frame::Frame;
pub use ingest::{FileConfig, FileSource};
pub use overlay::{LocationExtractor, OverlayConfig, StubRecognizer, TextRecognizer};
pub use pipeline::{Pipeline, RunStats};
pub use preview::PreviewWriter;
pub use track::{Track, TrackObservation, Tracker, TrackerConfig};

#[cfg(feature = "backend-tract")]
pub use detect::TractDetector;
