//! Frame-to-alert pipeline.
//!
//! One `Pipeline` owns all per-run state: the detector, the tracker,
//! the location extractor, the alert sink, and the set of tracks that
//! have already alerted. Each frame flows detect -> track -> classify
//! -> alert. Stage failures are logged and skipped; only ingestion
//! errors and detector warm-up end a run early.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use anyhow::Result;

use crate::alert::{AlertPayload, AlertSink};
use crate::config::RoadwatchConfig;
use crate::detect::{Detection, ObjectDetector};
use crate::error::PipelineError;
use crate::event::Severity;
use crate::frame::Frame;
use crate::ingest::FileSource;
use crate::overlay::{LocationExtractor, TextRecognizer};
use crate::preview::PreviewWriter;
use crate::track::Tracker;

const HEALTH_LOG_INTERVAL: Duration = Duration::from_secs(5);

/// Counters for one pipeline run.
#[derive(Clone, Copy, Debug, Default)]
pub struct RunStats {
    pub frames: u64,
    /// Watched-label detections that survived the confidence floor.
    pub detections: u64,
    /// Track observations produced, including first sightings.
    pub tracked: u64,
    pub alerts_sent: u64,
    pub alerts_failed: u64,
    pub detector_failures: u64,
    pub extraction_failures: u64,
}

pub struct Pipeline {
    config: RoadwatchConfig,
    detector: Box<dyn ObjectDetector>,
    extractor: LocationExtractor,
    sink: Box<dyn AlertSink>,
    preview: Option<PreviewWriter>,
    tracker: Tracker,
    alerted: HashSet<u64>,
    stats: RunStats,
}

impl Pipeline {
    pub fn new(
        config: RoadwatchConfig,
        detector: Box<dyn ObjectDetector>,
        recognizer: Box<dyn TextRecognizer>,
        sink: Box<dyn AlertSink>,
    ) -> Self {
        let tracker = Tracker::new(config.tracker.clone());
        let extractor = LocationExtractor::new(config.overlay.clone(), recognizer);
        Self {
            config,
            detector,
            extractor,
            sink,
            preview: None,
            tracker,
            alerted: HashSet::new(),
            stats: RunStats::default(),
        }
    }

    pub fn with_preview(mut self, preview: PreviewWriter) -> Self {
        self.preview = Some(preview);
        self
    }

    pub fn stats(&self) -> RunStats {
        self.stats
    }

    /// Drain the source until end of stream or shutdown.
    pub fn run(&mut self, source: &mut FileSource, shutdown: &AtomicBool) -> Result<RunStats> {
        self.detector.warm_up()?;
        log::info!("detector ready: {}", self.detector.name());

        let mut last_health = Instant::now();
        while !shutdown.load(Ordering::Relaxed) {
            let Some(frame) = source.next_frame()? else {
                log::info!("end of stream after {} frames", self.stats.frames);
                break;
            };
            self.process_frame(&frame);

            if last_health.elapsed() >= HEALTH_LOG_INTERVAL {
                let source_stats = source.stats();
                log::info!(
                    "health: source_healthy={} frames={} live_tracks={} alerts_sent={} path={}",
                    source.is_healthy(),
                    source_stats.frames_decoded,
                    self.tracker.live_tracks().len(),
                    self.stats.alerts_sent,
                    source_stats.path
                );
                last_health = Instant::now();
            }
        }
        Ok(self.stats)
    }

    /// Run detection, tracking, and alerting over one frame.
    ///
    /// A detector failure skips the whole frame without feeding the
    /// tracker, so live tracks do not accrue misses for it.
    pub fn process_frame(&mut self, frame: &Frame) {
        self.stats.frames += 1;

        let detections = match self.detector.detect(frame) {
            Ok(detections) => detections,
            Err(e) => {
                self.stats.detector_failures += 1;
                log::warn!("{}", PipelineError::Detection(e));
                return;
            }
        };

        if let Some(preview) = self.preview.as_mut() {
            if let Err(e) = preview.maybe_write(frame, &detections) {
                log::warn!("preview write failed: {e:#}");
            }
        }

        let watched = self.filter_watched(detections);
        self.stats.detections += watched.len() as u64;

        let centroids: Vec<(f32, f32)> = watched
            .iter()
            .map(|detection| detection.bbox.centroid())
            .collect();
        let observations = self.tracker.observe(&centroids);
        self.stats.tracked += observations.len() as u64;

        for (observation, detection) in observations.iter().zip(watched.iter()) {
            let Some(displacement) = observation.displacement else {
                continue;
            };
            let severity = self.config.severity.classify(displacement);
            log::debug!(
                "track {}: {} moved {displacement:.1}px ({severity})",
                observation.track_id,
                detection.label
            );
            if displacement <= self.config.alert.trigger {
                continue;
            }
            if self.alerted.contains(&observation.track_id) {
                continue;
            }
            self.dispatch_alert(
                frame,
                observation.track_id,
                displacement,
                severity,
                &detection.label,
            );
        }
    }

    /// Keep detections whose label is watched and whose confidence
    /// clears the floor.
    fn filter_watched(&self, detections: Vec<Detection>) -> Vec<Detection> {
        detections
            .into_iter()
            .filter(|detection| {
                detection.confidence >= self.config.detector.min_confidence
                    && self
                        .config
                        .detector
                        .watch_labels
                        .iter()
                        .any(|label| label == &detection.label)
            })
            .collect()
    }

    fn dispatch_alert(
        &mut self,
        frame: &Frame,
        track_id: u64,
        displacement: f32,
        severity: Severity,
        label: &str,
    ) {
        let location = if self.extractor.enabled() {
            match self.extractor.extract(frame) {
                Ok(text) => Some(text),
                Err(e) => {
                    self.stats.extraction_failures += 1;
                    log::warn!("{}", PipelineError::Extraction(e));
                    Some(self.extractor.placeholder().to_string())
                }
            }
        } else {
            None
        };

        let mut payload = AlertPayload::new(self.config.alert.lat, self.config.alert.lng, severity);
        payload.location_text = location;
        if self.config.alert.include_image {
            if let Err(e) = payload.attach_frame_image(frame) {
                log::warn!("alert image encoding failed, sending without image: {e:#}");
            }
        }

        // One attempt per track per run, success or not.
        self.alerted.insert(track_id);

        match self.sink.dispatch(&payload) {
            Ok(()) => {
                self.stats.alerts_sent += 1;
                log::warn!(
                    "alert dispatched: track={track_id} label={label} \
                     displacement={displacement:.1}px severity={severity} location={:?}",
                    payload.location_text
                );
            }
            Err(e) => {
                self.stats.alerts_failed += 1;
                log::warn!("{}", PipelineError::Dispatch(e));
            }
        }
    }
}
