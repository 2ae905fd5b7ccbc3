use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::event::SeverityThresholds;
use crate::overlay::OverlayConfig;
use crate::track::TrackerConfig;

const DEFAULT_VIDEO_PATH: &str = "stub://traffic";
const DEFAULT_DETECTOR_BACKEND: &str = "stub";
const DEFAULT_MODEL_INPUT: u32 = 640;
const DEFAULT_MIN_CONFIDENCE: f32 = 0.25;
const DEFAULT_WATCH_LABELS: &[&str] = &["car", "motorcycle"];
const DEFAULT_ALERT_URL: &str = "http://127.0.0.1:5000/alert";
const DEFAULT_CAMERA_LAT: f64 = 12.91;
const DEFAULT_CAMERA_LNG: f64 = 77.60;
const DEFAULT_TRIGGER: f32 = 30.0;
const DEFAULT_ALERT_TIMEOUT_SECS: u64 = 5;
const DEFAULT_PREVIEW_EVERY: u64 = 30;

#[derive(Debug, Deserialize, Default)]
struct RoadwatchConfigFile {
    video: Option<VideoConfigFile>,
    detector: Option<DetectorConfigFile>,
    tracker: Option<TrackerConfigFile>,
    severity: Option<SeverityConfigFile>,
    alert: Option<AlertConfigFile>,
    overlay: Option<OverlayConfigFile>,
    preview: Option<PreviewConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct VideoConfigFile {
    path: Option<String>,
    max_frames: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
struct DetectorConfigFile {
    backend: Option<String>,
    model_path: Option<String>,
    input_width: Option<u32>,
    input_height: Option<u32>,
    min_confidence: Option<f32>,
    watch_labels: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, Default)]
struct TrackerConfigFile {
    match_radius: Option<f32>,
    max_missed: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
struct SeverityConfigFile {
    high: Option<f32>,
    medium: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
struct AlertConfigFile {
    url: Option<String>,
    lat: Option<f64>,
    lng: Option<f64>,
    trigger: Option<f32>,
    timeout_secs: Option<u64>,
    include_image: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
struct OverlayConfigFile {
    enabled: Option<bool>,
    height_frac: Option<f32>,
    width_frac: Option<f32>,
    min_chars: Option<usize>,
    max_chars: Option<usize>,
    placeholder: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct PreviewConfigFile {
    path: Option<String>,
    every: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct RoadwatchConfig {
    pub video: VideoSettings,
    pub detector: DetectorSettings,
    pub tracker: TrackerConfig,
    pub severity: SeverityThresholds,
    pub alert: AlertSettings,
    pub overlay: OverlayConfig,
    pub preview: PreviewSettings,
}

#[derive(Debug, Clone)]
pub struct VideoSettings {
    pub path: String,
    /// Stop after this many frames. `None` runs to end of stream.
    pub max_frames: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct DetectorSettings {
    /// Detector backend name ("stub" or "tract").
    pub backend: String,
    pub model_path: Option<String>,
    pub input_width: u32,
    pub input_height: u32,
    /// Detections below this confidence are dropped.
    pub min_confidence: f32,
    /// Labels that count as vehicles for tracking and alerting.
    pub watch_labels: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct AlertSettings {
    pub url: String,
    pub lat: f64,
    pub lng: f64,
    /// Per-frame displacement (pixels) above which an alert fires.
    pub trigger: f32,
    pub timeout: Duration,
    pub include_image: bool,
}

#[derive(Debug, Clone)]
pub struct PreviewSettings {
    /// Where to write annotated snapshots. `None` disables previews.
    pub path: Option<String>,
    pub every: u64,
}

impl RoadwatchConfig {
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load config, preferring an explicit path over `ROADWATCH_CONFIG`.
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let env_path = std::env::var("ROADWATCH_CONFIG").ok();
        let file_cfg = match path {
            Some(path) => Some(read_config_file(path)?),
            None => match env_path.as_deref() {
                Some(path) => Some(read_config_file(Path::new(path))?),
                None => None,
            },
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: RoadwatchConfigFile) -> Self {
        let video = VideoSettings {
            path: file
                .video
                .as_ref()
                .and_then(|video| video.path.clone())
                .unwrap_or_else(|| DEFAULT_VIDEO_PATH.to_string()),
            max_frames: file.video.as_ref().and_then(|video| video.max_frames),
        };
        let detector = DetectorSettings {
            backend: file
                .detector
                .as_ref()
                .and_then(|detector| detector.backend.clone())
                .unwrap_or_else(|| DEFAULT_DETECTOR_BACKEND.to_string()),
            model_path: file
                .detector
                .as_ref()
                .and_then(|detector| detector.model_path.clone()),
            input_width: file
                .detector
                .as_ref()
                .and_then(|detector| detector.input_width)
                .unwrap_or(DEFAULT_MODEL_INPUT),
            input_height: file
                .detector
                .as_ref()
                .and_then(|detector| detector.input_height)
                .unwrap_or(DEFAULT_MODEL_INPUT),
            min_confidence: file
                .detector
                .as_ref()
                .and_then(|detector| detector.min_confidence)
                .unwrap_or(DEFAULT_MIN_CONFIDENCE),
            watch_labels: file
                .detector
                .and_then(|detector| detector.watch_labels)
                .unwrap_or_else(default_watch_labels),
        };
        let mut tracker = TrackerConfig::default();
        if let Some(file_tracker) = file.tracker {
            if let Some(radius) = file_tracker.match_radius {
                tracker.match_radius = radius;
            }
            if let Some(missed) = file_tracker.max_missed {
                tracker.max_missed = missed;
            }
        }
        let mut severity = SeverityThresholds::default();
        if let Some(file_severity) = file.severity {
            if let Some(high) = file_severity.high {
                severity.high = high;
            }
            if let Some(medium) = file_severity.medium {
                severity.medium = medium;
            }
        }
        let alert = AlertSettings {
            url: file
                .alert
                .as_ref()
                .and_then(|alert| alert.url.clone())
                .unwrap_or_else(|| DEFAULT_ALERT_URL.to_string()),
            lat: file
                .alert
                .as_ref()
                .and_then(|alert| alert.lat)
                .unwrap_or(DEFAULT_CAMERA_LAT),
            lng: file
                .alert
                .as_ref()
                .and_then(|alert| alert.lng)
                .unwrap_or(DEFAULT_CAMERA_LNG),
            trigger: file
                .alert
                .as_ref()
                .and_then(|alert| alert.trigger)
                .unwrap_or(DEFAULT_TRIGGER),
            timeout: Duration::from_secs(
                file.alert
                    .as_ref()
                    .and_then(|alert| alert.timeout_secs)
                    .unwrap_or(DEFAULT_ALERT_TIMEOUT_SECS),
            ),
            include_image: file
                .alert
                .and_then(|alert| alert.include_image)
                .unwrap_or(true),
        };
        let mut overlay = OverlayConfig::default();
        if let Some(file_overlay) = file.overlay {
            if let Some(enabled) = file_overlay.enabled {
                overlay.enabled = enabled;
            }
            if let Some(frac) = file_overlay.height_frac {
                overlay.height_frac = frac;
            }
            if let Some(frac) = file_overlay.width_frac {
                overlay.width_frac = frac;
            }
            if let Some(chars) = file_overlay.min_chars {
                overlay.min_chars = chars;
            }
            if let Some(chars) = file_overlay.max_chars {
                overlay.max_chars = chars;
            }
            if let Some(placeholder) = file_overlay.placeholder {
                overlay.placeholder = placeholder;
            }
        }
        let preview = PreviewSettings {
            path: file.preview.as_ref().and_then(|preview| preview.path.clone()),
            every: file
                .preview
                .and_then(|preview| preview.every)
                .unwrap_or(DEFAULT_PREVIEW_EVERY),
        };
        Self {
            video,
            detector,
            tracker,
            severity,
            alert,
            overlay,
            preview,
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(path) = std::env::var("ROADWATCH_VIDEO_PATH") {
            if !path.trim().is_empty() {
                self.video.path = path;
            }
        }
        if let Ok(url) = std::env::var("ROADWATCH_ALERT_URL") {
            if !url.trim().is_empty() {
                self.alert.url = url;
            }
        }
        if let Ok(lat) = std::env::var("ROADWATCH_CAMERA_LAT") {
            self.alert.lat = lat
                .parse()
                .map_err(|_| anyhow!("ROADWATCH_CAMERA_LAT must be a decimal latitude"))?;
        }
        if let Ok(lng) = std::env::var("ROADWATCH_CAMERA_LNG") {
            self.alert.lng = lng
                .parse()
                .map_err(|_| anyhow!("ROADWATCH_CAMERA_LNG must be a decimal longitude"))?;
        }
        if let Ok(trigger) = std::env::var("ROADWATCH_TRIGGER") {
            self.alert.trigger = trigger
                .parse()
                .map_err(|_| anyhow!("ROADWATCH_TRIGGER must be a displacement in pixels"))?;
        }
        Ok(())
    }

    /// Re-check invariants. Called by `load` and again by the daemon
    /// after command-line overrides.
    pub fn validate(&self) -> Result<()> {
        if self.video.path.trim().is_empty() {
            return Err(anyhow!("video path must not be empty"));
        }
        if self.alert.url.trim().is_empty() {
            return Err(anyhow!("alert url must not be empty"));
        }
        if self.severity.medium >= self.severity.high {
            return Err(anyhow!(
                "severity thresholds must satisfy medium < high (got medium={}, high={})",
                self.severity.medium,
                self.severity.high
            ));
        }
        if self.alert.trigger <= 0.0 {
            return Err(anyhow!("alert trigger must be greater than zero"));
        }
        if self.tracker.match_radius <= self.alert.trigger {
            return Err(anyhow!(
                "tracker match radius ({}) must exceed the alert trigger ({})",
                self.tracker.match_radius,
                self.alert.trigger
            ));
        }
        if !(0.0..=1.0).contains(&self.detector.min_confidence) {
            return Err(anyhow!("detector min confidence must be within 0..=1"));
        }
        if self.detector.input_width == 0 || self.detector.input_height == 0 {
            return Err(anyhow!("detector input dimensions must be nonzero"));
        }
        if !band_fraction_ok(self.overlay.height_frac) || !band_fraction_ok(self.overlay.width_frac)
        {
            return Err(anyhow!("overlay band fractions must be within (0, 1]"));
        }
        if self.overlay.min_chars == 0 {
            return Err(anyhow!("overlay min chars must be at least 1"));
        }
        if self.overlay.max_chars < self.overlay.min_chars {
            return Err(anyhow!("overlay max chars must not be below min chars"));
        }
        if self.preview.every == 0 {
            return Err(anyhow!("preview cadence must be greater than zero"));
        }
        Ok(())
    }
}

impl Default for RoadwatchConfig {
    fn default() -> Self {
        Self::from_file(RoadwatchConfigFile::default())
    }
}

fn band_fraction_ok(frac: f32) -> bool {
    frac > 0.0 && frac <= 1.0
}

fn default_watch_labels() -> Vec<String> {
    DEFAULT_WATCH_LABELS
        .iter()
        .map(|label| label.to_string())
        .collect()
}

fn read_config_file(path: &Path) -> Result<RoadwatchConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}
