//! roadwatchd - vehicle-motion accident alerting daemon
//!
//! The daemon:
//! 1. Decodes frames from a local video file (or the stub:// synthetic source)
//! 2. Runs the configured object detector over each frame
//! 3. Follows watched vehicles by bounding-box centroid across frames
//! 4. Classifies per-frame centroid displacement into severity levels
//! 5. Reads the location caption band off triggering frames
//! 6. POSTs one JSON alert per track to the configured endpoint

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use roadwatch::{
    FileConfig, FileSource, HttpAlertSink, ObjectDetector, Pipeline, PreviewWriter,
    RoadwatchConfig, StubDetector, StubRecognizer,
};

#[derive(Parser, Debug)]
#[command(
    name = "roadwatchd",
    version,
    about = "Vehicle-motion accident alerting daemon"
)]
struct Args {
    /// Path to a JSON config file.
    #[arg(long, env = "ROADWATCH_CONFIG", value_name = "PATH")]
    config: Option<PathBuf>,

    /// Video file to analyze (overrides the config file).
    #[arg(long, value_name = "PATH")]
    video: Option<String>,

    /// Alert endpoint URL (overrides the config file).
    #[arg(long, value_name = "URL")]
    endpoint: Option<String>,

    /// Stop after this many frames.
    #[arg(long, value_name = "N")]
    max_frames: Option<u64>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut cfg = RoadwatchConfig::load_from(args.config.as_deref())?;
    if let Some(video) = args.video {
        cfg.video.path = video;
    }
    if let Some(endpoint) = args.endpoint {
        cfg.alert.url = endpoint;
    }
    if let Some(max_frames) = args.max_frames {
        cfg.video.max_frames = Some(max_frames);
    }
    cfg.validate()?;

    let detector = build_detector(&cfg)?;
    log::info!(
        "roadwatchd starting: source={} detector={}",
        cfg.video.path,
        detector.name()
    );
    log::info!(
        "alerts to {} (trigger >{}px, severity medium >{} high >{})",
        cfg.alert.url,
        cfg.alert.trigger,
        cfg.severity.medium,
        cfg.severity.high
    );
    log::info!("watching labels: {}", cfg.detector.watch_labels.join(", "));

    let mut source = FileSource::new(FileConfig {
        path: cfg.video.path.clone(),
        limit: cfg.video.max_frames,
    })?;
    source.connect()?;

    let sink = HttpAlertSink::new(cfg.alert.url.clone(), cfg.alert.timeout);
    let mut pipeline = Pipeline::new(
        cfg.clone(),
        detector,
        Box::new(StubRecognizer),
        Box::new(sink),
    );
    if let Some(path) = &cfg.preview.path {
        log::info!(
            "writing previews to {} every {} frames",
            path,
            cfg.preview.every
        );
        pipeline =
            pipeline.with_preview(PreviewWriter::new(PathBuf::from(path), cfg.preview.every));
    }

    let shutdown = Arc::new(AtomicBool::new(false));
    let handler_flag = shutdown.clone();
    ctrlc::set_handler(move || {
        handler_flag.store(true, Ordering::Relaxed);
    })
    .context("install shutdown handler")?;

    let stats = pipeline.run(&mut source, &shutdown)?;
    log::info!(
        "run complete: frames={} detections={} alerts_sent={} alerts_failed={} \
         detector_failures={} extraction_failures={}",
        stats.frames,
        stats.detections,
        stats.alerts_sent,
        stats.alerts_failed,
        stats.detector_failures,
        stats.extraction_failures
    );
    Ok(())
}

fn build_detector(cfg: &RoadwatchConfig) -> Result<Box<dyn ObjectDetector>> {
    match cfg.detector.backend.as_str() {
        "stub" => Ok(Box::new(StubDetector::default())),
        #[cfg(feature = "backend-tract")]
        "tract" => {
            let model_path = cfg
                .detector
                .model_path
                .as_deref()
                .ok_or_else(|| anyhow!("tract backend requires detector.model_path"))?;
            let detector = roadwatch::TractDetector::new(
                model_path,
                cfg.detector.input_width,
                cfg.detector.input_height,
            )?
            .with_threshold(cfg.detector.min_confidence);
            Ok(Box::new(detector))
        }
        #[cfg(not(feature = "backend-tract"))]
        "tract" => Err(anyhow!(
            "detector backend 'tract' requires the backend-tract feature"
        )),
        other => Err(anyhow!("unknown detector backend '{}'", other)),
    }
}
