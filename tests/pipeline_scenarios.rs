//! End-to-end pipeline scenarios over scripted detections.

use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use image::GrayImage;

use roadwatch::{
    AlertPayload, AlertSink, BoundingBox, Detection, FileConfig, FileSource, Frame, MemorySink,
    ObjectDetector, Pipeline, RoadwatchConfig, RunStats, ScriptedDetector, Severity, StubDetector,
    StubRecognizer, TextRecognizer,
};

fn frame(index: u64) -> Frame {
    Frame::new(vec![0u8; 64 * 48 * 3], 64, 48, index).expect("frame")
}

fn car_at(cx: f32, cy: f32) -> Detection {
    Detection::new(
        "car",
        BoundingBox::new(cx - 20.0, cy - 15.0, cx + 20.0, cy + 15.0),
        0.9,
    )
}

fn person_at(cx: f32, cy: f32) -> Detection {
    Detection::new(
        "person",
        BoundingBox::new(cx - 10.0, cy - 25.0, cx + 10.0, cy + 25.0),
        0.9,
    )
}

fn test_config() -> RoadwatchConfig {
    let mut cfg = RoadwatchConfig::default();
    cfg.alert.include_image = false;
    cfg
}

fn run_script(cfg: RoadwatchConfig, script: Vec<Vec<Detection>>) -> (MemorySink, RunStats) {
    let sink = MemorySink::new();
    let frames = script.len() as u64;
    let mut pipeline = Pipeline::new(
        cfg,
        Box::new(ScriptedDetector::new(script)),
        Box::new(StubRecognizer),
        Box::new(sink.clone()),
    );
    for index in 1..=frames {
        pipeline.process_frame(&frame(index));
    }
    (sink, pipeline.stats())
}

#[test]
fn sudden_jump_dispatches_one_high_alert() {
    let script = vec![
        vec![car_at(100.0, 100.0)],
        vec![car_at(140.0, 135.0)],
        vec![car_at(100.0, 100.0)],
    ];
    let (sink, stats) = run_script(test_config(), script);

    // 75px jump fires once; the second jump is the same track
    let alerts = sink.dispatched();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].severity, Severity::High);
    assert_eq!(alerts[0].lat, 12.91);
    assert_eq!(alerts[0].lng, 77.60);
    assert_eq!(alerts[0].location_text.as_deref(), Some("Unknown Location"));
    assert!(alerts[0].image.is_none());

    assert_eq!(stats.frames, 3);
    assert_eq!(stats.alerts_sent, 1);
    assert_eq!(stats.alerts_failed, 0);
}

#[test]
fn unwatched_labels_are_never_tracked() {
    let script = vec![
        vec![person_at(100.0, 100.0)],
        vec![person_at(180.0, 180.0)],
    ];
    let (sink, stats) = run_script(test_config(), script);

    assert!(sink.dispatched().is_empty());
    assert_eq!(stats.detections, 0);
    assert_eq!(stats.tracked, 0);
}

#[test]
fn first_appearance_never_alerts() {
    let (sink, stats) = run_script(test_config(), vec![vec![car_at(300.0, 200.0)]]);

    assert!(sink.dispatched().is_empty());
    assert_eq!(stats.tracked, 1);
}

#[test]
fn slow_drift_stays_silent() {
    let script = vec![
        vec![car_at(100.0, 100.0)],
        vec![car_at(128.0, 100.0)],
        vec![car_at(156.0, 100.0)],
    ];
    let (sink, stats) = run_script(test_config(), script);

    assert!(sink.dispatched().is_empty());
    assert_eq!(stats.frames, 3);
}

#[test]
fn displacement_equal_to_the_trigger_stays_silent() {
    let script = vec![vec![car_at(100.0, 100.0)], vec![car_at(115.0, 115.0)]];
    let (sink, _) = run_script(test_config(), script);

    // exactly 30px is not "more than" the trigger
    assert!(sink.dispatched().is_empty());
}

#[test]
fn displacement_just_over_the_trigger_dispatches_medium() {
    let script = vec![vec![car_at(100.0, 100.0)], vec![car_at(115.5, 115.0)]];
    let (sink, _) = run_script(test_config(), script);

    let alerts = sink.dispatched();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].severity, Severity::Medium);
}

#[test]
fn dispatch_failure_still_marks_the_track() {
    #[derive(Clone, Default)]
    struct FailingSink {
        attempts: Arc<Mutex<u64>>,
    }

    impl AlertSink for FailingSink {
        fn dispatch(&mut self, _payload: &AlertPayload) -> Result<()> {
            *self.attempts.lock().unwrap() += 1;
            Err(anyhow!("endpoint down"))
        }
    }

    let sink = FailingSink::default();
    let script = vec![
        vec![car_at(100.0, 100.0)],
        vec![car_at(140.0, 135.0)],
        vec![car_at(180.0, 170.0)],
    ];
    let mut pipeline = Pipeline::new(
        test_config(),
        Box::new(ScriptedDetector::new(script)),
        Box::new(StubRecognizer),
        Box::new(sink.clone()),
    );
    for index in 1..=3 {
        pipeline.process_frame(&frame(index));
    }

    // one attempt on frame 2, no retry on the frame 3 jump
    assert_eq!(*sink.attempts.lock().unwrap(), 1);
    assert_eq!(pipeline.stats().alerts_failed, 1);
    assert_eq!(pipeline.stats().alerts_sent, 0);
}

#[test]
fn detector_failure_skips_the_frame_but_the_run_continues() {
    struct FlakyDetector {
        calls: u64,
    }

    impl ObjectDetector for FlakyDetector {
        fn name(&self) -> &'static str {
            "flaky"
        }

        fn detect(&mut self, _frame: &Frame) -> Result<Vec<Detection>> {
            self.calls += 1;
            match self.calls {
                1 => Ok(vec![car_at(100.0, 100.0)]),
                2 => Err(anyhow!("inference timeout")),
                _ => Ok(vec![car_at(140.0, 135.0)]),
            }
        }
    }

    let sink = MemorySink::new();
    let mut pipeline = Pipeline::new(
        test_config(),
        Box::new(FlakyDetector { calls: 0 }),
        Box::new(StubRecognizer),
        Box::new(sink.clone()),
    );
    for index in 1..=3 {
        pipeline.process_frame(&frame(index));
    }

    // the track survives the bad frame and the jump still alerts
    let alerts = sink.dispatched();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].severity, Severity::High);
    assert_eq!(pipeline.stats().detector_failures, 1);
    assert_eq!(pipeline.stats().frames, 3);
}

#[test]
fn failed_caption_reading_falls_back_to_the_placeholder() {
    struct FailingRecognizer;

    impl TextRecognizer for FailingRecognizer {
        fn recognize(&mut self, _crop: &GrayImage) -> Result<String> {
            Err(anyhow!("ocr engine unavailable"))
        }
    }

    let sink = MemorySink::new();
    let script = vec![vec![car_at(100.0, 100.0)], vec![car_at(140.0, 135.0)]];
    let mut pipeline = Pipeline::new(
        test_config(),
        Box::new(ScriptedDetector::new(script)),
        Box::new(FailingRecognizer),
        Box::new(sink.clone()),
    );
    for index in 1..=2 {
        pipeline.process_frame(&frame(index));
    }

    let alerts = sink.dispatched();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].location_text.as_deref(), Some("Unknown Location"));
    assert_eq!(pipeline.stats().extraction_failures, 1);
}

#[test]
fn recognized_caption_rides_the_alert() {
    struct FixedRecognizer(&'static str);

    impl TextRecognizer for FixedRecognizer {
        fn recognize(&mut self, _crop: &GrayImage) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    let sink = MemorySink::new();
    let script = vec![vec![car_at(100.0, 100.0)], vec![car_at(140.0, 135.0)]];
    let mut pipeline = Pipeline::new(
        test_config(),
        Box::new(ScriptedDetector::new(script)),
        Box::new(FixedRecognizer("  Cam 12   Main St  ")),
        Box::new(sink.clone()),
    );
    for index in 1..=2 {
        pipeline.process_frame(&frame(index));
    }

    let alerts = sink.dispatched();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].location_text.as_deref(), Some("Cam 12 Main St"));
}

#[test]
fn two_cars_jumping_alert_independently() {
    let script = vec![
        vec![car_at(100.0, 100.0), car_at(400.0, 300.0)],
        // detection order swapped; both drift only slightly
        vec![car_at(405.0, 305.0), car_at(102.0, 98.0)],
        // both jump 75px
        vec![car_at(140.0, 135.0), car_at(445.0, 340.0)],
        // same tracks jump again; both are already marked
        vec![car_at(180.0, 170.0), car_at(485.0, 375.0)],
    ];
    let (sink, stats) = run_script(test_config(), script);

    let alerts = sink.dispatched();
    assert_eq!(alerts.len(), 2);
    assert!(alerts.iter().all(|alert| alert.severity == Severity::High));
    assert_eq!(stats.alerts_sent, 2);
}

#[test]
fn distant_replacement_starts_a_fresh_track() {
    let script = vec![vec![car_at(100.0, 100.0)], vec![car_at(300.0, 300.0)]];
    let (sink, stats) = run_script(test_config(), script);

    // 400px is beyond the match radius, so this is a new first sighting
    assert!(sink.dispatched().is_empty());
    assert_eq!(stats.tracked, 2);
}

#[test]
fn low_confidence_detections_are_ignored() {
    let mut faint = car_at(100.0, 100.0);
    faint.confidence = 0.1;
    let mut faint_jump = car_at(140.0, 135.0);
    faint_jump.confidence = 0.1;

    let (sink, stats) = run_script(test_config(), vec![vec![faint], vec![faint_jump]]);

    assert!(sink.dispatched().is_empty());
    assert_eq!(stats.detections, 0);
    assert_eq!(stats.tracked, 0);
}

#[test]
fn run_reaches_end_of_stream_on_the_stub_source() {
    let mut source = FileSource::new(FileConfig {
        path: "stub://loop".to_string(),
        limit: Some(6),
    })
    .expect("source");
    source.connect().expect("connect");

    let sink = MemorySink::new();
    let mut pipeline = Pipeline::new(
        test_config(),
        Box::new(StubDetector::default()),
        Box::new(StubRecognizer),
        Box::new(sink.clone()),
    );

    let shutdown = AtomicBool::new(false);
    let stats = pipeline.run(&mut source, &shutdown).expect("run");

    assert_eq!(stats.frames, 6);
    assert!(sink.dispatched().is_empty());
}

#[test]
fn shutdown_flag_stops_the_run_before_any_frame() {
    let mut source = FileSource::new(FileConfig {
        path: "stub://loop".to_string(),
        limit: None,
    })
    .expect("source");
    source.connect().expect("connect");

    let mut pipeline = Pipeline::new(
        test_config(),
        Box::new(StubDetector::default()),
        Box::new(StubRecognizer),
        Box::new(MemorySink::new()),
    );

    let shutdown = AtomicBool::new(true);
    let stats = pipeline.run(&mut source, &shutdown).expect("run");

    assert_eq!(stats.frames, 0);
}

#[test]
fn alert_carries_a_hex_jpeg_when_images_are_enabled() {
    let mut cfg = RoadwatchConfig::default();
    cfg.alert.include_image = true;

    let script = vec![vec![car_at(100.0, 100.0)], vec![car_at(140.0, 135.0)]];
    let (sink, _) = run_script(cfg, script);

    let alerts = sink.dispatched();
    assert_eq!(alerts.len(), 1);
    let encoded = alerts[0].image.as_deref().expect("image attached");
    let bytes = hex::decode(encoded).expect("valid hex");
    assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
}
