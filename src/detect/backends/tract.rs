#![cfg(feature = "backend-tract")]

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use image::imageops::{self, FilterType};
use tract_onnx::prelude::*;

use crate::detect::backend::ObjectDetector;
use crate::detect::result::{BoundingBox, Detection};
use crate::frame::Frame;

/// COCO class names in YOLO export order.
const COCO_LABELS: [&str; 80] = [
    "person",
    "bicycle",
    "car",
    "motorcycle",
    "airplane",
    "bus",
    "train",
    "truck",
    "boat",
    "traffic light",
    "fire hydrant",
    "stop sign",
    "parking meter",
    "bench",
    "bird",
    "cat",
    "dog",
    "horse",
    "sheep",
    "cow",
    "elephant",
    "bear",
    "zebra",
    "giraffe",
    "backpack",
    "umbrella",
    "handbag",
    "tie",
    "suitcase",
    "frisbee",
    "skis",
    "snowboard",
    "sports ball",
    "kite",
    "baseball bat",
    "baseball glove",
    "skateboard",
    "surfboard",
    "tennis racket",
    "bottle",
    "wine glass",
    "cup",
    "fork",
    "knife",
    "spoon",
    "bowl",
    "banana",
    "apple",
    "sandwich",
    "orange",
    "broccoli",
    "carrot",
    "hot dog",
    "pizza",
    "donut",
    "cake",
    "chair",
    "couch",
    "potted plant",
    "bed",
    "dining table",
    "toilet",
    "tv",
    "laptop",
    "mouse",
    "remote",
    "keyboard",
    "cell phone",
    "microwave",
    "oven",
    "toaster",
    "sink",
    "refrigerator",
    "book",
    "clock",
    "vase",
    "scissors",
    "teddy bear",
    "hair drier",
    "toothbrush",
];

/// Tract-based ONNX detector backend.
///
/// Loads a local detection model whose output rows are
/// `[x1, y1, x2, y2, confidence, class]` in model-input pixel
/// coordinates (the usual NMS-applied export layout). Frames are
/// resized to the model input and boxes scaled back to frame
/// coordinates. No network I/O beyond loading the model file.
pub struct TractDetector {
    model: TypedSimplePlan<TypedModel>,
    width: u32,
    height: u32,
    min_confidence: f32,
}

impl TractDetector {
    /// Load an ONNX model from disk and prepare it for inference.
    pub fn new<P: AsRef<Path>>(model_path: P, width: u32, height: u32) -> Result<Self> {
        let model_path = model_path.as_ref();
        let model = tract_onnx::onnx()
            .model_for_path(model_path)
            .with_context(|| format!("failed to load ONNX model from {}", model_path.display()))?
            .with_input_fact(
                0,
                InferenceFact::dt_shape(
                    f32::datum_type(),
                    tvec!(1, 3, height as usize, width as usize),
                ),
            )
            .context("failed to set input fact")?
            .into_optimized()
            .context("failed to optimize ONNX model")?
            .into_runnable()
            .context("failed to build runnable ONNX model")?;

        Ok(Self {
            model,
            width,
            height,
            min_confidence: 0.25,
        })
    }

    /// Override the default confidence floor.
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.min_confidence = threshold;
        self
    }

    fn build_input(&self, pixels: &[u8]) -> Result<Tensor> {
        let expected_len = (self.width as usize)
            .checked_mul(self.height as usize)
            .and_then(|v| v.checked_mul(3))
            .ok_or_else(|| anyhow!("model input dimensions overflow"))?;

        if pixels.len() != expected_len {
            return Err(anyhow!(
                "expected {} RGB bytes, received {}",
                expected_len,
                pixels.len()
            ));
        }

        let width = self.width as usize;
        let input = tract_ndarray::Array4::from_shape_fn(
            (1, 3, self.height as usize, width),
            |(_, channel, y, x)| {
                let idx = (y * width + x) * 3 + channel;
                pixels[idx] as f32 / 255.0
            },
        );

        Ok(input.into_tensor())
    }

    fn parse_detections(
        &self,
        outputs: TVec<TValue>,
        scale_x: f32,
        scale_y: f32,
    ) -> Result<Vec<Detection>> {
        let output = outputs
            .first()
            .ok_or_else(|| anyhow!("model produced no outputs"))?;
        let rows = output
            .to_array_view::<f32>()
            .context("model output tensor was not f32")?;

        let values: Vec<f32> = rows.iter().copied().collect();
        if values.len() % 6 != 0 {
            return Err(anyhow!(
                "model output length {} is not rows of [x1, y1, x2, y2, conf, class]",
                values.len()
            ));
        }

        let mut detections = Vec::new();
        for row in values.chunks_exact(6) {
            let confidence = row[4];
            if confidence < self.min_confidence {
                continue;
            }
            let label = COCO_LABELS
                .get(row[5] as usize)
                .copied()
                .unwrap_or("unknown");
            let bbox = BoundingBox::new(
                row[0] * scale_x,
                row[1] * scale_y,
                row[2] * scale_x,
                row[3] * scale_y,
            );
            detections.push(Detection::new(label, bbox, confidence));
        }
        Ok(detections)
    }
}

impl ObjectDetector for TractDetector {
    fn name(&self) -> &'static str {
        "tract"
    }

    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>> {
        let (pixels, scale_x, scale_y) = if frame.width == self.width
            && frame.height == self.height
        {
            (frame.pixels.clone(), 1.0, 1.0)
        } else {
            let image = frame.to_rgb_image()?;
            let resized = imageops::resize(&image, self.width, self.height, FilterType::Triangle);
            let scale_x = frame.width as f32 / self.width as f32;
            let scale_y = frame.height as f32 / self.height as f32;
            (resized.into_raw(), scale_x, scale_y)
        };

        let input = self.build_input(&pixels)?;
        let outputs = self
            .model
            .run(tvec!(input.into()))
            .context("ONNX inference failed")?;
        self.parse_detections(outputs, scale_x, scale_y)
    }
}
