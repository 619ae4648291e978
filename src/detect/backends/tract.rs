#![cfg(feature = "backend-tract")]

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use tract_onnx::prelude::*;

use crate::detect::backend::{PoseEstimator, PresenceGate};
use crate::detect::result::{Landmark, Pose, POSE_LANDMARK_COUNT};
use crate::frame::Frame;

/// Values per landmark in the model's flat output: x, y, z, visibility, presence.
const LANDMARK_STRIDE: usize = 5;

/// Tract-based pose landmark estimator for ONNX models.
///
/// Expects a BlazePose-style landmark model: input `[1, 3, H, W]` RGB in 0..1,
/// output 0 a flat tensor of landmarks (stride 5, coordinates in input pixels)
/// and an optional output 1 holding the pose presence score.
///
/// The model is loaded from a local file; no network I/O.
pub struct TractPoseEstimator {
    model: TypedRunnableModel<TypedModel>,
    input_width: u32,
    input_height: u32,
    gate: PresenceGate,
}

impl TractPoseEstimator {
    /// Load an ONNX model from disk and prepare it for inference.
    pub fn new<P: AsRef<Path>>(model_path: P, input_width: u32, input_height: u32) -> Result<Self> {
        let model_path = model_path.as_ref();
        let model = tract_onnx::onnx()
            .model_for_path(model_path)
            .with_context(|| format!("failed to load ONNX model from {}", model_path.display()))?
            .with_input_fact(
                0,
                InferenceFact::dt_shape(
                    f32::datum_type(),
                    tvec!(1, 3, input_height as usize, input_width as usize),
                ),
            )
            .context("failed to set input fact")?
            .into_optimized()
            .context("failed to optimize ONNX model")?
            .into_runnable()
            .context("failed to build runnable ONNX model")?;

        Ok(Self {
            model,
            input_width,
            input_height,
            gate: PresenceGate::default(),
        })
    }

    /// Override the default detection/tracking thresholds.
    pub fn with_gate(mut self, gate: PresenceGate) -> Self {
        self.gate = gate;
        self
    }

    fn build_input(&self, frame: &Frame) -> Result<Tensor> {
        let rgb = image::RgbImage::from_raw(frame.width, frame.height, frame.pixels().to_vec())
            .ok_or_else(|| anyhow!("frame buffer does not match {}x{}", frame.width, frame.height))?;
        let resized = if rgb.width() == self.input_width && rgb.height() == self.input_height {
            rgb
        } else {
            image::imageops::resize(
                &rgb,
                self.input_width,
                self.input_height,
                image::imageops::FilterType::Triangle,
            )
        };

        let input = tract_ndarray::Array4::from_shape_fn(
            (1, 3, self.input_height as usize, self.input_width as usize),
            |(_, channel, y, x)| resized.get_pixel(x as u32, y as u32)[channel] as f32 / 255.0,
        );
        Ok(input.into_tensor())
    }
}

impl PoseEstimator for TractPoseEstimator {
    fn name(&self) -> &'static str {
        "tract"
    }

    fn estimate(&mut self, frame: &Frame) -> Result<Option<Pose>> {
        let input = self.build_input(frame)?;
        let outputs = self
            .model
            .run(tvec!(input.into()))
            .context("ONNX inference failed")?;

        let landmark_values = outputs
            .first()
            .ok_or_else(|| anyhow!("model produced no outputs"))?
            .to_array_view::<f32>()
            .context("landmark tensor was not f32")?;
        let landmark_values: Vec<f32> = landmark_values.iter().copied().collect();

        let score = match outputs.get(1) {
            Some(flag) => {
                let view = flag
                    .to_array_view::<f32>()
                    .context("presence tensor was not f32")?;
                view.iter().next().copied().map(as_probability).unwrap_or(0.0)
            }
            None => 1.0,
        };

        if !self.gate.admit(score) {
            return Ok(None);
        }
        let landmarks = decode_landmarks(&landmark_values, self.input_width, self.input_height)?;
        Ok(Some(Pose::new(landmarks, score)))
    }

    fn warm_up(&mut self) -> Result<()> {
        let blank = Frame::solid(self.input_width, self.input_height, 0, [0, 0, 0])?;
        let input = self.build_input(&blank)?;
        self.model
            .run(tvec!(input.into()))
            .context("ONNX warm-up inference failed")?;
        Ok(())
    }
}

/// Decode a flat landmark tensor into normalized landmarks.
///
/// Coordinates come in input pixels; z shares the x scale.
pub(crate) fn decode_landmarks(
    values: &[f32],
    input_width: u32,
    input_height: u32,
) -> Result<Vec<Landmark>> {
    let available = values.len() / LANDMARK_STRIDE;
    if available < POSE_LANDMARK_COUNT {
        return Err(anyhow!(
            "model produced {} landmarks, expected at least {}",
            available,
            POSE_LANDMARK_COUNT
        ));
    }

    let w = input_width as f32;
    let h = input_height as f32;
    Ok(values
        .chunks_exact(LANDMARK_STRIDE)
        .take(POSE_LANDMARK_COUNT)
        .enumerate()
        .map(|(index, v)| Landmark {
            index: index as u32,
            x: v[0] / w,
            y: v[1] / h,
            z: v[2] / w,
            visibility: as_probability(v[3]),
        })
        .collect())
}

/// Raw model scores may be logits; squash anything outside 0..1.
fn as_probability(value: f32) -> f32 {
    if (0.0..=1.0).contains(&value) {
        value
    } else {
        1.0 / (1.0 + (-value).exp())
    }
}
