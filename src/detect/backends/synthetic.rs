use anyhow::Result;

use crate::detect::backend::{PoseEstimator, PresenceGate};
use crate::detect::result::{Landmark, Pose, POSE_LANDMARK_COUNT};
use crate::frame::Frame;

/// Resting position of each of the 33 landmarks, as (x, y, z).
///
/// The figure faces the camera, so the person's left side is on the image's
/// right.
const REST_POSE: [(f32, f32, f32); POSE_LANDMARK_COUNT] = [
    (0.50, 0.20, -0.30), // nose
    (0.52, 0.18, -0.28),
    (0.53, 0.18, -0.28),
    (0.54, 0.18, -0.28),
    (0.48, 0.18, -0.28),
    (0.47, 0.18, -0.28),
    (0.46, 0.18, -0.28),
    (0.56, 0.19, -0.15), // ears
    (0.44, 0.19, -0.15),
    (0.52, 0.23, -0.27), // mouth
    (0.48, 0.23, -0.27),
    (0.60, 0.33, -0.10), // shoulders
    (0.40, 0.33, -0.10),
    (0.65, 0.45, -0.08), // elbows
    (0.35, 0.45, -0.08),
    (0.67, 0.56, -0.12), // wrists
    (0.33, 0.56, -0.12),
    (0.68, 0.59, -0.13), // pinky
    (0.32, 0.59, -0.13),
    (0.67, 0.60, -0.14), // index
    (0.33, 0.60, -0.14),
    (0.66, 0.58, -0.13), // thumb
    (0.34, 0.58, -0.13),
    (0.56, 0.62, 0.00), // hips
    (0.44, 0.62, 0.00),
    (0.57, 0.77, 0.02), // knees
    (0.43, 0.77, 0.02),
    (0.57, 0.92, 0.05), // ankles
    (0.43, 0.92, 0.05),
    (0.57, 0.94, 0.06), // heels
    (0.43, 0.94, 0.06),
    (0.58, 0.96, 0.00), // foot index
    (0.42, 0.96, 0.00),
];

const UPPER_ARM: f32 = 0.12;
const FOREARM: f32 = 0.11;
const PRESENT_SCORE: f32 = 0.9;

/// Synthetic pose estimator.
///
/// Ignores pixel content and animates a waving figure from the frame sequence
/// number, so the relay can run end to end without a model. Optional dropout
/// windows simulate the person leaving the frame.
pub struct SyntheticPoseEstimator {
    gate: PresenceGate,
    dropout: Option<(u64, u64)>,
}

impl SyntheticPoseEstimator {
    pub fn new(gate: PresenceGate) -> Self {
        Self {
            gate,
            dropout: None,
        }
    }

    /// Report no person for `length` frames out of every `period` frames.
    pub fn with_dropouts(mut self, period: u64, length: u64) -> Self {
        if period > 0 {
            self.dropout = Some((period, length.min(period)));
        }
        self
    }

    fn presence_score(&self, sequence: u64) -> f32 {
        match self.dropout {
            Some((period, length)) if sequence % period < length => 0.0,
            _ => PRESENT_SCORE,
        }
    }

    fn animate(sequence: u64) -> Vec<Landmark> {
        let phase = sequence as f32 * 0.1;
        let mut landmarks: Vec<Landmark> = REST_POSE
            .iter()
            .enumerate()
            .map(|(index, &(x, y, z))| Landmark::new(index as u32, x, y, z))
            .collect();

        // Arms swing out of phase. Angles are measured from straight down,
        // positive away from the body; `side` mirrors them onto the image.
        let arms = [(11usize, 13usize, 15usize, 1.0f32, 0.0f32), (12, 14, 16, -1.0, std::f32::consts::PI)];
        for (shoulder, elbow, wrist, side, offset) in arms {
            let swing = (phase + offset).sin();
            let upper = 0.3 + 0.25 * swing;
            let fore = upper + 0.9 * swing.max(0.0);
            let (sx, sy) = (landmarks[shoulder].x, landmarks[shoulder].y);
            let ex = sx + side * UPPER_ARM * upper.sin();
            let ey = sy + UPPER_ARM * upper.cos();

            landmarks[elbow].x = ex;
            landmarks[elbow].y = ey;
            landmarks[wrist].x = ex + side * FOREARM * fore.sin();
            landmarks[wrist].y = ey + FOREARM * fore.cos();
            landmarks[wrist].z = -0.12 + 0.05 * swing;
        }
        landmarks
    }
}

impl Default for SyntheticPoseEstimator {
    fn default() -> Self {
        Self::new(PresenceGate::default())
    }
}

impl PoseEstimator for SyntheticPoseEstimator {
    fn name(&self) -> &'static str {
        "synthetic"
    }

    fn estimate(&mut self, frame: &Frame) -> Result<Option<Pose>> {
        let score = self.presence_score(frame.sequence);
        if !self.gate.admit(score) {
            return Ok(None);
        }
        Ok(Some(Pose::new(Self::animate(frame.sequence), score)))
    }
}
