use anyhow::Result;

use crate::detect::result::Pose;
use crate::frame::Frame;

/// Pose estimator trait.
///
/// Implementations receive one frame at a time and return at most one pose.
/// They must treat the frame as read-only and must not retain its pixels
/// beyond the `estimate` call.
pub trait PoseEstimator: Send {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    /// Estimate the pose in a frame.
    ///
    /// `Ok(None)` means no person was found. Landmarks are returned in schema
    /// order.
    fn estimate(&mut self, frame: &Frame) -> Result<Option<Pose>>;

    /// Optional warm-up hook.
    fn warm_up(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Presence hysteresis shared by the estimators.
///
/// A pose is acquired once its presence score reaches the detection threshold
/// and kept while the score stays at or above the (usually lower) tracking
/// threshold.
#[derive(Clone, Copy, Debug)]
pub struct PresenceGate {
    min_detection_confidence: f32,
    min_tracking_confidence: f32,
    tracking: bool,
}

impl PresenceGate {
    pub fn new(min_detection_confidence: f32, min_tracking_confidence: f32) -> Self {
        Self {
            min_detection_confidence,
            min_tracking_confidence,
            tracking: false,
        }
    }

    /// Returns true when a pose with this presence score should be reported.
    pub fn admit(&mut self, score: f32) -> bool {
        let threshold = if self.tracking {
            self.min_tracking_confidence
        } else {
            self.min_detection_confidence
        };
        // NaN scores never pass.
        self.tracking = score >= threshold;
        self.tracking
    }

    pub fn is_tracking(&self) -> bool {
        self.tracking
    }
}

impl Default for PresenceGate {
    fn default() -> Self {
        Self::new(0.7, 0.5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gate_uses_detection_threshold_until_tracking() {
        let mut gate = PresenceGate::new(0.7, 0.5);
        assert!(!gate.admit(0.6));
        assert!(!gate.is_tracking());
        assert!(gate.admit(0.75));
        assert!(gate.is_tracking());
        // Once tracking, the lower threshold applies.
        assert!(gate.admit(0.6));
        assert!(!gate.admit(0.4));
        // Lost: the detection threshold applies again.
        assert!(!gate.admit(0.6));
    }

    #[test]
    fn gate_rejects_nan() {
        let mut gate = PresenceGate::default();
        assert!(!gate.admit(f32::NAN));
    }
}
