//! Pose estimation.
//!
//! Estimators turn one frame into at most one `Pose` in the 33-landmark body
//! schema. The relay only depends on the `PoseEstimator` trait; which backend
//! runs is decided by configuration:
//! - `synthetic`: animated figure, no model (default)
//! - `tract`: ONNX landmark model (feature: backend-tract)

mod backend;
mod backends;
mod result;

use anyhow::Result;

use crate::config::{EstimatorKind, EstimatorSettings};

pub use backend::{PoseEstimator, PresenceGate};
pub use backends::SyntheticPoseEstimator;
#[cfg(feature = "backend-tract")]
pub use backends::TractPoseEstimator;
pub use result::{Landmark, Pose, POSE_LANDMARK_COUNT};

/// Build the configured estimator and run its warm-up hook.
pub fn build_estimator(settings: &EstimatorSettings) -> Result<Box<dyn PoseEstimator>> {
    let gate = PresenceGate::new(
        settings.min_detection_confidence,
        settings.min_tracking_confidence,
    );
    let mut estimator: Box<dyn PoseEstimator> = match settings.backend {
        EstimatorKind::Synthetic => Box::new(SyntheticPoseEstimator::new(gate)),
        EstimatorKind::Tract => build_tract(settings, gate)?,
    };
    estimator.warm_up()?;
    log::info!("pose estimator ready: {}", estimator.name());
    Ok(estimator)
}

#[cfg(feature = "backend-tract")]
fn build_tract(settings: &EstimatorSettings, gate: PresenceGate) -> Result<Box<dyn PoseEstimator>> {
    let model_path = settings
        .model_path
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("tract estimator requires estimator.model_path"))?;
    let estimator =
        TractPoseEstimator::new(model_path, settings.input_width, settings.input_height)?
            .with_gate(gate);
    Ok(Box::new(estimator))
}

#[cfg(not(feature = "backend-tract"))]
fn build_tract(
    _settings: &EstimatorSettings,
    _gate: PresenceGate,
) -> Result<Box<dyn PoseEstimator>> {
    Err(anyhow::anyhow!(
        "estimator backend 'tract' requires the backend-tract feature.\n\
         Recompile with: cargo build --features backend-tract"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_synthetic_by_default() -> Result<()> {
        let estimator = build_estimator(&EstimatorSettings::default())?;
        assert_eq!(estimator.name(), "synthetic");
        Ok(())
    }

    #[cfg(not(feature = "backend-tract"))]
    #[test]
    fn tract_without_feature_is_rejected() {
        let settings = EstimatorSettings {
            backend: EstimatorKind::Tract,
            ..EstimatorSettings::default()
        };
        let err = build_estimator(&settings).err().unwrap();
        assert!(err.to_string().contains("backend-tract"));
    }
}
