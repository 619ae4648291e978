pub mod synthetic;

#[cfg(feature = "backend-tract")]
pub mod tract;

pub use synthetic::SyntheticPoseEstimator;

#[cfg(feature = "backend-tract")]
pub use tract::TractPoseEstimator;
