//! Pose Relay
//!
//! Captures webcam frames, estimates a body pose per frame and forwards a
//! small set of upper-body landmarks as JSON datagrams to a local engine.
//!
//! # Pipeline
//!
//! ```text
//! FrameSource -> PoseEstimator -> filter_landmarks -> PoseEnvelope -> EnvelopeSink
//!                                  \-> annotate -> Presenter
//! ```
//!
//! Forwarded landmarks: 0 Head, 11/12 shoulders, 13/14 elbows, 15/16 wrists.
//! Coordinates are normalized to the frame (`x`, `y` in `[0, 1]`, `z` relative
//! depth with smaller values closer to the camera).
//!
//! # Module Structure
//!
//! - `config`: JSON config file plus environment overrides
//! - `ingest`: frame sources (synthetic, V4L2)
//! - `detect`: pose estimators (synthetic, tract ONNX)
//! - `landmarks`, `envelope`: filtering and the wire record
//! - `transport`: UDP sender and listener
//! - `present`: overlay layout and display surfaces
//! - `relay`: the per-frame loop and ordered shutdown

pub mod config;
pub mod detect;
pub mod envelope;
pub mod frame;
pub mod ingest;
pub mod landmarks;
pub mod present;
pub mod relay;
pub mod transport;

pub use config::RelayConfig;
pub use detect::{Landmark, Pose, PoseEstimator};
pub use envelope::PoseEnvelope;
pub use frame::{CaptureFormat, Frame};
pub use ingest::FrameSource;
pub use landmarks::{filter_landmarks, LabeledLandmark, KEY_LANDMARKS};
pub use present::Presenter;
pub use relay::{start, RelayLoop, RelayState, RelayStats, Startup};
pub use transport::EnvelopeSink;
