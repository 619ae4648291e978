//! Frame sources.
//!
//! This module provides the sources the relay can capture from:
//! - Synthetic frames for `stub://` devices (demos and tests)
//! - USB/V4L2 cameras (feature: ingest-v4l2)
//!
//! Every source produces RGB24 `Frame`s. Sources are responsible for:
//! - Requesting a resolution and frame rate, and reporting what was granted
//! - Normalizing device pixel formats to RGB24

#[cfg(feature = "ingest-v4l2")]
mod normalize;
pub mod synthetic;
#[cfg(feature = "ingest-v4l2")]
pub mod v4l2;

use anyhow::Result;

use crate::config::CameraSettings;
use crate::frame::{CaptureFormat, Frame};

pub use synthetic::SyntheticSource;
#[cfg(feature = "ingest-v4l2")]
pub use v4l2::V4l2Source;

/// Statistics for a frame source.
#[derive(Clone, Debug, Default)]
pub struct SourceStats {
    pub frames_captured: u64,
    pub read_failures: u64,
    pub device: String,
}

/// A blocking producer of frames.
pub trait FrameSource {
    /// Open the device. Returns the format the device actually granted, which
    /// may differ from what was requested.
    fn connect(&mut self) -> Result<CaptureFormat>;

    /// Block until the next frame is available.
    ///
    /// `Ok(None)` means the source has ended and will not produce more frames.
    /// An `Err` is a per-frame failure; callers may retry.
    fn next_frame(&mut self) -> Result<Option<Frame>>;

    /// Check if the source is healthy.
    fn is_healthy(&self) -> bool {
        true
    }

    fn stats(&self) -> SourceStats;

    /// Release the device. Called exactly once during shutdown.
    fn release(&mut self) {}
}

/// Map a configured device string to a device path.
///
/// A bare camera index such as `0` becomes `/dev/video0`; anything else is used
/// as given.
pub fn resolve_device(device: &str) -> String {
    let trimmed = device.trim();
    if !trimmed.is_empty() && trimmed.bytes().all(|b| b.is_ascii_digit()) {
        format!("/dev/video{}", trimmed)
    } else {
        trimmed.to_string()
    }
}

/// Build the frame source for the configured camera. The source is not
/// connected yet.
pub fn open_source(settings: &CameraSettings) -> Result<Box<dyn FrameSource>> {
    let device = resolve_device(&settings.device);
    if device.starts_with("stub://") {
        return Ok(Box::new(
            SyntheticSource::new(device, settings.requested()).paced(),
        ));
    }

    #[cfg(feature = "ingest-v4l2")]
    {
        Ok(Box::new(V4l2Source::new(device, settings.requested())))
    }
    #[cfg(not(feature = "ingest-v4l2"))]
    {
        Err(anyhow::anyhow!(
            "camera device '{}' requires the ingest-v4l2 feature (use stub:// for synthetic frames)",
            device
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn camera_index_maps_to_device_node() {
        assert_eq!(resolve_device("0"), "/dev/video0");
        assert_eq!(resolve_device(" 2 "), "/dev/video2");
        assert_eq!(resolve_device("/dev/video4"), "/dev/video4");
        assert_eq!(resolve_device("stub://front"), "stub://front");
    }

    #[test]
    fn stub_device_opens_synthetic_source() -> Result<()> {
        let settings = CameraSettings {
            device: "stub://test".to_string(),
            width: 64,
            height: 48,
            fps: 30,
        };
        let mut source = open_source(&settings)?;
        let granted = source.connect()?;
        assert_eq!(granted.width, 64);
        assert_eq!(granted.height, 48);
        let frame = source.next_frame()?.ok_or_else(|| anyhow!("no frame"))?;
        assert_eq!(frame.sequence, 1);
        Ok(())
    }
}
