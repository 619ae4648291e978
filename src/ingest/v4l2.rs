//! V4L2 camera source.
//!
//! `V4l2Source` captures frames from a local V4L2 device (e.g. /dev/video0).
//!
//! The source is responsible for:
//! - Requesting the configured resolution, pixel format and frame rate
//! - Reporting the values the driver actually granted
//! - Normalizing RGB3/YUYV/NV12/MJPG buffers to RGB24 `Frame`s

use anyhow::{anyhow, Context, Result};
use ouroboros::self_referencing;
use std::time::{Duration, Instant};

use super::normalize::{normalize_to_rgb, PixelFormat};
use super::{FrameSource, SourceStats};
use crate::frame::{CaptureFormat, Frame};

/// V4L2 camera source.
pub struct V4l2Source {
    device: String,
    requested: CaptureFormat,
    granted: Option<CaptureFormat>,
    pixel_format: PixelFormat,
    state: Option<V4l2State>,
    frame_count: u64,
    read_failures: u64,
    last_frame_at: Option<Instant>,
    last_error: Option<String>,
}

#[self_referencing]
struct V4l2State {
    device: v4l::Device,
    #[borrows(mut device)]
    #[covariant]
    stream: v4l::prelude::MmapStream<'this, v4l::Device>,
}

impl V4l2Source {
    pub fn new(device: impl Into<String>, requested: CaptureFormat) -> Self {
        Self {
            device: device.into(),
            requested,
            granted: None,
            pixel_format: PixelFormat::Rgb24,
            state: None,
            frame_count: 0,
            read_failures: 0,
            last_frame_at: None,
            last_error: None,
        }
    }

    /// Format granted by the driver, once connected.
    pub fn granted(&self) -> Option<CaptureFormat> {
        self.granted
    }

    fn health_grace(&self) -> Duration {
        let base_ms = if self.requested.fps <= 0.0 {
            2_000.0
        } else {
            (1000.0 / self.requested.fps) * 6.0
        };
        Duration::from_millis(base_ms.max(2_000.0) as u64)
    }
}

impl FrameSource for V4l2Source {
    fn connect(&mut self) -> Result<CaptureFormat> {
        use v4l::buffer::Type;
        use v4l::video::Capture;

        let mut device = v4l::Device::with_path(&self.device)
            .with_context(|| format!("open v4l2 device {}", self.device))?;
        let mut format = device.format().context("read v4l2 format")?;
        format.width = self.requested.width;
        format.height = self.requested.height;
        format.fourcc = v4l::FourCC::new(b"RGB3");

        let format = match device.set_format(&format) {
            Ok(format) => format,
            Err(err) => {
                log::warn!(
                    "V4l2Source: failed to set format on {}: {}",
                    self.device,
                    err
                );
                device
                    .format()
                    .context("read v4l2 format after set failure")?
            }
        };
        self.pixel_format = PixelFormat::from_fourcc(&format.fourcc.repr).ok_or_else(|| {
            anyhow!(
                "v4l2 device {} granted unsupported pixel format {}",
                self.device,
                format.fourcc
            )
        })?;

        if self.requested.fps > 0.0 {
            let params = v4l::video::capture::Parameters::with_fps(self.requested.fps as u32);
            if let Err(err) = device.set_params(&params) {
                log::warn!("V4l2Source: failed to set fps on {}: {}", self.device, err);
            }
        }
        let granted_fps = match device.params() {
            Ok(params) if params.interval.numerator > 0 => {
                params.interval.denominator as f64 / params.interval.numerator as f64
            }
            _ => 0.0,
        };

        let granted = CaptureFormat {
            width: format.width,
            height: format.height,
            fps: granted_fps,
        };
        log::info!(
            "V4l2Source: requested width {}, actual {}",
            self.requested.width,
            granted.width
        );
        log::info!(
            "V4l2Source: requested height {}, actual {}",
            self.requested.height,
            granted.height
        );
        log::info!(
            "V4l2Source: requested fps {:.1}, actual {:.1}",
            self.requested.fps,
            granted.fps
        );

        let state = V4l2StateBuilder {
            device,
            stream_builder: |device| {
                v4l::prelude::MmapStream::with_buffers(device, Type::VideoCapture, 4)
                    .map_err(|err| anyhow::Error::new(err).context("create v4l2 buffer stream"))
            },
        }
        .try_build()
        .map_err(|err| {
            self.last_error = Some(err.to_string());
            err
        })?;
        self.state = Some(state);
        self.granted = Some(granted);
        self.last_error = None;

        log::info!(
            "V4l2Source: connected to {} ({}, {:?})",
            self.device,
            granted,
            self.pixel_format
        );
        Ok(granted)
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        use v4l::io::traits::CaptureStream;

        let granted = self.granted.context("v4l2 device not connected")?;
        let pixel_format = self.pixel_format;
        let state = self.state.as_mut().context("v4l2 device not connected")?;

        let captured = state.with_mut(|fields| -> Result<Vec<u8>> {
            let (buf, meta) = fields.stream.next().context("capture v4l2 frame")?;
            let used = match meta.bytesused as usize {
                0 => buf.len(),
                n => n.min(buf.len()),
            };
            normalize_to_rgb(&buf[..used], granted.width, granted.height, pixel_format)
        });

        let pixels = match captured {
            Ok(pixels) => pixels,
            Err(err) => {
                self.read_failures += 1;
                self.last_error = Some(err.to_string());
                return Err(err);
            }
        };

        self.frame_count += 1;
        self.last_frame_at = Some(Instant::now());
        self.last_error = None;

        let frame = Frame::new(pixels, granted.width, granted.height, self.frame_count)?;
        Ok(Some(frame))
    }

    fn is_healthy(&self) -> bool {
        if self.last_error.is_some() {
            return false;
        }
        let Some(last_frame_at) = self.last_frame_at else {
            return true;
        };
        last_frame_at.elapsed() <= self.health_grace()
    }

    fn stats(&self) -> SourceStats {
        SourceStats {
            frames_captured: self.frame_count,
            read_failures: self.read_failures,
            device: self.device.clone(),
        }
    }

    fn release(&mut self) {
        if self.state.take().is_some() {
            log::info!("V4l2Source: released {}", self.device);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_device_fails_to_connect() {
        let mut source = V4l2Source::new(
            "/dev/video-does-not-exist",
            CaptureFormat {
                width: 640,
                height: 480,
                fps: 30.0,
            },
        );
        assert!(source.connect().is_err());
        assert!(source.next_frame().is_err());
        assert!(source.granted().is_none());
    }
}
