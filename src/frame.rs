//! Captured frame container.
//!
//! - `Frame`: one RGB24 image produced by a frame source.
//! - `CaptureFormat`: resolution and frame rate negotiated with the device.
//!
//! A frame is owned by one loop iteration and dropped once it has been
//! estimated and rendered.

use anyhow::{anyhow, Result};
use std::time::{Duration, Instant};

// ----------------------------------------------------------------------------
// Frame
// ----------------------------------------------------------------------------

/// One captured RGB24 frame.
pub struct Frame {
    /// Packed RGB pixels, row-major, `width * height * 3` bytes.
    pixels: Vec<u8>,

    pub width: u32,
    pub height: u32,

    /// Monotonic sequence number assigned by the source (starts at 1).
    pub sequence: u64,

    captured_at: Instant,
}

impl Frame {
    /// Wrap an RGB24 buffer. Fails when the buffer length does not match the
    /// dimensions.
    pub fn new(pixels: Vec<u8>, width: u32, height: u32, sequence: u64) -> Result<Self> {
        let expected = rgb_len(width, height)?;
        if pixels.len() != expected {
            return Err(anyhow!(
                "frame buffer length mismatch: expected {} bytes for {}x{}, got {}",
                expected,
                width,
                height,
                pixels.len()
            ));
        }
        Ok(Self {
            pixels,
            width,
            height,
            sequence,
            captured_at: Instant::now(),
        })
    }

    /// A frame filled with a single colour.
    pub fn solid(width: u32, height: u32, sequence: u64, rgb: [u8; 3]) -> Result<Self> {
        let len = rgb_len(width, height)?;
        let mut pixels = Vec::with_capacity(len);
        for _ in 0..len / 3 {
            pixels.extend_from_slice(&rgb);
        }
        Self::new(pixels, width, height, sequence)
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Mutable pixel access for presenters that draw in place.
    pub fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    pub fn age(&self) -> Duration {
        self.captured_at.elapsed()
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("sequence", &self.sequence)
            .field("bytes", &self.pixels.len())
            .finish()
    }
}

/// Byte length of an RGB24 buffer with the given dimensions.
pub(crate) fn rgb_len(width: u32, height: u32) -> Result<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(3))
        .ok_or_else(|| anyhow!("frame dimensions overflow"))
}

// ----------------------------------------------------------------------------
// CaptureFormat
// ----------------------------------------------------------------------------

/// Resolution and frame rate, either requested from or granted by a device.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CaptureFormat {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
}

impl std::fmt::Display for CaptureFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{} @ {:.1} fps", self.width, self.height, self.fps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_rejects_mismatched_buffer() {
        let err = Frame::new(vec![0u8; 10], 2, 2, 1).unwrap_err();
        assert!(err.to_string().contains("length mismatch"));
    }

    #[test]
    fn solid_frame_fills_every_pixel() -> Result<()> {
        let frame = Frame::solid(3, 2, 7, [1, 2, 3])?;
        assert_eq!(frame.pixels().len(), 18);
        assert!(frame.pixels().chunks(3).all(|px| px == [1, 2, 3]));
        assert_eq!(frame.sequence, 7);
        Ok(())
    }

    #[test]
    fn capture_format_display() {
        let format = CaptureFormat {
            width: 1280,
            height: 720,
            fps: 30.0,
        };
        assert_eq!(format.to_string(), "1280x720 @ 30.0 fps");
    }
}
