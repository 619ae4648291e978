//! Synthetic frame source.
//!
//! `SyntheticSource` stands in for a camera when the configured device starts
//! with `stub://`. It produces a moving gradient at the requested resolution so
//! the whole pipeline can run without hardware.

use anyhow::Result;
use std::time::{Duration, Instant};

use super::{FrameSource, SourceStats};
use crate::frame::{CaptureFormat, Frame};

/// Synthetic frame source for `stub://` devices.
pub struct SyntheticSource {
    device: String,
    format: CaptureFormat,
    frame_count: u64,
    /// Simulated scene state, bumped every 50 frames.
    scene_state: u8,
    paced: bool,
    last_frame_at: Option<Instant>,
    released: bool,
}

impl SyntheticSource {
    pub fn new(device: impl Into<String>, format: CaptureFormat) -> Self {
        Self {
            device: device.into(),
            format,
            frame_count: 0,
            scene_state: 0,
            paced: false,
            last_frame_at: None,
            released: false,
        }
    }

    /// Sleep between frames so the source delivers at the requested rate,
    /// like a real camera would.
    pub fn paced(mut self) -> Self {
        self.paced = true;
        self
    }

    fn wait_for_next_slot(&self) {
        if !self.paced || self.format.fps <= 0.0 {
            return;
        }
        let Some(last) = self.last_frame_at else {
            return;
        };
        let interval = Duration::from_secs_f64(1.0 / self.format.fps);
        let elapsed = last.elapsed();
        if elapsed < interval {
            std::thread::sleep(interval - elapsed);
        }
    }

    fn generate_pixels(&mut self) -> Vec<u8> {
        if self.frame_count % 50 == 0 {
            self.scene_state = self.scene_state.wrapping_add(1);
        }

        let width = self.format.width as usize;
        let height = self.format.height as usize;
        let mut pixels = vec![0u8; width * height * 3];
        for (i, px) in pixels.chunks_exact_mut(3).enumerate() {
            let x = (i % width) as u64;
            let y = (i / width) as u64;
            let shift = self.frame_count + self.scene_state as u64;
            px[0] = ((x + shift) % 256) as u8;
            px[1] = ((y + shift) % 256) as u8;
            px[2] = self.scene_state.wrapping_mul(37);
        }
        pixels
    }
}

impl FrameSource for SyntheticSource {
    fn connect(&mut self) -> Result<CaptureFormat> {
        log::info!(
            "SyntheticSource: connected to {} ({})",
            self.device,
            self.format
        );
        Ok(self.format)
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        if self.released {
            return Ok(None);
        }
        self.wait_for_next_slot();

        self.frame_count += 1;
        self.last_frame_at = Some(Instant::now());
        let pixels = self.generate_pixels();
        let frame = Frame::new(
            pixels,
            self.format.width,
            self.format.height,
            self.frame_count,
        )?;
        Ok(Some(frame))
    }

    fn stats(&self) -> SourceStats {
        SourceStats {
            frames_captured: self.frame_count,
            read_failures: 0,
            device: self.device.clone(),
        }
    }

    fn release(&mut self) {
        self.released = true;
        log::info!("SyntheticSource: released {}", self.device);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    fn format() -> CaptureFormat {
        CaptureFormat {
            width: 32,
            height: 24,
            fps: 30.0,
        }
    }

    #[test]
    fn synthetic_source_produces_sequenced_frames() -> Result<()> {
        let mut source = SyntheticSource::new("stub://test", format());
        source.connect()?;

        let first = source.next_frame()?.ok_or_else(|| anyhow!("no frame"))?;
        let second = source.next_frame()?.ok_or_else(|| anyhow!("no frame"))?;
        assert_eq!(first.width, 32);
        assert_eq!(first.height, 24);
        assert_eq!(first.sequence, 1);
        assert_eq!(second.sequence, 2);
        assert_ne!(first.pixels(), second.pixels());
        assert_eq!(source.stats().frames_captured, 2);
        Ok(())
    }

    #[test]
    fn released_source_ends() -> Result<()> {
        let mut source = SyntheticSource::new("stub://test", format());
        source.connect()?;
        source.release();
        assert!(source.next_frame()?.is_none());
        Ok(())
    }
}
