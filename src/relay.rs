//! The per-frame relay loop.
//!
//! Each iteration acquires a frame, estimates a pose, forwards the key
//! landmarks as one datagram, renders the overlay and polls for quit. The loop
//! owns the camera, display surface and socket and releases them in that order
//! when it stops, including when it is dropped during unwinding.

use anyhow::Result;
use std::time::{Duration, Instant};

use crate::config::CameraSettings;
use crate::detect::{Pose, PoseEstimator};
use crate::envelope::PoseEnvelope;
use crate::frame::CaptureFormat;
use crate::ingest::{open_source, FrameSource};
use crate::present::{annotate, Presenter};
use crate::transport::EnvelopeSink;

const HEALTH_LOG_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RelayState {
    Running,
    /// Terminal. Resources are released on entry to this state.
    ShuttingDown,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RelayStats {
    pub frames_processed: u64,
    pub read_failures: u64,
    pub poses_detected: u64,
    pub datagrams_sent: u64,
    pub send_failures: u64,
    pub estimator_failures: u64,
    pub render_failures: u64,
}

impl std::fmt::Display for RelayStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "frames={} poses={} sent={} send_failures={} read_failures={} estimator_failures={} render_failures={}",
            self.frames_processed,
            self.poses_detected,
            self.datagrams_sent,
            self.send_failures,
            self.read_failures,
            self.estimator_failures,
            self.render_failures
        )
    }
}

pub struct RelayLoop {
    state: RelayState,
    source: Option<Box<dyn FrameSource>>,
    estimator: Box<dyn PoseEstimator>,
    presenter: Option<Box<dyn Presenter>>,
    sink: Option<Box<dyn EnvelopeSink>>,
    frame_limit: Option<u64>,
    stats: RelayStats,
    last_health_log: Instant,
}

impl RelayLoop {
    /// Assemble a loop from already opened parts. The source must be connected.
    pub fn new(
        source: Box<dyn FrameSource>,
        estimator: Box<dyn PoseEstimator>,
        presenter: Box<dyn Presenter>,
        sink: Box<dyn EnvelopeSink>,
    ) -> Self {
        Self {
            state: RelayState::Running,
            source: Some(source),
            estimator,
            presenter: Some(presenter),
            sink: Some(sink),
            frame_limit: None,
            stats: RelayStats::default(),
            last_health_log: Instant::now(),
        }
    }

    /// Stop after this many frames have been processed.
    pub fn with_frame_limit(mut self, limit: Option<u64>) -> Self {
        self.frame_limit = limit;
        self
    }

    pub fn state(&self) -> RelayState {
        self.state
    }

    pub fn stats(&self) -> RelayStats {
        self.stats
    }

    /// Run one iteration and return the resulting state.
    pub fn step(&mut self) -> RelayState {
        if self.state == RelayState::ShuttingDown {
            return self.state;
        }
        let Some(source) = self.source.as_mut() else {
            self.state = RelayState::ShuttingDown;
            return self.state;
        };

        let frame = match source.next_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                log::info!("frame source ended");
                self.state = RelayState::ShuttingDown;
                return self.state;
            }
            Err(e) => {
                self.stats.read_failures += 1;
                log::warn!("failed to read frame: {:#}", e);
                self.poll_quit();
                self.log_health_if_due();
                return self.state;
            }
        };
        self.stats.frames_processed += 1;

        let pose = match self.estimator.estimate(&frame) {
            Ok(pose) => pose.filter(|p| !p.is_empty()),
            Err(e) => {
                self.stats.estimator_failures += 1;
                log::warn!("pose estimation failed on frame {}: {:#}", frame.sequence, e);
                None
            }
        };

        let annotations = annotate(frame.width, frame.height, pose.as_ref());
        if let Some(pose) = &pose {
            self.stats.poses_detected += 1;
            self.forward(pose);
        }

        if let Some(presenter) = self.presenter.as_mut() {
            if let Err(e) = presenter.render(&frame, &annotations) {
                self.stats.render_failures += 1;
                log::warn!("failed to render frame {}: {:#}", frame.sequence, e);
            }
        }
        self.poll_quit();

        if let Some(limit) = self.frame_limit {
            if self.stats.frames_processed >= limit {
                log::info!("frame limit of {} reached", limit);
                self.state = RelayState::ShuttingDown;
            }
        }
        self.log_health_if_due();
        self.state
    }

    /// Iterate until a stop condition, then release everything.
    pub fn run(&mut self) -> RelayStats {
        log::info!("relay running");
        while self.step() == RelayState::Running {}
        self.shutdown();
        self.stats
    }

    /// Release the camera, then the display, then the socket. Safe to call
    /// more than once.
    pub fn shutdown(&mut self) {
        self.state = RelayState::ShuttingDown;
        if let Some(mut source) = self.source.take() {
            source.release();
            log::info!("camera released");
        }
        if let Some(mut presenter) = self.presenter.take() {
            presenter.close();
        }
        if let Some(mut sink) = self.sink.take() {
            sink.close();
        }
    }

    fn forward(&mut self, pose: &Pose) {
        let envelope = PoseEnvelope::from_pose(pose);
        for lm in &envelope.pose {
            log::info!(
                "{} ({}): x={:.3}, y={:.3}, z={:.3}",
                lm.name,
                lm.index,
                lm.x,
                lm.y,
                lm.z
            );
        }

        let Some(sink) = self.sink.as_mut() else {
            return;
        };
        match sink.send(&envelope) {
            Ok(_) => self.stats.datagrams_sent += 1,
            Err(e) => {
                self.stats.send_failures += 1;
                log::warn!("failed to send pose datagram: {:#}", e);
            }
        }
    }

    fn poll_quit(&mut self) {
        let quit = self
            .presenter
            .as_mut()
            .map(|p| p.quit_requested())
            .unwrap_or(false);
        if quit {
            log::info!("quit requested");
            self.state = RelayState::ShuttingDown;
        }
    }

    fn log_health_if_due(&mut self) {
        if self.last_health_log.elapsed() < HEALTH_LOG_INTERVAL {
            return;
        }
        let (healthy, device) = match self.source.as_ref() {
            Some(source) => (source.is_healthy(), source.stats().device),
            None => (false, String::new()),
        };
        log::info!("camera health={} {} device={}", healthy, self.stats, device);
        self.last_health_log = Instant::now();
    }
}

impl Drop for RelayLoop {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Outcome of bringing the relay up.
pub enum Startup {
    Ready(RelayLoop),
    /// The camera could not be opened. The sink has already been closed.
    CameraUnavailable,
}

/// Open and connect the configured camera, then the presenter, and assemble
/// the loop around the already bound sink.
///
/// An unopenable camera is logged and reported as `CameraUnavailable`, not as
/// an error. A presenter failure releases the camera and closes the sink before
/// the error is returned.
pub fn start<F>(
    camera: &CameraSettings,
    estimator: Box<dyn PoseEstimator>,
    mut sink: Box<dyn EnvelopeSink>,
    open_presenter: F,
) -> Result<Startup>
where
    F: FnOnce(CaptureFormat) -> Result<Box<dyn Presenter>>,
{
    let mut source = match open_source(camera) {
        Ok(source) => source,
        Err(e) => return Ok(camera_unavailable(camera, &e, &mut *sink)),
    };
    let format = match source.connect() {
        Ok(format) => format,
        Err(e) => {
            source.release();
            return Ok(camera_unavailable(camera, &e, &mut *sink));
        }
    };
    log::info!("camera opened at {}", format);

    let presenter = match open_presenter(format) {
        Ok(presenter) => presenter,
        Err(e) => {
            source.release();
            sink.close();
            return Err(e);
        }
    };
    Ok(Startup::Ready(RelayLoop::new(
        source, estimator, presenter, sink,
    )))
}

fn camera_unavailable(
    camera: &CameraSettings,
    err: &anyhow::Error,
    sink: &mut dyn EnvelopeSink,
) -> Startup {
    log::error!("could not open camera {}: {:#}", camera.device, err);
    sink.close();
    Startup::CameraUnavailable
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_line_reports_every_counter() {
        let stats = RelayStats {
            frames_processed: 120,
            read_failures: 1,
            poses_detected: 90,
            datagrams_sent: 89,
            send_failures: 1,
            estimator_failures: 4,
            render_failures: 2,
        };
        assert_eq!(
            stats.to_string(),
            "frames=120 poses=90 sent=89 send_failures=1 read_failures=1 estimator_failures=4 render_failures=2"
        );
    }
}
