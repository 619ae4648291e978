use std::cell::Cell;
use std::rc::Rc;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};

use pose_relay::config::CameraSettings;
use pose_relay::detect::SyntheticPoseEstimator;
use pose_relay::present::{HeadlessPresenter, Presenter};
use pose_relay::transport::{EnvelopeSink, SinkStats};
use pose_relay::{start, PoseEnvelope, RelayState, Startup};

#[derive(Default)]
struct ClosingSink {
    closed: Arc<Mutex<u32>>,
    stats: SinkStats,
}

impl EnvelopeSink for ClosingSink {
    fn send(&mut self, envelope: &PoseEnvelope) -> Result<usize> {
        self.stats.datagrams_sent += 1;
        Ok(envelope.to_json_bytes()?.len())
    }

    fn stats(&self) -> SinkStats {
        self.stats
    }

    fn close(&mut self) {
        *self.closed.lock().unwrap() += 1;
    }
}

fn camera(device: &str) -> CameraSettings {
    CameraSettings {
        device: device.to_string(),
        width: 64,
        height: 48,
        fps: 30,
    }
}

fn sink() -> (Box<dyn EnvelopeSink>, Arc<Mutex<u32>>) {
    let sink = ClosingSink::default();
    let closed = Arc::clone(&sink.closed);
    (Box::new(sink), closed)
}

#[test]
fn unopenable_camera_closes_the_socket_and_is_not_an_error() -> Result<()> {
    let (sink, closed) = sink();
    let presenter_opened = Rc::new(Cell::new(false));
    let flag = Rc::clone(&presenter_opened);

    let startup = start(
        &camera("/dev/pose-relay-missing-camera"),
        Box::new(SyntheticPoseEstimator::default()),
        sink,
        move |_format| {
            flag.set(true);
            Ok(Box::new(HeadlessPresenter::new()) as Box<dyn Presenter>)
        },
    )?;

    assert!(matches!(startup, Startup::CameraUnavailable));
    assert_eq!(*closed.lock().unwrap(), 1);
    assert!(!presenter_opened.get());
    Ok(())
}

#[test]
fn presenter_failure_releases_everything_and_propagates() {
    let (sink, closed) = sink();
    let result = start(
        &camera("stub://desk"),
        Box::new(SyntheticPoseEstimator::default()),
        sink,
        |_format| Err(anyhow!("no display attached")),
    );

    let err = result.err().unwrap();
    assert!(err.to_string().contains("no display attached"));
    assert_eq!(*closed.lock().unwrap(), 1);
}

#[test]
fn openable_camera_yields_a_running_loop() -> Result<()> {
    let (sink, closed) = sink();
    let startup = start(
        &camera("stub://desk"),
        Box::new(SyntheticPoseEstimator::default()),
        sink,
        |format| {
            assert_eq!((format.width, format.height), (64, 48));
            Ok(Box::new(HeadlessPresenter::new()) as Box<dyn Presenter>)
        },
    )?;

    let Startup::Ready(relay) = startup else {
        panic!("stub camera should open");
    };
    let mut relay = relay.with_frame_limit(Some(2));
    assert_eq!(relay.state(), RelayState::Running);
    assert_eq!(*closed.lock().unwrap(), 0);

    let stats = relay.run();
    assert_eq!(stats.frames_processed, 2);
    assert_eq!(stats.datagrams_sent, 2);
    assert_eq!(*closed.lock().unwrap(), 1);
    Ok(())
}
