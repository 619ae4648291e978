//! pose_relay - stream upper-body pose landmarks from a webcam over UDP.
//!
//! 1. Opens the UDP transport (loopback by default)
//! 2. Builds the configured pose estimator
//! 3. Opens the camera at the requested resolution and frame rate
//! 4. Runs the relay loop until quit, end of stream or the frame limit
//! 5. Releases the camera, display and socket in that order

use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use pose_relay::detect::build_estimator;
use pose_relay::present::{HeadlessPresenter, Presenter};
use pose_relay::transport::UdpSender;
use pose_relay::{start, RelayConfig, Startup};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum DisplayMode {
    /// Log the overlay; Ctrl-C quits.
    Headless,
    /// OpenCV window; 'q' quits (requires the display-opencv feature).
    Window,
}

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Stream webcam pose landmarks to a local engine over UDP"
)]
struct Args {
    /// JSON config file. Environment overrides still apply.
    #[arg(long, env = "POSE_RELAY_CONFIG")]
    config: Option<PathBuf>,

    /// Stop after this many frames.
    #[arg(long)]
    frames: Option<u64>,

    #[arg(long, value_enum, default_value_t = DisplayMode::Headless)]
    display: DisplayMode,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let cfg = RelayConfig::load_from(args.config.as_deref())?;
    log::info!(
        "camera={} requested={} destination={} estimator={}",
        cfg.camera.device,
        cfg.camera.requested(),
        cfg.transport.udp_addr,
        cfg.estimator.backend
    );

    let sender = UdpSender::bind(&cfg.transport)?;
    let estimator = build_estimator(&cfg.estimator)?;

    let startup = start(&cfg.camera, estimator, Box::new(sender), |format| {
        open_presenter(args.display, format.width, format.height)
    })?;
    let Startup::Ready(relay) = startup else {
        return Ok(());
    };

    let mut relay = relay.with_frame_limit(args.frames);
    let stats = relay.run();
    log::info!("Cleaning up: {}", stats);
    Ok(())
}

#[cfg(feature = "display-opencv")]
fn open_presenter(mode: DisplayMode, width: u32, height: u32) -> Result<Box<dyn Presenter>> {
    match mode {
        DisplayMode::Headless => Ok(Box::new(HeadlessPresenter::with_interrupt_handler()?)),
        DisplayMode::Window => Ok(Box::new(pose_relay::present::WindowPresenter::open(
            width, height,
        )?)),
    }
}

#[cfg(not(feature = "display-opencv"))]
fn open_presenter(mode: DisplayMode, _width: u32, _height: u32) -> Result<Box<dyn Presenter>> {
    if mode == DisplayMode::Window {
        return Err(anyhow::anyhow!(
            "window display requires the display-opencv feature.\n\
             Recompile with: cargo build --features display-opencv"
        ));
    }
    Ok(Box::new(HeadlessPresenter::with_interrupt_handler()?))
}
