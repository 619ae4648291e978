//! Operator-facing presentation: overlay layout and the surfaces that show it.

use anyhow::Result;

use crate::frame::Frame;

mod headless;
pub mod overlay;
#[cfg(feature = "display-opencv")]
mod window;

pub use headless::HeadlessPresenter;
pub use overlay::{annotate, Annotations, TextLine, POSE_CONNECTIONS};
#[cfg(feature = "display-opencv")]
pub use window::{WindowPresenter, WINDOW_TITLE};

/// A surface that shows annotated frames and reports quit requests.
pub trait Presenter {
    fn render(&mut self, frame: &Frame, annotations: &Annotations) -> Result<()>;

    /// Polled once per iteration after `render`.
    fn quit_requested(&mut self) -> bool;

    /// Release the surface. Called once during shutdown.
    fn close(&mut self) {}
}
