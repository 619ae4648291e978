use anyhow::{Context, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::overlay::Annotations;
use super::Presenter;
use crate::frame::Frame;

/// Presenter for machines without a display.
///
/// The overlay is summarized in the debug log and the quit request comes from
/// Ctrl-C instead of a key press.
pub struct HeadlessPresenter {
    quit: Arc<AtomicBool>,
    frames_rendered: u64,
    legend_logged: bool,
}

impl HeadlessPresenter {
    pub fn new() -> Self {
        Self {
            quit: Arc::new(AtomicBool::new(false)),
            frames_rendered: 0,
            legend_logged: false,
        }
    }

    /// Route Ctrl-C to the quit flag. The handler can only be installed once
    /// per process.
    pub fn with_interrupt_handler() -> Result<Self> {
        let presenter = Self::new();
        let quit = presenter.quit_handle();
        ctrlc::set_handler(move || {
            quit.store(true, Ordering::SeqCst);
        })
        .context("error setting Ctrl-C handler")?;
        log::info!("headless mode, press Ctrl-C to quit");
        Ok(presenter)
    }

    /// Shared flag; storing `true` asks the relay to stop.
    pub fn quit_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.quit)
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }
}

impl Default for HeadlessPresenter {
    fn default() -> Self {
        Self::new()
    }
}

impl Presenter for HeadlessPresenter {
    fn render(&mut self, frame: &Frame, annotations: &Annotations) -> Result<()> {
        if !self.legend_logged {
            for line in &annotations.legend {
                log::info!("{}", line.text);
            }
            self.legend_logged = true;
        }
        self.frames_rendered += 1;
        log::debug!(
            "frame {} ({}x{}): {} joints, {} bones, {} labels",
            frame.sequence,
            frame.width,
            frame.height,
            annotations.joints.len(),
            annotations.bones.len(),
            annotations.labels.len()
        );
        Ok(())
    }

    fn quit_requested(&mut self) -> bool {
        self.quit.load(Ordering::SeqCst)
    }

    fn close(&mut self) {
        log::info!("headless presenter closed after {} frames", self.frames_rendered);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::present::annotate;

    #[test]
    fn quit_flag_is_shared() -> Result<()> {
        let mut presenter = HeadlessPresenter::new();
        let frame = Frame::solid(4, 4, 0, [0, 0, 0])?;
        presenter.render(&frame, &annotate(4, 4, None))?;
        assert!(!presenter.quit_requested());

        presenter.quit_handle().store(true, Ordering::SeqCst);
        assert!(presenter.quit_requested());
        assert_eq!(presenter.frames_rendered(), 1);
        Ok(())
    }
}
