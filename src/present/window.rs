#![cfg(feature = "display-opencv")]

use anyhow::{Context, Result};
use opencv::core::{Mat, Point, Rect, Scalar, CV_8UC3};
use opencv::prelude::*;
use opencv::{highgui, imgproc};

use super::overlay::{Annotations, TextLine};
use super::Presenter;
use crate::frame::Frame;

pub const WINDOW_TITLE: &str = "Pose Relay";

const QUIT_KEY: i32 = b'q' as i32;

// BGR
const BONE_COLOR: (f64, f64, f64) = (255.0, 0.0, 0.0);
const JOINT_COLOR: (f64, f64, f64) = (0.0, 255.0, 0.0);
const LABEL_COLOR: (f64, f64, f64) = (255.0, 255.0, 255.0);
const LEGEND_COLOR: (f64, f64, f64) = (0.0, 255.0, 255.0);

/// On-screen operator view backed by an OpenCV highgui window.
pub struct WindowPresenter {
    canvas: Mat,
    last_key: i32,
    open: bool,
}

impl WindowPresenter {
    /// Open a resizable window sized to the capture format.
    pub fn open(width: u32, height: u32) -> Result<Self> {
        highgui::named_window(WINDOW_TITLE, highgui::WINDOW_NORMAL)
            .context("create display window")?;
        highgui::resize_window(WINDOW_TITLE, width as i32, height as i32)
            .context("resize display window")?;
        log::info!("display window \"{}\" opened, press 'q' to quit", WINDOW_TITLE);
        Ok(Self {
            canvas: Mat::default(),
            last_key: -1,
            open: true,
        })
    }

    fn load_frame(&mut self, frame: &Frame) -> Result<()> {
        let (rows, cols) = (frame.height as i32, frame.width as i32);
        if self.canvas.rows() != rows || self.canvas.cols() != cols {
            self.canvas = Mat::new_rows_cols_with_default(rows, cols, CV_8UC3, Scalar::all(0.0))
                .context("allocate display canvas")?;
        }
        let canvas = self.canvas.data_bytes_mut().context("map display canvas")?;
        for (dst, src) in canvas.chunks_exact_mut(3).zip(frame.pixels().chunks_exact(3)) {
            dst[0] = src[2];
            dst[1] = src[1];
            dst[2] = src[0];
        }
        Ok(())
    }

    fn draw(&mut self, annotations: &Annotations) -> opencv::Result<()> {
        for &((x1, y1), (x2, y2)) in &annotations.bones {
            imgproc::line(
                &mut self.canvas,
                Point::new(x1, y1),
                Point::new(x2, y2),
                color(BONE_COLOR),
                5,
                imgproc::LINE_8,
                0,
            )?;
        }
        for &(x, y) in &annotations.joints {
            imgproc::circle(
                &mut self.canvas,
                Point::new(x, y),
                5,
                color(JOINT_COLOR),
                5,
                imgproc::LINE_8,
                0,
            )?;
        }
        for label in &annotations.labels {
            self.draw_text(label, color(LABEL_COLOR))?;
        }
        for line in &annotations.legend {
            self.draw_text(line, color(LEGEND_COLOR))?;
        }
        Ok(())
    }

    fn draw_text(&mut self, line: &TextLine, fill: Scalar) -> opencv::Result<()> {
        let (x, y) = line.anchor;
        let origin = if line.backdrop {
            let mut baseline = 0;
            let size = imgproc::get_text_size(
                &line.text,
                imgproc::FONT_HERSHEY_SIMPLEX,
                line.scale,
                line.thickness,
                &mut baseline,
            )?;
            imgproc::rectangle(
                &mut self.canvas,
                Rect::new(x, y - size.height - 4, size.width, size.height + 4),
                Scalar::all(0.0),
                -1,
                imgproc::LINE_8,
                0,
            )?;
            Point::new(x, y - 5)
        } else {
            Point::new(x, y)
        };
        imgproc::put_text(
            &mut self.canvas,
            &line.text,
            origin,
            imgproc::FONT_HERSHEY_SIMPLEX,
            line.scale,
            fill,
            line.thickness,
            imgproc::LINE_AA,
            false,
        )
    }
}

impl Presenter for WindowPresenter {
    fn render(&mut self, frame: &Frame, annotations: &Annotations) -> Result<()> {
        self.load_frame(frame)?;
        self.draw(annotations).context("draw overlay")?;
        highgui::imshow(WINDOW_TITLE, &self.canvas).context("show frame")?;
        self.last_key = highgui::wait_key(1).context("poll keyboard")?;
        Ok(())
    }

    fn quit_requested(&mut self) -> bool {
        self.last_key & 0xFF == QUIT_KEY
    }

    fn close(&mut self) {
        if !self.open {
            return;
        }
        self.open = false;
        if let Err(e) = highgui::destroy_window(WINDOW_TITLE) {
            log::warn!("failed to destroy display window: {}", e);
        }
        log::info!("display window closed");
    }
}

fn color((b, g, r): (f64, f64, f64)) -> Scalar {
    Scalar::new(b, g, r, 0.0)
}
