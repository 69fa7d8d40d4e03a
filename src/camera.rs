// src/camera.rs
//
// OpenCV camera capture, annotation drawing and display window. This is
// the thin I/O edge of the system; everything interesting happens in
// the pipeline.

#![cfg(feature = "camera-opencv")]

use crate::pipeline::FrameSummary;
use crate::types::Frame;
use anyhow::Result;
use opencv::{
    core::{Mat, Point, Rect, Scalar},
    highgui, imgproc,
    prelude::*,
    videoio::{self, VideoCapture, VideoCaptureTrait, VideoCaptureTraitConst},
};
use tracing::{info, warn};

pub struct Camera {
    cap: VideoCapture,
}

impl Camera {
    pub fn open(index: i32) -> Result<Self> {
        info!("Opening camera {}", index);
        let cap = VideoCapture::new(index, videoio::CAP_ANY)?;
        if !cap.is_opened()? {
            anyhow::bail!("Failed to open camera {}", index);
        }
        Ok(Self { cap })
    }

    /// Grabs the next frame as BGR `Mat` plus an RGB copy for the model.
    /// `None` means end-of-stream: the caller exits the loop gracefully.
    pub fn read(&mut self) -> Result<Option<(Mat, Frame)>> {
        let mut bgr = Mat::default();
        if !self.cap.read(&mut bgr)? || bgr.empty() {
            warn!("Camera read failed, treating as end of stream");
            return Ok(None);
        }

        let mut rgb = Mat::default();
        imgproc::cvt_color(&bgr, &mut rgb, imgproc::COLOR_BGR2RGB, 0)?;

        let width = rgb.cols() as u32;
        let height = rgb.rows() as u32;
        let data = rgb.data_bytes()?.to_vec();

        Ok(Some((
            bgr,
            Frame {
                data,
                width,
                height,
                timestamp: 0.0,
            },
        )))
    }
}

/// Draws the pipeline's overlay data onto the BGR display frame:
/// red boxes with labels and the black timestamp banner.
pub fn draw_overlays(frame: &mut Mat, summary: &FrameSummary) -> Result<()> {
    let red = Scalar::new(0.0, 0.0, 255.0, 0.0);

    for overlay in &summary.overlays {
        let rect = Rect::new(
            overlay.bbox.x,
            overlay.bbox.y,
            overlay.bbox.width,
            overlay.bbox.height,
        );
        imgproc::rectangle(frame, rect, red, 2, imgproc::LINE_8, 0)?;
        imgproc::put_text(
            frame,
            &overlay.label,
            Point::new(overlay.bbox.x, overlay.bbox.y - 6),
            imgproc::FONT_HERSHEY_SIMPLEX,
            0.55,
            red,
            2,
            imgproc::LINE_8,
            false,
        )?;
    }

    let banner = Rect::new(0, 0, frame.cols(), 35);
    imgproc::rectangle(
        frame,
        banner,
        Scalar::new(0.0, 0.0, 0.0, 0.0),
        -1,
        imgproc::LINE_8,
        0,
    )?;
    imgproc::put_text(
        frame,
        &summary.banner,
        Point::new(10, 25),
        imgproc::FONT_HERSHEY_SIMPLEX,
        0.7,
        Scalar::new(255.0, 255.0, 255.0, 0.0),
        2,
        imgproc::LINE_8,
        false,
    )?;

    Ok(())
}

/// Shows the annotated frame; returns false when the operator quits
/// with 'q'.
pub fn show(window: &str, frame: &Mat) -> Result<bool> {
    highgui::imshow(window, frame)?;
    let key = highgui::wait_key(1)?;
    Ok(key != i32::from(b'q'))
}
