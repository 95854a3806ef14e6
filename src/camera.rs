use std::time::Instant;

use chrono::{DateTime, Local};
use opencv::core::{Mat, Size};
use opencv::prelude::*;
use opencv::videoio::{self, VideoCapture};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CameraError {
    #[error("failed to open camera device {0}")]
    OpenFailed(i32),
    #[error("camera device {0} reports no frame rate")]
    UnknownFrameRate(i32),
    #[error("camera device {0} reports zero resolution")]
    UnknownResolution(i32),
    #[error(transparent)]
    OpenCv(#[from] opencv::Error),
}

/// One captured image plus its capture times. `captured_at` feeds the
/// console lines, `instant` drives the idle-log interval.
pub struct Frame {
    pub pixels: Mat,
    pub captured_at: DateTime<Local>,
    pub instant: Instant,
}

pub trait FrameSource: Send {
    fn frame_rate(&self) -> f64;
    fn frame_size(&self) -> Size;
    /// `None` means the source is exhausted; the monitor treats that as a
    /// normal end of stream, never as an error.
    fn next_frame(&mut self) -> Option<Frame>;
    fn release(&mut self);
}

pub struct Camera {
    capture: VideoCapture,
    device: i32,
    frame_rate: f64,
    frame_size: Size,
}

impl Camera {
    pub fn open(device: i32) -> Result<Self, CameraError> {
        let capture = VideoCapture::new(device, videoio::CAP_ANY)?;
        if !capture.is_opened()? {
            return Err(CameraError::OpenFailed(device));
        }

        let frame_rate = capture.get(videoio::CAP_PROP_FPS)?;
        let width = capture.get(videoio::CAP_PROP_FRAME_WIDTH)? as i32;
        let height = capture.get(videoio::CAP_PROP_FRAME_HEIGHT)? as i32;

        // The recorder is sized from these up front, so they must be known.
        if frame_rate <= 0.0 {
            return Err(CameraError::UnknownFrameRate(device));
        }
        if width <= 0 || height <= 0 {
            return Err(CameraError::UnknownResolution(device));
        }

        tracing::info!(
            device,
            fps = frame_rate,
            width,
            height,
            "camera opened"
        );

        Ok(Self {
            capture,
            device,
            frame_rate,
            frame_size: Size::new(width, height),
        })
    }
}

impl FrameSource for Camera {
    fn frame_rate(&self) -> f64 {
        self.frame_rate
    }

    fn frame_size(&self) -> Size {
        self.frame_size
    }

    fn next_frame(&mut self) -> Option<Frame> {
        let mut pixels = Mat::default();
        match self.capture.read(&mut pixels) {
            Ok(true) if !pixels.empty() => Some(Frame {
                pixels,
                captured_at: Local::now(),
                instant: Instant::now(),
            }),
            Ok(_) => {
                tracing::info!(device = self.device, "camera returned no frame");
                None
            }
            Err(e) => {
                tracing::warn!(device = self.device, error = %e, "frame read failed, ending stream");
                None
            }
        }
    }

    fn release(&mut self) {
        if let Err(e) = self.capture.release() {
            tracing::warn!(device = self.device, error = %e, "failed to release camera");
        } else {
            tracing::debug!(device = self.device, "camera released");
        }
    }
}
