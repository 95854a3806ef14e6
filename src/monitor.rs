use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use opencv::core::Mat;
use opencv::imgproc;
use thiserror::Error;

use crate::alert::AlertPlayer;
use crate::camera::{Frame, FrameSource};
use crate::detect::{DetectError, Detection, Detector};
use crate::display::{DisplayError, Surface, SurfaceEvent};
use crate::record::{FrameSink, RecordError};

/// Minimum spacing between consecutive "no motion" console lines.
const IDLE_LOG_INTERVAL: Duration = Duration::from_secs(6);

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error(transparent)]
    Detect(#[from] DetectError),
    #[error(transparent)]
    Record(#[from] RecordError),
    #[error(transparent)]
    Display(#[from] DisplayError),
    #[error(transparent)]
    OpenCv(#[from] opencv::Error),
    #[error("status line write failed: {0}")]
    Status(#[from] std::io::Error),
}

/// Mutable state carried across iterations: nothing more than the running
/// flag and the time of the last idle line.
struct SessionState {
    running: bool,
    last_idle_log: Option<Instant>,
}

/// Timestamped console lines, one per loggable event.
pub struct StatusLog {
    out: Box<dyn Write + Send>,
}

impl StatusLog {
    pub fn stdout() -> Self {
        Self::to_writer(Box::new(std::io::stdout()))
    }

    pub fn to_writer(out: Box<dyn Write + Send>) -> Self {
        Self { out }
    }

    fn alert(&mut self, at: DateTime<Local>) -> std::io::Result<()> {
        writeln!(self.out, "{}", alert_line(at))?;
        self.out.flush()
    }

    fn idle(&mut self, at: DateTime<Local>) -> std::io::Result<()> {
        writeln!(self.out, "{}", idle_line(at))?;
        self.out.flush()
    }
}

pub fn alert_line(at: DateTime<Local>) -> String {
    format!("⚠️ ALERT! Motion detected at {}", at.format("%Y-%m-%d %H:%M:%S"))
}

pub fn idle_line(at: DateTime<Local>) -> String {
    format!(
        "System active - No motion detected at {}",
        at.format("%Y-%m-%d %H:%M:%S")
    )
}

/// Drives the capture → detect → react → record → display cycle.
pub struct Monitor {
    source: Box<dyn FrameSource>,
    detectors: Vec<Box<dyn Detector>>,
    sink: Box<dyn FrameSink>,
    alert: Box<dyn AlertPlayer>,
    display: Option<Box<dyn Surface>>,
    status: StatusLog,
    state: SessionState,
}

impl Monitor {
    pub fn new(
        source: Box<dyn FrameSource>,
        detectors: Vec<Box<dyn Detector>>,
        sink: Box<dyn FrameSink>,
        alert: Box<dyn AlertPlayer>,
        display: Option<Box<dyn Surface>>,
        status: StatusLog,
    ) -> Self {
        Self {
            source,
            detectors,
            sink,
            alert,
            display,
            status,
            state: SessionState {
                running: true,
                last_idle_log: None,
            },
        }
    }

    /// Run until the quit key, the shutdown flag, end of stream, or a fault.
    /// Collaborators are released on every exit path.
    pub fn run(mut self, shutdown: Arc<AtomicBool>) -> Result<(), MonitorError> {
        tracing::info!("monitor started");

        let result = self.drive(&shutdown);
        self.release();

        match &result {
            Ok(()) => tracing::info!("monitor stopped"),
            Err(e) => tracing::error!(error = %e, "monitor stopped on fault"),
        }

        result
    }

    fn drive(&mut self, shutdown: &AtomicBool) -> Result<(), MonitorError> {
        while self.state.running {
            let Some(mut frame) = self.source.next_frame() else {
                tracing::info!("frame source exhausted");
                break;
            };

            let detections = self.detect_all(&frame.pixels)?;

            if detections.is_empty() {
                self.log_idle_if_due(&frame)?;
            } else {
                self.status.alert(frame.captured_at)?;
                self.alert.play();
                annotate(&mut frame.pixels, &detections)?;
                tracing::debug!(count = detections.len(), "detections annotated");
            }

            self.sink.append(&frame.pixels)?;

            if let Some(display) = self.display.as_mut() {
                if display.present(&frame.pixels)? == SurfaceEvent::Quit {
                    tracing::info!("quit key received");
                    self.state.running = false;
                }
            }

            if shutdown.load(Ordering::Relaxed) {
                tracing::info!("shutdown flag observed");
                self.state.running = false;
            }
        }

        Ok(())
    }

    fn detect_all(&mut self, pixels: &Mat) -> Result<Vec<Detection>, MonitorError> {
        let mut gray = Mat::default();
        imgproc::cvt_color_def(pixels, &mut gray, imgproc::COLOR_BGR2GRAY)?;

        let mut detections = Vec::new();
        for detector in &mut self.detectors {
            detections.extend(detector.detect(&gray)?);
        }
        Ok(detections)
    }

    fn log_idle_if_due(&mut self, frame: &Frame) -> Result<(), MonitorError> {
        let due = match self.state.last_idle_log {
            Some(last) => frame.instant.duration_since(last) >= IDLE_LOG_INTERVAL,
            None => true,
        };

        if due {
            self.status.idle(frame.captured_at)?;
            self.state.last_idle_log = Some(frame.instant);
        }
        Ok(())
    }

    fn release(&mut self) {
        self.source.release();
        self.sink.release();
        if let Some(display) = self.display.as_mut() {
            display.release();
        }
        self.alert.release();
    }
}

fn annotate(pixels: &mut Mat, detections: &[Detection]) -> Result<(), opencv::Error> {
    for det in detections {
        imgproc::rectangle(pixels, det.rect, det.kind.color(), 2, imgproc::LINE_8, 0)?;
    }
    Ok(())
}
