use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use opencv::core::{Mat, Size};
use opencv::prelude::*;
use opencv::videoio::VideoWriter;
use thiserror::Error;

/// Footage plays back at this multiple of the capture rate.
pub const PLAYBACK_SPEEDUP: f64 = 4.0;

const CONTAINER_EXT: &str = "mp4";

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("failed to create output directory {}: {source}", .dir.display())]
    CreateDir {
        dir: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to open video writer for {}", .0.display())]
    OpenFailed(PathBuf),
    #[error(transparent)]
    OpenCv(#[from] opencv::Error),
}

pub trait FrameSink: Send {
    fn append(&mut self, frame: &Mat) -> Result<(), RecordError>;
    fn release(&mut self);
}

/// One video file per run, named after the session start time.
pub struct VideoFile {
    writer: VideoWriter,
    path: PathBuf,
    frames_written: u64,
}

impl VideoFile {
    pub fn create(
        output_dir: &Path,
        source_fps: f64,
        frame_size: Size,
    ) -> Result<Self, RecordError> {
        std::fs::create_dir_all(output_dir).map_err(|source| RecordError::CreateDir {
            dir: output_dir.to_path_buf(),
            source,
        })?;

        let path = output_dir.join(output_filename(Local::now()));
        let fourcc = VideoWriter::fourcc('m', 'p', '4', 'v')?;
        let fps = playback_rate(source_fps);

        let writer = VideoWriter::new(path.to_string_lossy().as_ref(), fourcc, fps, frame_size, true)?;
        if !writer.is_opened()? {
            return Err(RecordError::OpenFailed(path));
        }

        tracing::info!(
            path = %path.display(),
            fps,
            width = frame_size.width,
            height = frame_size.height,
            "recording started"
        );

        Ok(Self {
            writer,
            path,
            frames_written: 0,
        })
    }
}

impl FrameSink for VideoFile {
    fn append(&mut self, frame: &Mat) -> Result<(), RecordError> {
        self.writer.write(frame)?;
        self.frames_written += 1;
        Ok(())
    }

    fn release(&mut self) {
        if let Err(e) = self.writer.release() {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to release video writer");
        } else {
            tracing::info!(
                path = %self.path.display(),
                frames = self.frames_written,
                "recording finished"
            );
        }
    }
}

pub fn playback_rate(source_fps: f64) -> f64 {
    source_fps * PLAYBACK_SPEEDUP
}

fn output_filename(started_at: DateTime<Local>) -> String {
    format!(
        "security_footage_{}.{}",
        started_at.format("%Y%m%d_%H%M%S"),
        CONTAINER_EXT
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn output_filename_matches_pattern() {
        let at = Local.with_ymd_and_hms(2025, 3, 14, 15, 9, 26).unwrap();
        assert_eq!(output_filename(at), "security_footage_20250314_150926.mp4");
    }

    #[test]
    fn playback_runs_at_four_times_capture_rate() {
        assert_eq!(playback_rate(10.0), 40.0);
        assert_eq!(playback_rate(29.97), 29.97 * 4.0);
    }
}
