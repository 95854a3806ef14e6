use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AlertError {
    #[error("alert clip missing: {}", .0.display())]
    ClipMissing(PathBuf),
}

/// Plays the alert clip without ever blocking the caller.
pub trait AlertPlayer: Send {
    fn play(&self);
    fn release(&mut self) {}
}

/// Spawns one detached `ffplay` process per alert. Overlapping alerts play
/// concurrently; nothing is queued or joined.
pub struct FfplayAlert {
    clip: PathBuf,
}

impl FfplayAlert {
    pub fn new(clip: &Path) -> Result<Self, AlertError> {
        if !clip.is_file() {
            return Err(AlertError::ClipMissing(clip.to_path_buf()));
        }

        Ok(Self {
            clip: clip.to_path_buf(),
        })
    }
}

impl AlertPlayer for FfplayAlert {
    fn play(&self) {
        let clip = self.clip.clone();
        thread::spawn(move || {
            let spawned = Command::new("ffplay")
                .args(["-hide_banner", "-loglevel", "quiet", "-nodisp", "-autoexit"])
                .arg(&clip)
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .spawn();

            match spawned {
                Ok(mut child) => {
                    // Reap the player so finished processes do not linger.
                    let _ = child.wait();
                }
                Err(e) => {
                    tracing::warn!(clip = %clip.display(), error = %e, "failed to start alert playback");
                }
            }
        });
    }
}
