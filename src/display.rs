use opencv::core::Mat;
use opencv::highgui;
use thiserror::Error;

const QUIT_KEY: i32 = 'q' as i32;

#[derive(Debug, Error)]
pub enum DisplayError {
    #[error(transparent)]
    OpenCv(#[from] opencv::Error),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SurfaceEvent {
    None,
    Quit,
}

/// Live preview plus the input channel the quit key arrives on.
pub trait Surface: Send {
    fn present(&mut self, frame: &Mat) -> Result<SurfaceEvent, DisplayError>;
    fn release(&mut self);
}

pub struct Window {
    name: &'static str,
}

impl Window {
    pub fn open(name: &'static str) -> Result<Self, DisplayError> {
        highgui::named_window(name, highgui::WINDOW_AUTOSIZE)?;
        Ok(Self { name })
    }
}

impl Surface for Window {
    fn present(&mut self, frame: &Mat) -> Result<SurfaceEvent, DisplayError> {
        highgui::imshow(self.name, frame)?;
        let key = highgui::wait_key(1)?;
        if (key & 0xff) == QUIT_KEY {
            Ok(SurfaceEvent::Quit)
        } else {
            Ok(SurfaceEvent::None)
        }
    }

    fn release(&mut self) {
        if let Err(e) = highgui::destroy_all_windows() {
            tracing::warn!(error = %e, "failed to close preview window");
        }
    }
}
