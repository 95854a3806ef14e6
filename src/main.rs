use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

mod alert;
mod camera;
mod config;
mod detect;
mod display;
mod monitor;
mod record;

use alert::FfplayAlert;
use camera::{Camera, FrameSource};
use config::Config;
use detect::{CascadeDetector, Detector};
use display::{Surface, Window};
use monitor::{Monitor, StatusLog};
use record::VideoFile;

const WINDOW_NAME: &str = "Security Camera";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("vigil=debug".parse()?))
        .init();

    let config = Config::load()?;

    let source = Camera::open(config.camera.device)?;
    let sink = VideoFile::create(&config.output.dir, source.frame_rate(), source.frame_size())?;

    let detectors: Vec<Box<dyn Detector>> = vec![
        Box::new(CascadeDetector::frontal_face(&config.detection)?),
        Box::new(CascadeDetector::full_body(&config.detection)?),
    ];

    let alert = FfplayAlert::new(&config.alert.clip)?;

    let display: Option<Box<dyn Surface>> = if config.display.enabled {
        match Window::open(WINDOW_NAME) {
            Ok(window) => Some(Box::new(window)),
            Err(e) => {
                tracing::warn!(error = %e, "failed to open preview window, running headless");
                None
            }
        }
    } else {
        None
    };

    let monitor = Monitor::new(
        Box::new(source),
        detectors,
        Box::new(sink),
        Box::new(alert),
        display,
        StatusLog::stdout(),
    );

    let shutdown = Arc::new(AtomicBool::new(false));
    let loop_shutdown = Arc::clone(&shutdown);
    let mut handle = tokio::task::spawn_blocking(move || monitor.run(loop_shutdown));

    tokio::select! {
        result = &mut handle => {
            result??;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutdown signal received");
            shutdown.store(true, Ordering::Relaxed);
            handle.await??;
        }
    }

    tracing::info!("shutdown complete");
    Ok(())
}
