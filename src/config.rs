use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("detection scale factor must be greater than 1.0, got {0}")]
    BadScaleFactor(f64),
}

fn default_device() -> i32 {
    0
}

#[derive(Debug, Clone, Deserialize)]
pub struct CameraConfig {
    #[serde(default = "default_device")]
    pub device: i32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            device: default_device(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("security_footage")
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
        }
    }
}

fn default_alert_clip() -> PathBuf {
    PathBuf::from("alert.mp3")
}

#[derive(Debug, Clone, Deserialize)]
pub struct AlertConfig {
    #[serde(default = "default_alert_clip")]
    pub clip: PathBuf,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            clip: default_alert_clip(),
        }
    }
}

fn default_cascade_dir() -> PathBuf {
    PathBuf::from("cascades")
}

fn default_scale_factor() -> f64 {
    1.3
}

fn default_min_neighbors() -> i32 {
    5
}

fn default_min_size() -> i32 {
    0
}

#[derive(Debug, Clone, Deserialize)]
pub struct DetectionConfig {
    #[serde(default = "default_cascade_dir")]
    pub cascade_dir: PathBuf,
    #[serde(default = "default_scale_factor")]
    pub scale_factor: f64,
    #[serde(default = "default_min_neighbors")]
    pub min_neighbors: i32,
    #[serde(default = "default_min_size")]
    pub min_size: i32,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            cascade_dir: default_cascade_dir(),
            scale_factor: default_scale_factor(),
            min_neighbors: default_min_neighbors(),
            min_size: default_min_size(),
        }
    }
}

fn default_display_enabled() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_display_enabled")]
    pub enabled: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            enabled: default_display_enabled(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub alert: AlertConfig,
    #[serde(default)]
    pub detection: DetectionConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        let config: Config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            toml::from_str(&content)?
        } else {
            tracing::info!(path = %path.display(), "no config file, using defaults");
            Config::default()
        };

        if config.detection.scale_factor <= 1.0 {
            return Err(ConfigError::BadScaleFactor(config.detection.scale_factor));
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(dir.path().join("config.toml")).unwrap();

        assert_eq!(config.camera.device, 0);
        assert_eq!(config.output.dir, PathBuf::from("security_footage"));
        assert_eq!(config.alert.clip, PathBuf::from("alert.mp3"));
        assert_eq!(config.detection.scale_factor, 1.3);
        assert_eq!(config.detection.min_neighbors, 5);
        assert!(config.display.enabled);
    }

    #[test]
    fn partial_config_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[camera]\ndevice = 2\n\n[detection]\nmin_neighbors = 3\n")
            .unwrap();

        let config = Config::load_from(&path).unwrap();

        assert_eq!(config.camera.device, 2);
        assert_eq!(config.detection.min_neighbors, 3);
        assert_eq!(config.detection.scale_factor, 1.3);
        assert_eq!(config.output.dir, PathBuf::from("security_footage"));
    }

    #[test]
    fn full_config_parses() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[camera]
device = 1

[output]
dir = "/tmp/footage"

[alert]
clip = "/tmp/siren.mp3"

[detection]
cascade_dir = "/usr/share/cascades"
scale_factor = 1.2
min_neighbors = 4
min_size = 48

[display]
enabled = false
"#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();

        assert_eq!(config.camera.device, 1);
        assert_eq!(config.output.dir, PathBuf::from("/tmp/footage"));
        assert_eq!(config.alert.clip, PathBuf::from("/tmp/siren.mp3"));
        assert_eq!(
            config.detection.cascade_dir,
            PathBuf::from("/usr/share/cascades")
        );
        assert_eq!(config.detection.scale_factor, 1.2);
        assert_eq!(config.detection.min_size, 48);
        assert!(!config.display.enabled);
    }

    #[test]
    fn rejects_scale_factor_at_or_below_one() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[detection]\nscale_factor = 1.0\n").unwrap();

        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::BadScaleFactor(_))
        ));
    }

    #[test]
    fn rejects_malformed_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[camera\ndevice = ").unwrap();

        assert!(matches!(Config::load_from(&path), Err(ConfigError::Parse(_))));
    }
}
