use std::path::Path;

use opencv::core::{Mat, Rect, Size, Vector};
use opencv::objdetect::CascadeClassifier;
use opencv::prelude::*;

use super::{DetectError, Detection, DetectionKind, Detector};
use crate::config::DetectionConfig;

const FRONTAL_FACE_MODEL: &str = "haarcascade_frontalface_default.xml";
const FULL_BODY_MODEL: &str = "haarcascade_fullbody.xml";

/// Pretrained Haar cascade wrapped behind the `Detector` seam. The matching
/// algorithm itself is opaque; only the tuning knobs are ours.
pub struct CascadeDetector {
    classifier: CascadeClassifier,
    kind: DetectionKind,
    scale_factor: f64,
    min_neighbors: i32,
    min_size: i32,
}

impl CascadeDetector {
    pub fn frontal_face(config: &DetectionConfig) -> Result<Self, DetectError> {
        Self::from_file(
            &config.cascade_dir.join(FRONTAL_FACE_MODEL),
            DetectionKind::Face,
            config,
        )
    }

    pub fn full_body(config: &DetectionConfig) -> Result<Self, DetectError> {
        Self::from_file(
            &config.cascade_dir.join(FULL_BODY_MODEL),
            DetectionKind::Body,
            config,
        )
    }

    pub fn from_file(
        path: &Path,
        kind: DetectionKind,
        config: &DetectionConfig,
    ) -> Result<Self, DetectError> {
        if !path.is_file() {
            return Err(DetectError::ModelMissing(path.to_path_buf()));
        }

        let classifier = CascadeClassifier::new(path.to_string_lossy().as_ref())?;
        // OpenCV loads a bad model file into an empty classifier without
        // reporting failure, so check explicitly.
        if classifier.empty()? {
            return Err(DetectError::ModelInvalid(path.to_path_buf()));
        }

        tracing::info!(model = %path.display(), kind = kind.label(), "cascade loaded");

        Ok(Self {
            classifier,
            kind,
            scale_factor: config.scale_factor,
            min_neighbors: config.min_neighbors,
            min_size: config.min_size,
        })
    }
}

impl Detector for CascadeDetector {
    fn detect(&mut self, gray: &Mat) -> Result<Vec<Detection>, DetectError> {
        let mut rects = Vector::<Rect>::new();
        self.classifier.detect_multi_scale(
            gray,
            &mut rects,
            self.scale_factor,
            self.min_neighbors,
            0,
            Size::new(self.min_size, self.min_size),
            Size::default(),
        )?;

        Ok(rects
            .iter()
            .map(|rect| Detection {
                rect,
                kind: self.kind,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_model_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let config = DetectionConfig {
            cascade_dir: dir.path().to_path_buf(),
            ..DetectionConfig::default()
        };

        let result = CascadeDetector::frontal_face(&config);
        assert!(matches!(result, Err(DetectError::ModelMissing(_))));
    }
}
