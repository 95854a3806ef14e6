mod cascade;

pub use cascade::CascadeDetector;

use std::path::PathBuf;

use opencv::core::{Mat, Rect, Scalar};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DetectError {
    #[error("cascade model missing: {}", .0.display())]
    ModelMissing(PathBuf),
    #[error("cascade model {} is empty or unreadable", .0.display())]
    ModelInvalid(PathBuf),
    #[error(transparent)]
    OpenCv(#[from] opencv::Error),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DetectionKind {
    Face,
    Body,
}

impl DetectionKind {
    pub fn label(&self) -> &'static str {
        match self {
            DetectionKind::Face => "face",
            DetectionKind::Body => "body",
        }
    }

    /// Box color in BGR: faces blue, bodies green.
    pub fn color(&self) -> Scalar {
        match self {
            DetectionKind::Face => Scalar::new(255.0, 0.0, 0.0, 0.0),
            DetectionKind::Body => Scalar::new(0.0, 255.0, 0.0, 0.0),
        }
    }
}

/// One bounding box matched by a detector in a single frame.
#[derive(Clone, Debug)]
pub struct Detection {
    pub rect: Rect,
    pub kind: DetectionKind,
}

/// Opaque pattern-matching capability: grayscale frame in, boxes out.
pub trait Detector: Send {
    fn detect(&mut self, gray: &Mat) -> Result<Vec<Detection>, DetectError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn face_boxes_are_blue_body_boxes_are_green() {
        let face = DetectionKind::Face.color();
        assert_eq!(face[0], 255.0);
        assert_eq!(face[1], 0.0);
        assert_eq!(face[2], 0.0);

        let body = DetectionKind::Body.color();
        assert_eq!(body[0], 0.0);
        assert_eq!(body[1], 255.0);
        assert_eq!(body[2], 0.0);
    }

    #[test]
    fn kind_labels() {
        assert_eq!(DetectionKind::Face.label(), "face");
        assert_eq!(DetectionKind::Body.label(), "body");
    }
}
