use crate::domain::{FaceBox, Frame};
use thiserror::Error;

/// Platform face detection. Boxes are reported in upright coordinates of the frame.
pub trait FaceDetector: Send {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<FaceBox>, DetectorError>;

    /// Frees native resources. Called once when the face stream stops.
    fn release(&mut self) {}
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DetectorError {
    #[error("unsupported frame format: {0}")]
    UnsupportedFormat(String),
    #[error("face detection failed: {0}")]
    Failed(String),
}
