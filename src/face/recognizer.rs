use crate::domain::FaceSample;
use async_trait::async_trait;
use std::fmt::Debug;
use thiserror::Error;

/// Compares a face sample with an enrolled embedding.
#[async_trait]
pub trait FaceRecognizer: Debug + Send + Sync {
    /// Similarity between the sample and the reference, in `[0, 1]`.
    async fn similarity(&self, sample: &FaceSample, reference: &[f32]) -> Result<f32, RecognizerError>;
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecognizerError {
    #[error("could not compute an embedding for the sample: {0}")]
    Embedding(String),
    #[error("reference embedding has {actual} dimensions, expected {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
}
