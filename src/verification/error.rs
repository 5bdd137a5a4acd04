use crate::api::ApiError;
use thiserror::Error;

/// Reasons a check-in or check-out cannot go through. All of them are recoverable.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum VerificationError {
    #[error("current location is unavailable")]
    LocationUnavailable,
    #[error("current location is still being resolved")]
    LocationPending,
    #[error("office location is unknown")]
    GeofenceUnknown,
    #[error("{distance_m:.0} m away from the office, must be within {radius_m} m")]
    OutsideGeofence { distance_m: f64, radius_m: u32 },
    #[error("no face detected")]
    FaceNotDetected,
    #[error("face has not been verified yet")]
    FaceNotValidated,
    #[error("face does not match the enrolled employee (similarity {similarity:.2})")]
    FaceMismatch { similarity: f32 },
    #[error("a submission is already in progress")]
    SubmissionInProgress,
    #[error("attendance was already recorded in this session")]
    AlreadySubmitted,
    #[error("could not reach the attendance service: {0}")]
    SubmissionNetworkError(String),
    #[error("attendance was rejected: {0}")]
    SubmissionRejected(String),
    #[error("verification session is closed")]
    SessionClosed,
}

impl From<ApiError> for VerificationError {
    fn from(error: ApiError) -> Self {
        match error {
            ApiError::Rejected { message, .. } => VerificationError::SubmissionRejected(message),
            other => VerificationError::SubmissionNetworkError(other.to_string()),
        }
    }
}
