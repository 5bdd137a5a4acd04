use crate::domain::{FaceValidationResult, GeoPosition, SubmissionReceipt};
use crate::verification::VerificationError;
use chrono::{DateTime, Utc};
use tokio::sync::oneshot;

pub type SubmissionResult = Result<SubmissionReceipt, VerificationError>;

/// Everything that may change a verification session, funnelled into its store.
#[derive(Debug)]
pub enum VerificationEvent {
    LocationRequested { request_id: u64 },
    LocationResolved { request_id: u64, position: Option<GeoPosition> },
    FaceDetected(bool),
    FaceSampled { captured_at: DateTime<Utc> },
    FaceValidationStarted,
    FaceValidationFailed,
    FaceValidated(FaceValidationResult),
    SubmitRequested { reply: oneshot::Sender<SubmissionResult> },
    SubmissionFinished(SubmissionResult),
}
