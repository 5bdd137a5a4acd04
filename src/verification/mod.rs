mod error;
mod events;
mod plan;
mod session;
mod state;
mod store;

pub use error::VerificationError;
pub use events::{SubmissionResult, VerificationEvent};
pub use plan::{SessionPlan, prepare};
pub use session::{SessionDependencies, VerificationSession};
pub use state::{FaceDetectionState, FaceMatchStatus, LocationPhase, LocationState, VerificationState};
pub use store::{StateSnapshot, VerificationStore};
