use crate::api::{ApiError, AttendanceApi, EmployeeDirectory};
use crate::domain::{AttendanceAction, EmployeeProfile};
use tracing::{info, instrument};

/// What a session needs to know before the camera opens.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionPlan {
    pub profile: EmployeeProfile,
    /// `None` once both check-in and check-out are recorded for today.
    pub action: Option<AttendanceAction>,
}

/// Loads the employee profile and today's attendance concurrently.
#[instrument(skip_all)]
pub async fn prepare(directory: &dyn EmployeeDirectory, attendance_api: &dyn AttendanceApi) -> Result<SessionPlan, ApiError> {
    info!("🗓️ Preparing verification session...");
    let (profile, today) = tokio::try_join!(directory.fetch_profile(), attendance_api.today())?;

    let action = today.next_action();
    match action {
        Some(action) => info!("🗓️ Preparing verification session... OK, next action is {}", action),
        None => info!("🗓️ Preparing verification session... OK, attendance for today is complete"),
    }

    Ok(SessionPlan { profile, action })
}
