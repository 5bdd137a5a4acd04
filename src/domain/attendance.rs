use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceAction {
    CheckIn,
    CheckOut,
}

impl Display for AttendanceAction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            AttendanceAction::CheckIn => write!(f, "check-in"),
            AttendanceAction::CheckOut => write!(f, "check-out"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct SubmissionReceipt {
    pub success: bool,
    pub timestamp: Option<DateTime<Utc>>,
    pub message: Option<String>,
}

/// Today's attendance as recorded by the server.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct AttendanceStatus {
    pub checked_in_at: Option<DateTime<Utc>>,
    pub checked_out_at: Option<DateTime<Utc>>,
}

impl AttendanceStatus {
    /// The action the employee is expected to perform next, `None` once the day is complete.
    pub fn next_action(&self) -> Option<AttendanceAction> {
        match (self.checked_in_at, self.checked_out_at) {
            (None, _) => Some(AttendanceAction::CheckIn),
            (Some(_), None) => Some(AttendanceAction::CheckOut),
            (Some(_), Some(_)) => None,
        }
    }
}
