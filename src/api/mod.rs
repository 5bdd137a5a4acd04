mod attendance;
mod client;
mod directory;
mod error;
mod response;

pub use attendance::{AttendanceApi, HttpAttendanceApi};
pub use client::new_client;
pub use directory::{EmployeeDirectory, HttpEmployeeDirectory};
pub use error::ApiError;
