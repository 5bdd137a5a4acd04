mod attendance;
mod employee;
mod face_validation;
mod frame;
mod geo_position;
mod office_geofence;

pub use attendance::{AttendanceAction, AttendanceStatus, SubmissionReceipt};
pub use employee::EmployeeProfile;
pub use face_validation::FaceValidationResult;
pub use frame::{FaceBox, FaceSample, Frame, Rotation};
pub use geo_position::GeoPosition;
pub use office_geofence::{DEFAULT_RADIUS_M, OfficeGeofence};
