use crate::domain::OfficeGeofence;
use serde::Deserialize;

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct EmployeeProfile {
    pub id: String,
    pub name: String,
    pub office: OfficeGeofence,
    /// Enrolled reference embedding; the identity check is bypassed without one.
    #[serde(default)]
    pub face_embedding: Option<Vec<f32>>,
}

impl EmployeeProfile {
    pub fn reference_embedding(&self) -> Option<&[f32]> {
        self.face_embedding.as_deref().filter(|embedding| !embedding.is_empty())
    }
}
