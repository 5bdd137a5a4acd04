use crate::domain::GeoPosition;
use serde::de::Error;
use serde::{Deserialize, Deserializer};

pub const DEFAULT_RADIUS_M: u32 = 100;

/// The circular boundary around the office an employee is assigned to.
///
/// The directory may not know the office coordinates, in which case `center` is `None`.
#[derive(Clone, Debug, PartialEq)]
pub struct OfficeGeofence {
    pub center: Option<GeoPosition>,
    pub radius_m: u32,
    pub name: Option<String>,
}

impl OfficeGeofence {
    pub fn new(center: Option<GeoPosition>, radius_m: u32, name: Option<String>) -> Self {
        OfficeGeofence { center, radius_m, name }
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("<unnamed office>")
    }
}

impl Default for OfficeGeofence {
    fn default() -> Self {
        OfficeGeofence {
            center: None,
            radius_m: DEFAULT_RADIUS_M,
            name: None,
        }
    }
}

impl<'de> Deserialize<'de> for OfficeGeofence {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Debug, Deserialize)]
        pub struct Inner {
            name: Option<String>,
            latitude: Option<f64>,
            longitude: Option<f64>,
            radius: Option<u32>,
        }

        let inner = Inner::deserialize(deserializer)?;
        let center = match (inner.latitude, inner.longitude) {
            (Some(latitude), Some(longitude)) => {
                if !(-90.0..=90.0).contains(&latitude) {
                    return Err(Error::custom(format!("invalid office latitude: {}, must be between -90 and 90", latitude)));
                }
                if !(-180.0..=180.0).contains(&longitude) {
                    return Err(Error::custom(format!("invalid office longitude: {}, must be between -180 and 180", longitude)));
                }
                Some(GeoPosition::new(latitude, longitude))
            }
            _ => None,
        };

        Ok(OfficeGeofence {
            center,
            radius_m: inner.radius.unwrap_or(DEFAULT_RADIUS_M),
            name: inner.name,
        })
    }
}
