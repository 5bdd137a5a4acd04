use crate::domain::{GeoPosition, OfficeGeofence};
use tracing::warn;

pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle distance in meters between two positions, using the haversine formula.
pub fn distance(a: &GeoPosition, b: &GeoPosition) -> f64 {
    let phi1 = a.latitude.to_radians();
    let phi2 = b.latitude.to_radians();
    let delta_phi = (b.latitude - a.latitude).to_radians();
    let delta_lambda = (b.longitude - a.longitude).to_radians();

    let h = (delta_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (delta_lambda / 2.0).sin().powi(2);
    // Rounding can push h a hair outside [0, 1] for antipodal points
    let h = h.clamp(0.0, 1.0);

    2.0 * EARTH_RADIUS_M * h.sqrt().atan2((1.0 - h).sqrt())
}

pub fn within_radius(user: &GeoPosition, office: &GeoPosition, radius_m: u32) -> bool {
    distance(user, office) <= radius_m as f64
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GeofenceEvaluation {
    pub distance_m: Option<f64>,
    pub within_radius: bool,
}

/// Evaluates a resolved user position against the office geofence.
///
/// An office without coordinates is reported as within radius with an unknown distance.
/// The submission gate refuses that case on its own.
pub fn evaluate(user: &GeoPosition, geofence: &OfficeGeofence) -> GeofenceEvaluation {
    let Some(office) = geofence.center.as_ref() else {
        warn!(office = geofence.display_name(), "⚠️ Office coordinates are unknown, treating the location as within radius");
        return GeofenceEvaluation {
            distance_m: None,
            within_radius: true,
        };
    };

    let distance_m = distance(user, office);
    GeofenceEvaluation {
        distance_m: Some(distance_m),
        within_radius: distance_m <= geofence.radius_m as f64,
    }
}
