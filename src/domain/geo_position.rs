use serde::Serialize;

#[derive(Clone, Copy, Default, Debug, PartialEq, Serialize)]
pub struct GeoPosition {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPosition {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        GeoPosition { latitude, longitude }
    }
}
