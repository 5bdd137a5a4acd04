pub mod api;
pub mod app_config;
pub mod domain;
pub mod face;
pub mod geofence;
mod geo_position_deserializer;
pub mod location;
pub mod verification;
