use crate::domain::GeoPosition;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt::Debug;
use thiserror::Error;

/// Platform access to the device position.
///
/// Implementations must be cancel-safe: dropping the `current_position` future
/// has to cancel the underlying platform request.
#[async_trait]
pub trait PositionSource: Debug + Send + Sync {
    /// A fresh, high-accuracy fix.
    async fn current_position(&self) -> Result<GeoPosition, LocationError>;

    /// The platform's cached fix, if it has one.
    async fn last_known_position(&self) -> Result<Option<LastKnownPosition>, LocationError>;
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LastKnownPosition {
    pub position: GeoPosition,
    pub recorded_at: Option<DateTime<Utc>>,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LocationError {
    #[error("location services are disabled")]
    ServicesDisabled,
    #[error("platform location request failed: {0}")]
    Platform(String),
}

/// Serves a fixed position, for stationary devices such as a lobby kiosk.
#[derive(Debug, Clone)]
pub struct FixedPositionSource {
    position: GeoPosition,
}

impl FixedPositionSource {
    pub fn new(position: GeoPosition) -> Self {
        FixedPositionSource { position }
    }
}

#[async_trait]
impl PositionSource for FixedPositionSource {
    async fn current_position(&self) -> Result<GeoPosition, LocationError> {
        Ok(self.position)
    }

    async fn last_known_position(&self) -> Result<Option<LastKnownPosition>, LocationError> {
        Ok(Some(LastKnownPosition {
            position: self.position,
            recorded_at: None,
        }))
    }
}
