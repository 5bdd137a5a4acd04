use crate::app_config::AppConfig;
use crate::domain::GeoPosition;
use crate::location::{FixedPositionSource, PositionSource};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};

pub const DEFAULT_LOCATION_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct LocationProvider {
    source: Arc<dyn PositionSource>,
    timeout: Duration,
}

impl LocationProvider {
    pub fn new(source: Arc<dyn PositionSource>, timeout: Duration) -> Self {
        LocationProvider { source, timeout }
    }

    /// Uses the configured fixed position when there is one, the platform source otherwise.
    pub fn from_config(platform: Arc<dyn PositionSource>, config: &AppConfig) -> Self {
        let location = config.location();
        let source: Arc<dyn PositionSource> = match location.fixed_position() {
            Some(position) => {
                warn!(
                    latitude = position.latitude,
                    longitude = position.longitude,
                    "⚠️ Location is pinned to the configured fixed position, the device is not being located"
                );
                Arc::new(FixedPositionSource::new(position))
            }
            None => platform,
        };
        LocationProvider::new(source, location.timeout())
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Fetches a fresh fix, falling back once to the last known position.
    ///
    /// Both calls are bounded by the timeout. Dropping the returned future drops the
    /// in-flight platform request.
    #[instrument(skip(self))]
    pub async fn get_current_location(&self) -> Option<GeoPosition> {
        debug!("📍 Fetching current location...");
        match timeout(self.timeout, self.source.current_position()).await {
            Ok(Ok(position)) => {
                info!(latitude = position.latitude, longitude = position.longitude, "📍 Fetching current location... OK");
                return Some(position);
            }
            Ok(Err(e)) => warn!("📍 Fetching current location... failed, {}", e),
            Err(_) => warn!("⏳ No location fix within {:?}", self.timeout),
        }

        self.last_known_location().await
    }

    async fn last_known_location(&self) -> Option<GeoPosition> {
        debug!("📍 Falling back to the last known location...");
        match timeout(self.timeout, self.source.last_known_position()).await {
            Ok(Ok(Some(last_known))) => {
                // The age of the cached fix is not checked
                if let Some(recorded_at) = last_known.recorded_at {
                    debug!(age = ?(Utc::now() - recorded_at), "📍 Last known location was recorded at {}", recorded_at);
                }
                info!("📍 Falling back to the last known location... OK");
                Some(last_known.position)
            }
            Ok(Ok(None)) => {
                warn!("📍 Falling back to the last known location... failed, no cached position");
                None
            }
            Ok(Err(e)) => {
                warn!("📍 Falling back to the last known location... failed, {}", e);
                None
            }
            Err(_) => {
                warn!("⏳ No cached location within {:?}", self.timeout);
                None
            }
        }
    }
}
