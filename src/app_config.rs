use crate::domain::GeoPosition;
use crate::face::{DEFAULT_CROP_PADDING, DEFAULT_SAMPLE_INTERVAL};
use crate::location::DEFAULT_LOCATION_TIMEOUT;
use config::{Config, ConfigError};
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_MATCH_THRESHOLD: f32 = 0.8;

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    core: Core,
    #[serde(default)]
    verification: Verification,
    #[serde(default)]
    location: Location,
    api: Api,
}

impl AppConfig {
    /// Loads `config` and the optional `config_local` file, overridden by `PRESENCE__*` environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(config::File::with_name("config").required(true))
            .add_source(config::File::with_name("config_local").required(false))
            .add_source(config::Environment::with_prefix("PRESENCE").separator("__"))
            .build()?
            .try_deserialize()
    }

    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()?
            .try_deserialize()
    }

    pub fn core(&self) -> &Core {
        &self.core
    }

    pub fn verification(&self) -> &Verification {
        &self.verification
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn api(&self) -> &Api {
        &self.api
    }
}

#[derive(Debug, Deserialize)]
pub struct Core {
    store_buffer_size: usize,
}

impl Core {
    pub fn store_buffer_size(&self) -> usize {
        self.store_buffer_size
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Verification {
    match_threshold: f32,
    #[serde(with = "humantime_serde")]
    sample_interval: Duration,
    crop_padding: f32,
}

impl Default for Verification {
    fn default() -> Self {
        Verification {
            match_threshold: DEFAULT_MATCH_THRESHOLD,
            sample_interval: DEFAULT_SAMPLE_INTERVAL,
            crop_padding: DEFAULT_CROP_PADDING,
        }
    }
}

impl Verification {
    pub fn match_threshold(&self) -> f32 {
        self.match_threshold
    }

    pub fn sample_interval(&self) -> Duration {
        self.sample_interval
    }

    pub fn crop_padding(&self) -> f32 {
        self.crop_padding
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Location {
    #[serde(with = "humantime_serde")]
    timeout: Duration,
    fixed_position: Option<GeoPosition>,
}

impl Default for Location {
    fn default() -> Self {
        Location {
            timeout: DEFAULT_LOCATION_TIMEOUT,
            fixed_position: None,
        }
    }
}

impl Location {
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn fixed_position(&self) -> Option<GeoPosition> {
        self.fixed_position
    }
}

#[derive(Debug, Deserialize)]
pub struct Api {
    url: String,
    token: String,
    retry_ms: u64,
    retry_max_delay_ms: u64,
    retry_attempts: usize,
}

impl Api {
    pub fn url(&self) -> &str {
        self.url.trim_end_matches('/')
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn retry_ms(&self) -> u64 {
        self.retry_ms
    }

    pub fn retry_max_delay_ms(&self) -> Duration {
        Duration::from_millis(self.retry_max_delay_ms)
    }

    pub fn retry_attempts(&self) -> usize {
        self.retry_attempts
    }
}

#[cfg(test)]
pub struct AppConfigBuilder {
    config: AppConfig,
}

#[cfg(test)]
impl AppConfigBuilder {
    pub fn new() -> Self {
        AppConfigBuilder {
            config: AppConfig {
                core: Core { store_buffer_size: 64 },
                verification: Verification::default(),
                location: Location::default(),
                api: Api {
                    url: "https://attendance.example/api".to_string(),
                    token: "token".to_string(),
                    retry_ms: 1,
                    retry_max_delay_ms: 2,
                    retry_attempts: 2,
                },
            },
        }
    }

    pub fn api_url(mut self, url: String) -> Self {
        self.config.api.url = url;
        self
    }

    pub fn token(mut self, token: &str) -> Self {
        self.config.api.token = token.to_string();
        self
    }

    pub fn match_threshold(mut self, threshold: f32) -> Self {
        self.config.verification.match_threshold = threshold;
        self
    }

    pub fn fixed_position(mut self, position: GeoPosition) -> Self {
        self.config.location.fixed_position = Some(position);
        self
    }

    pub fn build(self) -> AppConfig {
        self.config
    }
}
