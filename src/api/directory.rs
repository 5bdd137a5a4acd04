use crate::api::ApiError;
use crate::api::response::json_or_rejection;
use crate::app_config::AppConfig;
use crate::domain::EmployeeProfile;
use async_trait::async_trait;
use reqwest::Client;
use std::fmt::Debug;
use std::time::Duration;
use tokio_retry::RetryIf;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tracing::{info, instrument, warn};

#[async_trait]
pub trait EmployeeDirectory: Debug + Send + Sync {
    /// The signed in employee's office geofence and enrolled face embedding.
    async fn fetch_profile(&self) -> Result<EmployeeProfile, ApiError>;
}

#[derive(Debug, Clone)]
pub struct HttpEmployeeDirectory {
    client: Client,
    url: String,
    retry_ms: u64,
    retry_max_delay: Duration,
    retry_attempts: usize,
}

impl HttpEmployeeDirectory {
    pub fn new(client: Client, config: &AppConfig) -> Self {
        HttpEmployeeDirectory {
            client,
            url: config.api().url().to_string(),
            retry_ms: config.api().retry_ms(),
            retry_max_delay: config.api().retry_max_delay_ms(),
            retry_attempts: config.api().retry_attempts(),
        }
    }

    async fn fetch_once(&self) -> Result<EmployeeProfile, ApiError> {
        let response = self.client.get(format!("{}/employees/me", self.url)).send().await?;
        json_or_rejection::<EmployeeProfile>(response).await
    }
}

#[async_trait]
impl EmployeeDirectory for HttpEmployeeDirectory {
    #[instrument(skip(self))]
    async fn fetch_profile(&self) -> Result<EmployeeProfile, ApiError> {
        let strategy = ExponentialBackoff::from_millis(self.retry_ms)
            .factor(2)
            .max_delay(self.retry_max_delay)
            .map(jitter)
            .take(self.retry_attempts);

        info!("👤 Retrieving employee profile...");
        let profile = RetryIf::spawn(
            strategy,
            || async {
                self.fetch_once().await.inspect_err(|e| {
                    if e.is_transient() {
                        warn!("⚠️ Employee directory error: {}. Retrying...", e);
                    }
                })
            },
            ApiError::is_transient,
        )
        .await?;

        info!(
            employee_id = %profile.id,
            office = profile.office.display_name(),
            face_enrolled = profile.reference_embedding().is_some(),
            "👤 Retrieving employee profile... OK"
        );
        Ok(profile)
    }
}
