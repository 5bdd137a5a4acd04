use crate::api::ApiError;
use crate::api::response::json_or_rejection;
use crate::app_config::AppConfig;
use crate::domain::{AttendanceAction, AttendanceStatus, SubmissionReceipt};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::fmt::Debug;
use tracing::{info, instrument, warn};

#[async_trait]
pub trait AttendanceApi: Debug + Send + Sync {
    /// Records a check-in or check-out at the given position.
    async fn submit(&self, action: AttendanceAction, latitude: f64, longitude: f64) -> Result<SubmissionReceipt, ApiError>;

    /// Today's check-in and check-out times for the signed in employee.
    async fn today(&self) -> Result<AttendanceStatus, ApiError>;
}

#[derive(Debug, Serialize)]
struct SubmitRequest {
    action: AttendanceAction,
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Clone)]
pub struct HttpAttendanceApi {
    client: Client,
    url: String,
}

impl HttpAttendanceApi {
    pub fn new(client: Client, config: &AppConfig) -> Self {
        HttpAttendanceApi {
            client,
            url: config.api().url().to_string(),
        }
    }
}

#[async_trait]
impl AttendanceApi for HttpAttendanceApi {
    #[instrument(skip(self))]
    async fn submit(&self, action: AttendanceAction, latitude: f64, longitude: f64) -> Result<SubmissionReceipt, ApiError> {
        info!("📤 Submitting {}...", action);
        let request = SubmitRequest { action, latitude, longitude };
        let response = self.client.post(format!("{}/attendance", self.url)).json(&request).send().await?;

        let result = json_or_rejection::<SubmissionReceipt>(response).await;
        match &result {
            Ok(receipt) => info!(success = receipt.success, "📤 Submitting {}... OK", action),
            Err(e) => warn!("📤 Submitting {}... failed, {}", action, e),
        }
        result
    }

    #[instrument(skip(self))]
    async fn today(&self) -> Result<AttendanceStatus, ApiError> {
        let response = self.client.get(format!("{}/attendance/today", self.url)).send().await?;
        json_or_rejection::<AttendanceStatus>(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app_config::AppConfigBuilder;
    use chrono::{TimeZone, Utc};
    use mockito::Matcher;
    use pretty_assertions::assert_eq;
    use reqwest::StatusCode;
    use serde_json::json;

    async fn api(server: &mockito::ServerGuard) -> HttpAttendanceApi {
        let config = AppConfigBuilder::new().api_url(server.url()).build();
        HttpAttendanceApi::new(Client::new(), &config)
    }

    #[tokio::test]
    async fn submit_posts_the_action_and_coordinates() -> Result<(), ApiError> {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/attendance")
            .match_body(Matcher::Json(json!({ "action": "check_in", "latitude": -6.2, "longitude": 106.8 })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{ "success": true, "timestamp": "2026-10-17T01:02:03Z", "message": "Checked in" }"#)
            .create_async()
            .await;

        let receipt = api(&server).await.submit(AttendanceAction::CheckIn, -6.2, 106.8).await?;

        mock.assert();
        assert_eq!(
            receipt,
            SubmissionReceipt {
                success: true,
                timestamp: Utc.with_ymd_and_hms(2026, 10, 17, 1, 2, 3).single(),
                message: Some("Checked in".to_string()),
            }
        );
        Ok(())
    }

    #[tokio::test]
    async fn submit_surfaces_the_server_rejection_message() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/attendance")
            .with_status(422)
            .with_header("content-type", "application/json")
            .with_body(r#"{ "message": "Outside office radius" }"#)
            .create_async()
            .await;

        let result = api(&server).await.submit(AttendanceAction::CheckOut, -6.2, 106.8).await;

        match result {
            Err(ApiError::Rejected { status, message }) => {
                assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
                assert_eq!(message, "Outside office radius");
            }
            other => panic!("expected a rejection, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn today_returns_the_attendance_status() -> Result<(), ApiError> {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/attendance/today")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{ "checked_in_at": "2026-10-17T01:00:00Z", "checked_out_at": null }"#)
            .create_async()
            .await;

        let status = api(&server).await.today().await?;

        assert_eq!(status.next_action(), Some(AttendanceAction::CheckOut));
        Ok(())
    }
}
