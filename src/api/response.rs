use crate::api::ApiError;
use reqwest::Response;
use serde::Deserialize;
use serde::de::DeserializeOwned;

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Deserializes a successful response, or turns a failed one into [`ApiError::Rejected`]
/// carrying the server's message.
pub(crate) async fn json_or_rejection<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json::<T>().await?);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(|error| error.message)
        .unwrap_or_else(|| if body.trim().is_empty() { status.to_string() } else { body.trim().to_string() });

    Err(ApiError::Rejected { status, message })
}
