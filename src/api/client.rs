use crate::api::ApiError;
use crate::app_config::AppConfig;
use reqwest::header::HeaderValue;
use reqwest::{Client, header};

pub fn new_client(config: &AppConfig) -> Result<Client, ApiError> {
    let mut headers = header::HeaderMap::new();
    let mut authorization_value = HeaderValue::from_str(&format!("Bearer {}", config.api().token()))?;
    authorization_value.set_sensitive(true);
    headers.insert(header::AUTHORIZATION, authorization_value);
    headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));

    let client = Client::builder().default_headers(headers).build()?;
    Ok(client)
}
