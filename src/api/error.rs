use reqwest::{StatusCode, header};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("request error: {0}")]
    RequestError(#[from] reqwest::Error),
    #[error("invalid header value: {0}")]
    InvalidHeaderValue(#[from] header::InvalidHeaderValue),
    #[error("server responded with {status}: {message}")]
    Rejected { status: StatusCode, message: String },
}

impl ApiError {
    /// Whether retrying the same request may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::RequestError(e) => e.is_timeout() || e.is_connect() || e.status().is_some_and(|status| status.is_server_error()),
            ApiError::Rejected { status, .. } => status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS,
            ApiError::InvalidHeaderValue(_) => false,
        }
    }
}
