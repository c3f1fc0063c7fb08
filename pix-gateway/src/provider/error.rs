use bytes::Bytes;
use reqwest::{header::HeaderValue, StatusCode};

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("reqwest error: {0}")]
    ReqwestError(#[from] reqwest::Error),

    #[error("url error: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("serde error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("provider responded with status {status}")]
    Upstream {
        status: StatusCode,
        content_type: Option<HeaderValue>,
        body: Bytes,
    },

    #[error("provider task failed: {0}")]
    TaskFailed(#[from] tokio::task::JoinError),

    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),
}
