use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use pix_core::{error::PixCoreError, primitives::ErrorResponse};
use thiserror::Error;
use tracing::{event, Level};

use crate::provider::error::ProviderError;

#[derive(Error, Debug)]
pub enum PixGatewayError {
    #[error("{0}")]
    InvalidArgument(#[from] PixCoreError),

    #[error("Token ausente no servidor.")]
    ConfigurationMissing,

    #[error("Provider responded with status {status}")]
    Upstream {
        status: StatusCode,
        content_type: Option<HeaderValue>,
        body: Bytes,
    },

    #[error("Falha ao comunicar com o provedor PIX.")]
    Network(#[source] ProviderError),

    #[error("Failed to set up provider client - {0}")]
    ProviderSetup(#[source] ProviderError),
}

impl From<ProviderError> for PixGatewayError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::Upstream {
                status,
                content_type,
                body,
            } => Self::Upstream {
                status,
                content_type,
                body,
            },
            other => Self::Network(other),
        }
    }
}

impl IntoResponse for PixGatewayError {
    fn into_response(self) -> Response {
        match self {
            Self::Upstream {
                status,
                content_type,
                body,
            } => {
                event!(
                    Level::WARN,
                    "provider rejected charge: {} {}",
                    status,
                    String::from_utf8_lossy(&body)
                );
                let content_type =
                    content_type.unwrap_or_else(|| HeaderValue::from_static("application/json"));
                (status, [(CONTENT_TYPE, content_type)], body).into_response()
            }
            Self::InvalidArgument(ref err) => {
                event!(Level::WARN, "invalid pix request: {:?}", err);
                (
                    StatusCode::BAD_REQUEST,
                    Json(ErrorResponse::new(self.to_string())),
                )
                    .into_response()
            }
            Self::Network(ref err) | Self::ProviderSetup(ref err) => {
                event!(Level::ERROR, "error in gateway: {} - {:?}", self, err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse::new(self.to_string())),
                )
                    .into_response()
            }
            Self::ConfigurationMissing => {
                event!(Level::ERROR, "error in gateway: {}", self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse::new(self.to_string())),
                )
                    .into_response()
            }
        }
    }
}
