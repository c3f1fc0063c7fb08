use axum::{extract::State, Json};
use bytes::Bytes;
use pix_core::primitives::{ErrorResponse, HealthResponse, PixChargeResponse, PostPixRequest};
use tracing::instrument;

use crate::{error::PixGatewayError, forwarder::PixForwarder};

#[utoipa::path(
        post,
        path = "/pix",
        request_body = PostPixRequest,
        responses(
            (status = 200, description = "pix charge created", body = PixChargeResponse),
            (status = 400, description = "invalid value or body", body = ErrorResponse),
            (status = 500, description = "token missing or provider unreachable", body = ErrorResponse),
        ),
    )]
#[instrument(name = "post_pix", skip_all)]
pub async fn post_pix(
    State(forwarder): State<PixForwarder>,
    body: Bytes,
) -> Result<Json<PixChargeResponse>, PixGatewayError> {
    let request = PostPixRequest::from_slice(&body)?;
    Ok(Json(forwarder.create_pix_charge(request).await?))
}

#[utoipa::path(
        get,
        path = "/health",
        responses(
            (status = 200, description = "health check", body = HealthResponse)
        ),
    )]
pub async fn get_health(State(forwarder): State<PixForwarder>) -> Json<HealthResponse> {
    Json(HealthResponse {
        ok: true,
        has_token: forwarder.has_token(),
    })
}
