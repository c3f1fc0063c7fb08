use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use pix_core::primitives::CreatePixCharge;
use reqwest::{
    header::{HeaderValue, ACCEPT, CONTENT_TYPE},
    redirect,
};
use tracing::{debug, instrument};
use url::Url;

use super::{error::ProviderError, PixProvider};
use crate::{
    config::{ApiToken, UpstreamConfig},
    resolver::Ipv4FirstResolver,
};

const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);
const TCP_KEEPALIVE: Duration = Duration::from_secs(60);

/// HTTP client for the PushinPay cash-in API.
///
/// A single pooled `reqwest::Client` is shared by every call. When `force_ipv4` is set, hostnames
/// are resolved through [`Ipv4FirstResolver`]: the connection goes to an IPv4 address while the
/// URL, and therefore TLS SNI and the `Host` header, keep the original hostname.
#[derive(Clone)]
pub struct PushinPayClient {
    endpoint: Url,
    reqwest_client: reqwest::Client,
}

impl PushinPayClient {
    pub fn new(upstream: &UpstreamConfig) -> Result<Self, ProviderError> {
        let endpoint = upstream.endpoint()?;

        let mut builder = reqwest::Client::builder()
            .timeout(Duration::from_secs(upstream.timeout_secs))
            .pool_idle_timeout(POOL_IDLE_TIMEOUT)
            .tcp_keepalive(TCP_KEEPALIVE)
            .redirect(redirect::Policy::none())
            .user_agent(concat!("pix-gateway/", env!("CARGO_PKG_VERSION")));

        if upstream.force_ipv4 {
            builder = builder.dns_resolver(Arc::new(Ipv4FirstResolver::system()));
        }

        Ok(Self {
            endpoint,
            reqwest_client: builder.build()?,
        })
    }

    pub async fn make_post(
        &self,
        api_token: &ApiToken,
        body: String,
    ) -> Result<serde_json::Value, ProviderError> {
        let response = self
            .reqwest_client
            .post(self.endpoint.clone())
            .bearer_auth(api_token.expose())
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .body(body)
            .send()
            .await?;

        let status = response.status();
        debug!("provider responded with {}", status);

        if !status.is_success() {
            let content_type = response.headers().get(CONTENT_TYPE).cloned();
            let body = response.bytes().await?;
            return Err(ProviderError::Upstream {
                status,
                content_type,
                body,
            });
        }

        let body = response.bytes().await?;
        let value: serde_json::Value = serde_json::from_slice(&body)?;
        if !value.is_object() {
            return Err(ProviderError::UnexpectedResponse(value.to_string()));
        }
        Ok(value)
    }
}

#[async_trait]
impl PixProvider for PushinPayClient {
    #[instrument(skip_all, fields(value = %charge.value), err)]
    async fn create_charge(
        &self,
        api_token: &ApiToken,
        charge: &CreatePixCharge,
    ) -> Result<serde_json::Value, ProviderError> {
        self.make_post(api_token, serde_json::to_string(charge)?)
            .await
    }
}
