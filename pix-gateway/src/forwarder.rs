use std::sync::Arc;

use pix_core::primitives::{PixChargeDefaults, PixChargeResponse, PostPixRequest};
use tracing::{debug, info, warn};

use crate::{
    config::{
        ApiToken, BuildParams, ChargeConfig, FrontendConfig, GatewayConfig, ServerConfig,
        TracingConfig, UpstreamConfig,
    },
    error::PixGatewayError,
    provider::{error::ProviderError, pushinpay::PushinPayClient, PixProvider},
};

#[derive(Clone)]
pub struct PixForwarder {
    pub provider: Arc<dyn PixProvider>,
    pub defaults: PixChargeDefaults,
    pub config: GatewayConfig,
    pub build_params: BuildParams,
}

impl PixForwarder {
    pub fn new(
        provider: Arc<dyn PixProvider>,
        config: GatewayConfig,
        build_params: BuildParams,
    ) -> Result<Self, PixGatewayError> {
        Ok(Self {
            provider,
            defaults: config.charge.defaults()?,
            config,
            build_params,
        })
    }

    pub fn builder() -> ForwarderBuilder {
        ForwarderBuilder::new()
    }

    pub const fn has_token(&self) -> bool {
        self.config.has_token()
    }

    /// Validates the request, sends a single cash-in call to the provider and reshapes its answer.
    ///
    /// Nothing is sent upstream when the token is missing or the request is invalid. Once issued,
    /// the provider call runs on its own task and completes even if the caller goes away.
    pub async fn create_pix_charge(
        &self,
        request: PostPixRequest,
    ) -> Result<PixChargeResponse, PixGatewayError> {
        let api_token = self
            .config
            .api_token
            .clone()
            .ok_or(PixGatewayError::ConfigurationMissing)?;

        let charge = request.into_charge(&self.defaults)?;
        debug!(
            "creating pix charge of {} with {} split rules",
            charge.value,
            charge.split_rules.len()
        );

        let provider = Arc::clone(&self.provider);
        let body = tokio::spawn(async move {
            // failures are logged by the provider client
            let result = provider.create_charge(&api_token, &charge).await;
            if result.is_ok() {
                info!("provider created pix charge of {}", charge.value);
            }
            result
        })
        .await
        .map_err(ProviderError::from)??;
        let response = PixChargeResponse::from_provider(&body);
        if response.qr_code.is_none() {
            warn!("provider response carries no qr code: {}", body);
        }
        Ok(response)
    }
}

#[derive(Default)]
pub struct ForwarderBuilder {
    api_token: Option<ApiToken>,
    server_config: Option<ServerConfig>,
    upstream_config: Option<UpstreamConfig>,
    charge_config: Option<ChargeConfig>,
    frontend_config: Option<FrontendConfig>,
    tracing_config: Option<TracingConfig>,
    provider: Option<Arc<dyn PixProvider>>,
}

impl ForwarderBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(self, config: GatewayConfig) -> Self {
        Self {
            api_token: config.api_token,
            server_config: Some(config.server),
            upstream_config: Some(config.upstream),
            charge_config: Some(config.charge),
            frontend_config: Some(config.frontend),
            tracing_config: Some(config.tracing),
            provider: self.provider,
        }
    }

    pub fn with_api_token(mut self, api_token: Option<ApiToken>) -> Self {
        self.api_token = api_token;
        self
    }

    pub fn with_upstream(mut self, upstream_config: Option<UpstreamConfig>) -> Self {
        self.upstream_config = upstream_config;
        self
    }

    pub fn with_charge(mut self, charge_config: Option<ChargeConfig>) -> Self {
        self.charge_config = charge_config;
        self
    }

    pub fn with_frontend(mut self, frontend_config: Option<FrontendConfig>) -> Self {
        self.frontend_config = frontend_config;
        self
    }

    /// Replaces the PushinPay client, used by tests.
    pub fn with_provider(mut self, provider: Arc<dyn PixProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn build(self) -> Result<PixForwarder, PixGatewayError> {
        let config = GatewayConfig {
            api_token: self.api_token,
            server: self.server_config.unwrap_or_default(),
            upstream: self.upstream_config.unwrap_or_default(),
            charge: self.charge_config.unwrap_or_default(),
            frontend: self.frontend_config.unwrap_or_default(),
            tracing: self.tracing_config.unwrap_or_default(),
        };

        let provider: Arc<dyn PixProvider> = match self.provider {
            Some(provider) => provider,
            None => Arc::new(
                PushinPayClient::new(&config.upstream).map_err(PixGatewayError::ProviderSetup)?,
            ),
        };

        PixForwarder::new(provider, config, BuildParams::from_env())
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc,
        },
        time::Duration,
    };

    use async_trait::async_trait;
    use bytes::Bytes;
    use hyper::StatusCode;
    use pix_core::primitives::{CreatePixCharge, PixChargeResponse, PostPixRequest};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use crate::{
        config::{ApiToken, ChargeConfig},
        error::PixGatewayError,
        forwarder::PixForwarder,
        provider::{error::ProviderError, MockPixProvider, PixProvider},
    };

    fn create_forwarder(provider: MockPixProvider, token: Option<&str>) -> PixForwarder {
        PixForwarder::builder()
            .with_api_token(token.and_then(ApiToken::new))
            .with_provider(Arc::new(provider))
            .build()
            .expect("forwarder")
    }

    #[tokio::test]
    async fn test_create_pix_charge_without_token_makes_no_call() {
        let mut provider = MockPixProvider::new();
        provider.expect_create_charge().times(0);

        let forwarder = create_forwarder(provider, None);
        let result = forwarder
            .create_pix_charge(PostPixRequest::with_value(1500))
            .await;

        assert!(matches!(result, Err(PixGatewayError::ConfigurationMissing)));
    }

    #[tokio::test]
    async fn test_create_pix_charge_checks_token_before_value() {
        let mut provider = MockPixProvider::new();
        provider.expect_create_charge().times(0);

        let forwarder = create_forwarder(provider, Some("   "));
        let request = PostPixRequest {
            value: Some(json!(-5)),
            ..Default::default()
        };
        let result = forwarder.create_pix_charge(request).await;

        assert!(matches!(result, Err(PixGatewayError::ConfigurationMissing)));
    }

    #[tokio::test]
    async fn test_create_pix_charge_invalid_value_makes_no_call() {
        let mut provider = MockPixProvider::new();
        provider.expect_create_charge().times(0);

        let forwarder = create_forwarder(provider, Some("token"));
        for value in [json!(0), json!(-1), json!(12.5), json!("abc"), json!(true)] {
            let request = PostPixRequest {
                value: Some(value),
                ..Default::default()
            };
            let result = forwarder.create_pix_charge(request).await;
            assert!(matches!(result, Err(PixGatewayError::InvalidArgument(_))));
        }
    }

    #[tokio::test]
    async fn test_create_pix_charge_forwards_value_and_reshapes() -> anyhow::Result<()> {
        let mut provider = MockPixProvider::new();
        provider
            .expect_create_charge()
            .withf(|token, charge| {
                token.expose() == "token"
                    && charge.value.centavos() == 1500
                    && charge.webhook_url == "https://seu-site.com/webhook"
                    && charge.split_rules.is_empty()
            })
            .times(1)
            .returning(|_, _| {
                Ok(json!({
                    "id": "abc",
                    "status": "created",
                    "value": 1500,
                    "qr_code": "000201...",
                    "qr_code_base64": "data:image/png;base64,iVBOR..."
                }))
            });

        let forwarder = create_forwarder(provider, Some("token"));
        let response = forwarder
            .create_pix_charge(PostPixRequest::with_value(1500))
            .await?;

        assert_eq!(
            PixChargeResponse {
                id: Some(json!("abc")),
                status: Some(json!("created")),
                value: Some(json!(1500)),
                qr_code: Some("000201...".to_owned()),
                qr_code_base64: Some("data:image/png;base64,iVBOR...".to_owned()),
            },
            response
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_create_pix_charge_uses_configured_defaults() -> anyhow::Result<()> {
        let mut provider = MockPixProvider::new();
        provider
            .expect_create_charge()
            .withf(|_, charge| {
                charge.value.centavos() == 2500 && charge.webhook_url == "https://loja.test/hook"
            })
            .times(1)
            .returning(|_, _| {
                Ok(json!({
                    "id": 48213,
                    "status": "pending",
                    "value": 2500,
                    "emv": "00020126580014br.gov.bcb.pix"
                }))
            });

        let forwarder = PixForwarder::builder()
            .with_api_token(ApiToken::new("token"))
            .with_charge(Some(ChargeConfig {
                default_value: 2500,
                default_webhook_url: "https://loja.test/hook".to_owned(),
            }))
            .with_provider(Arc::new(provider))
            .build()?;

        let response = forwarder
            .create_pix_charge(PostPixRequest::default())
            .await?;
        assert!(response.qr_code.is_some_and(|code| code.starts_with("000201")));
        Ok(())
    }

    #[tokio::test]
    async fn test_create_pix_charge_relays_upstream_error() {
        let mut provider = MockPixProvider::new();
        provider.expect_create_charge().times(1).returning(|_, _| {
            Err(ProviderError::Upstream {
                status: StatusCode::PAYMENT_REQUIRED,
                content_type: None,
                body: Bytes::from_static(br#"{"message":"Saldo insuficiente"}"#),
            })
        });

        let forwarder = create_forwarder(provider, Some("token"));
        let result = forwarder
            .create_pix_charge(PostPixRequest::with_value(1500))
            .await;

        match result {
            Err(PixGatewayError::Upstream { status, body, .. }) => {
                assert_eq!(StatusCode::PAYMENT_REQUIRED, status);
                assert_eq!(&br#"{"message":"Saldo insuficiente"}"#[..], &body[..]);
            }
            _ => panic!("expected upstream error"),
        }
    }

    #[tokio::test]
    async fn test_create_pix_charge_missing_fields_are_null() -> anyhow::Result<()> {
        let mut provider = MockPixProvider::new();
        provider
            .expect_create_charge()
            .times(1)
            .returning(|_, _| Ok(json!({ "id": 7 })));

        let forwarder = create_forwarder(provider, Some("token"));
        let response = forwarder
            .create_pix_charge(PostPixRequest::default())
            .await?;

        assert_eq!(
            json!({
                "id": 7,
                "status": null,
                "value": null,
                "qr_code": null,
                "qr_code_base64": null
            }),
            serde_json::to_value(response)?
        );
        Ok(())
    }

    struct SlowProvider {
        completed: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl PixProvider for SlowProvider {
        async fn create_charge(
            &self,
            _api_token: &ApiToken,
            charge: &CreatePixCharge,
        ) -> Result<serde_json::Value, ProviderError> {
            tokio::time::sleep(Duration::from_millis(400)).await;
            self.completed.fetch_add(1, Ordering::SeqCst);
            Ok(json!({ "id": "slow", "value": charge.value.centavos() }))
        }
    }

    #[tokio::test]
    async fn test_create_pix_charge_completes_after_caller_gives_up() {
        let completed = Arc::new(AtomicUsize::new(0));
        let forwarder = PixForwarder::builder()
            .with_api_token(ApiToken::new("token"))
            .with_provider(Arc::new(SlowProvider {
                completed: completed.clone(),
            }))
            .build()
            .expect("forwarder");

        let result = tokio::time::timeout(
            Duration::from_millis(100),
            forwarder.create_pix_charge(PostPixRequest::with_value(1500)),
        )
        .await;
        assert!(result.is_err());
        assert_eq!(0, completed.load(Ordering::SeqCst));

        tokio::time::sleep(Duration::from_millis(800)).await;
        assert_eq!(1, completed.load(Ordering::SeqCst));
    }

    #[test]
    fn test_builder_rejects_invalid_upstream_path() {
        let result = PixForwarder::builder()
            .with_upstream(Some(crate::config::UpstreamConfig {
                path: "http://[::1".to_owned(),
                ..Default::default()
            }))
            .build();
        assert!(matches!(result, Err(PixGatewayError::ProviderSetup(_))));
    }
}
