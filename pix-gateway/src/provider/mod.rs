use async_trait::async_trait;
use pix_core::primitives::CreatePixCharge;

use crate::config::ApiToken;

pub mod error;
pub mod pushinpay;

#[cfg(test)]
use mockall::automock;

use self::error::ProviderError;

/// The PIX provider's cash-in endpoint.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait PixProvider: Send + Sync {
    /// Submits a charge and returns the provider's JSON body. Non-2xx answers are returned as
    /// [`ProviderError::Upstream`] with the original status and body.
    async fn create_charge(
        &self,
        api_token: &ApiToken,
        charge: &CreatePixCharge,
    ) -> Result<serde_json::Value, ProviderError>;
}
